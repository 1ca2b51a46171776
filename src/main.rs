use clap::Parser;

use graphql_bundle_cli::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    graphql_bundle_cli::cli::init_logging(cli.verbose);
    graphql_bundle_cli::cli::run(cli)
}
