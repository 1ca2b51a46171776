use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::bundle::ProjectResolver;
use crate::config::load_project;
use crate::error::Error;
use crate::fs::{DryRunFs, Filesystem, LocalFs, PlannedWrite};
use crate::generator::{Console, Generator, Report};
use crate::routing::ProjectRoutes;
use crate::types::{BundleName, RoutePromptPolarity};

mod render;
use render::render_report;

#[derive(Debug, Clone, Copy, ValueEnum, Serialize, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "graphql-bundle")]
#[command(about = "Scaffolds and registers a GraphQL schema class for a bundle", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,

    /// Root of the PHP project (where `app/` and `src/` live).
    #[arg(
        long,
        global = true,
        env = "GRAPHQL_BUNDLE_PROJECT_DIR",
        default_value = "."
    )]
    pub project_dir: PathBuf,

    /// Take the default answer of every prompt without asking.
    #[arg(long, short = 'y', global = true, default_value_t = false)]
    pub yes: bool,

    #[arg(long, global = true)]
    pub dry_run: bool,

    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate the GraphQL schema class and register it.
    Configure(ConfigureArgs),
    Version,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigureArgs {
    /// Bundle to generate the class into; `Bundle` is appended when missing.
    #[arg(default_value = "AppBundle")]
    pub bundle: BundleName,

    /// Invoked from a composer script: skip "already configured" notices.
    #[arg(long, default_value_t = false)]
    pub composer: bool,

    /// Overrides `route_prompt` from the project file.
    #[arg(long, value_enum)]
    pub route_prompt: Option<RoutePromptPolarity>,
}

pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("graphql_bundle_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Version => {
            println!("graphql-bundle {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Configure(args) => run_configure(&cli, args),
    }
}

fn run_configure(cli: &Cli, args: &ConfigureArgs) -> anyhow::Result<()> {
    let project = load_project(&cli.project_dir)
        .with_context(|| format!("loading project at {}", cli.project_dir.display()))?;
    let resolver = ProjectResolver::new(&project);
    let routes = ProjectRoutes::new(&project, &resolver);
    let polarity = args.route_prompt.unwrap_or(project.config.route_prompt);
    let mut console = TerminalConsole {
        assume_default: cli.yes,
        echo: cli.output == OutputFormat::Text,
    };

    let configure = |fs: &dyn Filesystem, console: &mut TerminalConsole| -> anyhow::Result<Report> {
        let report = Generator::new(&resolver, &routes, fs, project.config_file())
            .route_prompt(polarity)
            .generate(args.bundle.clone(), args.composer, console)
            .with_context(|| format!("configuring {}", args.bundle))?;
        Ok(report)
    };

    let report = if cli.dry_run {
        let fs = DryRunFs::new(LocalFs);
        let report = configure(&fs, &mut console)?;
        if console.echo {
            for planned in fs.planned() {
                match planned {
                    PlannedWrite::Write(p) => println!("dry-run: would write {}", p.display()),
                    PlannedWrite::Append(p) => println!("dry-run: would append to {}", p.display()),
                    PlannedWrite::CreateDir(p) => {
                        println!("dry-run: would create directory {}", p.display())
                    }
                }
            }
        }
        report
    } else {
        configure(&LocalFs, &mut console)?
    };

    render_report(cli, &report)
}

/// Prompts on stderr, reads one answer per line from stdin, terminal or pipe alike. A
/// closed stdin takes the default, the way a non-interactive console does.
struct TerminalConsole {
    assume_default: bool,
    echo: bool,
}

impl Console for TerminalConsole {
    fn confirm(&mut self, question: &str, default: bool) -> crate::Result<bool> {
        if self.assume_default {
            return Ok(default);
        }

        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{question} ");
        let _ = stderr.flush();

        let mut input = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| Error::io("read answer from", "stdin", e))?;
        if read == 0 {
            let _ = writeln!(stderr);
        }
        Ok(parse_answer(&input, default))
    }

    fn line(&mut self, text: &str) {
        if self.echo {
            println!("{text}");
        }
    }

    fn blank_line(&mut self) {
        if self.echo {
            println!();
        }
    }
}

/// `y...` confirms, `n...` declines, anything else (including nothing) takes the default.
fn parse_answer(input: &str, default: bool) -> bool {
    let answer = input.trim().to_lowercase();
    match answer.chars().next() {
        None => default,
        Some('y') => true,
        Some('n') => false,
        Some(_) => default,
    }
}
