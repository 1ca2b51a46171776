use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A minimal Symfony 3 layout with one registered bundle.
fn symfony_project() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(&root.join("src/AppBundle/AppBundle.php"), "<?php\n");
    write(
        &root.join("app/AppKernel.php"),
        "<?php\n$bundles = [new AppBundle\\AppBundle()];\n",
    );
    write(&root.join("app/config/config.yml"), "framework:\n    secret: s3cr3t\n");
    write(
        &root.join("app/config/routing.yml"),
        "app:\n    resource: \"@AppBundle/Controller/\"\n    type: annotation\n",
    );
    tmp
}

fn cmd(project: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("graphql-bundle"));
    cmd.env_remove("GRAPHQL_BUNDLE_PROJECT_DIR");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--project-dir").arg(project);
    cmd
}

#[test]
fn version_works() {
    Command::new(assert_cmd::cargo::cargo_bin!("graphql-bundle"))
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graphql-bundle "));
}

#[test]
fn configure_scaffolds_and_registers_with_default_answers() {
    let project = symfony_project();
    let root = project.path();

    cmd(root)
        .args(["configure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema file has been created at"))
        .stdout(predicate::str::contains("Config was added to"));

    let schema = fs::read_to_string(root.join("src/AppBundle/GraphQL/Schema.php")).unwrap();
    assert!(schema.contains("namespace AppBundle\\GraphQL;"));

    let config = fs::read_to_string(root.join("app/config/config.yml")).unwrap();
    assert!(config.starts_with("graph_ql:\n"));
    assert!(config.ends_with("framework:\n    secret: s3cr3t\n"));

    let routing = fs::read_to_string(root.join("app/config/routing.yml")).unwrap();
    assert!(routing.contains("resource: \"@GraphQLBundle/Controller/\""));
}

#[test]
fn second_run_reports_existing_setup_and_changes_nothing() {
    let project = symfony_project();
    let root = project.path();
    cmd(root).arg("configure").assert().success();
    let config = fs::read_to_string(root.join("app/config/config.yml")).unwrap();
    let routing = fs::read_to_string(root.join("app/config/routing.yml")).unwrap();

    cmd(root)
        .args(["configure", "App"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Schema class AppBundle\\GraphQL\\Schema was found.",
        ))
        .stdout(predicate::str::contains("GraphQL default route was found."));

    cmd(root)
        .args(["configure", "--composer"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(fs::read_to_string(root.join("app/config/config.yml")).unwrap(), config);
    assert_eq!(fs::read_to_string(root.join("app/config/routing.yml")).unwrap(), routing);
}

#[test]
fn declining_on_stdin_writes_nothing() {
    let project = symfony_project();
    let root = project.path();

    cmd(root)
        .arg("configure")
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Confirm creating class at AppBundle\\GraphQL\\Schema ? [Y/n]",
        ));

    assert!(!root.join("src/AppBundle/GraphQL").exists());
    assert_eq!(
        fs::read_to_string(root.join("app/config/config.yml")).unwrap(),
        "framework:\n    secret: s3cr3t\n"
    );
}

#[test]
fn piped_answers_are_read_in_prompt_order() {
    let project = symfony_project();
    let root = project.path();

    cmd(root)
        .arg("configure")
        .write_stdin("y\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema.php\n\n"))
        .stderr(predicate::str::contains("[Y/n]"));

    assert!(root.join("src/AppBundle/GraphQL/Schema.php").is_file());
    let routing = fs::read_to_string(root.join("app/config/routing.yml")).unwrap();
    assert!(!routing.contains("graphql:"));
}

#[test]
fn unknown_bundle_is_reported_in_json() {
    let project = symfony_project();

    cmd(project.path())
        .args(["--output", "json", "configure", "Blog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"terminated\": \"bundle_not_found\""))
        .stdout(predicate::str::contains("There is no active bundle: BlogBundle"));
}

#[test]
fn dry_run_lists_writes_without_touching_disk() {
    let project = symfony_project();
    let root = project.path();

    cmd(root)
        .args(["--dry-run", "configure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run: would write"))
        .stdout(predicate::str::contains("dry-run: would append to"));

    assert!(!root.join("src/AppBundle/GraphQL").exists());
    assert_eq!(
        fs::read_to_string(root.join("app/config/config.yml")).unwrap(),
        "framework:\n    secret: s3cr3t\n"
    );
}

#[test]
fn project_file_can_invert_route_prompt() {
    let project = symfony_project();
    let root = project.path();
    write(&root.join("graphql-bundle.yml"), "route_prompt: append_on_no\n");

    cmd(root).args(["--yes", "configure"]).assert().success();

    assert!(root.join("src/AppBundle/GraphQL/Schema.php").is_file());
    let routing = fs::read_to_string(root.join("app/config/routing.yml")).unwrap();
    assert!(!routing.contains("graphql:"));
}

#[test]
fn table_output_summarizes_report() {
    let project = symfony_project();

    cmd(project.path())
        .env("COLUMNS", "120")
        .args(["--yes", "--output", "table", "configure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schema_created"))
        .stdout(predicate::str::contains("route_added"));
}
