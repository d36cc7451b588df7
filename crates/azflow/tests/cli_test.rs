mod common;

use common::{SERVER_ID, TestProject};
use predicates::prelude::*;

const VALID_SERVER: &str = r#"
name: reporting01
resource_group_name: analytics-rg
location: West Europe
sku: S0
admin_users:
  - alice@example.com
ipv4_firewall_rule:
  - name: office
    range_start: 10.0.0.1
    range_end: 10.0.0.9
"#;

/// CLI help lists every subcommand
#[test]
fn test_cli_help() {
    let project = TestProject::new();
    project
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Analysis Services"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_cli_version() {
    let project = TestProject::new();
    project
        .cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("azflow"));
}

#[test]
fn test_destroy_help() {
    let project = TestProject::new();
    project
        .cmd()
        .args(["destroy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<NAME>"))
        .stdout(predicate::str::contains("--yes"));
}

#[test]
fn test_show_empty_project() {
    let project = TestProject::new();
    project
        .cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No servers recorded"));
}

/// The backup URI is never printed
#[test]
fn test_show_recorded_server() {
    let project = TestProject::new();
    project.write_state_with_server("running");

    project
        .cmd()
        .args(["show", "reporting01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reporting01"))
        .stdout(predicate::str::contains(SERVER_ID))
        .stdout(predicate::str::contains("office 10.0.0.1 - 10.0.0.9"))
        .stdout(predicate::str::contains("(sensitive)"))
        .stdout(predicate::str::contains("sig=secret").not());
}

#[test]
fn test_show_unknown_server() {
    let project = TestProject::new();
    project
        .cmd()
        .args(["show", "missing01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in state"));
}

#[test]
fn test_project_dir_flag() {
    let project = TestProject::new();
    project.write_state_with_server("running");
    let elsewhere = TestProject::new();

    elsewhere
        .cmd()
        .arg("-C")
        .arg(project.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("reporting01"));
}

#[test]
fn test_apply_rejects_invalid_server() {
    let project = TestProject::new();
    let file = project.write(
        "server.yaml",
        "name: Reporting_01\nresource_group_name: analytics-rg\nlocation: westeurope\nsku: S0\n",
    );

    project
        .cmd()
        .arg("apply")
        .arg(file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("name"));
}

#[test]
fn test_apply_rejects_unknown_sku() {
    let project = TestProject::new();
    let file = project.write(
        "server.yaml",
        "name: reporting01\nresource_group_name: analytics-rg\nlocation: westeurope\nsku: S3\n",
    );

    project
        .cmd()
        .arg("apply")
        .arg(file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn test_apply_requires_credentials() {
    let project = TestProject::new();
    let file = project.write("server.yaml", VALID_SERVER);

    project
        .cmd()
        .arg("apply")
        .arg(file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("AZURE_SUBSCRIPTION_ID"));

    // Nothing was recorded
    assert!(!project.state_path().exists());
}

/// An unconfirmed create pins the server to its recorded resource group
#[test]
fn test_apply_refuses_moving_pending_create() {
    let project = TestProject::new();
    project.write_state_with_server("creating");
    let before = std::fs::read_to_string(project.state_path()).unwrap();
    let file = project.write(
        "server.yaml",
        "name: reporting01\nresource_group_name: other-rg\nlocation: westeurope\nsku: S0\n",
    );

    project
        .cmd()
        .arg("apply")
        .arg(file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unconfirmed create"))
        .stderr(predicate::str::contains("analytics-rg"));

    let after = std::fs::read_to_string(project.state_path()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_refresh_unknown_server() {
    let project = TestProject::new();
    project
        .cmd()
        .args(["refresh", "reporting01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in state"));
}

#[test]
fn test_destroy_without_yes_changes_nothing() {
    let project = TestProject::new();
    project.write_state_with_server("running");
    let before = std::fs::read_to_string(project.state_path()).unwrap();

    project
        .cmd()
        .args(["destroy", "reporting01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));

    let after = std::fs::read_to_string(project.state_path()).unwrap();
    assert_eq!(before, after);
}
