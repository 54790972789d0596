//! End-to-end tests for the up-npm binary
//!
//! These tests verify:
//! - Argument validation and help output
//! - Dry-run and JSON modes leave package.json unchanged
//! - The interactive flow rewrites only the selected entries
//! - Exit codes for success, partial failure and fatal errors

use assert_cmd::Command;
use mockito::{Mock, Server, ServerGuard};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PACKAGE_JSON: &str = r#"{
  "name": "test-project",
  "version": "1.0.0",
  "dependencies": {
    "lodash": "^4.17.0",
    "ghost": "^1.0.0"
  },
  "devDependencies": {
    "typescript": "~5.0.0"
  }
}
"#;

fn create_project(manifest: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(dir.path().join("package.json"), manifest).unwrap();
    dir
}

/// Command isolated from the developer's npm credentials and colors
fn up_npm(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("up-npm").unwrap();
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("NPM_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn package_mock(server: &mut ServerGuard, name: &str, latest: &str) -> Mock {
    server
        .mock("GET", format!("/{name}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"name":"{name}","dist-tags":{{"latest":"{latest}"}}}}"#
        ))
        .create()
}

/// Local registry; the mocks must outlive the command run
fn registry() -> (ServerGuard, Vec<Mock>) {
    let mut server = Server::new();
    let mocks = vec![
        package_mock(&mut server, "lodash", "4.17.21"),
        package_mock(&mut server, "typescript", "5.4.5"),
        server.mock("GET", "/ghost").with_status(404).create(),
    ];
    (server, mocks)
}

#[test]
fn help_lists_options() {
    let home = TempDir::new().unwrap();
    up_npm(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-dev"))
        .stdout(predicate::str::contains("--filter"))
        .stdout(predicate::str::contains("--allow-downgrade"))
        .stdout(predicate::str::contains("--concurrency"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn version_flag_prints_version() {
    let home = TempDir::new().unwrap();
    up_npm(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn zero_concurrency_is_rejected() {
    let home = TempDir::new().unwrap();
    up_npm(home.path())
        .args(["-c", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

#[test]
fn missing_manifest_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    up_npm(dir.path())
        .current_dir(dir.path())
        .arg("--dry-run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("manifest file not found"));
}

#[test]
fn invalid_manifest_exits_with_failure() {
    let dir = create_project("{ not json");
    up_npm(dir.path())
        .current_dir(dir.path())
        .arg("--dry-run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn dry_run_json_reports_and_keeps_file() {
    let (server, _mocks) = registry();
    let dir = create_project(PACKAGE_JSON);

    let output = up_npm(dir.path())
        .current_dir(dir.path())
        .args(["--json", "--registry", &server.url()])
        .output()
        .unwrap();

    // ghost is missing from the registry, so the run is only partially successful
    assert_eq!(output.status.code(), Some(2));

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_dependencies"], 3);
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["patch"], 1);
    assert_eq!(json["summary"]["minor"], 1);
    assert_eq!(json["skipped"][0]["name"], "ghost");
    assert_eq!(json["skipped"][0]["reason"], "fetch_failed");

    let names: Vec<&str> = json["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["dependency_name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"lodash"));
    assert!(names.contains(&"typescript"));

    assert_eq!(
        fs::read_to_string(dir.path().join("package.json")).unwrap(),
        PACKAGE_JSON
    );
}

#[test]
fn dry_run_text_with_filter_and_no_dev() {
    let (server, _mocks) = registry();
    let dir = create_project(PACKAGE_JSON);

    up_npm(dir.path())
        .current_dir(dir.path())
        .args(["--dry-run", "--no-dev", "-f", "lod", "--registry", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("lodash"))
        .stdout(predicate::str::contains("typescript").not())
        .stdout(predicate::str::contains(
            "Filtered 1 dependencies from a total of 2",
        ));
}

#[test]
fn up_to_date_project_says_so() {
    let (server, _mocks) = registry();
    let dir = create_project(r#"{ "dependencies": { "lodash": "^4.17.21" } }"#);

    up_npm(dir.path())
        .current_dir(dir.path())
        .args(["--dry-run", "--registry", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No outdated dependencies!"));
}

#[test]
fn interactive_update_rewrites_selected_entries() {
    let (server, _mocks) = registry();
    let manifest = r#"{
  "name": "test-project",
  "dependencies": {
    "lodash": "^4.17.0"
  },
  "devDependencies": {
    "typescript": "~5.0.0"
  }
}
"#;
    let dir = create_project(manifest);

    // Candidates come in patch, minor order: take lodash, skip typescript
    up_npm(dir.path())
        .current_dir(dir.path())
        .args(["--registry", &server.url()])
        .write_stdin("u\ns\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("has been updated with 1 updated packages"))
        .stdout(predicate::str::contains("Run 'npm install'"));

    let written = fs::read_to_string(dir.path().join("package.json")).unwrap();
    assert!(written.contains(r#""lodash": "^4.17.21""#));
    assert!(written.contains(r#""typescript": "~5.0.0""#));
}

#[test]
fn interactive_cancel_leaves_file() {
    let (server, _mocks) = registry();
    let manifest = r#"{ "dependencies": { "lodash": "^4.17.0" } }"#;
    let dir = create_project(manifest);

    up_npm(dir.path())
        .current_dir(dir.path())
        .args(["--registry", &server.url()])
        .write_stdin("u\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled update process"));

    assert_eq!(
        fs::read_to_string(dir.path().join("package.json")).unwrap(),
        manifest
    );
}

#[test]
fn public_registry_token_is_not_sent_to_custom_registry() {
    let mut server = Server::new();
    let lodash = server
        .mock("GET", "/lodash")
        .match_header("authorization", mockito::Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"lodash","dist-tags":{"latest":"4.17.21"}}"#)
        .create();
    let dir = create_project(r#"{ "dependencies": { "lodash": "^4.17.0" } }"#);
    fs::write(
        dir.path().join(".npmrc"),
        "//registry.npmjs.org/:_authToken=npm_SECRET\n",
    )
    .unwrap();

    up_npm(dir.path())
        .current_dir(dir.path())
        .env("NPM_TOKEN", "npm_ENV_SECRET")
        .args(["--dry-run", "--registry", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("lodash"));

    lodash.assert();
}

#[test]
fn token_keyed_to_custom_registry_is_sent() {
    let mut server = Server::new();
    let lodash = server
        .mock("GET", "/lodash")
        .match_header("authorization", "Bearer local_token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"lodash","dist-tags":{"latest":"4.17.21"}}"#)
        .create();
    let dir = create_project(r#"{ "dependencies": { "lodash": "^4.17.0" } }"#);
    // server.url() is http://host:port; .npmrc keys drop the scheme
    let key = server.url().replacen("http:", "", 1);
    fs::write(
        dir.path().join(".npmrc"),
        format!("//registry.npmjs.org/:_authToken=npm_SECRET\n{key}/:_authToken=local_token\n"),
    )
    .unwrap();

    up_npm(dir.path())
        .current_dir(dir.path())
        .args(["--dry-run", "--registry", &server.url()])
        .assert()
        .success();

    lodash.assert();
}
