//! CLI integration tests for Drydock.
//!
//! These tests run the binary against small fixture projects and check the
//! reported package sets.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the drydock binary command, isolated from ambient R libraries.
fn drydock() -> Command {
    let mut cmd = Command::cargo_bin("drydock").unwrap();
    cmd.env_remove("R_LIBS_USER").env_remove("R_LIBS");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write an installed-package DESCRIPTION into a library directory.
fn install(lib: &std::path::Path, name: &str, imports: &[&str]) {
    let dir = lib.join(name);
    fs::create_dir_all(&dir).unwrap();
    let mut content = format!("Package: {name}\nVersion: 1.0.0\n");
    if !imports.is_empty() {
        content.push_str(&format!("Imports: {}\n", imports.join(", ")));
    }
    fs::write(dir.join("DESCRIPTION"), content).unwrap();
}

// ============================================================================
// drydock discover
// ============================================================================

#[test]
fn test_discover_scans_scripts() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("analysis.R"),
        "library(dplyr)\nggplot2::ggplot(d)\n",
    )
    .unwrap();

    drydock()
        .args(["discover", "--no-implicit"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("dplyr\nggplot2\n");
}

#[test]
fn test_discover_adds_runtime_package_by_default() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("main.R"), "library(purrr)\n").unwrap();

    drydock()
        .arg("discover")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("drydock\npurrr\n");
}

#[test]
fn test_discover_expands_closure_from_lib_path() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("main.R"), "library(shiny)\n").unwrap();

    let lib = temp_dir();
    install(lib.path(), "shiny", &["httpuv", "rlang"]);
    install(lib.path(), "httpuv", &[]);
    install(lib.path(), "rlang", &[]);

    drydock()
        .args(["discover", "--no-implicit", "--lib-path"])
        .arg(lib.path())
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("httpuv\nrlang\nshiny\n");
}

#[test]
fn test_discover_no_closure_reports_direct_set_only() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("main.R"), "library(shiny)\n").unwrap();

    let lib = temp_dir();
    install(lib.path(), "shiny", &["httpuv"]);
    install(lib.path(), "httpuv", &[]);

    drydock()
        .args(["discover", "--no-implicit", "--no-closure", "--lib-path"])
        .arg(lib.path())
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("shiny\n");
}

#[test]
fn test_discover_ignore_flag_suppresses_package() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("main.R"), "library(dplyr)\nlibrary(zoo)\n").unwrap();

    drydock()
        .args(["discover", "--no-implicit", "--ignore", "zoo"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("dplyr\n");
}

#[test]
fn test_discover_library_project_uses_manifest() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("DESCRIPTION"),
        "Package: mypkg\nType: Package\nImports: rlang, cli\nSuggests: testthat\n",
    )
    .unwrap();
    // A library's source files are not consulted
    fs::write(tmp.path().join("scratch.R"), "library(forgotten)\n").unwrap();

    drydock()
        .args(["discover", "--no-implicit"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("cli\nrlang\n");
}

#[test]
fn test_discover_detects_shiny_server_file() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("server.R"),
        "shinyServer(function(input, output) {})\n",
    )
    .unwrap();

    drydock()
        .arg("discover")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("shiny"));
}

#[test]
fn test_discover_skips_character_only_variable() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("main.R"),
        "pkg <- \"dynamic\"\nlibrary(pkg, character.only = TRUE)\nlibrary(stable)\n",
    )
    .unwrap();

    drydock()
        .args(["discover", "--no-implicit"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("stable\n");
}

#[test]
fn test_discover_markdown_contributes_renderer() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("report.Rmd"),
        "---\ntitle: demo\n---\n\n```{r}\nlibrary(knitr)\n```\n",
    )
    .unwrap();

    drydock()
        .args(["discover", "--no-implicit"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("knitr\nrmarkdown\n");
}

#[test]
fn test_discover_warns_on_unparsable_file_but_succeeds() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("bad.R"), "library(dplyr) ((\n").unwrap();
    fs::write(tmp.path().join("good.R"), "library(purrr)\n").unwrap();

    drydock()
        .args(["discover", "--no-implicit"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("purrr\n")
        .stderr(predicate::str::contains("warning"));
}

#[test]
fn test_warnings_never_reach_stdout() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("bad.R"), "library(dplyr) ((\n").unwrap();

    drydock()
        .args(["discover", "--no-implicit", "--format", "json", "--verbose"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("WARN").not());
}

#[test]
fn test_discover_json_output() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("main.R"), "library(jsonlite)\n").unwrap();

    drydock()
        .args(["discover", "--no-implicit", "--format", "json"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"application\""))
        .stdout(predicate::str::contains("\"jsonlite\""));
}

#[test]
fn test_discover_respects_project_config() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("main.R"), "library(dplyr)\nlibrary(zoo)\n").unwrap();
    let config_dir = tmp.path().join("drydock");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[discovery]\nignored_packages = [\"zoo\"]\nimplicit_runtime = false\n",
    )
    .unwrap();

    drydock()
        .arg("discover")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("dplyr\n");
}

// ============================================================================
// drydock sources
// ============================================================================

#[test]
fn test_sources_lists_per_file_dependencies() {
    let tmp = temp_dir();
    fs::create_dir_all(tmp.path().join("R")).unwrap();
    fs::write(tmp.path().join("R/model.R"), "library(glmnet)\n").unwrap();
    fs::write(tmp.path().join("util.R"), "x <- 1\n").unwrap();

    drydock()
        .arg("sources")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("model.R: glmnet"))
        .stdout(predicate::str::contains("util.R: (none)"));
}

#[test]
fn test_sources_empty_project() {
    let tmp = temp_dir();

    drydock()
        .arg("sources")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no source files found"));
}

// ============================================================================
// drydock completions
// ============================================================================

#[test]
fn test_completions_bash() {
    drydock()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("drydock"));
}
