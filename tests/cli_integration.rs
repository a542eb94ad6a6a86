// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the ongi CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Write a config file pointing the cache into `data_dir`
fn config_file(data_dir: &TempDir, extra: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "database_path = \"{}\"\n{extra}",
        data_dir.path().join("ongi.db").display()
    )
    .unwrap();
    file
}

/// `ongi` with an isolated config and no colors
fn ongi(config: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("ongi").unwrap();
    cmd.arg("--config")
        .arg(config.path())
        .arg("--no-color")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("ongi")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stores"))
        .stdout(predicate::str::contains("nav"))
        .stdout(predicate::str::contains("favorite"));
}

#[test]
fn test_nav_store_then_map_then_back() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "");

    ongi(&config)
        .args(["nav", "--throttle-ms", "0", "navigate:store:42", "select:map", "back"])
        .assert()
        .success()
        .stdout(predicate::str::contains("home > store(42)"))
        .stdout(predicate::str::contains("hidden"));
}

#[test]
fn test_nav_json_reports_each_step() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "");

    let output = ongi(&config)
        .args([
            "--json",
            "nav",
            "--throttle-ms",
            "0",
            "navigate:store:1",
            "navigate:store:1",
            "pop",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let replay: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let applied: Vec<bool> = replay["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["applied"].as_bool().unwrap())
        .collect();
    assert_eq!(applied, vec![true, false, true]);
    assert_eq!(replay["state"]["current_tab"], "home");
    assert_eq!(replay["state"]["is_root"], true);
}

fn stack_len(config: &NamedTempFile, extra: &[&str]) -> usize {
    let output = ongi(config)
        .args(["--json", "nav"])
        .args(extra)
        .args(["navigate:store:1", "navigate:store:2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let replay: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    replay["state"]["current_back_stack"].as_array().unwrap().len()
}

#[test]
fn test_nav_throttle_comes_from_config() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "navigation_throttle_ms = 500");

    assert_eq!(stack_len(&config, &[]), 2);
    assert_eq!(stack_len(&config, &["--throttle-ms", "0"]), 3);
}

#[test]
fn test_nav_store_id_with_colon() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "");

    ongi(&config)
        .args(["nav", "navigate:store:branch:7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("store(branch:7)"));
}

#[test]
fn test_nav_rejects_unknown_op() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "");

    ongi(&config)
        .args(["nav", "teleport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown navigation op"));
}

#[test]
fn test_config_key_reads_file_and_env() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "api_base_url = \"https://stores.example\"");

    ongi(&config)
        .args(["config", "api_base_url"])
        .assert()
        .success()
        .stdout("https://stores.example\n");

    ongi(&config)
        .env("ONGI_RETRY__MAX_RETRIES", "7")
        .args(["config", "retry.max_retries"])
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn test_config_unknown_key_fails() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "");

    ongi(&config)
        .args(["config", "no.such.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_stores_rejects_bad_category() {
    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, "");

    ongi(&config)
        .args(["stores", "--category", "SPACESHIPS"])
        .assert()
        .failure();
}

#[test]
fn test_completions_generate() {
    Command::cargo_bin("ongi")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ongi"));
}

fn nearby_page() -> serde_json::Value {
    json!({
        "content": [{
            "id": "a",
            "name": "Halmae Gukbap",
            "category": "KOREAN_FOOD",
            "latitude": 37.5665,
            "longitude": 126.978,
            "distance": 0.2,
            "favoriteCount": 12
        }],
        "page": 0,
        "size": 20,
        "last": true
    })
}

#[test]
fn test_home_falls_back_to_cached_stores() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/api/v1/stores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(nearby_page()))
            .mount(&server),
    );

    let data_dir = TempDir::new().unwrap();
    let config = config_file(&data_dir, &format!("api_base_url = \"{}\"", server.uri()));
    ongi(&config)
        .arg("home")
        .assert()
        .success()
        .stdout(predicate::str::contains("Halmae Gukbap"));

    rt.block_on(server.reset());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/api/v1/stores"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server),
    );
    ongi(&config)
        .arg("home")
        .assert()
        .success()
        .stdout(predicate::str::contains("Halmae Gukbap"));

    let empty_dir = TempDir::new().unwrap();
    let cold = config_file(&empty_dir, &format!("api_base_url = \"{}\"", server.uri()));
    ongi(&cold)
        .arg("home")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load nearby stores"));
}
