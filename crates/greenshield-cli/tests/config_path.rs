use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use greenshield_core::config::Config;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_follows_greenshield_home() {
    let dir = tempdir().unwrap();
    let expected = dir.path().join("config.toml");

    cargo_bin_cmd!("greenshield")
        .env("GREENSHIELD_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_init_template_parses_back_to_defaults() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("greenshield")
        .env("GREENSHIELD_HOME", dir.path())
        .env_remove("GREENSHIELD_BASE_URL")
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"))
        .stdout(predicate::str::contains(
            "base_url       = https://greenshield.up.railway.app",
        ))
        .stdout(predicate::str::contains("timeout        = 60s"));

    assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "history_limit = 5\n").unwrap();

    cargo_bin_cmd!("greenshield")
        .env("GREENSHIELD_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "history_limit = 5\n");
}

#[test]
fn test_show_applies_env_base_url_and_file_settings() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "request_timeout_secs = 0\nhistory_limit = 25\nplatform = \"android\"\n",
    )
    .unwrap();

    cargo_bin_cmd!("greenshield")
        .env("GREENSHIELD_HOME", dir.path())
        .env("GREENSHIELD_BASE_URL", "http://localhost:3000/")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url       = http://localhost:3000"))
        .stdout(predicate::str::contains("timeout        = none"))
        .stdout(predicate::str::contains("history_limit  = 25"))
        .stdout(predicate::str::contains("platform       = android"));
}

#[test]
fn test_broken_config_reports_parse_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "history_limit = \"lots\"").unwrap();

    cargo_bin_cmd!("greenshield")
        .env("GREENSHIELD_HOME", dir.path())
        .args(["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}
