//! `config` subcommands.

use anyhow::{Context, Result};
use greenshield_core::config::{Config, paths};

pub fn path() {
    println!("{}", paths::config_path().display());
}

/// Writes the commented template, then reports the settings it resolves to.
pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    show_config(&Config::load_from(&config_path)?)
}

/// Prints the effective settings after env overrides.
pub fn show() -> Result<()> {
    show_config(&Config::load().context("load config")?)
}

fn show_config(config: &Config) -> Result<()> {
    let timeout = config
        .request_timeout()
        .map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs()));
    println!("base_url       = {}", config.resolve_base_url()?);
    println!("timeout        = {timeout}");
    println!("history_limit  = {}", config.history_limit);
    println!("platform       = {}", config.platform);
    println!("session_store  = {}", paths::session_path().display());
    Ok(())
}
