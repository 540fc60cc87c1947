//! Configuration commands.

use super::AppContext;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

/// Print the effective configuration, with secrets masked.
pub fn show(config_override: Option<&Path>) -> Result<()> {
    let ctx = AppContext::load(config_override)?;

    let mut config = ctx.config.clone();
    if config.remote.access_token.is_some() {
        config.remote.access_token = Some("********".to_string());
    }
    let rendered = config
        .to_toml_string()
        .context("Failed to render config")?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    if !ctx.config_file.exists() {
        println!(
            "{}",
            format!("# {} not found, showing defaults", ctx.config_file.display()).dimmed()
        );
    }
    println!("{}", rendered);
    println!("{}", format!("# database: {}", ctx.database_path().display()).dimmed());

    Ok(())
}

/// Print the config file path.
pub fn path(config_override: Option<&Path>) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    println!("{}", ctx.config_file.display());
    Ok(())
}
