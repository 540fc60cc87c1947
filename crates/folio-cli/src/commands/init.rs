//! Initialize Folio.

use super::AppContext;
use anyhow::{Context, Result};
use colored::Colorize;
use folio_config::Config;
use std::path::Path;

pub fn run(config_override: Option<&Path>) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    let database_path = ctx.database_path();

    if ctx.config_file.exists() && database_path.exists() {
        println!(
            "{} Folio is already initialized.",
            "Note:".yellow().bold()
        );
        println!("  Config: {}", ctx.config_file.display());
        println!("  Database: {}", database_path.display());
        return Ok(());
    }

    println!("{}", "Initializing Folio...".cyan().bold());

    ctx.paths
        .ensure_dirs()
        .context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    if !ctx.config_file.exists() {
        Config::create_default_file(&ctx.config_file)
            .context("Failed to create config file")?;
        println!(
            "  {} Created config: {}",
            "✓".green(),
            ctx.config_file.display()
        );
    }

    let _db = ctx.open_database()?;
    println!(
        "  {} Created database: {}",
        "✓".green(),
        database_path.display()
    );

    println!();
    println!("{}", "Folio initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set the folder to mirror in {} (or export FOLIO_FOLDER_ID)",
        ctx.config_file.display().to_string().cyan()
    );
    println!("  2. Run one cycle: {}", "folio poll".cyan());
    println!("  3. Keep polling: {}", "folio watch".cyan());

    Ok(())
}
