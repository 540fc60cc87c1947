//! Archive, restore and delete commands.

use super::AppContext;
use anyhow::{Context, Result};
use colored::Colorize;
use folio_core::FileStatus;
use std::io::{self, Write};
use std::path::Path;

pub fn archive(config_override: Option<&Path>, id: &str) -> Result<()> {
    set_status(config_override, id, FileStatus::Archived)
}

pub fn restore(config_override: Option<&Path>, id: &str) -> Result<()> {
    set_status(config_override, id, FileStatus::Active)
}

fn set_status(config_override: Option<&Path>, id: &str, status: FileStatus) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    let db = ctx.existing_database()?;

    db.set_status(id, status)
        .with_context(|| format!("Could not mark {} as {}", id, status.as_str()))?;

    println!("{} {} is now {}", "✓".green(), id, status.as_str());
    Ok(())
}

pub fn delete(config_override: Option<&Path>, id: &str, yes: bool) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    let db = ctx.existing_database()?;

    let file = db
        .find_file(id)?
        .with_context(|| format!("File not found: {}", id))?;

    if !yes {
        print!(
            "Delete {} and its {} units? [y/N] ",
            file.file_name.bold(),
            file.unit_count
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("{}", "Cancelled.".yellow());
            return Ok(());
        }
    }

    db.delete_file(id)?;
    println!("{} Deleted {}", "✓".green(), file.file_name);
    Ok(())
}
