//! List command - show stored files.

use super::{format_size, format_time, truncate, AppContext};
use anyhow::Result;
use colored::Colorize;
use folio_core::FileStatus;
use std::path::Path;

pub fn run(config_override: Option<&Path>, archived: bool) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    let db = ctx.existing_database()?;

    let status = if archived {
        FileStatus::Archived
    } else {
        FileStatus::Active
    };
    let files = db.list_files(status)?;

    if files.is_empty() {
        println!("{}", format!("No {} files.", status.as_str()).yellow());
        return Ok(());
    }

    println!(
        "{:<36} {:<12} {:>6} {:>10}  {}",
        "Name".bold(),
        "Type".bold(),
        "Units".bold(),
        "Size".bold(),
        "Modified".bold()
    );
    println!("{}", "─".repeat(70));

    for file in &files {
        println!(
            "{:<36} {:<12} {:>6} {:>10}  {}",
            truncate(&file.file_name, 36),
            file.file_type.as_str(),
            file.unit_count,
            format_size(file.byte_size),
            format_time(&file.modified_at)
        );
        println!("  {}", file.file_id.dimmed());
    }

    println!();
    println!("{} {} files", "Total:".bold(), files.len());
    Ok(())
}
