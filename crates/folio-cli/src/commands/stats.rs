//! Stats command - show store statistics.

use super::{format_size, AppContext};
use anyhow::Result;
use colored::Colorize;
use folio_db::Database;
use std::path::Path;

pub fn run(config_override: Option<&Path>) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    let db = ctx.existing_database()?;
    let stats = db.get_stats()?;

    println!("{}", "Folio Statistics".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Files".white().bold());
    println!("  Total: {}", stats.total_files.to_string().green());
    println!("  Active: {}", stats.active_files);
    println!("  Archived: {}", stats.archived_files);

    let mut by_type: Vec<_> = stats.files_by_type.iter().collect();
    by_type.sort();
    for (file_type, count) in by_type {
        let icon = match file_type.as_str() {
            "presentation" => "📊",
            "document" => "📄",
            _ => "📁",
        };
        println!("    {} {}: {}", icon, file_type, count);
    }

    println!();
    println!("{}", "Content".white().bold());
    println!("  Units: {}", stats.total_units);
    println!("  Text: {}", format_size(stats.plain_bytes));
    println!("  Compressed: {}", format_size(stats.compressed_bytes));
    if stats.plain_bytes > 0 {
        let ratio = stats.compressed_bytes as f64 / stats.plain_bytes as f64 * 100.0;
        println!("  Ratio: {:.1}%", ratio);
    }

    println!();
    println!("{}", "Storage".white().bold());
    let path = ctx.database_path();
    println!("  Database: {}", path.display());
    println!("  Size: {}", format_size(Database::file_size(&path)?));
    if db.integrity_check()? {
        println!("  Integrity: {}", "ok".green());
    } else {
        println!("  Integrity: {}", "FAILED".red().bold());
    }

    Ok(())
}
