//! Show command - print one stored file with all its text.

use super::{format_size, format_time, AppContext};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub fn run(config_override: Option<&Path>, id: &str) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    let db = ctx.existing_database()?;

    let doc = db
        .get_document(id)
        .with_context(|| format!("Could not load file {}", id))?;
    let file = &doc.file;

    println!("{}", file.file_name.cyan().bold());
    println!("{}", "─".repeat(70));
    println!("ID:        {}", file.file_id);
    println!("Type:      {}", file.file_type);
    println!("Status:    {}", file.status.as_str());
    println!("Size:      {}", format_size(file.byte_size));
    println!("Modified:  {}", format_time(&file.modified_at));
    println!("Processed: {}", format_time(&file.processed_at));
    println!("Hash:      {}", file.content_hash.dimmed());
    println!("Units:     {}", file.unit_count);

    let label = file.file_type.unit_label();
    for unit in &doc.units {
        println!();
        println!("{}", format!("{} {}", label, unit.ordinal).white().bold());
        if unit.text.trim().is_empty() {
            println!("{}", "(empty)".dimmed());
        } else {
            println!("{}", unit.text);
        }
    }

    Ok(())
}
