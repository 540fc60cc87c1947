//! Search command - full-text search over stored units.

use super::{format_time, truncate, AppContext};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(config_override: Option<&Path>, query: &str) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    let db = ctx.existing_database()?;

    let hits = db.search(query)?;

    if hits.is_empty() {
        println!("{}", "No matches found.".yellow());
        return Ok(());
    }

    let total: usize = hits.iter().map(|hit| hit.matches.len()).sum();
    println!(
        "{} {} matches in {} files for \"{}\"",
        "Found".green(),
        total,
        hits.len(),
        query
    );
    println!("{}", "─".repeat(70));

    for hit in &hits {
        println!();
        println!(
            "{} {}",
            hit.file.file_name.cyan().bold(),
            format!("({}, {})", hit.file.file_id, format_time(&hit.file.modified_at)).dimmed()
        );

        let label = hit.file.file_type.unit_label();
        for unit in &hit.matches {
            let preview = unit.text.split_whitespace().collect::<Vec<_>>().join(" ");
            println!(
                "  {} {}",
                format!("{} {}:", label, unit.ordinal).bold(),
                truncate(&preview, 120)
            );
        }
    }

    Ok(())
}
