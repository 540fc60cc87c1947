//! Poll command - run one cycle and report it.

use super::{format_time, AppContext};
use anyhow::{Context, Result};
use colored::Colorize;
use folio_core::Snapshot;
use folio_ingest::{CoordinatorConfig, CycleReport, IngestOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub fn run(config_override: Option<&Path>, json: bool) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    ctx.paths.ensure_dirs().context("Failed to create directories")?;
    let coordinator = ctx.coordinator(CoordinatorConfig::from_config(&ctx.config.poll))?;

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")?,
        );
        spinner.set_message("Polling remote folder...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(coordinator.run_once(&Snapshot::empty()));
    spinner.finish_and_clear();

    let (_, report) = result.context("Poll failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Print one cycle's per-item outcomes and totals.
pub fn print_report(report: &CycleReport) {
    println!(
        "{} {} ({} listed)",
        "Cycle".cyan().bold(),
        format_time(&report.finished_at),
        report.listed
    );
    println!("{}", "─".repeat(70));

    if report.is_quiet() {
        println!("{}", "No changes.".dimmed());
        return;
    }

    for entry in &report.items {
        let change = format!("[{}]", entry.change.as_str());
        match &entry.outcome {
            IngestOutcome::Stored { units } => println!(
                "  {} {} {} ({} units)",
                "✓".green(),
                entry.item.name,
                change.dimmed(),
                units
            ),
            IngestOutcome::Skipped { reason } => println!(
                "  {} {} {} ({})",
                "-".yellow(),
                entry.item.name,
                change.dimmed(),
                reason.as_str()
            ),
            IngestOutcome::Failed { class, message } => println!(
                "  {} {} {} {}: {}",
                "✗".red(),
                entry.item.name,
                change.dimmed(),
                class.to_string().red(),
                message
            ),
        }
    }

    println!();
    println!(
        "Stored: {}  Skipped: {}  Failed: {}",
        report.stored().to_string().green(),
        report.skipped().to_string().yellow(),
        if report.failed() > 0 {
            report.failed().to_string().red()
        } else {
            report.failed().to_string().normal()
        }
    );
}
