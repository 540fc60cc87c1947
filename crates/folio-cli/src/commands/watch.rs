//! Watch command - poll the remote folder until Ctrl+C.

use super::poll::print_report;
use super::AppContext;
use anyhow::{Context, Result};
use colored::Colorize;
use folio_config::RemoteKind;
use folio_ingest::CoordinatorConfig;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub fn run(config_override: Option<&Path>, interval: Option<u64>) -> Result<()> {
    let ctx = AppContext::load(config_override)?;
    ctx.paths.ensure_dirs().context("Failed to create directories")?;

    let mut poll = CoordinatorConfig::from_config(&ctx.config.poll);
    if let Some(seconds) = interval {
        poll = poll.with_interval(Duration::from_secs(seconds.max(1)));
    }
    let coordinator = ctx.coordinator(poll)?;

    println!("{}", "Starting Folio...".cyan());
    match ctx.config.remote.kind {
        RemoteKind::Drive => println!(
            "  Drive folder: {}",
            ctx.config.remote.folder_id.as_deref().unwrap_or_default()
        ),
        RemoteKind::Local => println!(
            "  Local folder: {}",
            ctx.config.remote.local_path.as_deref().unwrap_or_default()
        ),
    }
    println!("  Database: {}", ctx.database_path().display());
    println!("  Interval: {}s", coordinator.config().interval.as_secs());
    println!("\nPress Ctrl+C to stop.\n");

    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(async {
        let token = CancellationToken::new();
        let signal_token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Interrupt received, stopping after the current cycle"),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
            signal_token.cancel();
        });

        coordinator
            .run(token, |result| match result {
                Ok(report) if report.is_quiet() => {}
                Ok(report) => {
                    print_report(report);
                    println!();
                }
                Err(e) => println!("{} {} ({})", "Poll failed:".red(), e, e.class()),
            })
            .await
    });

    println!(
        "{} Stopped. {} files in the last listing.",
        "✓".green(),
        snapshot.len()
    );
    Ok(())
}
