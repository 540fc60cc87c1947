//! The ingestion loop: poll, fetch, extract and store.

use crate::detector;
use crate::error::{FailureClass, IngestError, IngestResult};
use crate::extract::ExtractorRegistry;
use crate::remote::RemoteSource;
use crate::retry::{retry_with_backoff, RetryPolicy};
use chrono::{DateTime, Utc};
use folio_config::PollConfig;
use folio_core::{Change, ChangeKind, FileMetadata, RemoteItem, Snapshot};
use folio_db::Database;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why a change was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The store already holds this or a newer version.
    UpToDate,
    /// Extraction produced no text.
    Empty,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UpToDate => "up to date",
            SkipReason::Empty => "no text",
        }
    }
}

/// Result of processing one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Stored { units: usize },
    Skipped { reason: SkipReason },
    Failed { class: FailureClass, message: String },
}

impl IngestOutcome {
    fn from_error(error: &IngestError) -> Self {
        IngestOutcome::Failed {
            class: error.class(),
            message: error.to_string(),
        }
    }

    /// Failures worth another attempt next cycle.
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestOutcome::Failed {
                class: FailureClass::Remote | FailureClass::Storage,
                ..
            }
        )
    }
}

/// One processed change and what happened to it.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub item: RemoteItem,
    pub change: ChangeKind,
    pub outcome: IngestOutcome,
}

/// Everything one poll cycle did, in listing order.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub listed: usize,
    pub items: Vec<ItemReport>,
}

impl CycleReport {
    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::Stored { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::Failed { .. }))
    }

    pub fn is_quiet(&self) -> bool {
        self.items.is_empty()
    }

    fn count(&self, pred: impl Fn(&IngestOutcome) -> bool) -> usize {
        self.items.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Loop timing and limits.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub interval: Duration,
    pub max_concurrent_jobs: usize,
    pub retry: RetryPolicy,
}

impl CoordinatorConfig {
    pub fn from_config(config: &PollConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_seconds.max(1)),
            max_concurrent_jobs: config.max_concurrent_jobs.max(1),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}

/// Drives detector, fetch, extraction and storage for one remote folder.
pub struct Coordinator {
    source: Arc<dyn RemoteSource>,
    db: Database,
    registry: Arc<ExtractorRegistry>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        source: Arc<dyn RemoteSource>,
        db: Database,
        registry: ExtractorRegistry,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            source,
            db,
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run exactly one cycle against `previous`.
    ///
    /// Returns the snapshot to use next time. Items that failed with a
    /// retryable class are left out of it so the next cycle sees them again.
    /// A listing failure returns an error and the caller keeps `previous`.
    pub async fn run_once(&self, previous: &Snapshot) -> IngestResult<(Snapshot, CycleReport)> {
        let started_at = Utc::now();

        let (snapshot, changes) = retry_with_backoff(
            &self.config.retry,
            &self.source.describe(),
            || detector::poll(self.source.as_ref(), previous),
        )
        .await?;

        let listed = snapshot.len();
        if !changes.is_empty() {
            info!("{} changed items in {}", changes.len(), self.source.describe());
        }

        let items: Vec<ItemReport> = stream::iter(changes)
            .map(|change| self.process(change))
            .buffered(self.config.max_concurrent_jobs)
            .collect()
            .await;

        let retry_ids: Vec<&str> = items
            .iter()
            .filter(|r| r.outcome.is_retryable())
            .map(|r| r.item.id.as_str())
            .collect();
        let snapshot = snapshot.revert(previous, retry_ids);

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            listed,
            items,
        };
        Ok((snapshot, report))
    }

    /// Poll until `token` is cancelled, sleeping the configured interval
    /// between cycles. `on_cycle` sees every cycle's result.
    ///
    /// Cancellation is observed between cycles and during the sleep; a
    /// cycle already running finishes first.
    pub async fn run<F>(&self, token: CancellationToken, mut on_cycle: F) -> Snapshot
    where
        F: FnMut(&IngestResult<CycleReport>),
    {
        let mut snapshot = Snapshot::empty();
        let mut cycle: u64 = 0;

        info!(
            "Polling {} every {:?}",
            self.source.describe(),
            self.config.interval
        );

        while !token.is_cancelled() {
            cycle += 1;
            debug!("Starting cycle {}", cycle);

            let result = match self.run_once(&snapshot).await {
                Ok((next, report)) => {
                    snapshot = next;
                    info!(
                        "Cycle {}: {} listed, {} stored, {} skipped, {} failed",
                        cycle,
                        report.listed,
                        report.stored(),
                        report.skipped(),
                        report.failed()
                    );
                    Ok(report)
                }
                Err(e) => {
                    error!("Cycle {} failed ({}): {}", cycle, e.class(), e);
                    Err(e)
                }
            };
            on_cycle(&result);

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!("Polling stopped after {} cycles", cycle);
        snapshot
    }

    async fn process(&self, change: Change) -> ItemReport {
        let outcome = match self.ingest(&change.item).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} [{}]: {}", change.item.name, e.class(), e);
                IngestOutcome::from_error(&e)
            }
        };

        ItemReport {
            item: change.item,
            change: change.kind,
            outcome,
        }
    }

    async fn ingest(&self, item: &RemoteItem) -> IngestResult<IngestOutcome> {
        let db = self.db.clone();
        let id = item.id.clone();
        let stored_at = tokio::task::spawn_blocking(move || db.stored_modified_at(&id))
            .await?
            .map_err(|e| IngestError::storage(&item.id, e))?;

        // Last write wins: never replace with an equal or older version
        if stored_at.is_some_and(|stored| stored >= item.modified_at) {
            debug!("{} is up to date", item.name);
            return Ok(IngestOutcome::Skipped {
                reason: SkipReason::UpToDate,
            });
        }

        let download = retry_with_backoff(&self.config.retry, &item.name, || {
            self.source.fetch(item)
        })
        .await?;
        let byte_size = item.size.unwrap_or(download.len() as i64);

        let registry = Arc::clone(&self.registry);
        let owned = item.clone();
        let document = tokio::task::spawn_blocking(move || registry.extract(&owned, &download))
            .await
            .map_err(|e| IngestError::extraction(&item.name, e))??;

        if document.is_empty() {
            debug!("{} has no text", item.name);
            return Ok(IngestOutcome::Skipped {
                reason: SkipReason::Empty,
            });
        }

        let units = document.unit_count();
        let metadata = FileMetadata::new(item.modified_at, byte_size);
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.upsert_document(&document, &metadata))
            .await?
            .map_err(|e| IngestError::storage(&item.id, e))?;

        info!("Stored {} ({} units)", item.name, units);
        Ok(IngestOutcome::Stored { units })
    }
}
