//! Folio Ingest - Change detection and the ingestion loop.
//!
//! This crate provides:
//! - Remote folder listing and download (Google Drive, local directory)
//! - Snapshot diffing to find new and modified files
//! - Text extraction for slides, documents, PDFs and plain text
//! - The polling coordinator that stores extracted text

mod coordinator;
pub mod detector;
mod error;
pub mod extract;
pub mod remote;
mod retry;

pub use coordinator::{
    Coordinator, CoordinatorConfig, CycleReport, IngestOutcome, ItemReport, SkipReason,
};
pub use detector::{diff, poll};
pub use error::{FailureClass, IngestError, IngestResult};
pub use extract::{Extractor, ExtractorRegistry};
pub use remote::{Download, DriveSource, LocalFolderSource, RemoteSource};
pub use retry::{retry_with_backoff, RetryPolicy};
