//! Folio Core - Domain types shared by the store, the detector and the CLI.

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;
