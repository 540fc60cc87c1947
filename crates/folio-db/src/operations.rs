//! Content store operations.

pub mod files;
pub mod search;
pub mod stats;
