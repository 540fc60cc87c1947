//! Folio DB - Content store for Folio using SQLite.
//!
//! Every unit of text is kept twice: zlib-compressed for durable storage and
//! as a plain projection indexed by FTS5 for search.

mod compression;
mod database;
mod error;
mod migrations;
mod operations;

pub use database::{Database, DEFAULT_POOL_SIZE};
pub use error::{DbError, DbResult};
pub use operations::search::build_match_query;
