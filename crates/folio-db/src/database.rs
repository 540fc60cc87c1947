//! Pooled SQLite handle.

use crate::error::{DbError, DbResult};
use crate::migrations;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 10;

const FILE_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;";

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Handle to the content store.
///
/// Cloning is cheap; clones share the same connection pool. Every
/// operation takes a connection for its own duration only, so callers on
/// different threads never wait on each other beyond SQLite's own locking.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Open (or create) the store at `path` with the default pool size.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_pool_size(path, DEFAULT_POOL_SIZE)
    }

    /// Open (or create) the store at `path` with at most `pool_size`
    /// connections. Missing parent directories are created.
    pub fn open_with_pool_size<P: AsRef<Path>>(path: P, pool_size: u32) -> DbResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DbError::Path {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        info!("Opening store at {} (pool {})", path.display(), pool_size);
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch(FILE_PRAGMAS));
        Self::build(manager, pool_size)
    }

    /// A private in-memory store. The pool holds a single connection, since
    /// each SQLite memory connection is its own database.
    pub fn open_in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        Self::build(manager, 1)
    }

    fn build(manager: SqliteConnectionManager, pool_size: u32) -> DbResult<Self> {
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(Duration::from_secs(10))
            .build(manager)?;

        migrations::initialize_schema(&*pool.get()?)?;
        debug!("Schema ready");

        Ok(Self { pool })
    }

    /// Borrow a connection; it goes back to the pool when the guard drops.
    pub fn conn(&self) -> DbResult<PooledConn> {
        Ok(self.pool.get()?)
    }

    /// Size of the store file on disk.
    pub fn file_size<P: AsRef<Path>>(path: P) -> DbResult<i64> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| DbError::Path {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(metadata.len() as i64)
    }

    /// `PRAGMA integrity_check` reports "ok".
    pub fn integrity_check(&self) -> DbResult<bool> {
        let verdict: String =
            self.conn()?
                .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(verdict == "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_in_memory_store_is_usable() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.integrity_check().unwrap());
        assert_eq!(db.pool.max_size(), 1);
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("folio.db");
        let db = Database::open_with_pool_size(&path, 2).unwrap();
        assert!(db.integrity_check().unwrap());
        assert!(Database::file_size(&path).unwrap() > 0);
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folio.db");
        drop(Database::open(&path).unwrap());
        let db = Database::open(&path).unwrap();
        assert!(db.integrity_check().unwrap());
    }

    #[test]
    fn test_file_size_of_missing_file() {
        let err = Database::file_size("/nonexistent/folio.db").unwrap_err();
        assert!(matches!(err, DbError::Path { .. }));
    }
}
