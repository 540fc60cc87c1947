//! Database migrations and schema management.

use crate::error::DbResult;
use rusqlite::Connection;
use tracing::info;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> DbResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating initial database schema...");
        create_initial_schema(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database from version {} to {}",
            current_version, SCHEMA_VERSION
        );
        run_migrations(conn, current_version)?;
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> DbResult<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

fn create_initial_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- One row per remote source file
        CREATE TABLE IF NOT EXISTS files (
            file_id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            file_type TEXT NOT NULL,
            modified_at TEXT NOT NULL,
            processed_at TEXT NOT NULL,
            unit_count INTEGER NOT NULL DEFAULT 0,
            byte_size INTEGER NOT NULL DEFAULT 0,
            content_hash TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_files_name ON files(file_name);
        CREATE INDEX IF NOT EXISTS idx_files_type ON files(file_type);
        CREATE INDEX IF NOT EXISTS idx_files_modified ON files(modified_at);
        CREATE INDEX IF NOT EXISTS idx_files_status ON files(status);

        -- Slides or pages; exactly one ordinal column is set
        CREATE TABLE IF NOT EXISTS content (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL REFERENCES files(file_id) ON DELETE CASCADE,
            slide_number INTEGER,
            page_number INTEGER,
            text_compressed BLOB NOT NULL,
            text_length INTEGER NOT NULL,
            text_plain TEXT NOT NULL,
            CHECK ((slide_number IS NULL) <> (page_number IS NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_content_file ON content(file_id);
        CREATE INDEX IF NOT EXISTS idx_content_slide ON content(slide_number);
        CREATE INDEX IF NOT EXISTS idx_content_page ON content(page_number);

        -- Stemmed full-text index over the plain projection
        CREATE VIRTUAL TABLE IF NOT EXISTS content_fts USING fts5(
            text_plain,
            content='content',
            content_rowid='id',
            tokenize='porter unicode61'
        );

        -- Triggers to keep FTS in sync
        CREATE TRIGGER IF NOT EXISTS content_ai AFTER INSERT ON content BEGIN
            INSERT INTO content_fts(rowid, text_plain) VALUES (NEW.id, NEW.text_plain);
        END;

        CREATE TRIGGER IF NOT EXISTS content_ad AFTER DELETE ON content BEGIN
            INSERT INTO content_fts(content_fts, rowid, text_plain) VALUES('delete', OLD.id, OLD.text_plain);
        END;

        CREATE TRIGGER IF NOT EXISTS content_au AFTER UPDATE ON content BEGIN
            INSERT INTO content_fts(content_fts, rowid, text_plain) VALUES('delete', OLD.id, OLD.text_plain);
            INSERT INTO content_fts(rowid, text_plain) VALUES (NEW.id, NEW.text_plain);
        END;
        "#,
    )?;

    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> DbResult<()> {
    // No migrations exist past version 1 yet.
    let _ = from_version;

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_created_once() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        // Second run is a no-op
        initialize_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('files', 'content', 'content_fts')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_unit_requires_exactly_one_ordinal() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO files (file_id, file_name, file_type, modified_at, processed_at, content_hash, created_at, updated_at)
             VALUES ('f', 'f.pdf', 'document', 't', 't', 'h', 't', 't')",
            [],
        )
        .unwrap();

        let both = conn.execute(
            "INSERT INTO content (file_id, slide_number, page_number, text_compressed, text_length, text_plain)
             VALUES ('f', 1, 1, x'00', 0, '')",
            [],
        );
        assert!(both.is_err());

        let neither = conn.execute(
            "INSERT INTO content (file_id, slide_number, page_number, text_compressed, text_length, text_plain)
             VALUES ('f', NULL, NULL, x'00', 0, '')",
            [],
        );
        assert!(neither.is_err());
    }
}
