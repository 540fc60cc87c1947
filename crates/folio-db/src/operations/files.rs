//! File and unit operations: transactional upsert, lookups and listings.

use crate::compression::{compress_text, decompress_text};
use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use folio_core::{
    format_timestamp, parse_timestamp, ContentDocument, ContentKind, ContentUnit, FileMetadata,
    FileStatus, StoredDocument, StoredFile,
};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Transaction};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Column list matching [`row_to_file`].
pub(crate) const FILE_COLUMNS: &str = "f.file_id, f.file_name, f.file_type, f.modified_at, f.processed_at, \
     f.unit_count, f.byte_size, f.content_hash, f.status, f.created_at, f.updated_at";

impl Database {
    /// Insert or replace a document and all of its units.
    ///
    /// The file row upsert, the deletion of the previous units and the
    /// insertion of the new ones commit together or not at all.
    pub fn upsert_document(
        &self,
        document: &ContentDocument,
        metadata: &FileMetadata,
    ) -> DbResult<()> {
        self.write_document(document, metadata, |_| Ok(()))
    }

    /// Upsert with a hook that runs after the old units are deleted and
    /// before the new ones are inserted. An error from the hook aborts the
    /// whole transaction.
    fn write_document<F>(
        &self,
        document: &ContentDocument,
        metadata: &FileMetadata,
        before_insert: F,
    ) -> DbResult<()>
    where
        F: FnOnce(&Transaction<'_>) -> DbResult<()>,
    {
        if document.source_id.trim().is_empty() {
            return Err(DbError::InvalidInput(
                "document source id must not be empty".to_string(),
            ));
        }

        self.replace_units(document, metadata, before_insert)
            .map_err(|e| DbError::Write {
                file_id: document.source_id.clone(),
                source: Box::new(e),
            })
    }

    fn replace_units<F>(
        &self,
        document: &ContentDocument,
        metadata: &FileMetadata,
        before_insert: F,
    ) -> DbResult<()>
    where
        F: FnOnce(&Transaction<'_>) -> DbResult<()>,
    {
        // Compress before the transaction opens so it stays short
        let rows = document
            .units
            .iter()
            .map(|unit| Ok((unit, compress_text(&unit.text)?)))
            .collect::<DbResult<Vec<_>>>()?;

        let now = format_timestamp(&Utc::now());
        let content_hash = content_hash(document);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO files (file_id, file_name, file_type, modified_at, processed_at,
                               unit_count, byte_size, content_hash, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'active', ?5, ?5)
            ON CONFLICT(file_id) DO UPDATE SET
                file_name = excluded.file_name,
                file_type = excluded.file_type,
                modified_at = excluded.modified_at,
                processed_at = excluded.processed_at,
                unit_count = excluded.unit_count,
                byte_size = excluded.byte_size,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
            params![
                document.source_id,
                document.display_name,
                document.kind.as_str(),
                format_timestamp(&metadata.modified_at),
                now,
                document.unit_count() as i64,
                metadata.byte_size,
                content_hash,
            ],
        )?;

        let removed = tx.execute(
            "DELETE FROM content WHERE file_id = ?1",
            params![document.source_id],
        )?;

        before_insert(&tx)?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO content (file_id, slide_number, page_number, text_compressed, text_length, text_plain)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for (unit, compressed) in &rows {
                let (slide, page) = match document.kind {
                    ContentKind::Presentation => (Some(unit.ordinal), None),
                    ContentKind::Document => (None, Some(unit.ordinal)),
                };
                stmt.execute(params![
                    document.source_id,
                    slide,
                    page,
                    compressed,
                    unit.text.chars().count() as i64,
                    unit.text,
                ])?;
            }
        }

        tx.commit()?;

        debug!(
            "Stored {} ({} units, replaced {})",
            document.source_id,
            rows.len(),
            removed
        );
        Ok(())
    }

    /// Get a file with its units, decompressed and ordered by slide or page number.
    pub fn get_document(&self, file_id: &str) -> DbResult<StoredDocument> {
        let conn = self.conn()?;

        let file = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.file_id = ?1"),
                params![file_id],
                row_to_file,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("File not found: {}", file_id))
                }
                _ => DbError::from(e),
            })?;

        let mut stmt = conn.prepare(
            r#"
            SELECT COALESCE(slide_number, page_number), text_compressed
            FROM content
            WHERE file_id = ?1
            ORDER BY COALESCE(slide_number, page_number), id
            "#,
        )?;

        let rows = stmt
            .query_map(params![file_id], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let units = rows
            .into_iter()
            .map(|(ordinal, compressed)| {
                Ok(ContentUnit::new(
                    file_id,
                    ordinal,
                    decompress_text(&compressed)?,
                ))
            })
            .collect::<DbResult<Vec<_>>>()?;

        Ok(StoredDocument { file, units })
    }

    /// Find a file row without loading its units.
    pub fn find_file(&self, file_id: &str) -> DbResult<Option<StoredFile>> {
        let conn = self.conn()?;
        let file = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.file_id = ?1"),
                params![file_id],
                row_to_file,
            )
            .optional()?;
        Ok(file)
    }

    /// Stored modification time of a file, if it has been ingested.
    pub fn stored_modified_at(&self, file_id: &str) -> DbResult<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT modified_at FROM files WHERE file_id = ?1",
                params![file_id],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|s| parse_timestamp(&s).map_err(|e| DbError::Other(e.to_string())))
            .transpose()
    }

    /// List files with the given status, most recently modified first.
    pub fn list_files(&self, status: FileStatus) -> DbResult<Vec<StoredFile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files f WHERE f.status = ?1
             ORDER BY f.modified_at DESC, f.file_name"
        ))?;

        let files = stmt.query_map(params![status.as_str()], row_to_file)?;
        files.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Change the status of a file without touching its content.
    pub fn set_status(&self, file_id: &str, status: FileStatus) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE files SET status = ?2, updated_at = ?3 WHERE file_id = ?1",
            params![file_id, status.as_str(), format_timestamp(&Utc::now())],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("File not found: {}", file_id)));
        }

        Ok(())
    }

    /// Delete a file; its units go with it through the cascading foreign key.
    pub fn delete_file(&self, file_id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM files WHERE file_id = ?1", params![file_id])?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("File not found: {}", file_id)));
        }

        Ok(())
    }
}

/// Hex SHA-256 over the unit ordinals and texts. Audit fingerprint only.
pub(crate) fn content_hash(document: &ContentDocument) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.kind.as_str().as_bytes());
    for unit in &document.units {
        hasher.update(unit.ordinal.to_le_bytes());
        hasher.update(unit.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    parse_timestamp(&value).map_err(|e| conversion_failure(idx, e))
}

fn conversion_failure(idx: usize, err: folio_core::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<StoredFile> {
    let file_type: String = row.get(2)?;
    let file_type = ContentKind::from_str(&file_type)
        .ok_or_else(|| conversion_failure(2, folio_core::Error::UnknownKind(file_type)))?;
    let status: String = row.get(8)?;
    let status = FileStatus::from_str(&status)
        .ok_or_else(|| conversion_failure(8, folio_core::Error::UnknownStatus(status)))?;

    Ok(StoredFile {
        file_id: row.get(0)?,
        file_name: row.get(1)?,
        file_type,
        modified_at: timestamp_column(row, 3)?,
        processed_at: timestamp_column(row, 4)?,
        unit_count: row.get(5)?,
        byte_size: row.get(6)?,
        content_hash: row.get(7)?,
        status,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}
