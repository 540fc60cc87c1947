//! Store statistics.

use crate::database::Database;
use crate::error::DbResult;
use folio_core::StoreStats;
use std::collections::HashMap;

impl Database {
    /// Get store statistics.
    pub fn get_stats(&self) -> DbResult<StoreStats> {
        let conn = self.conn()?;

        let (total_files, active_files, archived_files): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'active'), 0),
                    COALESCE(SUM(status = 'archived'), 0)
             FROM files",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        // Files by type
        let mut files_by_type = HashMap::new();
        {
            let mut stmt = conn.prepare("SELECT file_type, COUNT(*) FROM files GROUP BY file_type")?;
            let rows = stmt.query_map([], |row| {
                let file_type: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((file_type, count))
            })?;
            for row in rows {
                let (file_type, count) = row?;
                files_by_type.insert(file_type, count);
            }
        }

        let (total_units, compressed_bytes, plain_bytes): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(LENGTH(text_compressed)), 0),
                    COALESCE(SUM(LENGTH(CAST(text_plain AS BLOB))), 0)
             FROM content",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(StoreStats {
            total_files,
            active_files,
            archived_files,
            total_units,
            files_by_type,
            compressed_bytes,
            plain_bytes,
        })
    }
}
