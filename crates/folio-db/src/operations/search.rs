//! Full-text search over the plain unit projection.

use super::files::{row_to_file, FILE_COLUMNS};
use crate::database::Database;
use crate::error::{DbError, DbResult};
use folio_core::{ContentUnit, SearchHit};
use rusqlite::params;

/// Turn a natural-language query into an FTS5 MATCH expression.
///
/// Each word becomes a quoted term so FTS5 operators in user input are
/// treated as text; all terms are required. The index tokenizer stems the
/// terms, so "process" also matches "processing". Returns `None` when the
/// query holds no words.
pub fn build_match_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| format!("\"{}\"", word.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

impl Database {
    /// Search active files, grouped by file.
    ///
    /// Files come most recently modified first; matches within a file are in
    /// slide or page order.
    pub fn search(&self, query: &str) -> DbResult<Vec<SearchHit>> {
        let Some(match_query) = build_match_query(query) else {
            return Ok(Vec::new());
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {FILE_COLUMNS}, COALESCE(c.slide_number, c.page_number), c.text_plain
            FROM content_fts
            INNER JOIN content c ON c.id = content_fts.rowid
            INNER JOIN files f ON f.file_id = c.file_id
            WHERE content_fts MATCH ?1 AND f.status = 'active'
            ORDER BY f.modified_at DESC, f.file_id, COALESCE(c.slide_number, c.page_number), c.id
            "#
        ))?;

        let rows = stmt.query_map(params![match_query], |row| {
            let file = row_to_file(row)?;
            let ordinal: u32 = row.get(11)?;
            let text: String = row.get(12)?;
            let unit = ContentUnit::new(file.file_id.clone(), ordinal, text);
            Ok((file, unit))
        })?;

        let mut hits: Vec<SearchHit> = Vec::new();
        for row in rows {
            let (file, unit) = row.map_err(DbError::from)?;
            match hits.last_mut() {
                Some(hit) if hit.file.file_id == file.file_id => hit.matches.push(unit),
                _ => hits.push(SearchHit {
                    file,
                    matches: vec![unit],
                }),
            }
        }

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use folio_core::{ContentDocument, ContentKind, FileMetadata, FileStatus};

    fn store(db: &Database, id: &str, kind: ContentKind, texts: &[&str], hours_ago: i64) {
        let doc = ContentDocument::from_texts(id, id, kind, texts.iter().copied());
        let meta = FileMetadata::new(Utc::now() - Duration::hours(hours_ago), 10);
        db.upsert_document(&doc, &meta).unwrap();
    }

    #[test]
    fn test_build_match_query() {
        assert_eq!(build_match_query("process"), Some("\"process\"".to_string()));
        assert_eq!(
            build_match_query("  Data-Processing  NEAR "),
            Some("\"data\" \"processing\" \"near\"".to_string())
        );
        assert_eq!(build_match_query("\"*:()"), None);
        assert_eq!(build_match_query(""), None);
    }

    #[test]
    fn test_search_uses_stemming() {
        let db = Database::open_in_memory().unwrap();
        store(&db, "a", ContentKind::Document, &["The processing pipeline"], 1);

        let hits = db.search("process").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file.file_id, "a");
        assert_eq!(hits[0].matches[0].text, "The processing pipeline");
    }

    #[test]
    fn test_search_is_not_substring_matching() {
        let db = Database::open_in_memory().unwrap();
        store(&db, "a", ContentKind::Document, &["preprocessor macros"], 1);
        assert!(db.search("process").unwrap().is_empty());
    }

    #[test]
    fn test_search_forgets_replaced_content() {
        let db = Database::open_in_memory().unwrap();
        store(&db, "a", ContentKind::Document, &["keyword processing here"], 2);
        assert_eq!(db.search("process").unwrap().len(), 1);

        store(&db, "a", ContentKind::Document, &["nothing relevant"], 1);
        assert!(db.search("process").unwrap().is_empty());
        assert_eq!(db.search("relevant").unwrap().len(), 1);
    }

    #[test]
    fn test_search_groups_by_file_in_recency_order() {
        let db = Database::open_in_memory().unwrap();
        store(
            &db,
            "older",
            ContentKind::Presentation,
            &["budget review", "intro", "budget plan"],
            24,
        );
        store(&db, "newer", ContentKind::Document, &["budget"], 1);

        let hits = db.search("budget").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].file.file_id, "newer");
        assert_eq!(hits[1].file.file_id, "older");

        let ordinals: Vec<u32> = hits[1].matches.iter().map(|u| u.ordinal).collect();
        assert_eq!(ordinals, vec![1, 3]);
    }

    #[test]
    fn test_search_requires_all_words() {
        let db = Database::open_in_memory().unwrap();
        store(&db, "a", ContentKind::Document, &["quarterly budget", "annual budget"], 1);

        let hits = db.search("annual budgets").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matches.len(), 1);
        assert_eq!(hits[0].matches[0].ordinal, 2);
    }

    #[test]
    fn test_search_skips_archived_files() {
        let db = Database::open_in_memory().unwrap();
        store(&db, "a", ContentKind::Document, &["archived keyword"], 1);
        db.set_status("a", FileStatus::Archived).unwrap();
        assert!(db.search("keyword").unwrap().is_empty());
    }

    #[test]
    fn test_search_survives_operator_input() {
        let db = Database::open_in_memory().unwrap();
        store(&db, "a", ContentKind::Document, &["alpha OR beta"], 1);
        assert!(db.search("OR)(\"").unwrap().len() <= 1);
        assert!(db.search("*").unwrap().is_empty());
    }
}
