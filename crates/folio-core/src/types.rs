//! Core domain types for Folio.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identifier of a remote item, reused as the stored file's primary key.
pub type FileId = String;

/// Parse an RFC 3339 timestamp with any offset into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidTimestamp {
            value: value.to_string(),
            message: e.to_string(),
        })
}

/// Canonical storage form of a timestamp.
///
/// Fixed precision and a `Z` suffix, so lexical order equals chronological
/// order inside the database.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One entry of a remote folder listing.
///
/// Deserialized items go through [`RemoteItem::from_rfc3339`], so they get the
/// same UTC normalization and truncation as constructed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RemoteItemRecord")]
pub struct RemoteItem {
    pub id: FileId,
    pub name: String,
    pub content_type: String,
    pub modified_at: DateTime<Utc>,
    pub size: Option<i64>,
}

impl RemoteItem {
    /// Create an item; the timestamp is normalized to UTC whatever its offset
    /// and truncated to the microsecond precision the store keeps.
    pub fn new<Tz: TimeZone>(
        id: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
        modified_at: DateTime<Tz>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_type: content_type.into(),
            modified_at: modified_at.with_timezone(&Utc).trunc_subsecs(6),
            size: None,
        }
    }

    /// Create an item from an RFC 3339 modification time.
    pub fn from_rfc3339(
        id: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
        modified_at: &str,
    ) -> Result<Self> {
        Ok(Self::new(id, name, content_type, parse_timestamp(modified_at)?))
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Deserialize)]
struct RemoteItemRecord {
    id: FileId,
    name: String,
    content_type: String,
    modified_at: String,
    #[serde(default)]
    size: Option<i64>,
}

impl TryFrom<RemoteItemRecord> for RemoteItem {
    type Error = Error;

    fn try_from(record: RemoteItemRecord) -> Result<Self> {
        let item = Self::from_rfc3339(
            record.id,
            record.name,
            record.content_type,
            &record.modified_at,
        )?;
        Ok(match record.size {
            Some(size) => item.with_size(size),
            None => item,
        })
    }
}

/// The last-observed listing of a remote folder.
///
/// A snapshot is never mutated after construction; a poll produces a new one.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    items: HashMap<FileId, RemoteItem>,
    taken_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The snapshot held before the first poll.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a listing. A repeated id keeps its latest entry.
    pub fn from_listing(listing: impl IntoIterator<Item = RemoteItem>) -> Self {
        let mut items: HashMap<FileId, RemoteItem> = HashMap::new();
        for item in listing {
            match items.get(&item.id) {
                Some(existing) if existing.modified_at >= item.modified_at => {}
                _ => {
                    items.insert(item.id.clone(), item);
                }
            }
        }
        Self {
            items,
            taken_at: Some(Utc::now()),
        }
    }

    /// True until a listing has been observed.
    pub fn is_initial(&self) -> bool {
        self.taken_at.is_none()
    }

    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at
    }

    pub fn get(&self, id: &str) -> Option<&RemoteItem> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteItem> {
        self.items.values()
    }

    /// Put the given ids back to what `previous` recorded for them, so the
    /// next diff reports them again.
    pub fn revert<'a>(mut self, previous: &Snapshot, ids: impl IntoIterator<Item = &'a str>) -> Self {
        for id in ids {
            match previous.get(id) {
                Some(item) => {
                    self.items.insert(id.to_string(), item.clone());
                }
                None => {
                    self.items.remove(id);
                }
            }
        }
        self
    }
}

/// Why an item is part of a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    New,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::New => "new",
            ChangeKind::Modified => "modified",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single detected change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub item: RemoteItem,
    pub kind: ChangeKind,
}

/// Items new or more recently modified than in the previous snapshot, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// The changed items, without their change kind.
    pub fn items(&self) -> impl Iterator<Item = &RemoteItem> {
        self.changes.iter().map(|c| &c.item)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.changes.iter().any(|c| c.item.id == id)
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Kind of extracted content; decides whether ordinals are slides or pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Presentation,
    Document,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Presentation => "presentation",
            ContentKind::Document => "document",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "presentation" => Some(ContentKind::Presentation),
            "document" => Some(ContentKind::Document),
            _ => None,
        }
    }

    /// Label for a unit of this kind ("Slide" or "Page").
    pub fn unit_label(&self) -> &'static str {
        match self {
            ContentKind::Presentation => "Slide",
            ContentKind::Document => "Page",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ordinal-addressed chunk of text: a slide or a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub document_id: FileId,
    /// 1-based slide or page number.
    pub ordinal: u32,
    pub text: String,
}

impl ContentUnit {
    pub fn new(document_id: impl Into<String>, ordinal: u32, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ordinal,
            text: text.into(),
        }
    }
}

/// Normalized, ordered text extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub source_id: FileId,
    pub display_name: String,
    pub kind: ContentKind,
    pub units: Vec<ContentUnit>,
}

impl ContentDocument {
    pub fn new(
        source_id: impl Into<String>,
        display_name: impl Into<String>,
        kind: ContentKind,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            display_name: display_name.into(),
            kind,
            units: Vec::new(),
        }
    }

    /// Build a document whose units are numbered 1..=n in the given order.
    pub fn from_texts<I, S>(
        source_id: impl Into<String>,
        display_name: impl Into<String>,
        kind: ContentKind,
        texts: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .fold(Self::new(source_id, display_name, kind), |doc, text| {
                doc.with_unit(text)
            })
    }

    /// Append a unit with the next ordinal.
    pub fn with_unit(mut self, text: impl Into<String>) -> Self {
        let ordinal = self.units.len() as u32 + 1;
        self.units
            .push(ContentUnit::new(self.source_id.clone(), ordinal, text));
        self
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Attributes of the source file recorded alongside its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub modified_at: DateTime<Utc>,
    pub byte_size: i64,
}

impl FileMetadata {
    pub fn new(modified_at: DateTime<Utc>, byte_size: i64) -> Self {
        Self {
            modified_at,
            byte_size,
        }
    }
}

/// Visibility of a stored file in listings and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Active,
    Archived,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Active => "active",
            FileStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(FileStatus::Active),
            "archived" => Some(FileStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted file row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub file_id: FileId,
    pub file_name: String,
    pub file_type: ContentKind,
    pub modified_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
    pub unit_count: i64,
    pub byte_size: i64,
    pub content_hash: String,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored file together with its decompressed units in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub file: StoredFile,
    pub units: Vec<ContentUnit>,
}

/// Search matches within one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub file: StoredFile,
    pub matches: Vec<ContentUnit>,
}

/// Store statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_files: i64,
    pub active_files: i64,
    pub archived_files: i64,
    pub total_units: i64,
    pub files_by_type: HashMap<String, i64>,
    /// Bytes held by the compressed column.
    pub compressed_bytes: i64,
    /// Bytes held by the plain search projection.
    pub plain_bytes: i64,
}
