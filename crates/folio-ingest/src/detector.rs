//! Poll-based change detection against the previous snapshot.

use crate::error::IngestResult;
use crate::remote::RemoteSource;
use folio_core::{Change, ChangeKind, ChangeSet, RemoteItem, Snapshot};
use std::collections::HashMap;
use tracing::debug;

/// Compare a fresh listing with the previous snapshot.
///
/// An item is reported when its id is absent from `previous` or its
/// modification time is strictly later than the one recorded there.
/// Changes keep listing order and each id appears at most once; when a
/// listing repeats an id, the latest version is reported at the position
/// of its first occurrence, matching what [`Snapshot::from_listing`] keeps.
pub fn diff(previous: &Snapshot, listing: &[RemoteItem]) -> ChangeSet {
    let mut order: Vec<&str> = Vec::new();
    let mut latest: HashMap<&str, &RemoteItem> = HashMap::new();

    for item in listing {
        match latest.get(item.id.as_str()) {
            None => {
                order.push(item.id.as_str());
                latest.insert(item.id.as_str(), item);
            }
            Some(existing) if existing.modified_at < item.modified_at => {
                latest.insert(item.id.as_str(), item);
            }
            Some(_) => {}
        }
    }

    let changes = order
        .into_iter()
        .filter_map(|id| {
            let item = latest[id];
            let kind = match previous.get(id) {
                None => ChangeKind::New,
                Some(known) if known.modified_at < item.modified_at => ChangeKind::Modified,
                Some(_) => return None,
            };
            Some(Change {
                item: item.clone(),
                kind,
            })
        })
        .collect();

    ChangeSet::new(changes)
}

/// List the remote and diff it against `previous`.
///
/// Returns the snapshot to install next together with the changes. On
/// error nothing is returned, so the caller keeps its previous snapshot.
pub async fn poll(
    source: &dyn RemoteSource,
    previous: &Snapshot,
) -> IngestResult<(Snapshot, ChangeSet)> {
    let listing = source.list_items().await?;
    let changes = diff(previous, &listing);

    debug!(
        "Listed {} items from {}, {} changed",
        listing.len(),
        source.describe(),
        changes.len()
    );

    Ok((Snapshot::from_listing(listing), changes))
}
