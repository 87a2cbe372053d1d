// ── Ordered reactive record collection ──
//
// Insertion-ordered storage keyed by record id, with push-based change
// notification via a `watch` channel. Every effective mutation rebuilds
// the snapshot that subscribers receive; no-op writes publish nothing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bunker_api::{RecordId, Resource};
use indexmap::IndexMap;
use tokio::sync::watch;

/// Immutable view of a collection at one point in time.
pub type Snapshot<R> = Arc<Vec<Arc<R>>>;

/// Records of one kind. Identities are unique by construction.
pub(crate) struct RecordCollection<R: Resource> {
    by_id: Mutex<IndexMap<RecordId, Arc<R>>>,
    snapshot: watch::Sender<Snapshot<R>>,
}

impl<R: Resource> RecordCollection<R> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: Mutex::new(IndexMap::new()),
            snapshot,
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<RecordId, Arc<R>>> {
        self.by_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace by identity. Returns `false` when an equal record
    /// was already present.
    pub(crate) fn upsert(&self, record: R) -> bool {
        let mut by_id = self.lock();
        let id = record.id();
        if by_id.get(&id).is_some_and(|existing| **existing == record) {
            return false;
        }
        by_id.insert(id, Arc::new(record));
        self.publish(&by_id);
        true
    }

    /// Remove by identity. Absent ids are a no-op.
    pub(crate) fn remove(&self, id: RecordId) -> Option<Arc<R>> {
        let mut by_id = self.lock();
        let removed = by_id.shift_remove(&id);
        if removed.is_some() {
            self.publish(&by_id);
        }
        removed
    }

    /// Replace the contents with a full server listing.
    ///
    /// Ids in `pinned` keep whatever state they currently have (present or
    /// absent) regardless of the listing. Unchanged records keep their `Arc`
    /// and nothing is published if the result equals the current contents.
    pub(crate) fn replace_all(&self, incoming: Vec<R>, pinned: &HashSet<RecordId>) -> bool {
        let mut by_id = self.lock();
        let mut next: IndexMap<RecordId, Arc<R>> = IndexMap::with_capacity(incoming.len());

        for record in incoming {
            let id = record.id();
            if pinned.contains(&id) {
                if let Some(current) = by_id.get(&id) {
                    next.insert(id, Arc::clone(current));
                }
                continue;
            }
            let entry = match by_id.get(&id) {
                Some(current) if **current == record => Arc::clone(current),
                _ => Arc::new(record),
            };
            next.insert(id, entry);
        }
        for id in pinned {
            if let Some(current) = by_id.get(id) {
                next.entry(*id).or_insert_with(|| Arc::clone(current));
            }
        }

        let unchanged = next.len() == by_id.len()
            && next
                .iter()
                .zip(by_id.iter())
                .all(|((a_id, a), (b_id, b))| a_id == b_id && Arc::ptr_eq(a, b));
        if unchanged {
            return false;
        }

        *by_id = next;
        self.publish(&by_id);
        true
    }

    pub(crate) fn get(&self, id: RecordId) -> Option<Arc<R>> {
        self.lock().get(&id).cloned()
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<R> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<R>> {
        self.snapshot.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rebuild the snapshot vec and broadcast it. Called with the map locked
    /// so snapshots are published in mutation order.
    fn publish(&self, by_id: &IndexMap<RecordId, Arc<R>>) {
        let values: Vec<Arc<R>> = by_id.values().cloned().collect();
        // `send_replace` updates unconditionally, even with zero receivers.
        self.snapshot.send_replace(Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bunker_api::models::StorageLocation;

    fn loc(id: RecordId, name: &str) -> StorageLocation {
        StorageLocation {
            id,
            name: name.into(),
            description: None,
        }
    }

    fn names(col: &RecordCollection<StorageLocation>) -> Vec<String> {
        col.snapshot().iter().map(|l| l.name.clone()).collect()
    }

    #[test]
    fn upsert_reports_effective_changes_only() {
        let col = RecordCollection::new();
        assert!(col.upsert(loc(1, "Cellar")));
        assert!(!col.upsert(loc(1, "Cellar")));
        assert!(col.upsert(loc(1, "Garage")));
        assert_eq!(names(&col), ["Garage"]);
    }

    #[test]
    fn replacing_keeps_position() {
        let col = RecordCollection::new();
        col.upsert(loc(1, "A"));
        col.upsert(loc(2, "B"));
        col.upsert(loc(3, "C"));
        col.upsert(loc(2, "B2"));
        assert_eq!(names(&col), ["A", "B2", "C"]);

        col.remove(1);
        assert_eq!(names(&col), ["B2", "C"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let col = RecordCollection::new();
        col.upsert(loc(1, "A"));
        let mut rx = col.subscribe();
        rx.borrow_and_update();

        assert!(col.remove(42).is_none());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn replace_all_prunes_and_respects_pins() {
        let col = RecordCollection::new();
        col.upsert(loc(1, "A"));
        col.upsert(loc(2, "B-local"));
        col.upsert(loc(3, "C"));

        // 2 is pinned with its current state, 4 is pinned while absent.
        let pinned: HashSet<RecordId> = [2, 4].into_iter().collect();
        let changed = col.replace_all(
            vec![loc(1, "A"), loc(2, "B-server"), loc(4, "D")],
            &pinned,
        );

        assert!(changed);
        assert_eq!(names(&col), ["A", "B-local"]);
        assert!(col.get(3).is_none());
        assert!(col.get(4).is_none());
    }

    #[test]
    fn identical_listing_publishes_nothing() {
        let col = RecordCollection::new();
        col.replace_all(vec![loc(1, "A"), loc(2, "B")], &HashSet::new());
        let mut rx = col.subscribe();
        rx.borrow_and_update();

        assert!(!col.replace_all(vec![loc(1, "A"), loc(2, "B")], &HashSet::new()));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(col.len(), 2);
    }
}
