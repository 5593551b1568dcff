// ── Generic reactive document collection ──
//
// Lock-free concurrent storage with O(1) lookups and push-based change
// notification via `watch` channels, at two granularities: the whole
// collection (snapshot) and individual documents (DocSlot).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;

/// The state of a single watched document.
///
/// Distinguishes "not yet loaded" from "confirmed missing": before the
/// collection's first sync an unknown id is `Pending`; afterwards an
/// absent id is `Missing`. A failed lookup therefore never masquerades
/// as a still-loading one.
#[derive(Debug, Clone, Default)]
pub enum DocSlot<T> {
    /// The collection has not synchronized yet; the document may exist.
    #[default]
    Pending,
    /// The document is confirmed absent (or its lookup failed).
    Missing,
    /// The document is present.
    Present(Arc<T>),
}

impl<T> DocSlot<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_present(&self) -> Option<&Arc<T>> {
        match self {
            Self::Present(doc) => Some(doc),
            Self::Pending | Self::Missing => None,
        }
    }
}

impl<T: PartialEq> PartialEq for DocSlot<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Pending, Self::Pending) | (Self::Missing, Self::Missing) => true,
            (Self::Present(a), Self::Present(b)) => a == b,
            _ => false,
        }
    }
}

/// A reactive collection for a single document type.
///
/// Uses `DashMap` for O(1) concurrent lookups and `watch` channels for
/// push-based change notification. Every mutation bumps a version counter
/// and rebuilds the snapshot that subscribers receive; per-document
/// channels fire only for their own id.
pub(crate) struct DocumentCollection<T: Clone + Send + Sync + 'static> {
    /// Primary storage: document id -> document.
    by_id: DashMap<String, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,

    /// Per-document channels, created lazily by `subscribe_doc`.
    doc_watches: DashMap<String, watch::Sender<DocSlot<T>>>,

    /// Set once the first sync has been applied; flips `Pending` reads
    /// to `Missing` for absent ids.
    synced: AtomicBool,
}

impl<T: Clone + Send + Sync + 'static> DocumentCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
            doc_watches: DashMap::new(),
            synced: AtomicBool::new(false),
        }
    }

    /// Insert or overwrite a document. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: String, doc: T) -> bool {
        let doc = Arc::new(doc);
        let is_new = self.by_id.insert(id.clone(), Arc::clone(&doc)).is_none();

        self.notify_doc(&id, DocSlot::Present(doc));
        self.rebuild_snapshot();
        self.bump_version();

        is_new
    }

    /// Remove a document. Returns the removed document if it existed.
    pub(crate) fn remove(&self, id: &str) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, v)| v);
        if removed.is_some() {
            self.notify_doc(id, DocSlot::Missing);
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Replace the whole collection with a fresh sync result and mark the
    /// collection synced. Watched ids not in the new set flip to `Missing`.
    pub(crate) fn replace_all(&self, docs: Vec<(String, T)>) {
        self.by_id.clear();
        for (id, doc) in docs {
            self.by_id.insert(id, Arc::new(doc));
        }
        self.synced.store(true, Ordering::Release);

        // Re-resolve every watched document against the new contents.
        self.doc_watches.retain(|_, tx| !tx.is_closed());
        for entry in &self.doc_watches {
            let slot = self
                .by_id
                .get(entry.key())
                .map_or(DocSlot::Missing, |doc| DocSlot::Present(Arc::clone(doc.value())));
            entry.value().send_replace(slot);
        }

        self.rebuild_snapshot();
        self.bump_version();
    }

    /// Look up a document by id.
    pub(crate) fn get(&self, id: &str) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Subscribe to a single document's state.
    ///
    /// The receiver's initial value reflects what is known right now:
    /// `Present` if stored, `Missing` if absent after a sync, `Pending`
    /// before the first sync.
    pub(crate) fn subscribe_doc(&self, id: &str) -> watch::Receiver<DocSlot<T>> {
        let entry = self.doc_watches.entry(id.to_owned()).or_insert_with(|| {
            let initial = self.by_id.get(id).map_or_else(
                || {
                    if self.synced.load(Ordering::Acquire) {
                        DocSlot::Missing
                    } else {
                        DocSlot::Pending
                    }
                },
                |doc| DocSlot::Present(Arc::clone(doc.value())),
            );
            let (tx, _) = watch::channel(initial);
            tx
        });
        entry.value().subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Push a new state to a document's watch channel, if anyone asked.
    fn notify_doc(&self, id: &str, slot: DocSlot<T>) {
        if let Some(tx) = self.doc_watches.get(id) {
            tx.send_replace(slot);
        }
    }

    /// Collect all values into a snapshot vec and broadcast to subscribers.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    /// Increment the version counter.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_returns_true_for_new_id() {
        let col: DocumentCollection<String> = DocumentCollection::new();
        assert!(col.upsert("a".into(), "hello".into()));
        assert!(!col.upsert("a".into(), "world".into()));
        assert_eq!(*col.get("a").unwrap(), "world");
    }

    #[test]
    fn remove_updates_snapshot() {
        let col: DocumentCollection<String> = DocumentCollection::new();
        col.upsert("a".into(), "x".into());
        col.upsert("b".into(), "y".into());
        assert_eq!(col.len(), 2);

        let removed = col.remove("a");
        assert_eq!(*removed.unwrap(), "x");
        assert_eq!(col.snapshot().len(), 1);
        assert!(col.remove("a").is_none());
    }

    #[test]
    fn doc_watch_is_pending_before_sync() {
        let col: DocumentCollection<String> = DocumentCollection::new();
        let rx = col.subscribe_doc("ghost");
        assert!(matches!(*rx.borrow(), DocSlot::Pending));
    }

    #[test]
    fn doc_watch_is_missing_after_sync() {
        let col: DocumentCollection<String> = DocumentCollection::new();
        col.replace_all(vec![("a".into(), "x".into())]);

        let rx = col.subscribe_doc("ghost");
        assert!(matches!(*rx.borrow(), DocSlot::Missing));

        let rx = col.subscribe_doc("a");
        assert!(rx.borrow().is_present());
    }

    #[tokio::test]
    async fn doc_watch_fires_on_upsert_and_remove() {
        let col: DocumentCollection<String> = DocumentCollection::new();
        let mut rx = col.subscribe_doc("a");

        col.upsert("a".into(), "v1".into());
        rx.changed().await.unwrap();
        assert_eq!(**rx.borrow_and_update().as_present().unwrap(), "v1");

        col.remove("a");
        rx.changed().await.unwrap();
        assert!(matches!(*rx.borrow_and_update(), DocSlot::Missing));
    }

    #[test]
    fn replace_all_resolves_open_watches() {
        let col: DocumentCollection<String> = DocumentCollection::new();
        let pending = col.subscribe_doc("gone");
        let loaded = col.subscribe_doc("kept");
        assert!(matches!(*pending.borrow(), DocSlot::Pending));

        col.replace_all(vec![("kept".into(), "v".into())]);
        assert!(matches!(*pending.borrow(), DocSlot::Missing));
        assert!(loaded.borrow().is_present());
        assert!(col.is_synced());
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let col: DocumentCollection<String> = DocumentCollection::new();
        assert!(col.snapshot().is_empty());

        col.upsert("a".into(), "x".into());
        col.upsert("b".into(), "y".into());
        assert_eq!(col.snapshot().len(), 2);
    }
}
