//! Review/author join.
//!
//! Combines a live review query with per-author profile subscriptions into
//! one live stream of author-enriched rows: fan-out (one profile watch per
//! distinct author) and fan-in (a single combined snapshot), with no
//! head-of-line blocking and no partial-failure collapse.
//!
//! Guarantees:
//! - An empty input emits an empty output immediately, with no profile
//!   subscriptions created.
//! - Output preserves the input's length and order.
//! - A missing or failed profile lookup surfaces as [`DocSlot::Missing`]
//!   on that row only; the review itself is never dropped.
//! - A change to the outer query or to any single profile re-emits the
//!   combined snapshot; rows whose review and profile are unchanged are
//!   reused by `Arc` identity.
//! - After cancellation the background task stops and nothing is emitted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::{DocumentId, Review, UserProfile};
use crate::store::{CatalogStore, DocSlot};
use crate::stream::LiveQuery;

/// Per-author profile lookups, as live document subscriptions.
///
/// Implemented by [`CatalogStore`]; test suites substitute fakes.
pub trait ProfileSource: Send + Sync {
    fn subscribe_profile(&self, id: &DocumentId) -> watch::Receiver<DocSlot<UserProfile>>;
}

impl ProfileSource for CatalogStore {
    fn subscribe_profile(&self, id: &DocumentId) -> watch::Receiver<DocSlot<UserProfile>> {
        self.subscribe_profile_doc(id.as_str())
    }
}

/// A review enriched with the live state of its author's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewWithAuthor {
    pub review: Arc<Review>,
    pub author: DocSlot<UserProfile>,
}

impl ReviewWithAuthor {
    /// The best display name available: live profile first, then the
    /// denormalized name captured at submission time.
    pub fn display_name(&self) -> &str {
        match self.author.as_present() {
            Some(profile) => &profile.display_name,
            None => &self.review.author_name,
        }
    }
}

/// Handle to a running review/author join.
///
/// Owns the background task: dropping the board (or calling
/// [`shutdown`](Self::shutdown)) cancels it, after which no further
/// snapshot is emitted.
pub struct ReviewBoard {
    output: watch::Receiver<Arc<Vec<Arc<ReviewWithAuthor>>>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReviewBoard {
    /// Start the join over `reviews`, resolving authors through `profiles`.
    ///
    /// The initial combined snapshot is computed synchronously, so an
    /// empty input yields an empty board with no pending subscriptions.
    pub fn spawn(
        reviews: LiveQuery<Review>,
        profiles: Arc<dyn ProfileSource>,
        cancel: CancellationToken,
    ) -> Self {
        let mut state = JoinState {
            profiles,
            subs: HashMap::new(),
            rows: HashMap::new(),
        };

        let initial_snapshot = reviews.latest();
        state.sync_subs(&initial_snapshot);
        let (out_tx, output) = watch::channel(state.combine(&initial_snapshot));

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            join_loop(reviews, state, out_tx, task_cancel).await;
        });

        Self {
            output,
            cancel,
            task: Some(task),
        }
    }

    /// The latest combined snapshot.
    pub fn current(&self) -> Arc<Vec<Arc<ReviewWithAuthor>>> {
        self.output.borrow().clone()
    }

    /// Wait for the next combined snapshot.
    /// Returns `None` once the join has shut down.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<ReviewWithAuthor>>>> {
        self.output.changed().await.ok()?;
        Some(self.output.borrow_and_update().clone())
    }

    /// A raw watch receiver over the combined snapshots.
    pub fn watch(&self) -> watch::Receiver<Arc<Vec<Arc<ReviewWithAuthor>>>> {
        self.output.clone()
    }

    /// Cancel the join and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ReviewBoard {
    fn drop(&mut self) {
        // Idempotent; shutdown() may have fired already.
        self.cancel.cancel();
    }
}

// ── Join state ───────────────────────────────────────────────────────

struct JoinState {
    profiles: Arc<dyn ProfileSource>,
    /// One live profile subscription per distinct author in the input.
    subs: HashMap<DocumentId, watch::Receiver<DocSlot<UserProfile>>>,
    /// Previous emission's rows, keyed by review id, for Arc reuse.
    rows: HashMap<DocumentId, Arc<ReviewWithAuthor>>,
}

impl JoinState {
    /// Align profile subscriptions with the authors of `snapshot`:
    /// subscribe new authors, drop ones no longer referenced.
    fn sync_subs(&mut self, snapshot: &[Arc<Review>]) {
        let wanted: HashSet<&DocumentId> = snapshot.iter().map(|r| &r.author_id).collect();
        self.subs.retain(|id, _| wanted.contains(id));
        for review in snapshot {
            if !self.subs.contains_key(&review.author_id) {
                let rx = self.profiles.subscribe_profile(&review.author_id);
                self.subs.insert(review.author_id.clone(), rx);
            }
        }
    }

    /// Build the combined snapshot, reusing rows whose review and profile
    /// state are unchanged.
    fn combine(&mut self, snapshot: &[Arc<Review>]) -> Arc<Vec<Arc<ReviewWithAuthor>>> {
        let mut next_rows = HashMap::with_capacity(snapshot.len());
        let mut out = Vec::with_capacity(snapshot.len());

        for review in snapshot {
            let author = self
                .subs
                .get_mut(&review.author_id)
                .map_or(DocSlot::Missing, |rx| rx.borrow_and_update().clone());

            let row = match self.rows.get(&review.id) {
                Some(prev) if Arc::ptr_eq(&prev.review, review) && prev.author == author => {
                    Arc::clone(prev)
                }
                _ => Arc::new(ReviewWithAuthor {
                    review: Arc::clone(review),
                    author,
                }),
            };
            next_rows.insert(review.id.clone(), Arc::clone(&row));
            out.push(row);
        }

        self.rows = next_rows;
        Arc::new(out)
    }
}

enum Wake {
    Cancelled,
    /// Outer query changed (`None` means the store went away).
    Outer(Option<Arc<Vec<Arc<Review>>>>),
    Profile,
}

async fn join_loop(
    mut reviews: LiveQuery<Review>,
    mut state: JoinState,
    out_tx: watch::Sender<Arc<Vec<Arc<ReviewWithAuthor>>>>,
    cancel: CancellationToken,
) {
    loop {
        let wake = {
            // Waits for any single profile subscription to change; pends
            // forever when the input is empty (nothing to join on).
            let profile_changed = async {
                if state.subs.is_empty() {
                    std::future::pending::<()>().await;
                }
                let futures: Vec<_> = state
                    .subs
                    .values_mut()
                    .map(|rx| Box::pin(rx.changed()))
                    .collect();
                let _ = futures_util::future::select_all(futures).await;
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => Wake::Cancelled,
                maybe = reviews.changed() => Wake::Outer(maybe),
                () = profile_changed => Wake::Profile,
            }
        };

        match wake {
            Wake::Cancelled => break,
            Wake::Outer(None) => break,
            Wake::Outer(Some(snapshot)) => {
                state.sync_subs(&snapshot);
                out_tx.send_replace(state.combine(&snapshot));
            }
            Wake::Profile => {
                let snapshot = reviews.current().clone();
                out_tx.send_replace(state.combine(&snapshot));
            }
        }
    }

    debug!("review board shut down");
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Rating, Role};
    use crate::stream::ReviewSort;
    use chrono::{TimeZone, Utc};
    use showroom_api::RawDocument;
    use serde_json::json;
    use std::time::Duration;

    fn review(id: &str, author: &str, minute: u32) -> RawDocument {
        RawDocument {
            id: id.into(),
            data: json!({
                "carId": "car-1",
                "userId": author,
                "userName": format!("{author}-at-submit"),
                "rating": 4,
                "comment": "fine",
                "createdAt": Utc
                    .with_ymd_and_hms(2024, 6, 1, 10, minute, 0)
                    .unwrap()
                    .to_rfc3339(),
            }),
        }
    }

    fn profile(id: &str, name: &str) -> RawDocument {
        RawDocument {
            id: id.into(),
            data: json!({ "displayName": name, "email": format!("{id}@example.com"), "role": "user" }),
        }
    }

    fn board_over(store: &Arc<CatalogStore>) -> ReviewBoard {
        let query = store
            .subscribe_reviews()
            .with_sort(ReviewSort::NewestFirst);
        let profiles: Arc<dyn ProfileSource> = store.clone();
        ReviewBoard::spawn(query, profiles, CancellationToken::new())
    }

    #[tokio::test]
    async fn empty_input_emits_empty_output_immediately() {
        let store = Arc::new(CatalogStore::new());
        store.sync_reviews(&[]);
        store.sync_profiles(&[]);

        let board = board_over(&store);
        assert!(board.current().is_empty());
        board.shutdown().await;
    }

    #[tokio::test]
    async fn resolves_every_author_in_input_order() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[profile("u1", "Alice"), profile("u2", "Bob")]);
        store.sync_reviews(&[review("r1", "u1", 1), review("r2", "u2", 0)]);

        let board = board_over(&store);
        let rows = board.current();

        assert_eq!(rows.len(), 2);
        // NewestFirst: r1 (minute 1) before r2 (minute 0)
        assert_eq!(rows[0].review.id.as_str(), "r1");
        assert_eq!(rows[0].display_name(), "Alice");
        assert_eq!(rows[1].display_name(), "Bob");
        board.shutdown().await;
    }

    #[tokio::test]
    async fn missing_profile_never_drops_the_review() {
        let store = Arc::new(CatalogStore::new());
        // u2 has no profile document; the collection IS synced, so the
        // lookup resolves to a confirmed Missing, not Pending.
        store.sync_profiles(&[profile("u1", "Alice")]);
        store.sync_reviews(&[review("r1", "u1", 1), review("r2", "u2", 0)]);

        let board = board_over(&store);
        let rows = board.current();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].author.is_present());
        assert!(matches!(rows[1].author, DocSlot::Missing));
        // The denormalized fallback name still renders.
        assert_eq!(rows[1].display_name(), "u2-at-submit");
        board.shutdown().await;
    }

    #[tokio::test]
    async fn profile_edit_reemits_only_that_row() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[profile("u1", "Alice"), profile("u2", "Bob")]);
        store.sync_reviews(&[review("r1", "u1", 1), review("r2", "u2", 0)]);

        let mut board = board_over(&store);
        let before = board.current();

        let updated = UserProfile {
            id: DocumentId::from("u1"),
            display_name: "Alice Cooper".into(),
            email: "u1@example.com".into(),
            role: Role::User,
        };
        store.upsert_profile(updated);

        let after = board.changed().await.unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].display_name(), "Alice Cooper");
        // The untouched row is the same allocation as before.
        assert!(Arc::ptr_eq(&before[1], &after[1]));
        assert!(!Arc::ptr_eq(&before[0], &after[0]));
        board.shutdown().await;
    }

    #[tokio::test]
    async fn structural_change_reemits_with_new_row() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[profile("u1", "Alice")]);
        store.sync_reviews(&[review("r1", "u1", 0)]);

        let mut board = board_over(&store);
        assert_eq!(board.current().len(), 1);

        let extra = Review {
            id: DocumentId::from("r9"),
            car_id: DocumentId::from("car-1"),
            author_id: DocumentId::from("u1"),
            author_name: "Alice".into(),
            rating: Rating::new(5).unwrap(),
            comment: "new".into(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        };
        store.upsert_review(extra);

        let rows = board.changed().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].review.id.as_str(), "r9");
        board.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_emitted_after_shutdown() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[profile("u1", "Alice")]);
        store.sync_reviews(&[review("r1", "u1", 0)]);

        let board = board_over(&store);
        let rx = board.watch();
        let before_len = rx.borrow().len();

        // Unmount before anything else happens: cancel and join the task.
        board.shutdown().await;

        store.sync_reviews(&[review("r1", "u1", 0), review("r2", "u1", 1)]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The join applied no state update after teardown.
        assert_eq!(rx.borrow().len(), before_len);
    }

    #[tokio::test]
    async fn resubscribing_stable_inputs_is_idempotent() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[profile("u1", "Alice")]);
        store.sync_reviews(&[review("r1", "u1", 1), review("r2", "u1", 0)]);

        let first = board_over(&store);
        let second = board_over(&store);

        let a = first.current();
        let b = second.current();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(**x, **y);
        }
        first.shutdown().await;
        second.shutdown().await;
    }

    #[tokio::test]
    async fn empty_input_holds_no_profile_subscriptions() {
        let store = Arc::new(CatalogStore::new());
        store.sync_reviews(&[]);
        store.sync_profiles(&[profile("u1", "Alice")]);

        let mut board = board_over(&store);
        assert!(board.current().is_empty());

        // A review arriving later still wakes the join (outer arm).
        let extra = Review {
            id: DocumentId::from("r1"),
            car_id: DocumentId::from("car-1"),
            author_id: DocumentId::from("u1"),
            author_name: "Alice".into(),
            rating: Rating::new(3).unwrap(),
            comment: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        };
        store.upsert_review(extra);

        let rows = board.changed().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name(), "Alice");
        board.shutdown().await;
    }
}
