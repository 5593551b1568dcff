// ── Central reactive catalogue store ──
//
// Thread-safe storage for all showcase entities. Mutations are broadcast
// to subscribers via `watch` channels. Raw documents are validated here,
// at the adapter boundary: a malformed document is logged and skipped,
// never allowed to poison a sync.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use showroom_api::{ChangeEvent, ChangeOp, RawDocument};

use super::collection::{DocSlot, DocumentCollection};
use crate::model::{collections, Car, Review, UserProfile};
use crate::stream::LiveQuery;

/// Reactive store for cars, reviews, and user profiles.
pub struct CatalogStore {
    pub(crate) cars: DocumentCollection<Car>,
    pub(crate) reviews: DocumentCollection<Review>,
    pub(crate) profiles: DocumentCollection<UserProfile>,
    last_full_sync: watch::Sender<Option<DateTime<Utc>>>,
    last_feed_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        let (last_full_sync, _) = watch::channel(None);
        let (last_feed_event, _) = watch::channel(None);

        Self {
            cars: DocumentCollection::new(),
            reviews: DocumentCollection::new(),
            profiles: DocumentCollection::new(),
            last_full_sync,
            last_feed_event,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn cars_snapshot(&self) -> Arc<Vec<Arc<Car>>> {
        self.cars.snapshot()
    }

    pub fn reviews_snapshot(&self) -> Arc<Vec<Arc<Review>>> {
        self.reviews.snapshot()
    }

    pub fn profiles_snapshot(&self) -> Arc<Vec<Arc<UserProfile>>> {
        self.profiles.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn car(&self, id: &str) -> Option<Arc<Car>> {
        self.cars.get(id)
    }

    pub fn review(&self, id: &str) -> Option<Arc<Review>> {
        self.reviews.get(id)
    }

    pub fn profile(&self, id: &str) -> Option<Arc<UserProfile>> {
        self.profiles.get(id)
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_cars(&self) -> LiveQuery<Car> {
        LiveQuery::new(self.cars.subscribe())
    }

    pub fn subscribe_reviews(&self) -> LiveQuery<Review> {
        LiveQuery::new(self.reviews.subscribe())
    }

    pub fn subscribe_profiles(&self) -> LiveQuery<UserProfile> {
        LiveQuery::new(self.profiles.subscribe())
    }

    /// Live state of one profile document (the join's per-author input).
    pub fn subscribe_profile_doc(&self, id: &str) -> watch::Receiver<DocSlot<UserProfile>> {
        self.profiles.subscribe_doc(id)
    }

    // ── Sync application ─────────────────────────────────────────────

    /// Replace the car collection from a full fetch.
    pub fn sync_cars(&self, docs: &[RawDocument]) {
        self.cars.replace_all(validate_batch(docs, Car::from_document));
    }

    /// Replace the review collection from a full fetch.
    pub fn sync_reviews(&self, docs: &[RawDocument]) {
        self.reviews
            .replace_all(validate_batch(docs, Review::from_document));
    }

    /// Replace the profile collection from a full fetch.
    pub fn sync_profiles(&self, docs: &[RawDocument]) {
        self.profiles
            .replace_all(validate_batch(docs, UserProfile::from_document));
    }

    /// Stamp the completion of a full refresh.
    pub fn mark_full_sync(&self) {
        self.last_full_sync.send_replace(Some(Utc::now()));
    }

    /// Apply one live change-feed event.
    pub fn apply_change(&self, event: &ChangeEvent) {
        match event.op {
            ChangeOp::Upsert => {
                let Some(ref doc) = event.doc else {
                    warn!(id = %event.id, collection = %event.collection, "upsert event without document");
                    return;
                };
                let raw = RawDocument {
                    id: event.id.clone(),
                    data: doc.clone(),
                };
                match event.collection.as_str() {
                    collections::CARS => self.apply_upsert(&raw, &self.cars, Car::from_document),
                    collections::REVIEWS => {
                        self.apply_upsert(&raw, &self.reviews, Review::from_document);
                    }
                    collections::PROFILES => {
                        self.apply_upsert(&raw, &self.profiles, UserProfile::from_document);
                    }
                    other => warn!(collection = other, "change event for unknown collection"),
                }
            }
            ChangeOp::Delete => match event.collection.as_str() {
                collections::CARS => {
                    self.cars.remove(&event.id);
                }
                collections::REVIEWS => {
                    self.reviews.remove(&event.id);
                }
                collections::PROFILES => {
                    self.profiles.remove(&event.id);
                }
                other => warn!(collection = other, "delete event for unknown collection"),
            },
        }
        self.last_feed_event.send_replace(Some(Utc::now()));
    }

    // ── Direct upserts (post-write application by the command processor) ──

    pub fn upsert_car(&self, car: Car) {
        self.cars.upsert(car.id.as_str().to_owned(), car);
    }

    pub fn remove_car(&self, id: &str) {
        self.cars.remove(id);
    }

    pub fn upsert_review(&self, review: Review) {
        self.reviews.upsert(review.id.as_str().to_owned(), review);
    }

    pub fn remove_review(&self, id: &str) {
        self.reviews.remove(id);
    }

    pub fn upsert_profile(&self, profile: UserProfile) {
        self.profiles.upsert(profile.id.as_str().to_owned(), profile);
    }

    pub fn remove_profile(&self, id: &str) {
        self.profiles.remove(id);
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_full_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_full_sync.borrow()
    }

    pub fn last_feed_event(&self) -> Option<DateTime<Utc>> {
        *self.last_feed_event.borrow()
    }

    /// How long ago the last full refresh occurred, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_full_sync().map(|t| Utc::now() - t)
    }

    fn apply_upsert<T: Clone + Send + Sync + 'static>(
        &self,
        raw: &RawDocument,
        collection: &DocumentCollection<T>,
        parse: impl Fn(&RawDocument) -> Result<T, crate::CoreError>,
    ) {
        match parse(raw) {
            Ok(doc) => {
                collection.upsert(raw.id.clone(), doc);
            }
            Err(e) => warn!(id = %raw.id, error = %e, "skipping invalid document from feed"),
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a fetched batch, skipping (and logging) malformed documents.
fn validate_batch<T>(
    docs: &[RawDocument],
    parse: impl Fn(&RawDocument) -> Result<T, crate::CoreError>,
) -> Vec<(String, T)> {
    docs.iter()
        .filter_map(|raw| match parse(raw) {
            Ok(doc) => Some((raw.id.clone(), doc)),
            Err(e) => {
                warn!(id = %raw.id, error = %e, "skipping invalid document from sync");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn car_doc(id: &str, name: &str) -> RawDocument {
        RawDocument {
            id: id.into(),
            data: json!({
                "name": name,
                "manufacturer": "Acme",
                "year": 2024,
                "colour": "#112233",
                "approved": true
            }),
        }
    }

    #[test]
    fn sync_skips_invalid_documents() {
        let store = CatalogStore::new();
        let good = car_doc("c1", "Roadster");
        let bad = RawDocument {
            id: "c2".into(),
            data: json!({ "name": "NoYear" }),
        };

        store.sync_cars(&[good, bad]);
        assert_eq!(store.car_count(), 1);
        assert!(store.car("c1").is_some());
        assert!(store.car("c2").is_none());
    }

    #[test]
    fn apply_change_upsert_and_delete() {
        let store = CatalogStore::new();
        store.sync_cars(&[]);

        let upsert = ChangeEvent {
            collection: "cars".into(),
            op: ChangeOp::Upsert,
            id: "c1".into(),
            doc: Some(car_doc("c1", "Spyder").data),
        };
        store.apply_change(&upsert);
        assert_eq!(store.car_count(), 1);
        assert!(store.last_feed_event().is_some());

        let delete = ChangeEvent {
            collection: "cars".into(),
            op: ChangeOp::Delete,
            id: "c1".into(),
            doc: None,
        };
        store.apply_change(&delete);
        assert_eq!(store.car_count(), 0);
    }

    #[test]
    fn invalid_feed_document_is_skipped() {
        let store = CatalogStore::new();
        let event = ChangeEvent {
            collection: "profiles".into(),
            op: ChangeOp::Upsert,
            id: "u1".into(),
            doc: Some(json!({ "displayName": "Eve", "email": "e@x", "role": "root" })),
        };
        store.apply_change(&event);
        assert_eq!(store.profile_count(), 0);
    }
}
