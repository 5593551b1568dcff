// ── Reactive live queries ──
//
// Subscription types for consuming collection changes from the
// CatalogStore, with optional client-side filter/sort views. The backend's
// query surface (one equality filter, one sort key) is mirrored here so a
// screen can hold a projected view of the same underlying watch channel.

mod filter;

use std::cmp::Ordering;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub use filter::{CarFilter, CarSort, ReviewFilter, ReviewSort};

use crate::model::{Car, Review};

type FilterFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type SortFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A live subscription to a collection of documents.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via `changed()` or by converting to a `Stream`. When a
/// filter or sort view is attached, every snapshot observed through this
/// handle is projected accordingly.
pub struct LiveQuery<T: Clone + Send + Sync + 'static> {
    current: Arc<Vec<Arc<T>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<T>>>>,
    filter: Option<FilterFn<T>>,
    sort: Option<SortFn<T>>,
}

impl<T: Clone + Send + Sync + 'static> LiveQuery<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<T>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self {
            current,
            receiver,
            filter: None,
            sort: None,
        }
    }

    /// Get the snapshot captured at creation time (or the last `changed()`).
    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Arc<T>>> {
        project(&self.receiver.borrow().clone(), self.filter.as_ref(), self.sort.as_ref())
    }

    /// Wait for the next change, returning the new (projected) snapshot.
    /// Returns `None` if the sender (store) has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = project(&snap, self.filter.as_ref(), self.sort.as_ref());
        Some(self.current.clone())
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> LiveQueryStream<T> {
        LiveQueryStream {
            inner: WatchStream::new(self.receiver),
            filter: self.filter,
            sort: self.sort,
        }
    }

    fn attach(mut self, filter: Option<FilterFn<T>>, sort: Option<SortFn<T>>) -> Self {
        if filter.is_some() {
            self.filter = filter;
        }
        if sort.is_some() {
            self.sort = sort;
        }
        self.current = project(
            &self.receiver.borrow().clone(),
            self.filter.as_ref(),
            self.sort.as_ref(),
        );
        self
    }
}

impl LiveQuery<Review> {
    /// Restrict the view to reviews matching `filter`.
    pub fn with_filter(self, filter: ReviewFilter) -> Self {
        let f: FilterFn<Review> = Arc::new(move |r| filter.matches(r));
        self.attach(Some(f), None)
    }

    /// Order the view by `sort` (stable; ties keep store order).
    pub fn with_sort(self, sort: ReviewSort) -> Self {
        let s: SortFn<Review> = Arc::new(move |a, b| sort.compare(a, b));
        self.attach(None, Some(s))
    }
}

impl LiveQuery<Car> {
    /// Restrict the view to cars matching `filter`.
    pub fn with_filter(self, filter: CarFilter) -> Self {
        let f: FilterFn<Car> = Arc::new(move |c| filter.matches(c));
        self.attach(Some(f), None)
    }

    /// Order the view by `sort` (stable; ties keep store order).
    pub fn with_sort(self, sort: CarSort) -> Self {
        let s: SortFn<Car> = Arc::new(move |a, b| sort.compare(a, b));
        self.attach(None, Some(s))
    }
}

/// Apply the optional filter + sort to a raw snapshot.
fn project<T>(
    snap: &Arc<Vec<Arc<T>>>,
    filter: Option<&FilterFn<T>>,
    sort: Option<&SortFn<T>>,
) -> Arc<Vec<Arc<T>>> {
    if filter.is_none() && sort.is_none() {
        return Arc::clone(snap);
    }

    let mut out: Vec<Arc<T>> = match filter {
        Some(f) => snap.iter().filter(|doc| f(doc)).cloned().collect(),
        None => snap.iter().cloned().collect(),
    };
    if let Some(cmp) = sort {
        out.sort_by(|a, b| cmp(a, b));
    }
    Arc::new(out)
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new projected snapshot each time the underlying collection
/// is mutated.
pub struct LiveQueryStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<Arc<Vec<Arc<T>>>>,
    filter: Option<FilterFn<T>>,
    sort: Option<SortFn<T>>,
}

impl<T: Clone + Send + Sync + 'static> Stream for LiveQueryStream<T> {
    type Item = Arc<Vec<Arc<T>>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream is Unpin; Arc<Vec<Arc<T>>> is always Unpin.
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(snap)) => {
                Poll::Ready(Some(project(&snap, this.filter.as_ref(), this.sort.as_ref())))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DocumentId, Rating};
    use chrono::{TimeZone, Utc};

    fn review(id: &str, car: &str, rating: u8, minute: u32) -> Review {
        Review {
            id: DocumentId::from(id),
            car_id: DocumentId::from(car),
            author_id: DocumentId::from("u1"),
            author_name: "A".into(),
            rating: Rating::new(rating).unwrap(),
            comment: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, minute, 0).unwrap(),
        }
    }

    fn snapshot(reviews: Vec<Review>) -> watch::Sender<Arc<Vec<Arc<Review>>>> {
        let (tx, _) = watch::channel(Arc::new(reviews.into_iter().map(Arc::new).collect()));
        tx
    }

    #[test]
    fn unfiltered_query_shares_snapshot() {
        let tx = snapshot(vec![review("r1", "c1", 4, 0)]);
        let query = LiveQuery::new(tx.subscribe());
        assert_eq!(query.current().len(), 1);
    }

    #[test]
    fn filter_and_sort_project_the_view() {
        let tx = snapshot(vec![
            review("r1", "c1", 3, 0),
            review("r2", "c2", 5, 1),
            review("r3", "c1", 5, 2),
        ]);

        let query = LiveQuery::new(tx.subscribe())
            .with_filter(ReviewFilter::ByCar(DocumentId::from("c1")))
            .with_sort(ReviewSort::RatingDesc);

        let view = query.current();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].id.as_str(), "r3");
        assert_eq!(view[1].id.as_str(), "r1");
    }

    #[tokio::test]
    async fn changed_applies_projection() {
        let tx = snapshot(vec![]);
        let mut query = LiveQuery::new(tx.subscribe()).with_sort(ReviewSort::NewestFirst);
        assert!(query.current().is_empty());

        tx.send_replace(Arc::new(vec![
            Arc::new(review("r1", "c1", 4, 0)),
            Arc::new(review("r2", "c1", 2, 5)),
        ]));

        let snap = query.changed().await.unwrap();
        assert_eq!(snap[0].id.as_str(), "r2"); // newest first
    }
}
