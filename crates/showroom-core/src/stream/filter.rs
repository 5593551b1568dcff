// ── Filter predicates and sort keys for live queries ──
//
// Used by screens to project store snapshots without re-querying the
// backend. Mirrors the backend's query surface: one equality filter,
// one sort key.

use std::cmp::Ordering;

use crate::model::{Car, DocumentId, Review};

/// Filter predicate for car collections.
pub enum CarFilter {
    All,
    /// Only cars cleared for the public catalogue.
    Approved,
    ByOwner(DocumentId),
    Custom(Box<dyn Fn(&Car) -> bool + Send + Sync>),
}

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        match self {
            Self::All => true,
            Self::Approved => car.approved,
            Self::ByOwner(owner) => car.owner_id.as_ref() == Some(owner),
            Self::Custom(f) => f(car),
        }
    }
}

/// Sort key for car collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarSort {
    NewestFirst,
    NameAsc,
}

impl CarSort {
    pub fn compare(self, a: &Car, b: &Car) -> Ordering {
        match self {
            Self::NewestFirst => b.created_at.cmp(&a.created_at),
            Self::NameAsc => a.name.cmp(&b.name),
        }
    }
}

/// Filter predicate for review collections.
pub enum ReviewFilter {
    All,
    ByCar(DocumentId),
    ByAuthor(DocumentId),
    Custom(Box<dyn Fn(&Review) -> bool + Send + Sync>),
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        match self {
            Self::All => true,
            Self::ByCar(car_id) => review.car_id == *car_id,
            Self::ByAuthor(author_id) => review.author_id == *author_id,
            Self::Custom(f) => f(review),
        }
    }
}

/// Sort key for review collections.
///
/// The showcase screen orders by rating, the review screen by recency;
/// both orderings exist in the source system and are kept distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSort {
    RatingDesc,
    NewestFirst,
}

impl ReviewSort {
    pub fn compare(self, a: &Review, b: &Review) -> Ordering {
        match self {
            Self::RatingDesc => b.rating.cmp(&a.rating),
            Self::NewestFirst => b.created_at.cmp(&a.created_at),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Colour;
    use chrono::{TimeZone, Utc};

    fn car(name: &str, approved: bool, day: u32) -> Car {
        Car {
            id: DocumentId::from(name),
            name: name.to_owned(),
            manufacturer: "Acme".into(),
            year: 2024,
            colour: Colour::parse("#123456").unwrap(),
            model_file: None,
            owner_id: None,
            approved,
            created_at: Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn approved_filter() {
        assert!(CarFilter::Approved.matches(&car("a", true, 1)));
        assert!(!CarFilter::Approved.matches(&car("b", false, 1)));
        assert!(CarFilter::All.matches(&car("b", false, 1)));
    }

    #[test]
    fn car_sorts() {
        let older = car("zeta", true, 1);
        let newer = car("alpha", true, 2);
        assert_eq!(
            CarSort::NewestFirst.compare(&newer, &older),
            Ordering::Less
        );
        assert_eq!(CarSort::NameAsc.compare(&newer, &older), Ordering::Less);
    }
}
