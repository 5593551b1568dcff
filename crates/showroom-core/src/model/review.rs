// ── Star-rated review ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use showroom_api::RawDocument;

use crate::error::CoreError;
use crate::model::collections;
use crate::model::DocumentId;

/// A star rating, always in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, String> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("rating {value} outside 1..=5"))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

/// A user's review of a car.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: DocumentId,
    pub car_id: DocumentId,
    pub author_id: DocumentId,
    /// Denormalized display name captured at submission time; the live
    /// author profile is joined in separately (see `ReviewBoard`).
    pub author_name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Wire form of a review document.
///
/// One of the source screens historically wrote the timestamp as
/// `createdAT`; the alias accepts such documents on read. Writes always
/// emit the canonical `createdAt`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewDoc {
    car_id: String,
    user_id: String,
    #[serde(default)]
    user_name: Option<String>,
    rating: u8,
    comment: String,
    #[serde(default, alias = "createdAT")]
    created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Validate a raw store document into a typed review.
    pub fn from_document(doc: &RawDocument) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidDocument {
            collection: collections::REVIEWS.into(),
            id: doc.id.clone(),
            reason,
        };

        let wire: ReviewDoc =
            serde_json::from_value(doc.data.clone()).map_err(|e| invalid(e.to_string()))?;

        let rating = Rating::new(wire.rating).map_err(invalid)?;
        if wire.car_id.is_empty() {
            return Err(invalid("carId is empty".into()));
        }
        if wire.user_id.is_empty() {
            return Err(invalid("userId is empty".into()));
        }

        Ok(Self {
            id: DocumentId::from(doc.id.clone()),
            car_id: DocumentId::from(wire.car_id),
            author_id: DocumentId::from(wire.user_id),
            author_name: wire.user_name.unwrap_or_else(|| "Anonymous".into()),
            rating,
            comment: wire.comment,
            created_at: wire.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        })
    }

    /// Render the canonical wire body for a full-document overwrite.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::to_value(ReviewDoc {
            car_id: self.car_id.as_str().to_owned(),
            user_id: self.author_id.as_str().to_owned(),
            user_name: Some(self.author_name.clone()),
            rating: self.rating.value(),
            comment: self.comment.clone(),
            created_at: Some(self.created_at),
        })
        .expect("review body serialization cannot fail")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: &str, data: serde_json::Value) -> RawDocument {
        RawDocument {
            id: id.into(),
            data,
        }
    }

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(5).unwrap().value(), 5);
    }

    #[test]
    fn review_from_document() {
        let doc = raw(
            "r1",
            json!({
                "carId": "car-1",
                "userId": "u1",
                "userName": "Alice",
                "rating": 4,
                "comment": "Great handling",
                "createdAt": "2024-06-01T08:00:00Z"
            }),
        );

        let review = Review::from_document(&doc).unwrap();
        assert_eq!(review.author_name, "Alice");
        assert_eq!(review.rating.value(), 4);
    }

    #[test]
    fn review_accepts_legacy_timestamp_key() {
        // `createdAT` (capital T) appears in documents written by one of
        // the source screens.
        let doc = raw(
            "r2",
            json!({
                "carId": "car-1",
                "userId": "u2",
                "rating": 5,
                "comment": "!!",
                "createdAT": "2024-06-02T09:30:00Z"
            }),
        );

        let review = Review::from_document(&doc).unwrap();
        assert_eq!(
            review.created_at,
            "2024-06-02T09:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn review_writes_canonical_timestamp_key() {
        let doc = raw(
            "r3",
            json!({ "carId": "c", "userId": "u", "rating": 3, "comment": "ok",
                    "createdAT": "2024-01-01T00:00:00Z" }),
        );
        let review = Review::from_document(&doc).unwrap();

        let body = review.to_body();
        assert!(body.get("createdAt").is_some());
        assert!(body.get("createdAT").is_none());
    }

    #[test]
    fn review_out_of_range_rating_is_invalid() {
        let doc = raw(
            "r4",
            json!({ "carId": "c", "userId": "u", "rating": 9, "comment": "" }),
        );
        assert!(matches!(
            Review::from_document(&doc),
            Err(CoreError::InvalidDocument { .. })
        ));
    }
}
