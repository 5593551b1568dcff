//! Validated domain types.
//!
//! Everything in here is produced from the store's schemaless documents at
//! the adapter boundary: `from_document` parses and validates, `to_body`
//! renders the canonical wire form for a full-document overwrite. Dynamic
//! `serde_json::Value` payloads never travel past this module.

mod car;
mod ids;
mod review;
mod user;

pub use car::{Car, Colour};
pub use ids::DocumentId;
pub use review::{Rating, Review};
pub use user::{Role, UserProfile};

/// The auth provider's view of an identity (distinct from [`UserProfile`],
/// which lives in the document store).
pub use showroom_api::AuthUser;

/// Store collection names.
pub mod collections {
    pub const CARS: &str = "cars";
    pub const REVIEWS: &str = "reviews";
    pub const PROFILES: &str = "profiles";
}
