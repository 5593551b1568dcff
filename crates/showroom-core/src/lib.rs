//! Reactive data layer between `showroom-api` and UI consumers.
//!
//! This crate owns the business logic, domain model, and reactive data
//! infrastructure for the showroom workspace:
//!
//! - **[`Showroom`]** — Central facade managing the full lifecycle:
//!   [`connect()`](Showroom::connect) fetches an initial catalogue snapshot,
//!   then spawns background tasks for the live change feed, periodic
//!   refresh, and command processing. Sign-in/sign-up/sign-out flow through
//!   it as well.
//!
//! - **[`CatalogStore`]** — Reactive storage built on
//!   `DocumentCollection<T>` (`DashMap` + `tokio::sync::watch` channels),
//!   holding validated cars, reviews, and user profiles.
//!
//! - **[`LiveQuery<T>`]** — Subscription handle vended by the store.
//!   Exposes `current()` / `latest()` / `changed()` plus client-side
//!   filter/sort views for screen rendering.
//!
//! - **[`ReviewBoard`]** — The review/author join: a live review query
//!   fanned out over per-author profile subscriptions and fanned back in
//!   as one combined stream. A failed profile lookup never drops a review;
//!   it surfaces as [`DocSlot::Missing`].
//!
//! - **[`Command`]** — Typed mutation requests routed through an `mpsc`
//!   channel to the facade's command processor. Reads bypass the channel
//!   via store snapshots.
//!
//! - **Domain model** ([`model`]) — Validated types (`Car`, `Review`,
//!   `UserProfile`, …) produced from the store's schemaless documents at
//!   the adapter boundary; malformed documents are skipped, never crash a
//!   sync.

pub mod command;
pub mod config;
pub mod error;
pub mod identity;
pub mod join;
pub mod model;
pub mod showroom;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{BackendConfig, Credentials, TlsVerification};
pub use error::CoreError;
pub use identity::{Identity, IdentityStream};
pub use join::{ProfileSource, ReviewBoard, ReviewWithAuthor};
pub use showroom::{ConnectionState, Showroom};
pub use store::{CatalogStore, DocSlot};
pub use stream::{CarFilter, CarSort, LiveQuery, ReviewFilter, ReviewSort};

// Re-export model types at the crate root for ergonomics.
pub use model::{AuthUser, Car, Colour, DocumentId, Rating, Review, Role, UserProfile};
