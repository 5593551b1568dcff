// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The facade
// routes each variant to the appropriate backend surface (document store
// or blob storage). Reads bypass the channel via store snapshots.
//
// Writes are full-document overwrites with last-writer-wins semantics;
// nothing is retried automatically.

pub mod requests;

use crate::error::CoreError;
use crate::model::{Car, DocumentId, Review, UserProfile};

pub use requests::{SaveCarRequest, SaveProfileRequest, SubmitReviewRequest, UploadModelRequest};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All possible write operations against the backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Car operations ───────────────────────────────────────────────
    /// Create (no id) or fully overwrite (id) a car.
    SaveCar {
        id: Option<DocumentId>,
        request: SaveCarRequest,
    },
    /// Clear a car for the public catalogue.
    ApproveCar {
        id: DocumentId,
    },
    DeleteCar {
        id: DocumentId,
    },

    // ── Review operations ────────────────────────────────────────────
    /// Submit a review as the signed-in user. The author id, denormalized
    /// display name, and timestamp are stamped by the processor.
    SubmitReview(SubmitReviewRequest),
    DeleteReview {
        id: DocumentId,
    },

    // ── Profile operations ───────────────────────────────────────────
    /// Create or fully overwrite a user profile (admin editing; also used
    /// by sign-up to seed the default `user` role).
    SaveProfile {
        id: DocumentId,
        request: SaveProfileRequest,
    },
    DeleteUser {
        id: DocumentId,
    },

    // ── Blob operations ──────────────────────────────────────────────
    /// Upload a 3D model file, returning its blob path and public URL.
    UploadModel(UploadModelRequest),
}

impl Command {
    /// Pre-submission validation: an invalid command never reaches the
    /// network.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SaveCar { request, .. } => request.validate(),
            Self::SubmitReview(request) => request.validate(),
            Self::SaveProfile { request, .. } => request.validate(),
            Self::UploadModel(request) => request.validate(),
            Self::ApproveCar { .. }
            | Self::DeleteCar { .. }
            | Self::DeleteReview { .. }
            | Self::DeleteUser { .. } => Ok(()),
        }
    }
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    Car(Car),
    Review(Review),
    Profile(UserProfile),
    ModelUploaded { path: String, url: String },
}
