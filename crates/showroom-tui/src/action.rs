//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use showroom_core::{
    Car, Command, DocumentId, Identity, Review, ReviewWithAuthor, UserProfile,
};

use crate::screen::ScreenId;

/// Severity of a notification toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message surfaced to the user (the TUI's alert dialog).
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// A destructive operation awaiting a y/n confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmAction {
    pub message: String,
    pub command: Command,
}

/// Everything that can happen in the UI.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Data updates (from the data bridge and per-screen boards) ────
    CarsUpdated(Arc<Vec<Arc<Car>>>),
    ReviewsUpdated(Arc<Vec<Arc<Review>>>),
    ProfilesUpdated(Arc<Vec<Arc<UserProfile>>>),
    /// A review/author board snapshot for the screen that owns it.
    BoardUpdated {
        owner: ScreenId,
        rows: Arc<Vec<Arc<ReviewWithAuthor>>>,
    },
    IdentityChanged(Identity),

    // ── Connection state ─────────────────────────────────────────────
    Connected,
    Reconnecting,
    Disconnected(String),

    // ── Model asset loading (showcase screen) ────────────────────────
    ModelProgress {
        car_id: DocumentId,
        loaded: u64,
        total: Option<u64>,
    },
    ModelLoaded {
        car_id: DocumentId,
        bytes: u64,
    },
    ModelFailed {
        car_id: DocumentId,
        error: String,
    },
    /// A model upload finished; its blob path is ready for the car form.
    ModelPathReady {
        path: String,
    },

    // ── Navigation ───────────────────────────────────────────────────
    Navigate(ScreenId),
    GoBack,
    SelectCar(DocumentId),

    // ── Operations ───────────────────────────────────────────────────
    /// Dispatch a write command; the app runs it and notifies on result.
    Submit(Command),
    /// Ask for y/n confirmation before running a destructive command.
    Confirm(ConfirmAction),
    /// Sign the current session out.
    Logout,

    // ── Feedback ─────────────────────────────────────────────────────
    Notify(Notification),

    // ── App control ──────────────────────────────────────────────────
    Quit,
}
