use thiserror::Error;

/// Top-level error type for the `showroom-api` crate.
///
/// Covers every failure mode across all backend surfaces: authentication,
/// transport, document store, blob storage, and the change feed.
/// `showroom-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in or sign-up was rejected (wrong credentials, email in use, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session token has expired or been revoked.
    #[error("Session expired -- sign in again")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Document store ──────────────────────────────────────────────
    /// Structured error from the document store envelope.
    #[error("Store error (HTTP {status}): {message}")]
    Store {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// The requested document does not exist.
    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    // ── Blob storage ────────────────────────────────────────────────
    /// Blob upload or retrieval failed.
    #[error("Storage error: {message}")]
    Storage { message: String },

    // ── Change feed ─────────────────────────────────────────────────
    /// Change feed connection failed.
    #[error("Change feed connection failed: {0}")]
    FeedConnect(String),

    /// Change feed closed unexpectedly.
    #[error("Change feed closed (code {code}): {reason}")]
    FeedClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error (connection-level,
    /// not a rejection of the request itself).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::FeedConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Store { status: 404, .. } | Self::DocumentNotFound { .. } => true,
            _ => false,
        }
    }
}
