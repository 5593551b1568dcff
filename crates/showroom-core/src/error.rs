// ── Core error types ──
//
// User-facing errors from showroom-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<showroom_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not signed in -- this operation requires a session")]
    NotSignedIn,

    #[error("Not connected -- call connect() first")]
    NotConnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Invalid {collection} document {id}: {reason}")]
    InvalidDocument {
        collection: String,
        id: String,
        reason: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Backend error: {message}")]
    Api {
        message: String,
        /// Backend error code (e.g. "store/invalid-document").
        code: Option<String>,
        /// HTTP status code, if applicable.
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<showroom_api::Error> for CoreError {
    fn from(err: showroom_api::Error) -> Self {
        match err {
            showroom_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            showroom_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- sign in again".into(),
            },
            showroom_api::Error::Transport(ref e) => {
                if e.is_connect() || e.is_timeout() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        entity: "resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            showroom_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            showroom_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            showroom_api::Error::Store {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            showroom_api::Error::DocumentNotFound { collection, id } => CoreError::NotFound {
                entity: collection,
                identifier: id,
            },
            showroom_api::Error::Storage { message } => CoreError::OperationFailed { message },
            showroom_api::Error::FeedConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("change feed connection failed: {reason}"),
            },
            showroom_api::Error::FeedClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("change feed closed (code {code}): {reason}"),
            },
            showroom_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
