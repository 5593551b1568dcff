// ── Backend connection configuration ──

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification mode for backend connections.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-hosted backends with self-signed certs).
    DangerAcceptInvalid,
}

impl TlsVerification {
    pub(crate) fn to_tls_mode(&self) -> showroom_api::TlsMode {
        match self {
            Self::System => showroom_api::TlsMode::System,
            Self::CustomCa(path) => showroom_api::TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => showroom_api::TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Optional credentials for signing in during `connect()`.
///
/// Screens can also sign in interactively later; these exist for
/// config-profile driven sessions (e.g. an admin's saved profile).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Configuration for a [`Showroom`](crate::Showroom) instance.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend base URL (e.g. `https://showcase.example.com`).
    pub url: Url,

    /// Sign in with these credentials during `connect()`, if present.
    pub credentials: Option<Credentials>,

    pub tls: TlsVerification,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Interval between periodic full refreshes. Zero disables them.
    pub refresh_interval: Duration,

    /// Whether to open the live change feed after the initial fetch.
    pub feed_enabled: bool,
}

impl BackendConfig {
    /// A config with sensible defaults for the given backend URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::System,
            timeout: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(60),
            feed_enabled: true,
        }
    }
}
