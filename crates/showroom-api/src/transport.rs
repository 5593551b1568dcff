// Shared transport configuration for building reqwest::Client instances.
//
// Store, auth, and storage clients all share TLS and timeout settings
// through this module, plus a common bearer-token slot so a sign-in
// performed by the AuthClient is visible to every other surface.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-hosted backends with self-signed certs).
    DangerAcceptInvalid,
}

/// Shared session-token slot.
///
/// The auth client installs a token here after sign-in; the store and
/// storage clients read it per request. Cheaply cloneable.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<SecretString>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a session token (replacing any previous one).
    pub fn set(&self, token: SecretString) {
        *self.inner.write().expect("token lock poisoned") = Some(token);
    }

    /// Remove the current token (sign-out).
    pub fn clear(&self) {
        *self.inner.write().expect("token lock poisoned") = None;
    }

    /// Whether a token is currently installed.
    pub fn is_set(&self) -> bool {
        self.inner.read().expect("token lock poisoned").is_some()
    }

    /// Render the `Authorization` header value, if a token is installed.
    pub(crate) fn bearer_header(&self) -> Option<String> {
        self.inner
            .read()
            .expect("token lock poisoned")
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }

    /// The current token, if any (still wrapped in `SecretString`).
    pub fn current(&self) -> Option<SecretString> {
        self.inner.read().expect("token lock poisoned").clone()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("showroom/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path).map_err(|e| {
                    crate::error::Error::Tls(format!("failed to read CA cert: {e}"))
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| crate::error::Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn token_store_roundtrip() {
        let tokens = TokenStore::new();
        assert!(!tokens.is_set());
        assert!(tokens.bearer_header().is_none());

        tokens.set(SecretString::from("abc123".to_owned()));
        assert!(tokens.is_set());
        assert_eq!(tokens.bearer_header().unwrap(), "Bearer abc123");

        tokens.clear();
        assert!(!tokens.is_set());
    }

    #[test]
    fn token_store_debug_hides_secret() {
        let tokens = TokenStore::new();
        tokens.set(SecretString::from("hunter2".to_owned()));
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
