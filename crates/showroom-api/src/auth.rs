// Auth provider client
//
// Email/password sign-in, account creation, and sign-out against the
// backend's auth endpoints. A successful sign-in installs the session
// token into the shared TokenStore so the store and storage clients
// pick it up automatically.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{TokenStore, TransportConfig};

/// The identity the auth provider knows about: not the store-side profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A live session: the authenticated user plus their bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: SecretString,
}

#[derive(Deserialize)]
struct SessionResponse {
    user: AuthUser,
    token: String,
}

#[derive(Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the backend's auth endpoints.
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

impl AuthClient {
    pub fn new(base_url: Url, transport: &TransportConfig, tokens: TokenStore) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Create an auth client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, tokens: TokenStore) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    fn auth_url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1/auth/{path}")).expect("invalid auth URL")
    }

    /// Sign in with email and password.
    ///
    /// On success the session token is installed into the shared
    /// `TokenStore` and used by all subsequent store/storage requests.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthSession, Error> {
        let url = self.auth_url("sign-in");
        debug!("signing in at {url}");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let session = self.session_request(url, &body).await?;
        debug!(uid = %session.user.uid, "sign-in successful");
        Ok(session)
    }

    /// Create a new account.
    ///
    /// The backend creates the auth identity only; seeding the store-side
    /// profile document (display name, role) is the caller's job.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        display_name: &str,
    ) -> Result<AuthSession, Error> {
        let url = self.auth_url("sign-up");
        debug!("signing up at {url}");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
            "displayName": display_name,
        });

        let session = self.session_request(url, &body).await?;
        debug!(uid = %session.user.uid, "sign-up successful");
        Ok(session)
    }

    /// End the current session.
    ///
    /// The token is cleared locally even if the backend call fails --
    /// a dead session on the server is harmless, a stale local token is not.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let url = self.auth_url("sign-out");
        debug!("signing out at {url}");

        let result = match self.tokens.bearer_header() {
            Some(header) => self
                .http
                .post(url)
                .header(reqwest::header::AUTHORIZATION, header)
                .send()
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        self.tokens.clear();
        result.map_err(Error::Transport)
    }

    async fn session_request(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<AuthSession, Error> {
        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AuthErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(Error::Authentication { message });
        }

        let text = resp.text().await?;
        let parsed: SessionResponse = serde_json::from_str(&text).map_err(|e| {
            let preview = &text[..text.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: text.clone(),
            }
        })?;

        let token = SecretString::from(parsed.token);
        self.tokens.set(token.clone());
        Ok(AuthSession {
            user: parsed.user,
            token,
        })
    }
}
