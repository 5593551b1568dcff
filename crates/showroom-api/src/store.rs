// Document store HTTP client
//
// Wraps `reqwest::Client` with collection-scoped URL construction and
// envelope unwrapping. Every response carries a `{ data, error }` envelope;
// callers only ever see the unwrapped `data` payload.
//
// Writes are full-document overwrites: the backend applies last-writer-wins
// with no compare-and-swap, so concurrent edits to the same document race.

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{TokenStore, TransportConfig};

/// A `(record, identifier)` pair as returned by the document store.
///
/// `data` is the raw schemaless payload; typed validation happens in
/// `showroom-core` at the adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub data: serde_json::Value,
}

/// Sort direction for a query's order-by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn as_param(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A collection query: at most one field-equality filter and one sort key.
///
/// Mirrors what the backend's live-query surface supports; anything richer
/// is client-side.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    filter: Option<(String, String)>,
    order_by: Option<(String, SortDirection)>,
    limit: Option<u32>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on `field == value` (string equality on the wire).
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    /// Sort by the given field.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Render into URL query pairs.
    fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some((field, value)) = &self.filter {
            pairs.append_pair("filter_field", field);
            pairs.append_pair("filter_value", value);
        }
        if let Some((field, direction)) = &self.order_by {
            pairs.append_pair("order_by", field);
            pairs.append_pair("direction", direction.as_param());
        }
        if let Some(n) = self.limit {
            pairs.append_pair("limit", &n.to_string());
        }
    }
}

/// Response envelope: `{ "data": ..., "error": { "code", "message" } }`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<EnvelopeError>,
}

#[derive(Deserialize)]
struct EnvelopeError {
    code: Option<String>,
    message: Option<String>,
}

/// HTTP client for the backend's document collections.
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

impl StoreClient {
    /// Create a new store client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig, tokens: TokenStore) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Create a store client with a pre-built `reqwest::Client`.
    ///
    /// Use this in tests or when sharing a client across surfaces.
    pub fn with_client(http: reqwest::Client, base_url: Url, tokens: TokenStore) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/v1/collections/{collection}/documents`
    pub(crate) fn collection_url(&self, collection: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/v1/collections/{collection}/documents");
        Url::parse(&full).expect("invalid collection URL")
    }

    /// `{base}/v1/collections/{collection}/documents/{id}`
    pub(crate) fn document_url(&self, collection: &str, id: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/v1/collections/{collection}/documents/{id}");
        Url::parse(&full).expect("invalid document URL")
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch a single document. Returns `Ok(None)` if it does not exist.
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>, Error> {
        let url = self.document_url(collection, id);
        debug!("GET {url}");

        let resp = self.authed(self.http.get(url)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: RawDocument = self.parse_envelope(resp).await?;
        Ok(Some(doc))
    }

    /// List documents in a collection, optionally filtered and sorted.
    pub async fn list(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<RawDocument>, Error> {
        let mut url = self.collection_url(collection);
        query.apply(&mut url);
        debug!("GET {url}");

        let resp = self.authed(self.http.get(url)).send().await?;
        self.parse_envelope(resp).await
    }

    /// Create or fully overwrite a document (last-writer-wins).
    pub async fn put(
        &self,
        collection: &str,
        id: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<RawDocument, Error> {
        let url = self.document_url(collection, id);
        debug!("PUT {url}");

        let resp = self.authed(self.http.put(url).json(body)).send().await?;
        self.parse_envelope(resp).await
    }

    /// Delete a document. Deleting an already-absent document is not an error.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        let url = self.document_url(collection, id);
        debug!("DELETE {url}");

        let resp = self.authed(self.http.delete(url)).send().await?;
        let status = resp.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        // Error path: reuse envelope parsing for the message.
        let _: serde_json::Value = self.parse_envelope(resp).await?;
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Attach the session token, if one is installed.
    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.bearer_header() {
            Some(value) => builder.header(reqwest::header::AUTHORIZATION, value),
            None => builder,
        }
    }

    /// Parse the `{ data, error }` envelope, returning `data` on success.
    async fn parse_envelope<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        let body = resp.text().await?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        if let Some(err) = envelope.error {
            return Err(Error::Store {
                message: err.message.unwrap_or_else(|| format!("HTTP {status}")),
                code: err.code,
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(Error::Store {
                message: format!("HTTP {status}"),
                code: None,
                status: status.as_u16(),
            });
        }

        envelope.data.ok_or_else(|| Error::Deserialization {
            message: "envelope missing `data`".into(),
            body,
        })
    }
}
