// Blob storage client
//
// Uploads binary files (3D model assets) under a path and retrieves their
// public URLs. Also streams an asset down with per-chunk progress
// reporting, which is what the showcase screen renders while a car's
// model file loads.

use futures_util::StreamExt;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{TokenStore, TransportConfig};

/// HTTP client for the backend's blob storage endpoints.
pub struct StorageClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    url: String,
}

impl StorageClient {
    pub fn new(base_url: Url, transport: &TransportConfig, tokens: TokenStore) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Create a storage client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, tokens: TokenStore) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    fn blob_url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/v1/blobs/{path}")).expect("invalid blob URL")
    }

    /// Upload a binary file under `path`, returning its public retrieval URL.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        let url = self.blob_url(path);
        debug!(size = bytes.len(), "PUT {url}");

        let mut builder = self
            .http
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(header) = self.tokens.bearer_header() {
            builder = builder.header(reqwest::header::AUTHORIZATION, header);
        }

        let resp = builder.send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Storage {
                message: format!("upload failed (HTTP {status}): {}", &body[..body.len().min(200)]),
            });
        }

        let parsed: UploadResponse = resp.json().await?;
        Ok(parsed.url)
    }

    /// The public retrieval URL for a blob path (no request is made).
    pub fn download_url(&self, path: &str) -> String {
        self.blob_url(path).to_string()
    }

    /// Download an asset, reporting `(loaded, total)` after every chunk.
    ///
    /// `total` is `None` when the server sends no Content-Length. The
    /// progress callback is invoked on the calling task; keep it cheap.
    pub async fn fetch_asset(
        &self,
        url: &str,
        mut on_progress: impl FnMut(u64, Option<u64>),
    ) -> Result<Vec<u8>, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(Error::Storage {
                message: format!("asset fetch failed (HTTP {status})"),
            });
        }

        let total = resp.content_length();
        let mut loaded: u64 = 0;
        let mut buf: Vec<u8> = Vec::with_capacity(usize::try_from(total.unwrap_or(0)).unwrap_or(0));

        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            loaded += chunk.len() as u64;
            buf.extend_from_slice(&chunk);
            on_progress(loaded, total);
        }

        Ok(buf)
    }
}
