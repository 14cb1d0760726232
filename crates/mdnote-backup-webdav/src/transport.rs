//! reqwest implementation of `DavTransport`.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use mdnote_backup_core::{BackupError, Credentials, DavResponse, DavTransport, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder};
use tracing::{debug, instrument};

/// Upper bound for a whole request, connect to last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal PROPFIND body; `resourcetype` is all the listing needs.
const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:resourcetype/></d:prop></d:propfind>"#;

/// WebDAV over HTTP(S) with Basic auth on every request.
///
/// Stateless apart from the connection pool inside `reqwest::Client`.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a transport whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BackupError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Wrap an existing client (its timeout settings apply).
    pub fn from_client(http: Client) -> Self {
        Self { http }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        credentials: Credentials<'_>,
    ) -> Result<DavResponse> {
        let response = request
            .basic_auth(credentials.username, Some(credentials.password))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(
            "HTTP {} {} ({} bytes)",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            body.len()
        );

        Ok(DavResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            body.to_vec(),
        ))
    }
}

/// Flatten a reqwest error and its sources into one message.
fn transport_error(e: reqwest::Error) -> BackupError {
    let mut message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        e.to_string()
    };
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    BackupError::Transport(message)
}

#[async_trait]
impl DavTransport for HttpTransport {
    #[instrument(skip(self, credentials), level = "debug")]
    async fn propfind(&self, url: &str, credentials: Credentials<'_>) -> Result<DavResponse> {
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| BackupError::Transport(format!("Invalid method: {}", e)))?;

        let request = self
            .http
            .request(method, url)
            .header("Depth", "1")
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY);

        self.send(request, credentials).await
    }

    #[instrument(skip(self, credentials, body), level = "debug", fields(body_len = body.len()))]
    async fn put(
        &self,
        url: &str,
        credentials: Credentials<'_>,
        body: Vec<u8>,
    ) -> Result<DavResponse> {
        let request = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "text/markdown; charset=utf-8")
            .body(body);

        self.send(request, credentials).await
    }

    #[instrument(skip(self, credentials), level = "debug")]
    async fn get(&self, url: &str, credentials: Credentials<'_>) -> Result<DavResponse> {
        self.send(self.http.get(url), credentials).await
    }
}
