use async_trait::async_trait;

use crate::error::Result;

/// HTTP Basic credentials, borrowed from an `EndpointConfig`.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Raw response of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    pub status: u16,
    /// Reason phrase (canonical for the status when the server gives none)
    pub reason: String,
    pub body: Vec<u8>,
}

impl DavResponse {
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }
}

/// The request shapes the backup client needs from a WebDAV server.
///
/// Implementations send exactly one request per call and authenticate with
/// Basic credentials. They report connection-level failures as
/// `BackupError::Transport` and never interpret status codes.
#[async_trait]
pub trait DavTransport: Send + Sync {
    /// `PROPFIND` with `Depth: 1`.
    async fn propfind(&self, url: &str, credentials: Credentials<'_>) -> Result<DavResponse>;

    /// `PUT` replacing the resource with `body`.
    async fn put(
        &self,
        url: &str,
        credentials: Credentials<'_>,
        body: Vec<u8>,
    ) -> Result<DavResponse>;

    /// `GET`.
    async fn get(&self, url: &str, credentials: Credentials<'_>) -> Result<DavResponse>;
}
