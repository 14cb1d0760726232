use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, instrument};

use crate::cache::{validate_display_name, write_cache_file};
use crate::config::EndpointConfig;
use crate::error::{BackupError, Result};
use crate::listing::{parse_listing, RemoteDocument};
use crate::naming::{backup_name, split_document_name};
use crate::transport::{DavResponse, DavTransport};

/// Only Markdown backups are restore candidates.
pub const DOCUMENT_EXTENSION: &str = ".md";

const MULTI_STATUS: u16 = 207;

/// A document fetched from the server and stored in the restore cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredDocument {
    pub content: Vec<u8>,
    pub cache_path: PathBuf,
}

/// Backup, listing and restore against a WebDAV endpoint.
///
/// Holds no connection state of its own; the endpoint config is passed into
/// every call. Share it behind an `Arc` to run operations on background
/// tasks.
pub struct BackupClient<T> {
    transport: T,
}

fn remote_error(response: &DavResponse) -> BackupError {
    BackupError::Remote {
        status: response.status,
        reason: response.reason.clone(),
    }
}

fn is_restore_candidate(document: &RemoteDocument) -> bool {
    !document.is_collection
        && !document.display_name.is_empty()
        && document
            .display_name
            .to_lowercase()
            .ends_with(DOCUMENT_EXTENSION)
}

impl<T: DavTransport> BackupClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List the Markdown documents directly inside the effective base URL.
    ///
    /// Collections, entries without a name and non-`.md` files are dropped.
    /// Server order is kept. Any status other than `207 Multi-Status` is a
    /// `BackupError::Remote`.
    #[instrument(skip(self, config), level = "debug")]
    pub async fn list_documents(&self, config: &EndpointConfig) -> Result<Vec<RemoteDocument>> {
        config.require_endpoint()?;

        let url = config.effective_base_url();
        let response = self.transport.propfind(&url, config.credentials()).await?;
        if response.status != MULTI_STATUS {
            return Err(remote_error(&response));
        }

        let entries = parse_listing(&response.body)?;
        let total = entries.len();
        let documents: Vec<RemoteDocument> =
            entries.into_iter().filter(is_restore_candidate).collect();

        debug!(
            "Listed {} documents at {} ({} entries)",
            documents.len(),
            url,
            total
        );
        Ok(documents)
    }

    /// Upload `content` as `{local_name}_{timestamp}{extension}`.
    ///
    /// Returns the full URL of the new backup. Backups of the same document
    /// within the same second replace each other.
    #[instrument(
        skip(self, config, content),
        level = "debug",
        fields(content_len = content.len())
    )]
    pub async fn backup(
        &self,
        config: &EndpointConfig,
        local_name: &str,
        extension: &str,
        content: &[u8],
        now: DateTime<Local>,
    ) -> Result<String> {
        if content.is_empty() {
            return Err(BackupError::EmptyContent);
        }
        config.require_endpoint()?;
        validate_display_name(local_name)?;

        let remote_name = backup_name(local_name, extension, &now);
        validate_display_name(&remote_name)?;

        let url = config.document_url(&remote_name);
        let response = self
            .transport
            .put(&url, config.credentials(), content.to_vec())
            .await?;

        match response.status {
            200 | 201 | 204 => {
                debug!("Backed up {} bytes to {}", content.len(), url);
                Ok(url)
            }
            _ => Err(remote_error(&response)),
        }
    }

    /// Back up a document given its file name, e.g. `notes.md`.
    pub async fn backup_document(
        &self,
        config: &EndpointConfig,
        file_name: &str,
        content: &[u8],
        now: DateTime<Local>,
    ) -> Result<String> {
        let (stem, extension) = split_document_name(file_name);
        self.backup(config, stem, extension, content, now).await
    }

    /// Download `display_name` and store it at `{cache_dir}/{display_name}`.
    ///
    /// The name is checked before anything else happens. A failure to write
    /// the cache after a successful download is `BackupError::CacheWrite`.
    #[instrument(skip(self, config), level = "debug")]
    pub async fn restore(
        &self,
        config: &EndpointConfig,
        display_name: &str,
        cache_dir: &Path,
    ) -> Result<RestoredDocument> {
        validate_display_name(display_name)?;
        config.require_endpoint()?;

        let url = config.document_url(display_name);
        let response = self.transport.get(&url, config.credentials()).await?;
        if response.status != 200 {
            return Err(remote_error(&response));
        }

        let cache_path = write_cache_file(cache_dir, display_name, &response.body).await?;
        debug!(
            "Restored {} ({} bytes) to {}",
            url,
            response.body.len(),
            cache_path.display()
        );

        Ok(RestoredDocument {
            content: response.body,
            cache_path,
        })
    }
}
