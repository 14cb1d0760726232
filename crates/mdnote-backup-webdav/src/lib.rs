//! WebDAV backend for mdnote backups.
//!
//! `HttpTransport` sends the PROPFIND / PUT / GET requests that
//! `mdnote_backup_core::BackupClient` needs; `settings` persists the
//! endpoint config for the `mdnote-backup` host binary.

pub mod settings;
mod transport;

use std::time::Duration;

use mdnote_backup_core::{BackupClient, Result};

pub use transport::{HttpTransport, DEFAULT_TIMEOUT};

/// Backup client speaking WebDAV over reqwest.
pub type WebDavBackupClient = BackupClient<HttpTransport>;

/// Build a client whose requests fail after `timeout`.
pub fn webdav_client(timeout: Duration) -> Result<WebDavBackupClient> {
    Ok(BackupClient::new(HttpTransport::with_timeout(timeout)?))
}
