//! Core types and operations for mdnote WebDAV backups.
//!
//! This crate holds everything that does not depend on a concrete HTTP stack:
//! - `EndpointConfig`: where backups live and how to authenticate
//! - `BackupClient`: listing, backup and restore over any `DavTransport`
//! - `parse_listing`: multi-status body parsing
//! - Naming and restore-cache helpers
//!
//! Every operation takes the config explicitly and performs one bounded
//! request/response exchange. Hosts run operations on a background task and
//! render the returned `Result`.

mod cache;
mod client;
mod config;
mod error;
mod listing;
mod naming;
mod transport;

pub use cache::{validate_display_name, write_cache_file};
pub use client::{BackupClient, RestoredDocument, DOCUMENT_EXTENSION};
pub use config::EndpointConfig;
pub use error::{BackupError, Result};
pub use listing::{parse_listing, RemoteDocument};
pub use naming::{
    backup_name, backup_timestamp, parse_backup_name, split_document_name, BackupName,
    TIMESTAMP_FORMAT,
};
pub use transport::{Credentials, DavResponse, DavTransport};
