use std::path::PathBuf;

/// Errors returned by backup operations.
///
/// Each operation fails with exactly one of these; nothing is retried
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// A precondition on the endpoint config is not met.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Empty or unsafe document name.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Nothing to back up: content is empty")]
    EmptyContent,

    /// Connection, DNS, TLS or timeout failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a status outside the accepted set.
    #[error("Remote error {status}: {reason}")]
    Remote { status: u16, reason: String },

    /// The multi-status body could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The document was fetched but could not be persisted locally.
    #[error("Cache write error for {}: {message}", path.display())]
    CacheWrite { path: PathBuf, message: String },
}

impl BackupError {
    /// Whether the host should ask for configuration before retrying.
    pub fn requires_configuration(&self) -> bool {
        matches!(self, BackupError::Config(_))
    }

    /// HTTP status for `Remote` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackupError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
