//! Local cache for restored documents.
//!
//! One flat namespace keyed by display name: `{cache_dir}/{display_name}`.
//! Restoring two remote documents with the same basename keeps only the
//! last one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{BackupError, Result};

static PARTIAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reject names that are empty or could escape the cache directory.
pub fn validate_display_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BackupError::InvalidName("name is empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(BackupError::InvalidName(format!(
            "'{}' is not a document name",
            name
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(BackupError::InvalidName(format!(
            "'{}' contains a path separator",
            name
        )));
    }
    Ok(())
}

/// Write `content` to `{cache_dir}/{name}`, replacing any previous copy.
///
/// Data goes to a hidden sibling file first and is renamed into place once
/// flushed and closed, so a failed write never leaves a truncated file under
/// the final name. The sibling's name does not embed `name`, so any name the
/// filesystem accepts can be cached. Concurrent writes of the same name each
/// use their own sibling; the last rename wins. The cache directory is
/// created when missing.
pub async fn write_cache_file(cache_dir: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
    validate_display_name(name)?;

    let cache_path = cache_dir.join(name);
    let temp_path = cache_dir.join(format!(
        ".restore-{}-{}.partial",
        std::process::id(),
        PARTIAL_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let cache_error = |e: std::io::Error| BackupError::CacheWrite {
        path: cache_path.clone(),
        message: e.to_string(),
    };

    fs::create_dir_all(cache_dir).await.map_err(cache_error)?;

    if let Err(e) = write_and_close(&temp_path, content).await {
        discard_partial(&temp_path).await;
        return Err(cache_error(e));
    }

    if let Err(e) = fs::rename(&temp_path, &cache_path).await {
        discard_partial(&temp_path).await;
        return Err(cache_error(e));
    }

    debug!("Cached {} bytes at {}", content.len(), cache_path.display());
    Ok(cache_path)
}

async fn discard_partial(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(
                "Failed to remove partial cache file {}: {}",
                temp_path.display(),
                e
            );
        }
    }
}

async fn write_and_close(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await?;
    // Early returns above drop (and close) the handle too
    drop(file);
    Ok(())
}
