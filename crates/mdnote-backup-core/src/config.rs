use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BackupError, Result};
use crate::transport::Credentials;

/// WebDAV endpoint and credentials.
///
/// Serialized with the keys `url`, `username`, `password` and `remote_dir`.
/// Owned by the host application and passed by reference into every
/// operation; nothing in this crate mutates it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Server URL, e.g. `https://dav.example.com/remote.php/webdav`
    #[serde(rename = "url", default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Optional directory below `base_url` (empty for none)
    #[serde(default)]
    pub remote_dir: String,
}

impl EndpointConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            remote_dir: String::new(),
        }
    }

    pub fn with_remote_dir(mut self, remote_dir: impl Into<String>) -> Self {
        self.remote_dir = remote_dir.into();
        self
    }

    fn trimmed_base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    /// Whether an endpoint URL has been set.
    pub fn is_configured(&self) -> bool {
        !self.trimmed_base().is_empty()
    }

    /// Fails with `BackupError::Config` when no endpoint is set.
    pub fn require_endpoint(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(BackupError::Config("endpoint not configured".to_string()))
        }
    }

    /// Base URL joined with the remote directory.
    ///
    /// Exactly one slash separates the parts and the result never ends with
    /// a slash, however many the caller supplied. Empty segments inside
    /// `remote_dir` are dropped.
    pub fn effective_base_url(&self) -> String {
        let dir = self
            .remote_dir
            .trim()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        if dir.is_empty() {
            self.trimmed_base().to_string()
        } else {
            format!("{}/{}", self.trimmed_base(), dir)
        }
    }

    /// Full URL of a document directly inside the effective base.
    pub fn document_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.effective_base_url(),
            urlencoding::encode(name)
        )
    }

    pub fn credentials(&self) -> Credentials<'_> {
        Credentials {
            username: &self.username,
            password: &self.password,
        }
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("remote_dir", &self.remote_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str, dir: &str) -> EndpointConfig {
        EndpointConfig::new(base, "alice", "secret").with_remote_dir(dir)
    }

    #[test]
    fn test_effective_base_url_without_remote_dir() {
        assert_eq!(
            config("https://dav.example.com/webdav", "").effective_base_url(),
            "https://dav.example.com/webdav"
        );
        assert_eq!(
            config("https://dav.example.com/webdav///", "").effective_base_url(),
            "https://dav.example.com/webdav"
        );
        assert_eq!(
            config("https://dav.example.com/webdav/", "///").effective_base_url(),
            "https://dav.example.com/webdav"
        );
    }

    #[test]
    fn test_effective_base_url_joins_with_single_slash() {
        let cases = [
            ("https://h/dav", "notes"),
            ("https://h/dav/", "notes"),
            ("https://h/dav", "/notes"),
            ("https://h/dav//", "//notes//"),
            ("  https://h/dav/ ", " notes/ "),
        ];
        for (base, dir) in cases {
            assert_eq!(
                config(base, dir).effective_base_url(),
                "https://h/dav/notes",
                "base={base:?} dir={dir:?}"
            );
        }
    }

    #[test]
    fn test_effective_base_url_never_has_double_or_trailing_slash() {
        let bases = ["http://h", "http://h/", "http://h/a//", "http://h/a/b"];
        let dirs = ["", "/", "x", "/x/", "x//y", "//x/y//"];
        for base in bases {
            for dir in dirs {
                let url = config(base, dir).effective_base_url();
                let path = url.trim_start_matches("http://");
                assert!(!path.contains("//"), "{url}");
                assert!(!url.ends_with('/'), "{url}");
            }
        }
    }

    #[test]
    fn test_document_url_encodes_name() {
        let cfg = config("https://h/dav/", "backups");
        assert_eq!(
            cfg.document_url("notes_20240102030405.md"),
            "https://h/dav/backups/notes_20240102030405.md"
        );
        assert_eq!(
            cfg.document_url("my notes.md"),
            "https://h/dav/backups/my%20notes.md"
        );
    }

    #[test]
    fn test_require_endpoint() {
        let err = EndpointConfig::default().require_endpoint().unwrap_err();
        assert!(err.requires_configuration());
        assert!(err.to_string().contains("endpoint not configured"));

        assert!(config("/", "").require_endpoint().is_err());
        assert!(config("https://h", "").require_endpoint().is_ok());
    }

    #[test]
    fn test_serde_keys_and_defaults() {
        let cfg: EndpointConfig =
            serde_json::from_str(r#"{"url": "https://h/dav", "username": "bob"}"#).unwrap();
        assert_eq!(cfg.base_url, "https://h/dav");
        assert_eq!(cfg.username, "bob");
        assert!(cfg.password.is_empty());
        assert!(cfg.remote_dir.is_empty());

        let json = serde_json::to_value(config("https://h", "d")).unwrap();
        assert_eq!(json["url"], "https://h");
        assert_eq!(json["remote_dir"], "d");
    }

    #[test]
    fn test_debug_masks_password() {
        let rendered = format!("{:?}", config("https://h", ""));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("alice"));
    }
}
