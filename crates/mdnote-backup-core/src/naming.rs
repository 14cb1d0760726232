//! Backup file naming.
//!
//! A backup of `notes.md` taken at 2024-01-02 03:04:05 local time is stored
//! as `notes_20240102030405.md`. The fixed-width timestamp keeps versions of
//! one document lexically sorted. Two backups within the same second share a
//! name and the later upload replaces the earlier one.

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, TimeZone};

/// `YYYYMMDDHHMMSS`, no separators.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const TIMESTAMP_LEN: usize = 14;

/// Format `now` as a backup timestamp in the zone it carries.
pub fn backup_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// `{stem}_{timestamp}{extension}`.
pub fn backup_name<Tz: TimeZone>(stem: &str, extension: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("{}_{}{}", stem, backup_timestamp(now), extension)
}

/// Split a file name into stem and extension (extension keeps its dot).
///
/// Leading dots do not start an extension and only the last dot counts:
/// `notes.md` -> (`notes`, `.md`), `.env` -> (`.env`, ``),
/// `a.tar.gz` -> (`a.tar`, `.gz`).
pub fn split_document_name(file_name: &str) -> (&str, &str) {
    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[leading_dots..].rfind('.') {
        Some(pos) => file_name.split_at(leading_dots + pos),
        None => (file_name, ""),
    }
}

/// A remote name that follows the backup naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupName {
    pub stem: String,
    pub timestamp: NaiveDateTime,
    pub extension: String,
}

impl BackupName {
    /// Raw `YYYYMMDDHHMMSS` form of the timestamp.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Recover stem, timestamp and extension from a backup name.
///
/// Returns `None` for names not produced by [`backup_name`].
pub fn parse_backup_name(name: &str) -> Option<BackupName> {
    let (base, extension) = split_document_name(name);
    let (stem, timestamp) = base.rsplit_once('_')?;
    if stem.is_empty()
        || timestamp.len() != TIMESTAMP_LEN
        || !timestamp.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    Some(BackupName {
        stem: stem.to_string(),
        timestamp,
        extension: extension.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Local, NaiveDate, Utc};

    #[test]
    fn test_backup_name_format() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(backup_timestamp(&now), "20240102030405");
        assert_eq!(backup_name("notes", ".md", &now), "notes_20240102030405.md");
        assert_eq!(backup_name("README", "", &now), "README_20240102030405");
    }

    #[test]
    fn test_timestamp_uses_carried_zone() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 1, 2, 20, 0, 0)
            .unwrap()
            .with_timezone(&tz);
        assert_eq!(backup_timestamp(&now), "20240103040000");

        let local = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().unwrap();
        assert_eq!(backup_timestamp(&local), "20240102030405");
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(backup_name("n", ".md", &earlier) < backup_name("n", ".md", &later));
    }

    #[test]
    fn test_split_document_name() {
        assert_eq!(split_document_name("notes.md"), ("notes", ".md"));
        assert_eq!(split_document_name("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_document_name("README"), ("README", ""));
        assert_eq!(split_document_name(".env"), (".env", ""));
        assert_eq!(split_document_name("..hidden.md"), ("..hidden", ".md"));
        assert_eq!(split_document_name("trailing."), ("trailing", "."));
        assert_eq!(split_document_name(""), ("", ""));
    }

    #[test]
    fn test_parse_backup_name() {
        let parsed = parse_backup_name("my_notes_20240102030405.md").unwrap();
        assert_eq!(parsed.stem, "my_notes");
        assert_eq!(parsed.extension, ".md");
        assert_eq!(
            parsed.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap()
        );
        assert_eq!(parsed.timestamp_string(), "20240102030405");

        assert!(parse_backup_name("notes.md").is_none());
        assert!(parse_backup_name("notes_2024.md").is_none());
        assert!(parse_backup_name("_20240102030405.md").is_none());
        assert!(parse_backup_name("notes_20241302030405.md").is_none());
        assert!(parse_backup_name("notes_2024010203040x.md").is_none());
    }

    #[test]
    fn test_parse_inverts_backup_name() {
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 1).unwrap();
        let name = backup_name("journal", ".md", &now);
        let parsed = parse_backup_name(&name).unwrap();
        assert_eq!(parsed.stem, "journal");
        assert_eq!(parsed.timestamp, now.naive_utc());
    }
}
