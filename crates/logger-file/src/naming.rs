//! Archive file names
//!
//! `logs/app.log` rotated for the interval starting 2024-03-01 00:00 becomes
//! `logs/app.20240301T000000.log`. The timestamp is fixed width, so sorting
//! archive names sorts them chronologically.

use chrono::NaiveDateTime;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Layout of the timestamp inside archive names
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

// The timestamp between `<stem>.` and the base's extension
static ARCHIVE_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8}T[0-9]{6}$").unwrap());

/// Maps a base path and an interval start to an archive path, and recognises
/// archives of a base path in a directory listing
pub trait ArchiveNamer: Send + Sync + 'static {
    /// Archive path for the interval starting at `start` (wall-clock time)
    fn archive_path(&self, base: &Path, start: NaiveDateTime) -> PathBuf;

    /// Whether `file_name` (no directory) is an archive of `base`
    fn is_archive(&self, base: &Path, file_name: &str) -> bool;
}

/// `<stem>.<YYYYMMDDTHHMMSS>[.<ext>]`
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNamer;

impl TimestampNamer {
    fn stem(base: &Path) -> &str {
        base.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
    }
}

impl ArchiveNamer for TimestampNamer {
    fn archive_path(&self, base: &Path, start: NaiveDateTime) -> PathBuf {
        let mut name = format!(
            "{}.{}",
            Self::stem(base),
            start.format(ARCHIVE_TIMESTAMP_FORMAT)
        );
        if let Some(ext) = base.extension().and_then(|e| e.to_str()) {
            name.push('.');
            name.push_str(ext);
        }
        base.with_file_name(name)
    }

    /// Only names this namer could have produced for `base`: an archive of
    /// `app.log` never matches `app.<timestamp>.txt`
    fn is_archive(&self, base: &Path, file_name: &str) -> bool {
        let Some(rest) = file_name
            .strip_prefix(Self::stem(base))
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            return false;
        };
        let stamp = match base.extension().and_then(|e| e.to_str()) {
            Some(ext) => rest
                .strip_suffix(ext)
                .and_then(|rest| rest.strip_suffix('.')),
            None => Some(rest),
        };
        stamp.is_some_and(|stamp| ARCHIVE_STAMP.is_match(stamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-01 07:05:09", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_timestamp_goes_before_extension() {
        let namer = TimestampNamer;
        assert_eq!(
            namer.archive_path(Path::new("/var/log/app.log"), start()),
            PathBuf::from("/var/log/app.20240301T070509.log")
        );
        assert_eq!(
            namer.archive_path(Path::new("logs/app"), start()),
            PathBuf::from("logs/app.20240301T070509")
        );
    }

    #[test]
    fn test_recognises_archives_only() {
        let namer = TimestampNamer;
        let base = Path::new("logs/app.log");

        assert!(namer.is_archive(base, "app.20240301T070509.log"));

        assert!(!namer.is_archive(base, "app.log"));
        assert!(!namer.is_archive(base, "app.2024-03-01.log"));
        assert!(!namer.is_archive(base, "app.20240301T070509.log.gz"));
        assert!(!namer.is_archive(base, "application.20240301T070509.log"));
        assert!(!namer.is_archive(base, "other.20240301T070509.log"));
    }

    #[test]
    fn test_archives_of_a_sibling_extension_are_not_ours() {
        let namer = TimestampNamer;

        let log = Path::new("logs/app.log");
        assert!(!namer.is_archive(log, "app.20240301T070509.txt"));
        assert!(!namer.is_archive(log, "app.20240301T070509"));

        let txt = Path::new("logs/app.txt");
        assert!(namer.is_archive(txt, "app.20240301T070509.txt"));
        assert!(!namer.is_archive(txt, "app.20240301T070509.log"));

        let bare = Path::new("logs/app");
        assert!(namer.is_archive(bare, "app.20240301T070509"));
        assert!(!namer.is_archive(bare, "app.20240301T070509.log"));
    }

    #[test]
    fn test_names_sort_chronologically() {
        let namer = TimestampNamer;
        let base = Path::new("app.log");
        let later = start() + chrono::TimeDelta::hours(3);

        let early = namer.archive_path(base, start());
        let late = namer.archive_path(base, later);
        assert!(early < late);
    }
}
