//! Archiving the current file and starting a fresh one

use crate::error::{Error, Result, RotationStage};
use crate::fs::FileSystem;
use crate::naming::ArchiveNamer;
use crate::rollover::RotationClock;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) type Writer = Box<dyn Write + Send>;

/// Outcome of a successful rotation
pub(crate) struct Rotated {
    /// Where the previous file went; `None` when there was no file to move
    pub(crate) archive: Option<PathBuf>,
    /// The fresh current file; `None` for lazy sinks
    pub(crate) writer: Option<Writer>,
    /// Rollover instant for the new interval
    pub(crate) next_rollover: DateTime<Utc>,
}

/// Owns the current path and knows how to move it aside
pub(crate) struct FileRotator {
    fs: Arc<dyn FileSystem>,
    namer: Arc<dyn ArchiveNamer>,
    clock: RotationClock,
    path: PathBuf,
    lazy_open: bool,
}

impl FileRotator {
    pub(crate) fn new(
        fs: Arc<dyn FileSystem>,
        namer: Arc<dyn ArchiveNamer>,
        clock: RotationClock,
        path: PathBuf,
        lazy_open: bool,
    ) -> Self {
        Self {
            fs,
            namer,
            clock,
            path,
            lazy_open,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Open the current file for appending; returns it with its size on disk
    pub(crate) fn open(&self) -> Result<(Writer, u64)> {
        let open_error = |source| Error::Open {
            path: self.path.clone(),
            source,
        };
        let writer = self.fs.open_append(&self.path).map_err(open_error)?;
        let size = self.fs.len(&self.path).map_err(open_error)?;
        Ok((writer, size))
    }

    /// First rollover for a sink starting at `now`. An existing file anchors
    /// the schedule at its modification time, so a file left over from an
    /// elapsed interval is rotated on the first write.
    pub(crate) fn initial_rollover(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let anchor = self
            .fs
            .modified(&self.path)
            .map(DateTime::<Utc>::from)
            .unwrap_or(now);
        self.clock.compute_rollover(anchor)
    }

    /// Close `current`, move the file to its archive name and start over.
    /// Nothing is retried; the first failing step is returned.
    pub(crate) fn rotate(
        &self,
        current: Option<Writer>,
        next_rollover: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Rotated> {
        if let Some(mut writer) = current {
            writer
                .flush()
                .map_err(|source| self.failed(RotationStage::Close, &self.path, source))?;
        }

        let start = self.clock.interval_start(next_rollover, now);
        let target = self
            .namer
            .archive_path(&self.path, self.clock.local_time(start));

        let archive = if self.fs.exists(&self.path) {
            if self.fs.exists(&target) {
                self.fs
                    .remove_file(&target)
                    .map_err(|source| self.failed(RotationStage::RemoveExisting, &target, source))?;
            }
            self.fs
                .rename(&self.path, &target)
                .map_err(|source| self.failed(RotationStage::Rename, &self.path, source))?;
            Some(target)
        } else {
            None
        };

        let writer = if self.lazy_open {
            None
        } else {
            let writer = self
                .fs
                .open_append(&self.path)
                .map_err(|source| self.failed(RotationStage::Reopen, &self.path, source))?;
            Some(writer)
        };

        Ok(Rotated {
            archive,
            writer,
            next_rollover: self.clock.next_rollover(now, now),
        })
    }

    fn failed(&self, stage: RotationStage, path: &Path, source: std::io::Error) -> Error {
        Error::Rotation {
            stage,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FailOn, MemoryFileSystem};
    use crate::naming::TimestampNamer;
    use crate::rollover::{RotationInterval, RotationUnit};
    use chrono::{TimeDelta, TimeZone};
    use std::time::SystemTime;

    fn base() -> PathBuf {
        PathBuf::from("logs/app.log")
    }

    fn rotator(fs: &MemoryFileSystem, lazy_open: bool) -> FileRotator {
        FileRotator::new(
            Arc::new(fs.clone()),
            Arc::new(TimestampNamer),
            RotationClock::utc(RotationInterval::new(RotationUnit::Hours, 1)),
            base(),
            lazy_open,
        )
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_rotate_archives_under_interval_start() {
        let fs = MemoryFileSystem::new();
        let rotator = rotator(&fs, false);
        let (mut writer, size) = rotator.open().unwrap();
        assert_eq!(size, 0);
        writer.write_all(b"first\n").unwrap();

        let rotated = rotator.rotate(Some(writer), at(6, 0), at(6, 0)).unwrap();

        let archive = PathBuf::from("logs/app.20240301T050000.log");
        assert_eq!(rotated.archive.as_deref(), Some(archive.as_path()));
        assert_eq!(fs.read(&archive).as_deref(), Some("first\n"));
        assert_eq!(fs.read(&base()).as_deref(), Some(""));
        assert!(rotated.writer.is_some());
        assert_eq!(rotated.next_rollover, at(7, 0));
    }

    #[test]
    fn test_rotate_overwrites_existing_archive() {
        let fs = MemoryFileSystem::new();
        let archive = PathBuf::from("logs/app.20240301T050000.log");
        fs.insert(&archive, "old\n", SystemTime::now());
        fs.insert(base(), "new\n", SystemTime::now());

        rotator(&fs, false).rotate(None, at(6, 0), at(6, 0)).unwrap();

        assert_eq!(fs.read(&archive).as_deref(), Some("new\n"));
    }

    #[test]
    fn test_missing_current_file_is_not_an_error() {
        let fs = MemoryFileSystem::new();
        let rotated = rotator(&fs, true).rotate(None, at(6, 0), at(6, 30)).unwrap();

        assert!(rotated.archive.is_none());
        assert!(rotated.writer.is_none());
        assert!(fs.paths().is_empty());
        assert_eq!(rotated.next_rollover, at(7, 30));
    }

    #[test]
    fn test_rename_failure_names_the_stage() {
        let fs = MemoryFileSystem::new();
        fs.insert(base(), "data\n", SystemTime::now());
        fs.fail(FailOn::Rename(base()));

        let err = rotator(&fs, false)
            .rotate(None, at(6, 0), at(6, 0))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Rotation {
                stage: RotationStage::Rename,
                ..
            }
        ));
        assert_eq!(fs.read(&base()).as_deref(), Some("data\n"));
    }

    #[test]
    fn test_initial_rollover_anchors_on_existing_file() {
        let fs = MemoryFileSystem::new();
        let rotator = rotator(&fs, false);
        let now = at(12, 0);
        assert_eq!(rotator.initial_rollover(now), at(13, 0));

        let stale = at(3, 15);
        fs.insert(base(), "old\n", SystemTime::from(stale));
        assert_eq!(rotator.initial_rollover(now), stale + TimeDelta::hours(1));
    }
}
