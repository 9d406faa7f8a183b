//! Retention: deleting archives beyond the configured count

use crate::error::Error;
use crate::fs::FileSystem;
use crate::naming::ArchiveNamer;
use std::path::{Path, PathBuf};

/// What a pruning pass did
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Archives that were deleted, oldest first
    pub removed: Vec<PathBuf>,
    /// Deletions (or the directory listing) that failed
    pub failures: Vec<Error>,
}

impl PruneReport {
    /// Whether every attempted deletion succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes old archives of a base path
pub trait Pruner: Send + Sync + 'static {
    /// Prune the archives of `base`. Failures are reported, never raised.
    fn prune(&self, fs: &dyn FileSystem, namer: &dyn ArchiveNamer, base: &Path) -> PruneReport;
}

/// Keeps the newest `retention` archives; 0 keeps everything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountPruner {
    retention: usize,
}

impl CountPruner {
    /// Keep at most `retention` archives
    pub fn new(retention: usize) -> Self {
        Self { retention }
    }
}

impl Pruner for CountPruner {
    fn prune(&self, fs: &dyn FileSystem, namer: &dyn ArchiveNamer, base: &Path) -> PruneReport {
        let mut report = PruneReport::default();
        if self.retention == 0 {
            return report;
        }

        let dir = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut archives: Vec<String> = match fs.list_dir(dir) {
            Ok(names) => names
                .into_iter()
                .filter(|name| namer.is_archive(base, name))
                .collect(),
            Err(source) => {
                report.failures.push(Error::Prune {
                    path: dir.to_path_buf(),
                    source,
                });
                return report;
            }
        };
        if archives.len() <= self.retention {
            return report;
        }

        archives.sort();
        let excess = archives.len() - self.retention;
        for name in archives.into_iter().take(excess) {
            let path = dir.join(name);
            match fs.remove_file(&path) {
                Ok(()) => report.removed.push(path),
                Err(source) => report.failures.push(Error::Prune { path, source }),
            }
        }
        report
    }
}
