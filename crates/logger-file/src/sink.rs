//! The rotating file sink
//!
//! Every write runs filter, open, render, rotation check, rotation, pruning
//! and append under one mutex, so concurrent writers never double-rotate or
//! append into a file that is being renamed. Handles derived with
//! [`Logger::with_context`] share that mutex and file.

use crate::clock::{Clock, SystemClock};
use crate::config::FileLoggerConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, OsFileSystem};
use crate::naming::{ArchiveNamer, TimestampNamer};
use crate::policy::{RotationCheck, RotationPolicy, RotationTrigger, SizeOrTimePolicy};
use crate::pruner::{CountPruner, Pruner};
use crate::rollover::{RotationClock, Zone};
use crate::rotator::{FileRotator, Writer};
use chrono::{DateTime, Local, Utc};
use hourglass_logger::{Context, Level, LevelFormatter, LogFormatter, Logger, Record};
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Externally visible state of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// A file handle is open
    Open,
    /// A rotation is in progress
    Rotating,
    /// No handle: not opened yet (lazy), shut down, or failed
    Closed,
}

enum Handle {
    /// Lazy sink before its first write, or right after a lazy rotation
    Deferred,
    Open(Writer),
    Rotating,
    /// A rotation failed; the sink stays closed
    Failed,
    ShutDown,
}

struct Inner {
    handle: Handle,
    size: u64,
    next_rollover: DateTime<Utc>,
}

struct Shared {
    rotator: FileRotator,
    policy: Box<dyn RotationPolicy>,
    pruner: Box<dyn Pruner>,
    namer: Arc<dyn ArchiveNamer>,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    formatter: LevelFormatter,
    min_level: Level,
    inner: Mutex<Inner>,
}

/// A logger that appends to a file and rotates it by size or time
#[derive(Clone)]
pub struct RotatingFileLogger {
    shared: Arc<Shared>,
    context: Context,
}

impl RotatingFileLogger {
    /// Create a sink on the real file system and clock
    pub fn new(config: FileLoggerConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start a builder to replace individual collaborators
    pub fn builder(config: FileLoggerConfig) -> RotatingFileLoggerBuilder {
        RotatingFileLoggerBuilder::new(config)
    }

    /// Append one record, rotating and pruning first when due.
    ///
    /// Records below the sink's level are dropped without touching the file.
    /// A failed rotation closes the sink: this call returns the rotation
    /// error and every later call returns [`Error::Closed`].
    pub fn write(&self, record: Record<'_>) -> Result<()> {
        if !self.is_enabled(record.level) {
            return Ok(());
        }

        let record = if record.context.is_none() {
            record.with_context(&self.context)
        } else {
            record
        };
        let mut line = self.shared.formatter.format(&record);
        line.push('\n');

        let now = self.shared.clock.now();
        let mut inner = self.shared.inner.lock();
        self.shared.write_line(&mut inner, line.as_bytes(), now)
    }

    /// Flush and close the file. Later writes return [`Error::Closed`].
    pub fn shutdown(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        let handle = std::mem::replace(&mut inner.handle, Handle::ShutDown);
        if let Handle::Open(mut writer) = handle {
            writer.flush()?;
        }
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> SinkState {
        match self.shared.inner.lock().handle {
            Handle::Open(_) => SinkState::Open,
            Handle::Rotating => SinkState::Rotating,
            Handle::Deferred | Handle::Failed | Handle::ShutDown => SinkState::Closed,
        }
    }

    /// Path of the current file
    pub fn path(&self) -> &Path {
        self.shared.rotator.path()
    }

    /// Bytes in the current file, as tracked by the sink
    pub fn current_size(&self) -> u64 {
        self.shared.inner.lock().size
    }

    /// Instant at or after which the next write rotates
    pub fn next_rollover(&self) -> DateTime<Utc> {
        self.shared.inner.lock().next_rollover
    }

    /// Minimum level this sink writes
    pub fn level(&self) -> Level {
        self.shared.min_level
    }
}

impl Shared {
    fn write_line(&self, inner: &mut Inner, line: &[u8], now: DateTime<Utc>) -> Result<()> {
        self.ensure_open(inner)?;

        let check = RotationCheck {
            current_size: inner.size,
            pending_len: line.len() as u64,
            now,
            next_rollover: inner.next_rollover,
        };
        if let Some(trigger) = self.policy.should_rotate(&check) {
            self.rotate(inner, trigger, now)?;
            self.prune();
            self.ensure_open(inner)?;
        }

        match &mut inner.handle {
            Handle::Open(writer) => {
                writer.write_all(line)?;
                writer.flush()?;
                inner.size += line.len() as u64;
                Ok(())
            }
            _ => Err(Error::Closed),
        }
    }

    fn ensure_open(&self, inner: &mut Inner) -> Result<()> {
        match inner.handle {
            Handle::Open(_) => Ok(()),
            Handle::Deferred => {
                let (writer, size) = self.rotator.open()?;
                inner.handle = Handle::Open(writer);
                inner.size = size;
                Ok(())
            }
            Handle::Rotating | Handle::Failed | Handle::ShutDown => Err(Error::Closed),
        }
    }

    fn rotate(
        &self,
        inner: &mut Inner,
        trigger: RotationTrigger,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let current = match std::mem::replace(&mut inner.handle, Handle::Rotating) {
            Handle::Open(writer) => Some(writer),
            _ => None,
        };

        match self.rotator.rotate(current, inner.next_rollover, now) {
            Ok(rotated) => {
                debug!(
                    ?trigger,
                    archive = ?rotated.archive,
                    next_rollover = %rotated.next_rollover,
                    "Rotated log file"
                );
                inner.handle = rotated.writer.map_or(Handle::Deferred, Handle::Open);
                inner.size = 0;
                inner.next_rollover = rotated.next_rollover;
                Ok(())
            }
            Err(e) => {
                inner.handle = Handle::Failed;
                Err(e)
            }
        }
    }

    fn prune(&self) {
        let report = self
            .pruner
            .prune(self.fs.as_ref(), self.namer.as_ref(), self.rotator.path());
        for failure in &report.failures {
            warn!(error = %failure, "Failed to prune old log file");
        }
        if !report.removed.is_empty() {
            debug!(removed = report.removed.len(), "Pruned old log files");
        }
    }
}

impl Logger for RotatingFileLogger {
    fn log(&self, record: Record<'_>) {
        if let Err(e) = self.write(record) {
            error!(
                error = %e,
                path = %self.path().display(),
                "Failed to write log record"
            );
        }
    }

    fn flush(&self) {
        let mut inner = self.shared.inner.lock();
        if let Handle::Open(writer) = &mut inner.handle {
            if let Err(e) = writer.flush() {
                warn!(error = %e, path = %self.path().display(), "Failed to flush log file");
            }
        }
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        level >= self.shared.min_level
    }

    fn with_context(&self, context: Context) -> Arc<dyn Logger> {
        Arc::new(Self {
            shared: self.shared.clone(),
            context: self.context.merge(&context),
        })
    }
}

/// Assembles a [`RotatingFileLogger`], defaulting every collaborator
pub struct RotatingFileLoggerBuilder {
    config: FileLoggerConfig,
    context: Context,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    zone: Option<Arc<dyn Zone>>,
    policy: Option<Box<dyn RotationPolicy>>,
    namer: Arc<dyn ArchiveNamer>,
    pruner: Option<Box<dyn Pruner>>,
}

impl RotatingFileLoggerBuilder {
    /// Start from a configuration with the real file system and clock
    pub fn new(config: FileLoggerConfig) -> Self {
        Self {
            config,
            context: Context::new(""),
            fs: Arc::new(OsFileSystem),
            clock: Arc::new(SystemClock),
            zone: None,
            policy: None,
            namer: Arc::new(TimestampNamer),
            pruner: None,
        }
    }

    /// Name records that arrive without a context
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Use another file system
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Use another clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Schedule and name archives in `zone` (overrides the `utc` setting)
    pub fn zone(mut self, zone: Arc<dyn Zone>) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Replace the size-or-time policy
    pub fn policy(mut self, policy: Box<dyn RotationPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Replace the timestamp naming scheme
    pub fn namer(mut self, namer: Arc<dyn ArchiveNamer>) -> Self {
        self.namer = namer;
        self
    }

    /// Replace the count-based pruner
    pub fn pruner(mut self, pruner: Box<dyn Pruner>) -> Self {
        self.pruner = Some(pruner);
        self
    }

    /// Create the directory, open the file (unless lazy) and schedule the
    /// first rollover
    pub fn build(self) -> Result<RotatingFileLogger> {
        let config = self.config;
        config.validate()?;
        let formatter = LevelFormatter::new(&config.formats)?.with_utc(config.formatter_utc);

        if let Some(dir) = config.path.parent() {
            if !dir.as_os_str().is_empty() {
                self.fs
                    .create_dir_all(dir)
                    .map_err(|source| Error::CreateDirectory {
                        path: dir.to_path_buf(),
                        source,
                    })?;
            }
        }

        let zone = self.zone.unwrap_or_else(|| {
            if config.utc {
                Arc::new(Utc) as Arc<dyn Zone>
            } else {
                Arc::new(Local)
            }
        });
        let rotator = FileRotator::new(
            self.fs.clone(),
            self.namer.clone(),
            RotationClock::new(config.rotation, zone),
            config.path.clone(),
            config.lazy_open,
        );

        // Schedule before opening: opening would touch the file's mtime
        let next_rollover = rotator.initial_rollover(self.clock.now());
        let (handle, size) = if config.lazy_open {
            (Handle::Deferred, 0)
        } else {
            let (writer, size) = rotator.open()?;
            (Handle::Open(writer), size)
        };

        Ok(RotatingFileLogger {
            shared: Arc::new(Shared {
                rotator,
                policy: self
                    .policy
                    .unwrap_or_else(|| Box::new(SizeOrTimePolicy::new(config.max_size_bytes))),
                pruner: self
                    .pruner
                    .unwrap_or_else(|| Box::new(CountPruner::new(config.retention_count))),
                namer: self.namer,
                fs: self.fs,
                clock: self.clock,
                formatter,
                min_level: config.min_level,
                inner: Mutex::new(Inner {
                    handle,
                    size,
                    next_rollover,
                }),
            }),
            context: self.context,
        })
    }
}
