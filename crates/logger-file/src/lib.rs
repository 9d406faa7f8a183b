//! Rotating file sink for hourglass loggers
//!
//! [`RotatingFileLogger`] appends formatted lines to one file and rolls it
//! over into timestamped archives:
//! - When the next line would push the file past a size limit
//! - When a wall-clock boundary passes (seconds to weekly, DST aware)
//! - Keeping only the newest archives
//!
//! File access, time and the rotation decisions sit behind traits
//! ([`FileSystem`], [`Clock`], [`RotationPolicy`], [`ArchiveNamer`],
//! [`Pruner`]) so each piece can be swapped or tested alone.
//! [`LoggerService`] wires a file sink and a console sink from
//! [`LoggingSettings`].

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod clock;
mod config;
mod error;
mod fs;
mod naming;
mod policy;
mod pruner;
mod rollover;
mod rotator;
mod service;
mod settings;
mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    FileLoggerConfig, FileLoggerConfigBuilder, LOCATED_TEMPLATE, PLAIN_TEMPLATE,
    default_console_formats, default_file_formats,
};
pub use error::{Error, Result, RotationStage};
#[cfg(any(test, feature = "test-support"))]
pub use fs::{FailOn, MemoryFileSystem};
pub use fs::{FileSystem, OsFileSystem};
pub use naming::{ARCHIVE_TIMESTAMP_FORMAT, ArchiveNamer, TimestampNamer};
pub use policy::{RotationCheck, RotationPolicy, RotationTrigger, SizeOrTimePolicy};
pub use pruner::{CountPruner, PruneReport, Pruner};
pub use rollover::{
    MAX_INTERVAL_SECONDS, ParseRotationUnitError, RotationClock, RotationInterval, RotationUnit,
    Zone,
};
pub use service::LoggerService;
pub use settings::{
    ConfigWarning, ConsoleSettings, DEFAULT_LEVEL, FileSettings, LoggingSettings, Resolved,
};
pub use sink::{RotatingFileLogger, RotatingFileLoggerBuilder, SinkState};
