//! Configuration for the rotating file logger

use crate::error::{Error, Result};
use crate::rollover::RotationInterval;
use hourglass_logger::{FormatSpec, Level};
use std::path::PathBuf;

/// Template for records that show where they were logged from
pub const LOCATED_TEMPLATE: &str =
    "{timestamp} - {name} - {level} - [{file}:{line}] {message}";

/// Template for everything else
pub const PLAIN_TEMPLATE: &str = "{timestamp} - {name} - {level} - {message}";

/// Default per-severity formats for the file sink: DEBUG and ERROR-and-above
/// carry the source location, INFO and WARN do not
pub fn default_file_formats() -> FormatSpec {
    FormatSpec::new()
        .level(Level::Debug, LOCATED_TEMPLATE)
        .level(Level::Info, PLAIN_TEMPLATE)
        .level(Level::Warn, PLAIN_TEMPLATE)
        .level(Level::Error, LOCATED_TEMPLATE)
}

/// Default per-severity formats for the console sink: only DEBUG carries the
/// source location
pub fn default_console_formats() -> FormatSpec {
    FormatSpec::new()
        .level(Level::Debug, LOCATED_TEMPLATE)
        .level(Level::Info, PLAIN_TEMPLATE)
        .level(Level::Warn, PLAIN_TEMPLATE)
        .level(Level::Error, PLAIN_TEMPLATE)
}

/// Configuration for the rotating file logger
#[derive(Debug, Clone)]
pub struct FileLoggerConfig {
    /// Path of the current log file; archives are created next to it
    pub path: PathBuf,

    /// Rotate before the file would reach this many bytes (0 disables)
    pub max_size_bytes: u64,

    /// Time-based rollover schedule
    pub rotation: RotationInterval,

    /// Schedule and name archives in UTC instead of local time
    pub utc: bool,

    /// Archives to keep (0 keeps all)
    pub retention_count: usize,

    /// Create the file on the first write instead of at construction
    pub lazy_open: bool,

    /// Records below this level are dropped
    pub min_level: Level,

    /// Per-severity line templates
    pub formats: FormatSpec,

    /// Render `{timestamp}` in UTC instead of local time
    pub formatter_utc: bool,
}

impl Default for FileLoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/app.log"),
            max_size_bytes: 10_000_000,
            rotation: RotationInterval::default(),
            utc: false,
            retention_count: 10,
            lazy_open: false,
            min_level: Level::Debug,
            formats: default_file_formats(),
            formatter_utc: false,
        }
    }
}

impl FileLoggerConfig {
    /// Start a builder from the defaults
    pub fn builder() -> FileLoggerConfigBuilder {
        FileLoggerConfigBuilder::new()
    }

    /// Check the settings that cannot be recovered from
    pub fn validate(&self) -> Result<()> {
        if self.path.file_name().is_none() {
            return Err(Error::Configuration(format!(
                "log path {} has no file name",
                self.path.display()
            )));
        }
        if self.formats.is_empty() {
            return Err(Error::Configuration(
                "at least one log format is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`FileLoggerConfig`]
#[derive(Debug, Clone, Default)]
pub struct FileLoggerConfigBuilder {
    config: FileLoggerConfig,
}

impl FileLoggerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the size limit in bytes
    pub fn max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.config.max_size_bytes = max_size_bytes;
        self
    }

    /// Set the rollover schedule
    pub fn rotation(mut self, rotation: RotationInterval) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Use UTC for scheduling and archive names
    pub fn utc(mut self, utc: bool) -> Self {
        self.config.utc = utc;
        self
    }

    /// Set how many archives to keep
    pub fn retention_count(mut self, retention_count: usize) -> Self {
        self.config.retention_count = retention_count;
        self
    }

    /// Defer creating the file until the first write
    pub fn lazy_open(mut self, lazy_open: bool) -> Self {
        self.config.lazy_open = lazy_open;
        self
    }

    /// Set the minimum level
    pub fn min_level(mut self, level: Level) -> Self {
        self.config.min_level = level;
        self
    }

    /// Set the per-severity templates
    pub fn formats(mut self, formats: FormatSpec) -> Self {
        self.config.formats = formats;
        self
    }

    /// Render timestamps in UTC
    pub fn formatter_utc(mut self, formatter_utc: bool) -> Self {
        self.config.formatter_utc = formatter_utc;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<FileLoggerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
