//! Error types for file-based logging

use hourglass_logger::TemplateError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for file logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Step of a rotation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStage {
    /// Flushing and closing the current file
    Close,
    /// Removing an archive that already had the target name
    RemoveExisting,
    /// Renaming the current file to its archive name
    Rename,
    /// Opening a fresh current file
    Reopen,
}

impl fmt::Display for RotationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Close => "close",
            Self::RemoveExisting => "remove existing archive",
            Self::Rename => "rename",
            Self::Reopen => "reopen",
        })
    }
}

/// Error types that can occur during file logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to create log directory
    #[error("Failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The path that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to open the current log file
    #[error("Failed to open log file {path}: {source}")]
    Open {
        /// The file that could not be opened
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to rotate log file; the sink is closed afterwards
    #[error("Failed to rotate log file {path} ({stage}): {source}")]
    Rotation {
        /// Which step failed
        stage: RotationStage,
        /// The file the step operated on
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to delete an archive beyond the retention count
    #[error("Failed to prune {path}: {source}")]
    Prune {
        /// The archive (or directory, for listing failures)
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// The sink was shut down or closed by an earlier rotation failure
    #[error("Log sink is closed")]
    Closed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid line template
    #[error("Invalid log format: {0}")]
    Template(#[from] TemplateError),

    /// Settings file could not be parsed
    #[error("Failed to parse logging settings: {0}")]
    Settings(#[from] toml::de::Error),
}
