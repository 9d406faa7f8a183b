//! Raw logging settings: TOML file plus environment overrides
//!
//! Settings are kept as written and resolved into typed values when the
//! sinks are built. A value that is missing or cannot be understood falls
//! back to its default and yields a [`ConfigWarning`] instead of an error.

use crate::config::{FileLoggerConfig, default_file_formats};
use crate::error::Result;
use crate::rollover::{RotationInterval, RotationUnit};
use hourglass_logger::Level;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Threshold used when a sink's level is missing or invalid
pub const DEFAULT_LEVEL: Level = Level::Debug;

/// A setting that fell back to its default
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    /// The setting was not provided
    #[error("{setting} not set; using {fallback}")]
    Missing {
        /// Setting (environment variable) name
        setting: &'static str,
        /// Value used instead
        fallback: String,
    },

    /// The setting could not be parsed
    #[error("{setting} has invalid value {value:?}; using {fallback}")]
    Invalid {
        /// Setting (environment variable) name
        setting: &'static str,
        /// The rejected value
        value: String,
        /// Value used instead
        fallback: String,
    },
}

/// A resolved value and the fallbacks taken to get it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The value to use
    pub value: T,
    /// Why (if at all) defaults were used
    pub warnings: Vec<ConfigWarning>,
}

impl<T> Resolved<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }
}

/// Top-level logging settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Name of the root logger
    pub name: String,
    /// Rotating file sink
    pub file: FileSettings,
    /// Console (stderr) sink
    pub console: ConsoleSettings,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            file: FileSettings::default(),
            console: ConsoleSettings::default(),
        }
    }
}

/// File sink settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Whether to write a log file at all
    pub enabled: bool,
    /// Directory holding the log file and its archives (`LOG_DIR`)
    pub directory: PathBuf,
    /// Name of the current log file
    pub file_name: String,
    /// Size limit in bytes, 0 disables (`LOG_MAX_SIZE_BYTES`)
    pub max_size_bytes: u64,
    /// Rotation unit code such as `D`, `H`, `MIDNIGHT` or `W0` (`LOG_ROTATION`)
    pub rotation: String,
    /// Units per rotation (`LOG_ROTATION_INTERVAL`)
    pub interval: u32,
    /// Schedule, name and timestamp in UTC (`LOG_UTC`)
    pub utc: bool,
    /// Archives to keep (`LOG_RETENTION_COUNT`)
    pub retention_count: usize,
    /// Create the file on first write
    pub lazy_open: bool,
    /// Threshold level name (`FILE_LOG_LEVEL`)
    pub level: Option<String>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("logs"),
            file_name: "app.log".to_string(),
            max_size_bytes: 10_000_000,
            rotation: "D".to_string(),
            interval: 1,
            utc: false,
            retention_count: 10,
            lazy_open: false,
            level: None,
        }
    }
}

/// Console sink settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Whether to log to stderr
    pub enabled: bool,
    /// Threshold level name (`CONSOLE_LOG_LEVEL`)
    pub level: Option<String>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: None,
        }
    }
}

fn resolve_level(setting: &'static str, raw: Option<&str>) -> Resolved<Level> {
    let fallback = DEFAULT_LEVEL.to_string();
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Resolved {
            value: DEFAULT_LEVEL,
            warnings: vec![ConfigWarning::Missing { setting, fallback }],
        },
        Some(raw) => match raw.parse::<Level>() {
            Ok(level) => Resolved::clean(level),
            Err(_) => Resolved {
                value: DEFAULT_LEVEL,
                warnings: vec![ConfigWarning::Invalid {
                    setting,
                    value: raw.to_string(),
                    fallback,
                }],
            },
        },
    }
}

impl FileSettings {
    /// Path of the current log file
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Threshold, DEBUG when missing or invalid
    pub fn resolve_level(&self) -> Resolved<Level> {
        resolve_level("FILE_LOG_LEVEL", self.level.as_deref())
    }

    /// Rotation schedule; an unknown unit becomes daily, an interval of 0
    /// becomes 1 and an interval past a century is cut down to one
    pub fn resolve_rotation(&self) -> Resolved<RotationInterval> {
        let mut warnings = Vec::new();
        let unit = self.rotation.parse::<RotationUnit>().unwrap_or_else(|_| {
            warnings.push(ConfigWarning::Invalid {
                setting: "LOG_ROTATION",
                value: self.rotation.clone(),
                fallback: RotationUnit::Days.to_string(),
            });
            RotationUnit::Days
        });
        let max = RotationInterval::max_magnitude(unit);
        let magnitude = match self.interval {
            0 => 1,
            n if n > max => max,
            n => n,
        };
        if magnitude != self.interval {
            warnings.push(ConfigWarning::Invalid {
                setting: "LOG_ROTATION_INTERVAL",
                value: self.interval.to_string(),
                fallback: magnitude.to_string(),
            });
        }
        Resolved {
            value: RotationInterval::new(unit, magnitude),
            warnings,
        }
    }

    /// Typed sink configuration with the default file templates
    pub fn to_config(&self) -> Resolved<FileLoggerConfig> {
        let level = self.resolve_level();
        let rotation = self.resolve_rotation();
        let mut warnings = level.warnings;
        warnings.extend(rotation.warnings);

        Resolved {
            value: FileLoggerConfig {
                path: self.path(),
                max_size_bytes: self.max_size_bytes,
                rotation: rotation.value,
                utc: self.utc,
                retention_count: self.retention_count,
                lazy_open: self.lazy_open,
                min_level: level.value,
                formats: default_file_formats(),
                formatter_utc: self.utc,
            },
            warnings,
        }
    }
}

impl ConsoleSettings {
    /// Threshold, DEBUG when missing or invalid
    pub fn resolve_level(&self) -> Resolved<Level> {
        resolve_level("CONSOLE_LOG_LEVEL", self.level.as_deref())
    }
}

impl LoggingSettings {
    /// Parse settings from TOML; absent keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Defaults overridden by whatever `lookup` knows
    pub fn from_lookup<F>(lookup: F) -> Resolved<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay(lookup)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Resolved<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` (environment variable names as keys).
    /// Unparseable numbers and booleans are ignored with a warning.
    pub fn overlay<F>(mut self, lookup: F) -> Resolved<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(level) = lookup("FILE_LOG_LEVEL") {
            self.file.level = Some(level);
        }
        if let Some(level) = lookup("CONSOLE_LOG_LEVEL") {
            self.console.level = Some(level);
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.file.directory = PathBuf::from(dir);
        }
        if let Some(rotation) = lookup("LOG_ROTATION") {
            self.file.rotation = rotation;
        }
        let file = &mut self.file;
        override_parsed(&lookup, "LOG_MAX_SIZE_BYTES", &mut file.max_size_bytes, &mut warnings);
        override_parsed(&lookup, "LOG_RETENTION_COUNT", &mut file.retention_count, &mut warnings);
        override_parsed(&lookup, "LOG_ROTATION_INTERVAL", &mut file.interval, &mut warnings);
        if let Some(raw) = lookup("LOG_UTC") {
            match parse_bool(&raw) {
                Some(utc) => self.file.utc = utc,
                None => warnings.push(ConfigWarning::Invalid {
                    setting: "LOG_UTC",
                    value: raw,
                    fallback: self.file.utc.to_string(),
                }),
            }
        }

        Resolved {
            value: self,
            warnings,
        }
    }
}

fn override_parsed<F, T>(
    lookup: &F,
    setting: &'static str,
    target: &mut T,
    warnings: &mut Vec<ConfigWarning>,
) where
    F: Fn(&str) -> Option<String>,
    T: FromStr + ToString,
{
    let Some(raw) = lookup(setting) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warnings.push(ConfigWarning::Invalid {
            setting,
            value: raw,
            fallback: target.to_string(),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
