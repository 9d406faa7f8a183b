//! Test support utilities
//!
//! This module provides utilities for capturing logs during tests.
//! It's only available in this crate's tests or when the `test-support`
//! feature is enabled.

use crate::{Context, Level, Logger, Record};
use parking_lot::Mutex;
use std::fmt::Write as FmtWrite;
use std::sync::Arc;

/// A captured record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    /// Level of the record
    pub level: Level,
    /// Logger name the record was emitted under
    pub name: String,
    /// Message text
    pub message: String,
}

/// A logger that captures all logs in memory for testing
#[derive(Clone)]
pub struct CaptureLogger {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
    min_level: Level,
    context: Context,
}

impl CaptureLogger {
    /// Create a new capture logger
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            min_level: Level::Trace,
            context: Context::new("test"),
        }
    }

    /// Create with a specific level
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Captured records, oldest first
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    /// All captured logs as `<LEVEL> [<name>] <message>` lines
    pub fn logs(&self) -> String {
        let mut out = String::new();
        for record in self.records.lock().iter() {
            let _ = writeln!(out, "{} [{}] {}", record.level, record.name, record.message);
        }
        out
    }

    /// Clear captured logs
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Check if logs contain a specific string
    pub fn contains(&self, text: &str) -> bool {
        self.logs().contains(text)
    }
}

impl Default for CaptureLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, record: Record<'_>) {
        if !self.is_enabled(record.level) {
            return;
        }

        let name = record
            .context
            .map_or_else(|| self.context.name.clone(), |ctx| ctx.name.clone());

        self.records.lock().push(CapturedRecord {
            level: record.level,
            name,
            message: record.message.into_owned(),
        });
    }

    fn flush(&self) {
        // No-op for in-memory logger
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn with_context(&self, context: Context) -> Arc<dyn Logger> {
        Arc::new(CaptureLogger {
            records: self.records.clone(),
            min_level: self.min_level,
            context: self.context.merge(&context),
        })
    }
}
