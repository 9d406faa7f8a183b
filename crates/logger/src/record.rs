//! Log record type

use crate::{Context, Level};
use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// A log record. Built once by the emitter, read-only for sinks.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// Log level
    pub level: Level,
    /// The log message
    pub message: Cow<'a, str>,
    /// When the record was created
    pub timestamp: DateTime<Utc>,
    /// Target module
    pub target: &'static str,
    /// Source file
    pub file: Option<&'static str>,
    /// Source line
    pub line: Option<u32>,
    /// Context of the emitting handle
    pub context: Option<&'a Context>,
}

impl<'a> Record<'a> {
    /// Create a new record stamped with the current time
    #[inline]
    pub fn new(level: Level, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            target: module_path!(),
            file: None,
            line: None,
            context: None,
        }
    }

    /// Builder-style method for setting target
    #[inline]
    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = target;
        self
    }

    /// Builder-style method for setting location
    #[inline]
    pub fn with_location(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// Builder-style method for setting context
    #[inline]
    pub fn with_context(mut self, context: &'a Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Builder-style method for overriding the timestamp
    #[inline]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Logger name: the context name, or the target when there is none
    pub fn logger_name(&self) -> &str {
        self.context
            .map(|ctx| ctx.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_name_prefers_context() {
        let ctx = Context::new("app.http");
        let record = Record::new(Level::Info, "hi").with_target("my_crate::server");
        assert_eq!(record.logger_name(), "my_crate::server");

        let record = record.with_context(&ctx);
        assert_eq!(record.logger_name(), "app.http");

        let unnamed = Context::new("");
        let record = record.with_context(&unnamed);
        assert_eq!(record.logger_name(), "my_crate::server");
    }

    #[test]
    fn test_location_builder() {
        let record = Record::new(Level::Debug, String::from("owned")).with_location("src/a.rs", 7);
        assert_eq!(record.file, Some("src/a.rs"));
        assert_eq!(record.line, Some(7));
        assert_eq!(record.message, "owned");
    }
}
