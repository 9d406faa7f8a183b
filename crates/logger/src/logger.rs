//! Core logger trait

use crate::{Context, Level, Record};
use std::borrow::Cow;
use std::sync::Arc;

/// A logger handle. Handles are passed explicitly to whatever logs;
/// there is no process-wide registry.
pub trait Logger: Send + Sync + 'static {
    /// Log a record
    fn log(&self, record: Record<'_>);

    /// Flush any buffered logs
    fn flush(&self);

    /// Check if a level is enabled (for fast filtering)
    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }

    /// Create a child logger with additional context.
    ///
    /// The child writes to the same underlying sink(s) as its parent.
    fn with_context(&self, context: Context) -> Arc<dyn Logger>;
}

/// Extension trait for convenient logging methods
pub trait LoggerExt: Logger {
    /// Log a message at the given level
    #[inline]
    fn log_message(&self, level: Level, msg: impl Into<Cow<'static, str>>) {
        if self.is_enabled(level) {
            self.log(Record::new(level, msg));
        }
    }

    /// Log a critical failure
    #[inline]
    fn critical(&self, msg: impl Into<Cow<'static, str>>) {
        self.log_message(Level::Critical, msg);
    }

    /// Log an error
    #[inline]
    fn error(&self, msg: impl Into<Cow<'static, str>>) {
        self.log_message(Level::Error, msg);
    }

    /// Log a warning
    #[inline]
    fn warn(&self, msg: impl Into<Cow<'static, str>>) {
        self.log_message(Level::Warn, msg);
    }

    /// Log info
    #[inline]
    fn info(&self, msg: impl Into<Cow<'static, str>>) {
        self.log_message(Level::Info, msg);
    }

    /// Log debug
    #[inline]
    fn debug(&self, msg: impl Into<Cow<'static, str>>) {
        self.log_message(Level::Debug, msg);
    }

    /// Log trace
    #[inline]
    fn trace(&self, msg: impl Into<Cow<'static, str>>) {
        self.log_message(Level::Trace, msg);
    }
}

// Implement for all loggers
impl<T: Logger + ?Sized> LoggerExt for T {}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _record: Record<'_>) {}

    fn flush(&self) {}

    #[inline]
    fn is_enabled(&self, _level: Level) -> bool {
        false
    }

    fn with_context(&self, _context: Context) -> Arc<dyn Logger> {
        Arc::new(Self)
    }
}

/// Log through an explicit handle, capturing module, file and line.
///
/// ```
/// use hourglass_logger::{Level, NoOpLogger, log};
///
/// let logger = NoOpLogger;
/// log!(logger, Level::Info, "listening on port {}", 8080);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let __logger = &$logger;
        let __level: $crate::Level = $level;
        if __logger.is_enabled(__level) {
            __logger.log(
                $crate::Record::new(__level, ::std::format!($($arg)+))
                    .with_target(::std::module_path!())
                    .with_location(::std::file!(), ::std::line!()),
            );
        }
    }};
}

/// Log a critical failure through an explicit handle
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Critical, $($arg)+) };
}

/// Log an error through an explicit handle
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Error, $($arg)+) };
}

/// Log a warning through an explicit handle
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Warn, $($arg)+) };
}

/// Log info through an explicit handle
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Info, $($arg)+) };
}

/// Log debug through an explicit handle
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Debug, $($arg)+) };
}

/// Log trace through an explicit handle
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Trace, $($arg)+) };
}
