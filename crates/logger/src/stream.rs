//! Stream logger for console output

use crate::{Context, Level, LevelFormatter, LogFormatter, Logger, Record};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

type SharedStream = Arc<Mutex<Box<dyn Write + Send>>>;

/// Logger that writes formatted lines to a stream (stderr by default)
pub struct StreamLogger {
    context: Context,
    /// Minimum log level
    min_level: Level,
    formatter: Arc<dyn LogFormatter>,
    /// Lock for the stream (to prevent interleaving)
    stream: SharedStream,
}

impl StreamLogger {
    /// Create a logger writing to stderr
    pub fn stderr(formatter: LevelFormatter) -> Self {
        Self::new(io::stderr(), formatter)
    }

    /// Create a logger writing to any stream
    pub fn new(stream: impl Write + Send + 'static, formatter: LevelFormatter) -> Self {
        Self {
            context: Context::new(""),
            min_level: Level::Trace,
            formatter: Arc::new(formatter),
            stream: Arc::new(Mutex::new(Box::new(stream))),
        }
    }

    /// Drop records below `level`
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Set the context records are tagged with
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Minimum level this logger emits
    pub fn level(&self) -> Level {
        self.min_level
    }

    fn write_line(&self, record: &Record<'_>) -> io::Result<()> {
        let mut line = self.formatter.format(record);
        line.push('\n');

        let mut stream = self.stream.lock();
        stream.write_all(line.as_bytes())?;
        stream.flush()
    }
}

impl Logger for StreamLogger {
    fn log(&self, record: Record<'_>) {
        if !self.is_enabled(record.level) {
            return;
        }

        let record = if record.context.is_none() {
            record.with_context(&self.context)
        } else {
            record
        };

        if let Err(e) = self.write_line(&record) {
            tracing::warn!(error = %e, "Failed to write log line to stream");
        }
    }

    fn flush(&self) {
        if let Err(e) = self.stream.lock().flush() {
            tracing::warn!(error = %e, "Failed to flush stream");
        }
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn with_context(&self, context: Context) -> Arc<dyn Logger> {
        Arc::new(StreamLogger {
            context: self.context.merge(&context),
            min_level: self.min_level,
            formatter: self.formatter.clone(),
            stream: self.stream.clone(),
        })
    }
}
