//! Fan-out logger: one handle, several sinks

use crate::{Context, Level, Logger, Record};
use std::sync::Arc;

/// Sends every record to each sink; each sink applies its own threshold
#[derive(Clone, Default)]
pub struct MultiLogger {
    sinks: Vec<Arc<dyn Logger>>,
}

impl MultiLogger {
    /// Create an empty fan-out
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with_sink(mut self, sink: Arc<dyn Logger>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no sinks
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Logger for MultiLogger {
    fn log(&self, record: Record<'_>) {
        for sink in &self.sinks {
            if sink.is_enabled(record.level) {
                sink.log(record.clone());
            }
        }
    }

    fn flush(&self) {
        for sink in &self.sinks {
            sink.flush();
        }
    }

    fn is_enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|sink| sink.is_enabled(level))
    }

    fn with_context(&self, context: Context) -> Arc<dyn Logger> {
        Arc::new(Self {
            sinks: self
                .sinks
                .iter()
                .map(|sink| sink.with_context(context.clone()))
                .collect(),
        })
    }
}
