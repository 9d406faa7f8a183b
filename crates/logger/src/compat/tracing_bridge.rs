//! Bridge from tracing to hourglass loggers
//!
//! Libraries that emit through `tracing` (web servers, HTTP clients, ...) can
//! be routed into the same sinks as the application's own handles by adding a
//! [`TracingBridge`] layer to the subscriber.

use crate::{Context, Level, Logger, Record};
use std::fmt::Write;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{Event, Subscriber, field::Visit};
use tracing_subscriber::{Layer, layer::Context as LayerContext, registry::LookupSpan};

/// Targets that are never forwarded. The sinks report their own failures
/// through `tracing`; forwarding those back into a sink would re-enter it.
const IGNORED_TARGET_PREFIXES: &[&str] = &["hourglass_logger"];

/// A tracing layer that forwards events to a logger handle
pub struct TracingBridge<S> {
    logger: Arc<dyn Logger>,
    context: Context,
    _phantom: PhantomData<fn(S)>,
}

impl<S> TracingBridge<S> {
    /// Forward events to `logger`, naming them after their target
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            context: Context::new(""),
            _phantom: PhantomData,
        }
    }

    /// Forward events under a fixed logger name instead of their target
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.context = Context::new(name);
        self
    }

    fn is_ignored(target: &str) -> bool {
        IGNORED_TARGET_PREFIXES
            .iter()
            .any(|prefix| target.starts_with(prefix))
    }
}

impl<S> Layer<S> for TracingBridge<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: LayerContext<'_, S>) {
        let metadata = event.metadata();
        if Self::is_ignored(metadata.target()) {
            return;
        }

        // Map tracing levels to our levels
        let level = match *metadata.level() {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Trace,
        };

        // Skip if not enabled
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let spans: Vec<&str> = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|span| span.name()).collect())
            .unwrap_or_default();

        let body = visitor.finish();
        let message = if spans.is_empty() {
            body
        } else {
            format!("{}: {}", spans.join("::"), body)
        };

        let mut record = Record::new(level, message).with_target(metadata.target());
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            record = record.with_location(file, line);
        }
        if !self.context.name.is_empty() {
            record = record.with_context(&self.context);
        }

        self.logger.log(record);
    }
}

/// Visitor to extract the message and `key=value` fields from an event
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: impl std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }

    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push_field(field.name(), value);
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push_field(field.name(), value);
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push_field(field.name(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CaptureLogger;
    use tracing_subscriber::prelude::*;

    fn with_bridge(capture: &CaptureLogger, name: Option<&str>, f: impl FnOnce()) {
        let mut bridge = TracingBridge::new(Arc::new(capture.clone()));
        if let Some(name) = name {
            bridge = bridge.with_name(name);
        }
        let subscriber = tracing_subscriber::registry().with(bridge);
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_events_are_forwarded_with_fields() {
        let capture = CaptureLogger::new();
        with_bridge(&capture, None, || {
            tracing::error!("Error from tracing");
            tracing::info!(count = 42, "Message with field");
        });

        let logs = capture.logs();
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("Error from tracing"));
        assert!(logs.contains("Message with field count=42"));
    }

    #[test]
    fn test_span_names_prefix_the_message() {
        let capture = CaptureLogger::new();
        with_bridge(&capture, Some("server"), || {
            let span = tracing::info_span!("request");
            let _enter = span.enter();
            tracing::info!("Inside span");
        });

        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "server");
        assert_eq!(records[0].message, "request: Inside span");
    }

    #[test]
    fn test_own_diagnostics_are_not_forwarded() {
        let capture = CaptureLogger::new();
        with_bridge(&capture, None, || {
            tracing::warn!(target: "hourglass_logger_file::sink", "rotation failed");
            tracing::warn!(target: "web::server", "slow request");
        });

        assert!(!capture.contains("rotation failed"));
        assert!(capture.contains("slow request"));
    }

    #[test]
    fn test_level_filter_of_target_logger_applies() {
        let capture = CaptureLogger::new().with_level(Level::Warn);
        with_bridge(&capture, None, || {
            tracing::debug!("noise");
            tracing::warn!("signal");
        });

        assert!(!capture.contains("noise"));
        assert!(capture.contains("signal"));
    }
}
