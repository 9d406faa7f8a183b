//! Application logging service: one named handle over a rotating file sink
//! and a console sink

use crate::config::default_console_formats;
use crate::error::Result;
use crate::settings::{ConfigWarning, LoggingSettings};
use crate::sink::RotatingFileLogger;
use hourglass_logger::compat::TracingBridge;
use hourglass_logger::{
    Context, LevelFormatter, Logger, LoggerExt, MultiLogger, StreamLogger,
};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;

/// Owns the sinks built from [`LoggingSettings`] and hands out loggers
pub struct LoggerService {
    root: Arc<dyn Logger>,
    file: Option<RotatingFileLogger>,
    warnings: Vec<ConfigWarning>,
}

impl LoggerService {
    /// Build the sinks, logging to stderr on the console side
    pub fn new(settings: &LoggingSettings) -> Result<Self> {
        Self::assemble(settings, Vec::new(), io::stderr())
    }

    /// Build from defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        let resolved = LoggingSettings::from_env();
        Self::assemble(&resolved.value, resolved.warnings, io::stderr())
    }

    /// Build with the console sink writing to `console`
    pub fn with_console(
        settings: &LoggingSettings,
        console: impl Write + Send + 'static,
    ) -> Result<Self> {
        Self::assemble(settings, Vec::new(), console)
    }

    fn assemble(
        settings: &LoggingSettings,
        mut warnings: Vec<ConfigWarning>,
        console: impl Write + Send + 'static,
    ) -> Result<Self> {
        let context = Context::new(settings.name.clone());
        let mut root = MultiLogger::new();
        let mut file = None;

        if settings.file.enabled {
            let config = settings.file.to_config();
            warnings.extend(config.warnings);
            let sink = RotatingFileLogger::builder(config.value)
                .context(context.clone())
                .build()?;
            root = root.with_sink(Arc::new(sink.clone()));
            file = Some(sink);
        }

        if settings.console.enabled {
            let level = settings.console.resolve_level();
            warnings.extend(level.warnings);
            let formatter =
                LevelFormatter::new(&default_console_formats())?.with_utc(settings.file.utc);
            let sink = StreamLogger::new(console, formatter)
                .with_level(level.value)
                .with_context(context);
            root = root.with_sink(Arc::new(sink));
        }

        let root: Arc<dyn Logger> = Arc::new(root);
        for warning in &warnings {
            warn!(%warning, "Logging setting fell back to its default");
            root.warn(warning.to_string());
        }

        Ok(Self {
            root,
            file,
            warnings,
        })
    }

    /// The root logger
    pub fn logger(&self) -> Arc<dyn Logger> {
        self.root.clone()
    }

    /// A logger named `<root>.<name>` writing to the same sinks
    pub fn child(&self, name: &str) -> Arc<dyn Logger> {
        self.root.with_context(Context::new(name))
    }

    /// Layer forwarding `tracing` events from other crates into the sinks
    /// under the logger name `<root>.<name>`
    pub fn tracing_bridge<S>(&self, name: &str) -> TracingBridge<S> {
        TracingBridge::new(self.child(name))
    }

    /// The rotating file sink, when enabled
    pub fn file_sink(&self) -> Option<&RotatingFileLogger> {
        self.file.as_ref()
    }

    /// Settings that fell back to defaults while building
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// Flush everything and close the file sink
    pub fn shutdown(&self) -> Result<()> {
        self.root.flush();
        match &self.file {
            Some(file) => file.shutdown(),
            None => Ok(()),
        }
    }
}
