use hourglass_logger::{Level, LoggerExt};
use hourglass_logger_file::{
    ConfigWarning, Error, LoggerService, LoggingSettings, RotationInterval, RotationUnit,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

fn toml_settings(dir: &std::path::Path) -> LoggingSettings {
    let source = format!(
        r#"
name = "cv_api"

[file]
directory = "{}"
file_name = "api.log"
max_size_bytes = 2048
rotation = "midnight"
retention_count = 5
utc = true
level = "info"

[console]
level = "warning"
"#,
        dir.display()
    );
    LoggingSettings::from_toml_str(&source).unwrap()
}

#[test]
fn test_settings_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let settings = toml_settings(dir.path());

    assert_eq!(settings.name, "cv_api");
    assert!(settings.console.enabled);

    let config = settings.file.to_config();
    assert!(config.warnings.is_empty());
    let config = config.value;
    assert_eq!(config.path, dir.path().join("api.log"));
    assert_eq!(config.max_size_bytes, 2048);
    assert_eq!(config.rotation, RotationInterval::new(RotationUnit::Midnight, 1));
    assert_eq!(config.retention_count, 5);
    assert_eq!(config.min_level, Level::Info);
    assert!(config.utc);
    assert_eq!(settings.console.resolve_level().value, Level::Warn);
}

#[test]
fn test_malformed_toml_is_an_error() {
    let result = LoggingSettings::from_toml_str("[file]\nmax_size_bytes = \"lots\"\n");
    assert!(matches!(result, Err(Error::Settings(_))));
}

#[test]
fn test_environment_overrides_toml() {
    let dir = tempfile::tempdir().unwrap();
    let vars: HashMap<&str, &str> = [
        ("FILE_LOG_LEVEL", "ERROR"),
        ("LOG_ROTATION", "H"),
        ("LOG_RETENTION_COUNT", "many"),
    ]
    .into_iter()
    .collect();

    let resolved = toml_settings(dir.path()).overlay(|key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(resolved.value.file.level.as_deref(), Some("ERROR"));
    assert_eq!(resolved.value.file.rotation, "H");
    assert_eq!(resolved.value.file.retention_count, 5);
    assert_eq!(
        resolved.warnings,
        vec![ConfigWarning::Invalid {
            setting: "LOG_RETENTION_COUNT",
            value: "many".to_string(),
            fallback: "5".to_string(),
        }]
    );
}

#[test]
fn test_service_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let console = SharedBuf::default();
    let service = LoggerService::with_console(&toml_settings(dir.path()), console.clone()).unwrap();

    let logger = service.logger();
    logger.debug("cache warm");
    logger.info("ready");
    let db = service.child("db");
    hourglass_logger::error!(db, "connection {}", "refused");

    let subscriber = tracing_subscriber::registry().with(service.tracing_bridge("uvicorn"));
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(target: "uvicorn.error", "Invalid HTTP request received");
    });
    service.shutdown().unwrap();

    let file = std::fs::read_to_string(dir.path().join("api.log")).unwrap();
    let lines: Vec<&str> = file.lines().collect();
    assert_eq!(lines.len(), 3, "{file}");
    assert!(lines[0].ends_with(" - cv_api - INFO - ready"));
    assert!(lines[1].contains(" - cv_api.db - ERROR - ["));
    assert!(lines[1].ends_with("] connection refused"));
    assert!(lines[2].ends_with(" - cv_api.uvicorn - WARN - Invalid HTTP request received"));

    let console = console.text();
    assert!(!console.contains("ready"));
    assert!(console.contains(" - cv_api.db - ERROR - connection refused\n"));
    assert!(console.contains(" - cv_api.uvicorn - WARN - Invalid HTTP request received\n"));
}

#[test]
fn test_disabled_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = toml_settings(dir.path());
    settings.file.enabled = false;
    settings.console.enabled = false;

    let service = LoggerService::new(&settings).unwrap();
    service.logger().critical("into the void");

    assert!(service.file_sink().is_none());
    assert!(!dir.path().join("api.log").exists());
    service.shutdown().unwrap();
}

#[test]
fn test_oversized_rotation_interval_falls_back_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = toml_settings(dir.path());
    settings.file.rotation = "D".to_string();
    settings.file.interval = 200_000_000;
    let console = SharedBuf::default();

    let service = LoggerService::with_console(&settings, console.clone()).unwrap();

    assert_eq!(
        service.warnings(),
        &[ConfigWarning::Invalid {
            setting: "LOG_ROTATION_INTERVAL",
            value: "200000000".to_string(),
            fallback: "36600".to_string(),
        }]
    );
    let file = service.file_sink().unwrap();
    assert_eq!(file.state(), hourglass_logger_file::SinkState::Open);
    assert!(console.text().contains("LOG_ROTATION_INTERVAL has invalid value \"200000000\""));
}

