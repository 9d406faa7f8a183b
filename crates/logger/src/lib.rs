//! Explicit-handle logging core for hourglass
//!
//! Loggers are plain values passed to the code that logs; there is no global
//! registry. This crate provides:
//! - The [`Logger`] trait and the [`LoggerExt`] convenience methods
//! - Level-aware formatting: one template per severity band ([`LevelFormatter`])
//! - A console sink ([`StreamLogger`]) and a fan-out ([`MultiLogger`])
//! - Dotted child contexts (`app` -> `app.http`)
//! - A `tracing` bridge so third-party crates land in the same sinks

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod context;
mod formatter;
mod level;
mod logger;
mod multi;
mod record;
mod stream;

pub mod compat;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use context::Context;
pub use formatter::{
    FormatSpec, LevelFormatter, LogFormatter, TIMESTAMP_FORMAT, Template, TemplateError,
};
pub use level::{Level, ParseLevelError};
pub use logger::{Logger, LoggerExt, NoOpLogger};
pub use multi::MultiLogger;
pub use record::Record;
pub use stream::StreamLogger;
