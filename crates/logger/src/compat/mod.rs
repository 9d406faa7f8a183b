//! Compatibility bridges for other logging crates

#[cfg(feature = "tracing-compat")]
pub mod tracing_bridge;

#[cfg(feature = "tracing-compat")]
pub use tracing_bridge::TracingBridge;
