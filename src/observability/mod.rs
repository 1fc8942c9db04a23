//! Observability module
//!
//! Structured logging for `stubchaos` runs. Diagnostics go to stderr so
//! command results on stdout stay machine-readable.

pub mod logging;

pub use logging::{LogFormat, init_logging};
