//! Shared utilities for the CV_UP service.

pub mod logging;

pub use logging::{init_tracing, LogFormat, LoggingError};
