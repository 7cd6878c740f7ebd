//! Error types shared across crates and the logging bootstrap

pub mod logging;
pub mod types;

pub use logging::LoggingTransformer;
pub use types::{ElevationError, UnsupportedPlatform};
