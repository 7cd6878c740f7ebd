//! Shared infrastructure for the locom crates
//!
//! This crate provides the pieces every other locom crate leans on:
//! - Logging bootstrap on top of `env_logger`
//! - Platform detection for the three supported operating systems
//! - Subprocess helpers for interactive and captured commands
//! - The [`ElevationStrategy`] capability used for privileged writes

pub mod elevation;
pub mod error;
pub mod platform;
pub mod process;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use elevation::{ElevationStrategy, RunAsElevation, SudoElevation, SystemElevation};
pub use error::logging::{self, LoggingTransformer};
pub use error::{ElevationError, UnsupportedPlatform};
pub use platform::Platform;
