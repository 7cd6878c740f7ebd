//! Core error types

use thiserror::Error;

/// Failure while running a command with elevated privileges
#[derive(Debug, Error)]
pub enum ElevationError {
    /// The privilege prompt was declined or the elevated command exited non-zero
    #[error("elevated command `{command}` was denied or failed ({status})")]
    Denied {
        /// Rendered command line
        command: String,
        /// Exit status as reported by the OS
        status: String,
    },

    /// The helper program needed to elevate or to perform the action is not installed
    #[error("required helper `{helper}` was not found on PATH")]
    HelperMissing {
        /// Program name that failed to spawn
        helper: String,
    },

    /// Spawning or waiting on the helper failed for another reason
    #[error("failed to run `{command}`")]
    Io {
        /// Rendered command line
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ElevationError {
    /// True when the user (or policy) refused the elevated action
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// The running (or requested) operating system has no trust-store or hosts support
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported platform: {0}")]
pub struct UnsupportedPlatform(pub String);
