//! Hosts and verification errors

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use locom_common::ElevationError;
use thiserror::Error;

/// Hosts file editing errors
#[derive(Debug, Error)]
pub enum HostsError {
    /// Reading, staging or writing a file failed
    #[error("filesystem operation on {} failed: {source}", path.display())]
    Filesystem {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The elevated copy was denied or its helper is missing
    #[error(transparent)]
    Elevation(#[from] ElevationError),

    /// Address, suffix or project name cannot be written as a hosts entry
    #[error("invalid hosts entry: {0}")]
    InvalidEntry(String),
}

impl HostsError {
    pub(crate) fn filesystem(path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Advisory verification failures; never fatal to a hosts update
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The resolver returned an error
    #[error("DNS resolution failed for {hostname}: {source}")]
    DnsResolution {
        /// Name looked up
        hostname: String,
        /// Resolver error
        #[source]
        source: std::io::Error,
    },

    /// The name resolved, but not to the bind address
    #[error("DNS {hostname} resolved to {resolved:?}, expected {expected}")]
    AddressMismatch {
        /// Name looked up
        hostname: String,
        /// Bind address written to the hosts file
        expected: IpAddr,
        /// Addresses actually returned
        resolved: Vec<IpAddr>,
    },
}

/// Result alias for hosts operations
pub type Result<T> = std::result::Result<T, HostsError>;
