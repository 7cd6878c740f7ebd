//! TLS error types

use std::path::{Path, PathBuf};

use locom_common::{ElevationError, UnsupportedPlatform};

/// Errors raised while generating, fingerprinting or trusting certificates
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// Random RSA key generation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Building or signing an X.509 certificate failed
    #[error("certificate creation failed: {0}")]
    CertificateCreation(String),

    /// A directory or file could not be created, read or written
    #[error("filesystem operation on {} failed: {source}", path.display())]
    Filesystem {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Input is not a PEM encoded certificate
    #[error("could not decode certificate: {0}")]
    Decode(String),

    /// No trust store exists for this operating system
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    /// Privileged helper was denied, missing or failed
    #[error(transparent)]
    Elevation(#[from] ElevationError),

    /// The proxy TLS snippet could not be serialized
    #[error("rendering proxy TLS config failed: {0}")]
    Render(#[from] serde_yaml::Error),

    /// The CA certificate has not been generated yet
    #[error("CA certificate not found at {}; run `locom cert selfsigned setup` first", path.display())]
    CaNotFound {
        /// Expected CA certificate path
        path: PathBuf,
    },
}

impl TlsError {
    pub(crate) fn filesystem(path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for this crate
pub type Result<T> = std::result::Result<T, TlsError>;
