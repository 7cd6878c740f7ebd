//! OS trust-store integration
//!
//! One [`TrustStoreAdapter`] per platform, selected once through
//! [`TrustStore::select`]. Every privileged step goes through the injected
//! [`ElevationStrategy`].

mod keychain;
mod linux;
mod windows;

use std::path::Path;

use locom_common::{ElevationStrategy, Platform};

pub use keychain::{KeychainTrustStore, SYSTEM_KEYCHAIN};
pub use linux::{LinuxBundleTrustStore, CA_ANCHORS_DIR, INSTALLED_CA_NAME, NSS_NICKNAME};
pub use windows::WindowsUserTrustStore;

use crate::certificate;
use crate::errors::{Result, TlsError};

/// Result of a trust or untrust call
///
/// Best-effort steps that failed are reported here instead of as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustReport {
    /// Human readable warnings from best-effort steps
    pub warnings: Vec<String>,
}

impl TrustReport {
    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(warning = %message, "trust store warning");
        self.warnings.push(message);
    }
}

/// Install or remove a CA certificate in an OS trust mechanism
#[allow(async_fn_in_trait)]
pub trait TrustStoreAdapter {
    /// Install the CA certificate at `ca_cert` as a trusted root
    async fn trust(&self, ca_cert: &Path) -> Result<TrustReport>;

    /// Remove the CA identified by an uppercase hex SHA-1 `fingerprint`
    async fn untrust(&self, fingerprint: &str) -> Result<TrustReport>;
}

/// Trust store of one platform
#[derive(Debug)]
pub enum TrustStore<E> {
    /// macOS system keychain
    Keychain(KeychainTrustStore<E>),
    /// Linux CA bundle plus the per-user NSS database
    LinuxBundle(LinuxBundleTrustStore<E>),
    /// Windows current user Root store
    WindowsUserStore(WindowsUserTrustStore<E>),
}

impl<E: ElevationStrategy> TrustStore<E> {
    /// Trust store for `platform`
    pub fn select(platform: Platform, elevation: E) -> Self {
        match platform {
            Platform::MacOs => Self::Keychain(KeychainTrustStore::new(elevation)),
            Platform::Linux => Self::LinuxBundle(LinuxBundleTrustStore::new(elevation)),
            Platform::Windows => Self::WindowsUserStore(WindowsUserTrustStore::new(elevation)),
        }
    }

    /// Trust store for an OS identifier such as `linux` or `darwin`
    ///
    /// Unknown identifiers fail with `UnsupportedPlatform` before anything is spawned.
    pub fn for_platform(os: &str, elevation: E) -> Result<Self> {
        let platform = Platform::from_os(os)?;
        Ok(Self::select(platform, elevation))
    }

    /// Platform this store belongs to
    pub fn platform(&self) -> Platform {
        match self {
            Self::Keychain(_) => Platform::MacOs,
            Self::LinuxBundle(_) => Platform::Linux,
            Self::WindowsUserStore(_) => Platform::Windows,
        }
    }

    /// Fingerprint the CA file and remove it from the store
    pub async fn untrust_ca_file(&self, ca_cert: &Path) -> Result<TrustReport> {
        ensure_ca_present(ca_cert).await?;
        let fingerprint = certificate::fingerprint(ca_cert).await?;
        self.untrust(&fingerprint).await
    }
}

impl<E: ElevationStrategy> TrustStoreAdapter for TrustStore<E> {
    async fn trust(&self, ca_cert: &Path) -> Result<TrustReport> {
        ensure_ca_present(ca_cert).await?;
        tracing::info!(platform = %self.platform(), ca = %ca_cert.display(), "trusting CA");
        match self {
            Self::Keychain(store) => store.trust(ca_cert).await,
            Self::LinuxBundle(store) => store.trust(ca_cert).await,
            Self::WindowsUserStore(store) => store.trust(ca_cert).await,
        }
    }

    async fn untrust(&self, fingerprint: &str) -> Result<TrustReport> {
        let fingerprint = normalize_fingerprint(fingerprint)?;
        tracing::info!(platform = %self.platform(), %fingerprint, "untrusting CA");
        match self {
            Self::Keychain(store) => store.untrust(&fingerprint).await,
            Self::LinuxBundle(store) => store.untrust(&fingerprint).await,
            Self::WindowsUserStore(store) => store.untrust(&fingerprint).await,
        }
    }
}

/// Fail with `CaNotFound` unless `ca_cert` exists
pub async fn ensure_ca_present(ca_cert: &Path) -> Result<()> {
    match tokio::fs::metadata(ca_cert).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(TlsError::CaNotFound {
            path: ca_cert.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TlsError::CaNotFound {
            path: ca_cert.to_path_buf(),
        }),
        Err(e) => Err(TlsError::filesystem(ca_cert, e)),
    }
}

/// Uppercase a SHA-1 fingerprint and drop `:` or space separators
pub fn normalize_fingerprint(fingerprint: &str) -> Result<String> {
    let normalized: String = fingerprint
        .chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.len() != 40 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TlsError::Decode(format!(
            "`{fingerprint}` is not a SHA-1 fingerprint"
        )));
    }
    Ok(normalized)
}
