use std::path::Path;

use locom_common::ElevationStrategy;

use super::{TrustReport, TrustStoreAdapter};
use crate::errors::Result;

/// Current user's Root store via `certutil`
#[derive(Debug)]
pub struct WindowsUserTrustStore<E> {
    elevation: E,
}

impl<E> WindowsUserTrustStore<E> {
    /// Store driven through `elevation`
    pub fn new(elevation: E) -> Self {
        Self { elevation }
    }
}

impl<E: ElevationStrategy> TrustStoreAdapter for WindowsUserTrustStore<E> {
    async fn trust(&self, ca_cert: &Path) -> Result<TrustReport> {
        let args = ["-addstore", "-user", "Root"]
            .map(String::from)
            .into_iter()
            .chain([ca_cert.display().to_string()])
            .collect::<Vec<_>>();
        self.elevation.run_elevated("certutil", &args).await?;
        Ok(TrustReport::default())
    }

    async fn untrust(&self, fingerprint: &str) -> Result<TrustReport> {
        // certutil matches the thumbprint as hex without separators
        let args = ["-delstore", "-user", "Root", fingerprint].map(String::from).to_vec();
        self.elevation.run_elevated("certutil", &args).await?;
        Ok(TrustReport::default())
    }
}
