use std::path::{Path, PathBuf};

use locom_common::ElevationStrategy;

use super::{TrustReport, TrustStoreAdapter};
use crate::errors::Result;

/// Keychain holding system-wide trusted roots
pub const SYSTEM_KEYCHAIN: &str = "/Library/Keychains/System.keychain";

/// macOS system keychain via `security`
#[derive(Debug)]
pub struct KeychainTrustStore<E> {
    elevation: E,
    keychain: PathBuf,
}

impl<E> KeychainTrustStore<E> {
    /// Store targeting the system keychain
    pub fn new(elevation: E) -> Self {
        Self {
            elevation,
            keychain: PathBuf::from(SYSTEM_KEYCHAIN),
        }
    }

    /// Target another keychain file
    pub fn with_keychain(self, keychain: impl Into<PathBuf>) -> Self {
        Self {
            keychain: keychain.into(),
            ..self
        }
    }
}

impl<E: ElevationStrategy> TrustStoreAdapter for KeychainTrustStore<E> {
    async fn trust(&self, ca_cert: &Path) -> Result<TrustReport> {
        let args = vec![
            "add-trusted-cert".to_string(),
            "-d".to_string(),
            "-r".to_string(),
            "trustRoot".to_string(),
            "-k".to_string(),
            self.keychain.display().to_string(),
            ca_cert.display().to_string(),
        ];
        self.elevation.run_elevated("security", &args).await?;
        Ok(TrustReport::default())
    }

    async fn untrust(&self, fingerprint: &str) -> Result<TrustReport> {
        let args = vec![
            "delete-certificate".to_string(),
            "-Z".to_string(),
            fingerprint.to_string(),
            self.keychain.display().to_string(),
        ];
        self.elevation.run_elevated("security", &args).await?;
        Ok(TrustReport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TlsError;
    use locom_common::testing::{ElevatedCall, RecordingElevation};

    #[tokio::test]
    async fn test_trust_and_untrust_commands() {
        let elevation = RecordingElevation::new();
        let store = KeychainTrustStore::new(&elevation);

        store.trust(Path::new("/tmp/ca.crt")).await.unwrap();
        store.untrust("A9993E364706816ABA3E25717850C26C9CD0D89D").await.unwrap();

        let calls = elevation.calls();
        assert_eq!(
            calls[0],
            ElevatedCall::Run {
                program: "security".to_string(),
                args: [
                    "add-trusted-cert",
                    "-d",
                    "-r",
                    "trustRoot",
                    "-k",
                    SYSTEM_KEYCHAIN,
                    "/tmp/ca.crt"
                ]
                .map(String::from)
                .to_vec(),
            }
        );
        assert_eq!(
            calls[1],
            ElevatedCall::Run {
                program: "security".to_string(),
                args: [
                    "delete-certificate",
                    "-Z",
                    "A9993E364706816ABA3E25717850C26C9CD0D89D",
                    SYSTEM_KEYCHAIN
                ]
                .map(String::from)
                .to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn test_denied_prompt_is_an_error() {
        let elevation = RecordingElevation::denying();
        let store = KeychainTrustStore::new(&elevation).with_keychain("/tmp/login.keychain");

        let err = store.trust(Path::new("/tmp/ca.crt")).await.unwrap_err();
        assert!(matches!(err, TlsError::Elevation(e) if e.is_denied()));
    }
}
