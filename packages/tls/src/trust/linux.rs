//! Linux trust: system CA bundle plus the Chromium NSS database
//!
//! The bundle steps are required. The NSS steps are best-effort since
//! `certutil` (libnss3-tools) is often not installed; their failures are
//! downgraded to report warnings.

use std::path::{Path, PathBuf};

use locom_common::process;
use locom_common::{ElevationError, ElevationStrategy};

use super::{TrustReport, TrustStoreAdapter};
use crate::certificate;
use crate::errors::Result;

/// Directory scanned by `update-ca-certificates`
pub const CA_ANCHORS_DIR: &str = "/usr/local/share/ca-certificates";
/// File name of the installed CA
pub const INSTALLED_CA_NAME: &str = "locom-selfsigned.crt";
/// Nickname of the CA inside the NSS database
pub const NSS_NICKNAME: &str = "locom-selfsigned";

const UPDATE_BUNDLE: &str = "update-ca-certificates";
const NSS_TOOL: &str = "certutil";

/// System CA bundle with an optional per-user NSS database
#[derive(Debug)]
pub struct LinuxBundleTrustStore<E> {
    elevation: E,
    anchors_dir: PathBuf,
    nss_db: Option<PathBuf>,
}

impl<E> LinuxBundleTrustStore<E> {
    /// Store using the system anchors directory and `~/.pki/nssdb`
    pub fn new(elevation: E) -> Self {
        Self {
            elevation,
            anchors_dir: PathBuf::from(CA_ANCHORS_DIR),
            nss_db: dirs::home_dir().map(|home| home.join(".pki").join("nssdb")),
        }
    }

    /// Install into another anchors directory
    pub fn with_anchors_dir(self, anchors_dir: impl Into<PathBuf>) -> Self {
        Self {
            anchors_dir: anchors_dir.into(),
            ..self
        }
    }

    /// Use another NSS database, or none to skip the browser step
    pub fn with_nss_db(self, nss_db: Option<PathBuf>) -> Self {
        Self { nss_db, ..self }
    }

    /// Where the CA is installed
    pub fn installed_path(&self) -> PathBuf {
        self.anchors_dir.join(INSTALLED_CA_NAME)
    }

    async fn nss_add(&self, ca_cert: &Path, report: &mut TrustReport) {
        let Some(db) = &self.nss_db else {
            report.warn("browser NSS database skipped: home directory unknown");
            return;
        };
        if let Err(e) = tokio::fs::create_dir_all(db).await {
            report.warn(format!(
                "browser NSS database skipped: cannot create {}: {e}",
                db.display()
            ));
            return;
        }

        let args = nss_args(db, &["-A", "-t", "C,,", "-n", NSS_NICKNAME, "-i"])
            .into_iter()
            .chain([ca_cert.display().to_string()])
            .collect::<Vec<_>>();
        if let Err(e) = process::run_captured(NSS_TOOL, &args).await {
            report.warn(nss_warning("update", &e));
        }
    }

    async fn nss_remove(&self, report: &mut TrustReport) {
        let Some(db) = &self.nss_db else {
            return;
        };
        let args = nss_args(db, &["-D", "-n", NSS_NICKNAME]);
        if let Err(e) = process::run_captured(NSS_TOOL, &args).await {
            report.warn(nss_warning("removal", &e));
        }
    }
}

impl<E: ElevationStrategy> TrustStoreAdapter for LinuxBundleTrustStore<E> {
    async fn trust(&self, ca_cert: &Path) -> Result<TrustReport> {
        let mut report = TrustReport::default();
        let installed = self.installed_path();

        self.elevation.copy_elevated(ca_cert, &installed).await?;
        self.elevation.run_elevated(UPDATE_BUNDLE, &[]).await?;
        tracing::info!(installed = %installed.display(), "CA added to system bundle");

        self.nss_add(ca_cert, &mut report).await;
        Ok(report)
    }

    async fn untrust(&self, fingerprint: &str) -> Result<TrustReport> {
        let mut report = TrustReport::default();
        let installed = self.installed_path();

        match certificate::fingerprint(&installed).await {
            Ok(found) if found != fingerprint => report.warn(format!(
                "installed CA {} has fingerprint {found}, not {fingerprint}; removing it anyway",
                installed.display()
            )),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "installed CA not inspected"),
        }

        let rm_args = vec!["-f".to_string(), installed.display().to_string()];
        self.elevation.run_elevated("rm", &rm_args).await?;
        self.elevation.run_elevated(UPDATE_BUNDLE, &[]).await?;

        self.nss_remove(&mut report).await;
        Ok(report)
    }
}

fn nss_args(db: &Path, rest: &[&str]) -> Vec<String> {
    let mut args = vec!["-d".to_string(), format!("sql:{}", db.display())];
    args.extend(rest.iter().map(|s| s.to_string()));
    args
}

fn nss_warning(step: &str, error: &ElevationError) -> String {
    match error {
        ElevationError::HelperMissing { .. } => format!(
            "browser NSS database {step} skipped: certutil not found (install libnss3-tools)"
        ),
        other => format!("browser NSS database {step} failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TlsError;
    use locom_common::testing::{ElevatedCall, RecordingElevation};

    #[tokio::test]
    async fn test_trust_copies_and_refreshes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let elevation = RecordingElevation::new();
        let store = LinuxBundleTrustStore::new(&elevation)
            .with_anchors_dir(dir.path())
            .with_nss_db(None);

        let report = store.trust(Path::new("/stage/proxy/certs/ca.crt")).await.unwrap();

        assert_eq!(
            elevation.calls(),
            vec![
                ElevatedCall::Copy {
                    source: "/stage/proxy/certs/ca.crt".into(),
                    destination: dir.path().join(INSTALLED_CA_NAME),
                },
                ElevatedCall::Run {
                    program: UPDATE_BUNDLE.to_string(),
                    args: vec![],
                },
            ]
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("NSS"));
    }

    #[tokio::test]
    async fn test_denied_copy_stops_before_refresh() {
        let elevation = RecordingElevation::denying();
        let store = LinuxBundleTrustStore::new(&elevation).with_nss_db(None);

        let err = store.trust(Path::new("ca.crt")).await.unwrap_err();
        assert!(matches!(err, TlsError::Elevation(_)));
        assert_eq!(elevation.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_untrust_removes_installed_file() {
        let dir = tempfile::tempdir().unwrap();
        let elevation = RecordingElevation::new();
        let store = LinuxBundleTrustStore::new(&elevation)
            .with_anchors_dir(dir.path())
            .with_nss_db(None);

        let report = store
            .untrust("A9993E364706816ABA3E25717850C26C9CD0D89D")
            .await
            .unwrap();

        assert!(report.warnings.is_empty());
        assert_eq!(
            elevation.calls(),
            vec![
                ElevatedCall::Run {
                    program: "rm".to_string(),
                    args: vec![
                        "-f".to_string(),
                        dir.path().join(INSTALLED_CA_NAME).display().to_string()
                    ],
                },
                ElevatedCall::Run {
                    program: UPDATE_BUNDLE.to_string(),
                    args: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_nss_args_use_sql_prefix() {
        let args = nss_args(Path::new("/home/dev/.pki/nssdb"), &["-D", "-n", NSS_NICKNAME]);
        assert_eq!(
            args,
            ["-d", "sql:/home/dev/.pki/nssdb", "-D", "-n", "locom-selfsigned"].map(String::from)
        );
    }
}
