//! Certificate authority builder
//!
//! Setup always mints a brand-new CA and server key pair. Any CA trusted
//! from an earlier run stops matching and has to be untrusted and trusted
//! again by the caller.

use super::files::{self, PRIVATE_MODE, PUBLIC_MODE};
use crate::certificate::{self, generate_ca, generate_server};
use crate::errors::Result;
use crate::layout::{CertificateIdentity, CertificateLayout, FileType, GeneratedFile};
use crate::proxy_config::ProxyTlsConfigWriter;

/// Default CA key size
pub const CA_KEY_BITS: usize = 4096;
/// Default server key size
pub const SERVER_KEY_BITS: usize = 2048;

/// Builder for the local CA, server certificate and proxy TLS snippet
#[derive(Debug, Clone)]
pub struct CertificateAuthorityBuilder {
    layout: CertificateLayout,
    identity: CertificateIdentity,
    ca_key_bits: usize,
    server_key_bits: usize,
    proxy_writer: ProxyTlsConfigWriter,
}

impl Default for CertificateAuthorityBuilder {
    fn default() -> Self {
        Self::new(CertificateLayout::default())
    }
}

/// Outcome of a successful setup
#[derive(Debug, Clone)]
pub struct SetupReport {
    /// Fingerprint of the new CA
    pub ca_fingerprint: String,
    /// Fingerprint of the new server certificate
    pub server_fingerprint: String,
    /// Fingerprint of the CA that was overwritten, if one existed
    pub replaced_ca_fingerprint: Option<String>,
    /// Files written, in write order
    pub files: Vec<GeneratedFile>,
}

impl CertificateAuthorityBuilder {
    /// Builder writing into `layout` with the default identity and key sizes
    pub fn new(layout: CertificateLayout) -> Self {
        Self {
            layout,
            identity: CertificateIdentity::default(),
            ca_key_bits: CA_KEY_BITS,
            server_key_bits: SERVER_KEY_BITS,
            proxy_writer: ProxyTlsConfigWriter::default(),
        }
    }

    /// Replace only the server certificate SANs
    pub fn subject_alt_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity.subject_alt_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the CA RSA key size
    pub fn ca_key_bits(self, bits: usize) -> Self {
        Self {
            ca_key_bits: bits,
            ..self
        }
    }

    /// Set the server RSA key size
    pub fn server_key_bits(self, bits: usize) -> Self {
        Self {
            server_key_bits: bits,
            ..self
        }
    }

    /// Target layout
    pub fn layout(&self) -> &CertificateLayout {
        &self.layout
    }

    /// Generate the CA and server certificate and write all six files
    ///
    /// # Errors
    ///
    /// - `KeyGeneration` when RSA key generation fails
    /// - `CertificateCreation` when building or signing a certificate fails
    /// - `Filesystem` when a directory or file cannot be written
    ///
    /// Files written before a failure are left in place.
    pub async fn setup(&self) -> Result<SetupReport> {
        let layout = &self.layout;
        files::ensure_dir(&layout.certs_dir).await?;
        files::ensure_dir(&layout.config_dir).await?;

        let replaced_ca_fingerprint = self.existing_ca_fingerprint().await;

        let ca = generate_ca(&self.identity, self.ca_key_bits)?;
        let mut written = Vec::with_capacity(6);
        written.push(
            files::write_file(
                &layout.ca_cert(),
                ca.certificate.certificate_pem.as_bytes(),
                PUBLIC_MODE,
                FileType::Certificate,
            )
            .await?,
        );
        written.push(
            files::write_file(
                &layout.ca_key(),
                ca.certificate.private_key_pem.as_bytes(),
                PRIVATE_MODE,
                FileType::PrivateKey,
            )
            .await?,
        );

        let server = generate_server(&ca, &self.identity, self.server_key_bits)?;
        written.push(
            files::write_file(
                &layout.server_cert(),
                server.certificate_pem.as_bytes(),
                PUBLIC_MODE,
                FileType::Certificate,
            )
            .await?,
        );
        written.push(
            files::write_file(
                &layout.server_key(),
                server.private_key_pem.as_bytes(),
                PRIVATE_MODE,
                FileType::PrivateKey,
            )
            .await?,
        );

        let chain = files::concat_pem(&[
            server.certificate_pem.as_str(),
            ca.certificate.certificate_pem.as_str(),
        ]);
        written.push(
            files::write_file(
                &layout.fullchain(),
                chain.as_bytes(),
                PUBLIC_MODE,
                FileType::CertificateChain,
            )
            .await?,
        );

        written.push(
            self.proxy_writer
                .write(&layout.fullchain(), &layout.server_key(), &layout.tls_snippet())
                .await?,
        );

        let report = SetupReport {
            ca_fingerprint: ca.certificate.fingerprint(),
            server_fingerprint: server.fingerprint(),
            replaced_ca_fingerprint,
            files: written,
        };
        if let Some(previous) = &report.replaced_ca_fingerprint {
            tracing::info!(
                previous = %previous,
                current = %report.ca_fingerprint,
                "replaced existing CA; a previously trusted CA no longer matches"
            );
        }
        Ok(report)
    }

    async fn existing_ca_fingerprint(&self) -> Option<String> {
        let path = self.layout.ca_cert();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return None;
        }
        match certificate::fingerprint(&path).await {
            Ok(fp) => Some(fp),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "existing CA unreadable");
                None
            }
        }
    }
}
