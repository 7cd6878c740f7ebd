//! Where generated material lives and what identity it carries

use std::path::{Path, PathBuf};

/// Organization on the CA subject
pub const ORGANIZATION: &str = "Local Dev CA";
/// Common name of the root CA
pub const CA_COMMON_NAME: &str = "Local Dev Root CA";
/// Common name of the server certificate
pub const SERVER_COMMON_NAME: &str = "*.locom.self";
/// Subject alternative names of the server certificate
pub const DEFAULT_SUBJECT_ALT_NAMES: [&str; 2] = ["proxy.locom.self", "*.locom.self"];

/// Host directory mounted at `/certs` in the proxy container
pub const DEFAULT_CERTS_DIR: &str = "./proxy/certs";
/// Host directory holding the proxy's dynamic configuration
pub const DEFAULT_CONFIG_DIR: &str = "./proxy/config";

/// Subject data for the CA and server certificates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateIdentity {
    /// `O=` on the CA
    pub organization: String,
    /// `CN=` on the CA
    pub ca_common_name: String,
    /// `CN=` on the server certificate
    pub server_common_name: String,
    /// DNS names the server certificate is valid for
    pub subject_alt_names: Vec<String>,
}

impl Default for CertificateIdentity {
    fn default() -> Self {
        Self {
            organization: ORGANIZATION.to_string(),
            ca_common_name: CA_COMMON_NAME.to_string(),
            server_common_name: SERVER_COMMON_NAME.to_string(),
            subject_alt_names: DEFAULT_SUBJECT_ALT_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// File names and directories of the six generated files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateLayout {
    /// Directory for certificates and keys
    pub certs_dir: PathBuf,
    /// Directory for the proxy TLS snippet
    pub config_dir: PathBuf,
}

impl Default for CertificateLayout {
    fn default() -> Self {
        Self::new(DEFAULT_CERTS_DIR, DEFAULT_CONFIG_DIR)
    }
}

impl CertificateLayout {
    /// CA certificate file name
    pub const CA_CERT: &'static str = "ca.crt";
    /// CA private key file name
    pub const CA_KEY: &'static str = "ca.key";
    /// Server certificate file name
    pub const SERVER_CERT: &'static str = "server.crt";
    /// Server private key file name
    pub const SERVER_KEY: &'static str = "server.key";
    /// Server certificate followed by the CA
    pub const FULLCHAIN: &'static str = "server.fullchain.crt";
    /// Proxy TLS configuration snippet
    pub const TLS_SNIPPET: &'static str = "tls-snippet.yml";

    /// Layout rooted at explicit directories
    pub fn new(certs_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            certs_dir: certs_dir.into(),
            config_dir: config_dir.into(),
        }
    }

    /// Default layout below a stage directory
    pub fn in_stage(stage_dir: &Path) -> Self {
        Self::new(
            stage_dir.join("proxy").join("certs"),
            stage_dir.join("proxy").join("config"),
        )
    }

    /// CA certificate path
    pub fn ca_cert(&self) -> PathBuf {
        self.certs_dir.join(Self::CA_CERT)
    }

    /// CA private key path
    pub fn ca_key(&self) -> PathBuf {
        self.certs_dir.join(Self::CA_KEY)
    }

    /// Server certificate path
    pub fn server_cert(&self) -> PathBuf {
        self.certs_dir.join(Self::SERVER_CERT)
    }

    /// Server private key path
    pub fn server_key(&self) -> PathBuf {
        self.certs_dir.join(Self::SERVER_KEY)
    }

    /// Full chain path
    pub fn fullchain(&self) -> PathBuf {
        self.certs_dir.join(Self::FULLCHAIN)
    }

    /// Proxy TLS snippet path
    pub fn tls_snippet(&self) -> PathBuf {
        self.config_dir.join(Self::TLS_SNIPPET)
    }

    /// Every file `setup` writes, in write order
    pub fn generated_files(&self) -> [PathBuf; 6] {
        [
            self.ca_cert(),
            self.ca_key(),
            self.server_cert(),
            self.server_key(),
            self.fullchain(),
            self.tls_snippet(),
        ]
    }
}

/// Kind of a generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// PEM certificate
    Certificate,
    /// PEM private key
    PrivateKey,
    /// Concatenated PEM certificates
    CertificateChain,
    /// Proxy configuration document
    TlsConfig,
}

/// A file written by setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Where it was written
    pub path: PathBuf,
    /// What it holds
    pub file_type: FileType,
    /// Bytes written
    pub size_bytes: u64,
}
