//! Locally trusted TLS for locom stages
//!
//! - [`CertificateAuthorityBuilder`] mints a root CA plus one server
//!   certificate and writes them, a full chain and the proxy TLS snippet
//! - [`certificate::fingerprint`] gives the SHA-1 identity used by trust stores
//! - [`TrustStore`] installs or removes the CA in the OS trust mechanism

pub mod authority;
pub mod certificate;
pub mod errors;
pub mod layout;
pub mod proxy_config;
pub mod trust;

pub use authority::{cleanup, CertificateAuthorityBuilder, CleanupReport, SetupReport};
pub use certificate::{fingerprint, fingerprint_der, fingerprint_pem};
pub use errors::{Result, TlsError};
pub use layout::{CertificateIdentity, CertificateLayout, FileType, GeneratedFile};
pub use proxy_config::ProxyTlsConfigWriter;
pub use trust::{TrustReport, TrustStore, TrustStoreAdapter};
