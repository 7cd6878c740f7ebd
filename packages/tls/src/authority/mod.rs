//! Certificate authority setup and cleanup

mod builder;
pub(crate) mod files;

pub use builder::{CertificateAuthorityBuilder, SetupReport};
pub use files::{cleanup, CleanupReport};
