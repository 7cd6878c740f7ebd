//! Key material, certificate generation and fingerprinting

pub mod generation;
pub mod keys;
pub mod parsing;

pub use generation::{generate_ca, generate_server, CertificateAuthority, IssuedCertificate};
pub use keys::{generate_rsa_key, RsaKeyMaterial, MIN_KEY_BITS};
pub use parsing::{
    decode_certificate_pem, fingerprint, fingerprint_der, fingerprint_pem,
    split_certificate_chain,
};
