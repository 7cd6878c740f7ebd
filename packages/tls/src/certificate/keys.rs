//! RSA key generation
//!
//! rcgen only signs with RSA keys it is handed, so keys are generated with
//! the `rsa` crate and loaded into an [`rcgen::KeyPair`] through PKCS#8 PEM.

use rcgen::KeyPair;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::RsaPrivateKey;
use sha1::{Digest, Sha1};

use crate::errors::{Result, TlsError};

/// Smallest RSA modulus accepted
pub const MIN_KEY_BITS: usize = 2048;

/// A freshly generated RSA key
pub struct RsaKeyMaterial {
    /// Signing handle for rcgen
    pub key_pair: KeyPair,
    /// PKCS#8 `PRIVATE KEY` PEM
    pub private_key_pem: String,
    /// SHA-1 of the DER SubjectPublicKeyInfo
    pub subject_key_id: Vec<u8>,
}

impl std::fmt::Debug for RsaKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyMaterial")
            .field("subject_key_id", &hex::encode_upper(&self.subject_key_id))
            .finish_non_exhaustive()
    }
}

/// Generate an RSA key of `bits` length
pub fn generate_rsa_key(bits: usize) -> Result<RsaKeyMaterial> {
    if bits < MIN_KEY_BITS {
        return Err(TlsError::KeyGeneration(format!(
            "{bits}-bit RSA keys are below the {MIN_KEY_BITS}-bit minimum"
        )));
    }

    tracing::debug!(bits, "generating RSA key");
    let private_key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, bits)
        .map_err(|e| TlsError::KeyGeneration(e.to_string()))?;

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| TlsError::KeyGeneration(format!("PKCS#8 encoding failed: {e}")))?
        .as_str()
        .to_owned();

    let spki = private_key
        .to_public_key()
        .to_public_key_der()
        .map_err(|e| TlsError::KeyGeneration(format!("public key encoding failed: {e}")))?;
    let subject_key_id = Sha1::digest(spki.as_bytes()).to_vec();

    let key_pair = KeyPair::from_pem(&private_key_pem)
        .map_err(|e| TlsError::KeyGeneration(format!("key not usable for signing: {e}")))?;

    Ok(RsaKeyMaterial {
        key_pair,
        private_key_pem,
        subject_key_id,
    })
}
