//! PEM decoding and fingerprints

use std::path::Path;

use sha1::{Digest, Sha1};

use crate::errors::{Result, TlsError};

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Uppercase hex SHA-1 of the first certificate in a PEM file
///
/// This is the identity trust stores are searched by when removing a CA.
pub async fn fingerprint(path: &Path) -> Result<String> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| TlsError::filesystem(path, e))?;
    fingerprint_pem(&contents)
}

/// Uppercase hex SHA-1 of the first certificate block in `input`
pub fn fingerprint_pem(input: &[u8]) -> Result<String> {
    let der = decode_certificate_pem(input)?;
    Ok(fingerprint_der(&der))
}

/// Uppercase hex SHA-1 of DER bytes
pub fn fingerprint_der(der: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(der))
}

/// Decode the first PEM block of `input` and check it is an X.509 certificate
pub fn decode_certificate_pem(input: &[u8]) -> Result<Vec<u8>> {
    let block =
        pem::parse(input).map_err(|e| TlsError::Decode(format!("no PEM block found: {e}")))?;
    certificate_der(block)
}

/// Decode every block of a PEM bundle, in file order
pub fn split_certificate_chain(input: &[u8]) -> Result<Vec<Vec<u8>>> {
    let blocks = pem::parse_many(input)
        .map_err(|e| TlsError::Decode(format!("malformed PEM bundle: {e}")))?;
    if blocks.is_empty() {
        return Err(TlsError::Decode("no PEM block found".to_string()));
    }
    blocks.into_iter().map(certificate_der).collect()
}

fn certificate_der(block: pem::Pem) -> Result<Vec<u8>> {
    if block.tag() != CERTIFICATE_TAG {
        return Err(TlsError::Decode(format!(
            "expected a {CERTIFICATE_TAG} block, found {}",
            block.tag()
        )));
    }

    let der = block.into_contents();
    if let Err(e) = x509_parser::parse_x509_certificate(&der) {
        return Err(TlsError::Decode(format!("invalid X.509 certificate: {e}")));
    }
    Ok(der)
}
