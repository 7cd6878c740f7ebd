//! CA and server certificate generation

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, Issuer, KeyIdMethod, KeyPair, KeyUsagePurpose, SerialNumber,
};
use time::{Duration, OffsetDateTime};

use super::keys::generate_rsa_key;
use super::parsing::fingerprint_der;
use crate::errors::{Result, TlsError};
use crate::layout::CertificateIdentity;

/// CA lifetime
pub const CA_VALIDITY_DAYS: i64 = 10 * 365;
/// Server certificate lifetime
pub const SERVER_VALIDITY_DAYS: i64 = 365;

/// A certificate and its private key, both PEM encoded
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// `CERTIFICATE` PEM block
    pub certificate_pem: String,
    /// Raw DER of the certificate
    pub certificate_der: Vec<u8>,
    /// PKCS#8 `PRIVATE KEY` PEM block
    pub private_key_pem: String,
}

impl IssuedCertificate {
    /// Uppercase hex SHA-1 of the certificate DER
    pub fn fingerprint(&self) -> String {
        fingerprint_der(&self.certificate_der)
    }
}

/// Root CA able to sign server certificates
pub struct CertificateAuthority {
    /// Self-signed CA certificate and key
    pub certificate: IssuedCertificate,
    /// SHA-1 of the CA public key, also the SubjectKeyIdentifier
    pub subject_key_id: Vec<u8>,
    issuer: Issuer<'static, KeyPair>,
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("fingerprint", &self.certificate.fingerprint())
            .field("subject_key_id", &hex::encode_upper(&self.subject_key_id))
            .finish_non_exhaustive()
    }
}

/// Generate a new self-signed root CA
pub fn generate_ca(identity: &CertificateIdentity, key_bits: usize) -> Result<CertificateAuthority> {
    let key = generate_rsa_key(key_bits)?;

    let mut params = CertificateParams::new(Vec::<String>::new()).map_err(creation_error)?;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.serial_number = Some(SerialNumber::from(vec![1]));

    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, identity.organization.as_str());
    dn.push(DnType::CommonName, identity.ca_common_name.as_str());
    params.distinguished_name = dn;

    (params.not_before, params.not_after) = validity(CA_VALIDITY_DAYS);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.key_identifier_method = KeyIdMethod::PreSpecified(key.subject_key_id.clone());

    let cert = params
        .clone()
        .self_signed(&key.key_pair)
        .map_err(creation_error)?;

    let certificate = IssuedCertificate {
        certificate_pem: cert.pem(),
        certificate_der: cert.der().to_vec(),
        private_key_pem: key.private_key_pem,
    };
    tracing::info!(fingerprint = %certificate.fingerprint(), "generated root CA");

    Ok(CertificateAuthority {
        certificate,
        subject_key_id: key.subject_key_id,
        issuer: Issuer::new(params, key.key_pair),
    })
}

/// Generate a server certificate for `identity.subject_alt_names` signed by `ca`
pub fn generate_server(
    ca: &CertificateAuthority,
    identity: &CertificateIdentity,
    key_bits: usize,
) -> Result<IssuedCertificate> {
    let key = generate_rsa_key(key_bits)?;

    let mut params =
        CertificateParams::new(identity.subject_alt_names.clone()).map_err(creation_error)?;
    params.serial_number = Some(SerialNumber::from(vec![2]));

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, identity.server_common_name.as_str());
    params.distinguished_name = dn;

    (params.not_before, params.not_after) = validity(SERVER_VALIDITY_DAYS);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    params.use_authority_key_identifier_extension = true;

    let cert = params
        .signed_by(&key.key_pair, &ca.issuer)
        .map_err(creation_error)?;

    let issued = IssuedCertificate {
        certificate_pem: cert.pem(),
        certificate_der: cert.der().to_vec(),
        private_key_pem: key.private_key_pem,
    };
    tracing::info!(
        fingerprint = %issued.fingerprint(),
        sans = ?identity.subject_alt_names,
        "generated server certificate"
    );
    Ok(issued)
}

// not_before is backdated by one hour
fn validity(days: i64) -> (OffsetDateTime, OffsetDateTime) {
    let now = OffsetDateTime::now_utc();
    (now - Duration::hours(1), now + Duration::days(days))
}

fn creation_error(e: rcgen::Error) -> TlsError {
    TlsError::CertificateCreation(e.to_string())
}
