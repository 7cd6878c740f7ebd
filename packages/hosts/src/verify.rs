//! Advisory DNS and TCP checks after a hosts update

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::VerifyError;

/// Port probed once the name resolves
pub const DEFAULT_PROBE_PORT: u16 = 80;
/// TCP probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of the TCP probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Something accepted the connection
    Connected,
    /// DNS is correct but nothing listens yet
    Refused,
    /// Timeout or another connection error
    Failed(String),
}

/// A name that resolved to the expected address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Name looked up
    pub hostname: String,
    /// Every address the resolver returned
    pub resolved: Vec<IpAddr>,
    /// Address probed
    pub probed: SocketAddr,
    /// Probe result
    pub probe: ProbeOutcome,
}

/// Resolves a name and probes the expected address
#[derive(Debug, Clone)]
pub struct DnsVerifier {
    port: u16,
}

impl Default for DnsVerifier {
    fn default() -> Self {
        Self {
            port: DEFAULT_PROBE_PORT,
        }
    }
}

impl DnsVerifier {
    /// Probe another port
    pub fn port(self, port: u16) -> Self {
        Self { port }
    }

    /// Resolve `hostname`, require `expected` among the answers, then probe it
    ///
    /// Resolution uses the OS resolver without an extra timeout. Probe
    /// failures are part of the returned [`Verification`], not errors.
    pub async fn verify(&self, hostname: &str, expected: IpAddr) -> Result<Verification, VerifyError> {
        let resolved: Vec<IpAddr> = tokio::net::lookup_host((hostname, self.port))
            .await
            .map_err(|source| VerifyError::DnsResolution {
                hostname: hostname.to_string(),
                source,
            })?
            .map(|addr| addr.ip())
            .fold(Vec::new(), |mut acc, ip| {
                if !acc.contains(&ip) {
                    acc.push(ip);
                }
                acc
            });

        if !resolved.contains(&expected) {
            return Err(VerifyError::AddressMismatch {
                hostname: hostname.to_string(),
                expected,
                resolved,
            });
        }
        tracing::info!(hostname, %expected, "DNS resolution matches");

        let probed = SocketAddr::new(expected, self.port);
        let probe = self.probe(probed).await;
        tracing::debug!(%probed, ?probe, "TCP probe finished");

        Ok(Verification {
            hostname: hostname.to_string(),
            resolved,
            probed,
            probe,
        })
    }

    async fn probe(&self, addr: SocketAddr) -> ProbeOutcome {
        match tokio::time::timeout(DEFAULT_PROBE_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => ProbeOutcome::Connected,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => ProbeOutcome::Refused,
            Ok(Err(e)) => ProbeOutcome::Failed(e.to_string()),
            Err(_) => ProbeOutcome::Failed(format!(
                "timed out after {}ms",
                DEFAULT_PROBE_TIMEOUT.as_millis()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[tokio::test]
    async fn test_listening_port_connects() {
        let listener = tokio::net::TcpListener::bind((LOOPBACK, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let verification = DnsVerifier::default()
            .port(port)
            .verify("127.0.0.1", LOOPBACK)
            .await
            .unwrap();

        assert_eq!(verification.resolved, vec![LOOPBACK]);
        assert_eq!(verification.probe, ProbeOutcome::Connected);
    }

    #[tokio::test]
    async fn test_closed_port_is_refused_not_an_error() {
        let port = {
            let listener = std::net::TcpListener::bind((LOOPBACK, 0)).unwrap();
            listener.local_addr().unwrap().port()
        };

        let verification = DnsVerifier::default()
            .port(port)
            .verify("127.0.0.1", LOOPBACK)
            .await
            .unwrap();

        assert_eq!(verification.probe, ProbeOutcome::Refused);
    }

    #[tokio::test]
    async fn test_wrong_address_is_a_mismatch() {
        let expected: IpAddr = "10.0.0.1".parse().unwrap();
        let err = DnsVerifier::default()
            .verify("127.0.0.1", expected)
            .await
            .unwrap_err();

        match err {
            VerifyError::AddressMismatch { resolved, .. } => assert_eq!(resolved, vec![LOOPBACK]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unresolvable_name_is_a_dns_error() {
        let err = DnsVerifier::default()
            .verify("proxy.locom-verify.invalid", LOOPBACK)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::DnsResolution { .. }));
    }
}
