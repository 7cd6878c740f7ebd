//! TLS snippet for the reverse proxy

use std::path::Path;

use serde::Serialize;

use crate::authority::files::{self, PUBLIC_MODE};
use crate::errors::Result;
use crate::layout::{FileType, GeneratedFile};

/// Where the host certs directory is mounted inside the proxy container
pub const DEFAULT_MOUNT: &str = "/certs";

#[derive(Debug, Serialize)]
struct TlsDocument {
    tls: TlsSection,
}

#[derive(Debug, Serialize)]
struct TlsSection {
    certificates: Vec<CertificateEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CertificateEntry {
    cert_file: String,
    key_file: String,
}

/// Writes the proxy's dynamic TLS configuration
///
/// Paths in the document are container paths: the file names of the host
/// files joined onto the mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTlsConfigWriter {
    mount: String,
}

impl Default for ProxyTlsConfigWriter {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT)
    }
}

impl ProxyTlsConfigWriter {
    /// Writer for a custom mount point
    pub fn new(mount: impl Into<String>) -> Self {
        let mount = mount.into();
        let trimmed = mount.trim_end_matches('/');
        Self {
            mount: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
        }
    }

    /// Render the snippet for `fullchain` and `key`
    pub fn render(&self, fullchain: &Path, key: &Path) -> Result<String> {
        let document = TlsDocument {
            tls: TlsSection {
                certificates: vec![CertificateEntry {
                    cert_file: self.container_path(fullchain),
                    key_file: self.container_path(key),
                }],
            },
        };
        Ok(serde_yaml::to_string(&document)?)
    }

    /// Render and write the snippet to `output`
    pub async fn write(&self, fullchain: &Path, key: &Path, output: &Path) -> Result<GeneratedFile> {
        let document = self.render(fullchain, key)?;
        files::write_file(output, document.as_bytes(), PUBLIC_MODE, FileType::TlsConfig).await
    }

    fn container_path(&self, host_path: &Path) -> String {
        let name = host_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.mount == "/" {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.mount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rendered: &str) -> serde_yaml::Value {
        let doc: serde_yaml::Value = serde_yaml::from_str(rendered).unwrap();
        doc["tls"]["certificates"][0].clone()
    }

    #[test]
    fn test_render_uses_container_paths() {
        let writer = ProxyTlsConfigWriter::default();
        let rendered = writer
            .render(
                Path::new("/home/dev/demo/proxy/certs/server.fullchain.crt"),
                Path::new("/home/dev/demo/proxy/certs/server.key"),
            )
            .unwrap();

        assert!(rendered.starts_with("tls:\n  certificates:\n"), "{rendered}");
        let entry = entry(&rendered);
        assert_eq!(entry["certFile"].as_str(), Some("/certs/server.fullchain.crt"));
        assert_eq!(entry["keyFile"].as_str(), Some("/certs/server.key"));
    }

    #[test]
    fn test_custom_mount_point() {
        let writer = ProxyTlsConfigWriter::new("/etc/traefik/certs/");
        let rendered = writer.render(Path::new("a/chain.crt"), Path::new("a/key.pem")).unwrap();

        let entry = entry(&rendered);
        assert_eq!(entry["certFile"].as_str(), Some("/etc/traefik/certs/chain.crt"));
        assert_eq!(entry["keyFile"].as_str(), Some("/etc/traefik/certs/key.pem"));
    }

    #[test]
    fn test_awkward_file_names_stay_valid_yaml() {
        let writer = ProxyTlsConfigWriter::new("/certs: \"x\"");
        let rendered = writer
            .render(Path::new("a/chain \"1\".crt"), Path::new("a/#key: 2.pem"))
            .unwrap();

        let entry = entry(&rendered);
        assert_eq!(entry["certFile"].as_str(), Some("/certs: \"x\"/chain \"1\".crt"));
        assert_eq!(entry["keyFile"].as_str(), Some("/certs: \"x\"/#key: 2.pem"));
        assert_eq!(entry.as_mapping().map(|m| m.len()), Some(2));
    }

    #[tokio::test]
    async fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tls-snippet.yml");
        let written = ProxyTlsConfigWriter::default()
            .write(Path::new("server.fullchain.crt"), Path::new("server.key"), &output)
            .await
            .unwrap();

        assert_eq!(written.file_type, FileType::TlsConfig);
        assert!(std::fs::read_to_string(&output).unwrap().contains("/certs/server.key"));
    }
}
