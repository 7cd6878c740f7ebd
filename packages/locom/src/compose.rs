//! Docker Compose file for the stage's reverse proxy
//!
//! The proxy stack is generated twice: a reference copy under
//! `.locom/proxy/` that is refreshed on every run, and the working copy in
//! `proxy/` that is only written when missing so local edits survive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Network, CONFIG_DIR};

/// Compose file name used for both copies
pub const COMPOSE_FILE: &str = "docker-compose.yml";
/// Working copy directory, relative to the stage
pub const PROXY_DIR: &str = "proxy";
/// Only supported proxy engine
pub const TRAEFIK: &str = "traefik";
/// Traefik version used when the config leaves it empty
pub const DEFAULT_TRAEFIK_VERSION: &str = "2.10";
/// DNS suffix used for the dashboard when the config leaves it empty
pub const DEFAULT_SUFFIX: &str = ".locom.self";

/// Proxy compose generation errors
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// `stage.network.proxy.type.engine` names something other than traefik
    #[error("unsupported proxy engine `{0}`; only traefik is supported")]
    UnsupportedEngine(String),

    /// The compose model could not be serialized
    #[error("rendering compose file failed: {0}")]
    Render(#[from] serde_yaml::Error),

    /// A compose file or its directory could not be written
    #[error("writing {}: {source}", path.display())]
    Write {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// A `docker-compose.yml` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeFile {
    /// Legacy format version, omitted when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Services by name
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
    /// Networks by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, NetworkRef>,
}

/// A network entry; locom networks are created outside compose
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRef {
    /// Whether compose expects the network to exist already
    #[serde(default)]
    pub external: bool,
}

/// One compose service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Image reference
    pub image: String,
    /// Fixed container name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    /// Restart policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    /// Arguments passed to the image entrypoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// `host:container` port mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Bind mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    /// Networks the service joins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    /// Container labels, read by traefik for routing
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ComposeFile {
    /// Traefik proxy stack attached to the external network `network_name`
    ///
    /// Service name, image version and dashboard host come from `network`;
    /// empty values fall back to traefik, [`DEFAULT_TRAEFIK_VERSION`] and
    /// `proxy` + [`DEFAULT_SUFFIX`].
    pub fn traefik(network_name: &str, network: &Network) -> Result<Self, ComposeError> {
        let engine = network.proxy.kind.engine.trim();
        if !engine.is_empty() && !engine.eq_ignore_ascii_case(TRAEFIK) {
            return Err(ComposeError::UnsupportedEngine(engine.to_string()));
        }

        let service_name = non_empty(&network.proxy.name, TRAEFIK);
        let version = non_empty(&network.proxy.kind.version, DEFAULT_TRAEFIK_VERSION);
        let version = version.trim_start_matches('v');
        let dashboard = format!("proxy{}", non_empty(&network.dns.suffix, DEFAULT_SUFFIX));

        let labels = [
            ("traefik.enable", "true".to_string()),
            ("traefik.http.routers.traefik.rule", format!("Host(`{dashboard}`)")),
            ("traefik.http.routers.traefik.entrypoints", "web".to_string()),
            ("traefik.http.routers.traefik.middlewares", "redirect-to-https".to_string()),
            (
                "traefik.http.middlewares.redirect-to-https.redirectscheme.scheme",
                "https".to_string(),
            ),
            ("traefik.http.routers.traefik-secure.rule", format!("Host(`{dashboard}`)")),
            ("traefik.http.routers.traefik-secure.entrypoints", "websecure".to_string()),
            ("traefik.http.routers.traefik-secure.service", "api@internal".to_string()),
            ("traefik.http.routers.traefik-secure.tls", "true".to_string()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        let service = Service {
            image: format!("traefik:v{version}"),
            container_name: Some(service_name.to_string()),
            restart: Some("unless-stopped".to_string()),
            command: strings(&[
                "--api.dashboard=true",
                "--api.insecure=true",
                "--providers.docker=true",
                "--providers.docker.exposedbydefault=false",
                "--entrypoints.web.address=:80",
                "--entrypoints.websecure.address=:443",
                "--providers.file.directory=/etc/traefik/dynamic",
                "--providers.file.watch=true",
            ]),
            ports: strings(&["80:80", "443:443", "8080:8080"]),
            volumes: strings(&[
                "/var/run/docker.sock:/var/run/docker.sock:ro",
                "./config:/etc/traefik/dynamic",
                "./certs:/certs:ro",
            ]),
            networks: vec![network_name.to_string()],
            labels,
        };

        Ok(Self {
            version: None,
            services: BTreeMap::from([(service_name.to_string(), service)]),
            networks: BTreeMap::from([(network_name.to_string(), NetworkRef { external: true })]),
        })
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, ComposeError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    match value.trim() {
        "" => fallback,
        trimmed => trimmed,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Where the proxy compose files went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyComposeReport {
    /// Reference copy under `.locom/proxy/`, always rewritten
    pub reference: PathBuf,
    /// Working copy under `proxy/`
    pub working: PathBuf,
    /// False when the working copy already existed and was left alone
    pub working_written: bool,
}

/// Write `compose` as the stage's reference and working proxy compose files
pub async fn write_proxy_compose(
    stage_dir: &Path,
    compose: &ComposeFile,
) -> Result<ProxyComposeReport, ComposeError> {
    let document = compose.to_yaml()?;

    let reference = stage_dir.join(CONFIG_DIR).join(PROXY_DIR).join(COMPOSE_FILE);
    write_with_parents(&reference, &document).await?;
    tracing::debug!(path = %reference.display(), "wrote reference proxy compose file");

    let working = stage_dir.join(PROXY_DIR).join(COMPOSE_FILE);
    let working_written = match tokio::fs::try_exists(&working).await {
        Ok(true) => false,
        Ok(false) => {
            write_with_parents(&working, &document).await?;
            true
        }
        Err(source) => return Err(ComposeError::Write { path: working, source }),
    };
    tracing::info!(path = %working.display(), working_written, "proxy compose file ready");

    Ok(ProxyComposeReport {
        reference,
        working,
        working_written,
    })
}

async fn write_with_parents(path: &Path, content: &str) -> Result<(), ComposeError> {
    let write_error = |source| ComposeError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, content).await.map_err(write_error)
}
