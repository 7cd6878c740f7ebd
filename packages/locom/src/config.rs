//! Stage configuration in `.locom/locom.yml`

use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Directory holding stage configuration and state
pub const CONFIG_DIR: &str = ".locom";
/// Configuration file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "locom.yml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No `.locom/locom.yml` in the working directory
    #[error("this folder does not contain locom stage configuration")]
    NotAStage,

    /// The file exists but cannot be read
    #[error("reading {}: {source}", path.display())]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for a stage
    #[error("parsing {}: {source}", path.display())]
    Parse {
        /// Config file
        path: PathBuf,
        /// YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// A required field is empty
    #[error("missing required fields in locom.yml ({0})")]
    MissingField(&'static str),

    /// The stage directory has no usable name
    #[error("cannot derive a project name from {}", .0.display())]
    ProjectName(PathBuf),
}

/// Root of `locom.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage-wide settings
    #[serde(default)]
    pub stage: Stage,
    /// Application definitions, consumed by other tooling
    #[serde(default)]
    pub apps: Option<serde_yaml::Mapping>,
}

/// `stage:` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// `stage.network`
    #[serde(default)]
    pub network: Network,
}

/// `stage.network` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Compose network name
    #[serde(default)]
    pub name: String,
    /// Loopback bind address
    #[serde(default)]
    pub bind: Bind,
    /// DNS naming
    #[serde(default)]
    pub dns: Dns,
    /// Reverse proxy
    #[serde(default)]
    pub proxy: Proxy,
}

/// `stage.network.bind`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bind {
    /// IPv4 or IPv6 literal
    #[serde(default)]
    pub address: String,
}

/// `stage.network.dns`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    /// Suffix with leading dot
    #[serde(default)]
    pub suffix: String,
}

/// `stage.network.proxy`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    /// Service name
    #[serde(default)]
    pub name: String,
    /// Engine and version
    #[serde(default, rename = "type")]
    pub kind: ProxyType,
}

/// `stage.network.proxy.type`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyType {
    /// Proxy implementation, e.g. `traefik`
    #[serde(default)]
    pub engine: String,
    /// Image version
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: String,
}

// unquoted versions like 2.10 arrive as floats
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a version string, found {other:?}"
        ))),
    }
}

impl StageConfig {
    /// Path of the config file below `stage_dir`
    pub fn path(stage_dir: &Path) -> PathBuf {
        stage_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load `.locom/locom.yml` from `stage_dir`
    pub async fn load(stage_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(stage_dir);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotAStage)
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Self::parse(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Parse YAML text; an empty document is the default config
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Compose network name, required by `proxy` and `network`
    pub fn network_name(&self) -> Result<&str, ConfigError> {
        match self.stage.network.name.trim() {
            "" => Err(ConfigError::MissingField("stage.network.name")),
            name => Ok(name),
        }
    }

    /// Bind address and DNS suffix, both required for hosts entries
    pub fn loopback(&self) -> Result<(&str, &str), ConfigError> {
        let address = self.stage.network.bind.address.trim();
        let suffix = self.stage.network.dns.suffix.trim();
        if address.is_empty() || suffix.is_empty() {
            return Err(ConfigError::MissingField(
                "stage.network.bind.address or stage.network.dns.suffix",
            ));
        }
        Ok((address, suffix))
    }
}

/// Project name of a stage: the base name of its directory
pub fn project_name(stage_dir: &Path) -> Result<String, ConfigError> {
    stage_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ConfigError::ProjectName(stage_dir.to_path_buf()))
}
