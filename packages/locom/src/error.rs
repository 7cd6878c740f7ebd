//! Top-level error type of the CLI

use locom_common::UnsupportedPlatform;
use locom_hosts::HostsError;
use locom_tls::TlsError;

use crate::compose::ComposeError;
use crate::config::ConfigError;
use crate::network::NetworkError;
use crate::stage::InitError;

/// Any error a command can end with
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid arguments, or a help/usage request
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// Stage configuration missing or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `init` failed
    #[error(transparent)]
    Init(#[from] InitError),

    /// Certificate generation or trust-store failure
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Hosts file update failure
    #[error(transparent)]
    Hosts(#[from] HostsError),

    /// Proxy compose generation failure
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// Docker network inspection or creation failure
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Running OS is not supported
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    /// The working directory could not be determined
    #[error("cannot determine the current directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    /// Writing command output failed
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
