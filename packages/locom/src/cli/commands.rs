//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Help order of the `help` command
pub const HELP_ORDER: usize = 1;
/// Help order of the `version` command
pub const VERSION_ORDER: usize = 10;
/// Help order of the `init` command
pub const INIT_ORDER: usize = 20;
/// Help order of the `cert` command
pub const CERT_ORDER: usize = 30;
/// Help order of the `hosts` command
pub const HOSTS_ORDER: usize = 40;
/// Help order of the `proxy` command
pub const PROXY_ORDER: usize = 50;
/// Help order of the `network` command
pub const NETWORK_ORDER: usize = 60;

/// locom manages a local stage of Docker Compose stacks
#[derive(Debug, Parser)]
#[command(name = "locom")]
#[command(
    long_about = "locom is a CLI tool for managing local Docker Compose stacks in a minimal, offline-friendly way."
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Print this message or the help of the given subcommand
    #[command(display_order = HELP_ORDER)]
    Help {
        /// Command path to describe
        #[arg(value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Print version information
    #[command(display_order = VERSION_ORDER)]
    Version,

    /// Initialize a new locom stage in the specified folder
    ///
    /// Creates a .locom directory and a default locom.yml config file inside
    /// the given folder. Fails if the folder is not empty.
    #[command(display_order = INIT_ORDER)]
    Init {
        /// Stage folder, created when missing
        #[arg(value_name = "FOLDER", default_value = ".")]
        folder: PathBuf,
    },

    /// Manage certificates for locom
    #[command(display_order = CERT_ORDER)]
    Cert {
        #[command(subcommand)]
        command: CertCommands,
    },

    /// Update the hosts file with entries from the locom stage
    #[command(display_order = HOSTS_ORDER)]
    Hosts {
        /// Check if the DNS name resolves and responds
        #[arg(long)]
        verify: bool,

        /// Remove this stage's entries from the hosts file
        #[arg(long, conflicts_with = "verify")]
        remove: bool,
    },

    /// Create a default docker-compose configuration with Traefik proxy
    ///
    /// Always refreshes .locom/proxy/docker-compose.yml and writes
    /// proxy/docker-compose.yml only when it does not exist yet.
    #[command(display_order = PROXY_ORDER)]
    Proxy,

    /// Ensure the Docker network defined in .locom/locom.yml exists
    #[command(display_order = NETWORK_ORDER)]
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CertCommands {
    /// Local CA and server certificate for the stage
    Selfsigned {
        #[command(subcommand)]
        command: SelfSignedCommands,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum SelfSignedCommands {
    /// Generate a local CA, a server certificate and the proxy TLS config
    Setup,

    /// Install the local CA into the OS trust store
    Trust,

    /// Remove the local CA from the OS trust store
    Untrust {
        /// Remove this CA instead of the one in proxy/certs
        #[arg(long, value_name = "SHA1")]
        fingerprint: Option<String>,
    },

    /// Delete the generated certificates, keys and TLS config
    Cleanup,
}
