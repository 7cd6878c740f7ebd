//! Command tree and dispatch
//!
//! Commands are declared in [`commands`]; top-level help order comes from
//! the `display_order` constants there rather than from declaration order.

pub mod cert;
pub mod commands;
pub mod hosts;
pub mod init;
pub mod network;
pub mod proxy;
pub mod version;

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Command, CommandFactory, Parser};
use locom_common::{ElevationStrategy, Platform, SystemElevation};
use locom_hosts::hosts_path;
use locom_tls::{CertificateAuthorityBuilder, CertificateLayout};

pub use commands::{Cli, Commands};

use crate::error::CliError;
use crate::network::DockerCli;

/// Everything a command needs from the environment
#[derive(Debug)]
pub struct Context<E> {
    /// Stage directory, normally the working directory
    pub stage_dir: PathBuf,
    /// Running platform, selects trust store and hosts path
    pub platform: Platform,
    /// Privilege escalation used for protected writes
    pub elevation: E,
    /// Hosts file to edit
    pub hosts_path: PathBuf,
    /// Certificate setup for this stage
    pub builder: CertificateAuthorityBuilder,
    /// Docker client used by `network`
    pub docker: DockerCli,
}

impl Context<SystemElevation> {
    /// Context for the real system, rooted at the working directory
    pub fn system() -> Result<Self, CliError> {
        let stage_dir = std::env::current_dir().map_err(CliError::WorkingDirectory)?;
        let platform = Platform::current()?;
        Ok(Self::new(stage_dir, platform, SystemElevation::for_platform(platform)))
    }
}

impl<E: ElevationStrategy> Context<E> {
    /// Context with the platform's hosts path and the default certificate layout
    pub fn new(stage_dir: PathBuf, platform: Platform, elevation: E) -> Self {
        let builder = CertificateAuthorityBuilder::new(CertificateLayout::in_stage(&stage_dir));
        Self {
            hosts_path: hosts_path(platform),
            stage_dir,
            platform,
            elevation,
            builder,
            docker: DockerCli::default(),
        }
    }

    /// Edit another hosts file
    pub fn hosts_path(self, hosts_path: impl Into<PathBuf>) -> Self {
        Self {
            hosts_path: hosts_path.into(),
            ..self
        }
    }

    /// Use another certificate builder
    pub fn builder(self, builder: CertificateAuthorityBuilder) -> Self {
        Self { builder, ..self }
    }

    /// Use another docker client
    pub fn docker(self, docker: DockerCli) -> Self {
        Self { docker, ..self }
    }
}

/// Build the full `locom` command tree
pub fn build_command_tree() -> Command {
    Cli::command()
}

/// Parse `args` and run the selected command, writing progress to `out`
pub async fn run<I, T, E>(args: I, ctx: &Context<E>, out: &mut impl Write) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    E: ElevationStrategy,
{
    let cli = Cli::try_parse_from(args)?;
    process_command(cli.command, ctx, out).await
}

/// Run one parsed command
pub async fn process_command<E: ElevationStrategy>(
    command: Commands,
    ctx: &Context<E>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Commands::Help { command } => handle_help(&command, out),
        Commands::Version => version::handle_version(out),
        Commands::Init { folder } => init::handle_init(&folder, ctx, out).await,
        Commands::Cert { command } => cert::handle_cert(command, ctx, out).await,
        Commands::Hosts { verify, remove } => hosts::handle_hosts(verify, remove, ctx, out).await,
        Commands::Proxy => proxy::handle_proxy(ctx, out).await,
        Commands::Network => network::handle_network(ctx, out).await,
    }
}

/// `path` relative to `base` when it lies below it
pub(crate) fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}

fn handle_help(path: &[String], out: &mut impl Write) -> Result<(), CliError> {
    let mut root = build_command_tree();
    let mut command = &mut root;
    for name in path {
        command = match command.find_subcommand_mut(name.as_str()) {
            Some(sub) => sub,
            None => {
                let message = format!("unrecognized command '{name}'");
                return Err(build_command_tree()
                    .error(clap::error::ErrorKind::InvalidSubcommand, message)
                    .into());
            }
        };
    }
    write!(out, "{}", command.render_help())?;
    Ok(())
}
