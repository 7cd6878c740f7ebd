//! Privilege elevation capability
//!
//! Trust-store and hosts-file writes need administrator rights. Components
//! take an [`ElevationStrategy`] instead of spawning prompts themselves, so
//! the platform flavour is chosen once at startup and tests can substitute a
//! recording fake.

use std::path::Path;

use crate::error::{ElevationError, LoggingTransformer};
use crate::platform::Platform;
use crate::process;

/// Run commands or copy files with elevated privileges
///
/// Both operations are interactive and block until the user answers the
/// OS prompt. A declined prompt surfaces as [`ElevationError::Denied`].
#[allow(async_fn_in_trait)]
pub trait ElevationStrategy {
    /// Run `program` with `args` as administrator/root
    async fn run_elevated(&self, program: &str, args: &[String]) -> Result<(), ElevationError>;

    /// Copy `source` over `destination` as administrator/root
    async fn copy_elevated(&self, source: &Path, destination: &Path)
        -> Result<(), ElevationError>;
}

impl<E: ElevationStrategy + ?Sized> ElevationStrategy for &E {
    async fn run_elevated(&self, program: &str, args: &[String]) -> Result<(), ElevationError> {
        (**self).run_elevated(program, args).await
    }

    async fn copy_elevated(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), ElevationError> {
        (**self).copy_elevated(source, destination).await
    }
}

/// `sudo` on macOS and Linux
#[derive(Debug, Clone, Copy, Default)]
pub struct SudoElevation;

impl ElevationStrategy for SudoElevation {
    async fn run_elevated(&self, program: &str, args: &[String]) -> Result<(), ElevationError> {
        LoggingTransformer::log_elevation_request(program, "sudo");
        let mut sudo_args = Vec::with_capacity(args.len() + 1);
        sudo_args.push(program.to_string());
        sudo_args.extend_from_slice(args);
        process::run_interactive("sudo", &sudo_args).await
    }

    async fn copy_elevated(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), ElevationError> {
        // tee keeps the destination inode, so ownership and mode survive
        LoggingTransformer::log_elevation_request("write a protected file", "sudo tee");
        let args = vec!["tee".to_string(), destination.display().to_string()];
        process::run_with_input("sudo", &args, source).await
    }
}

/// UAC prompt via PowerShell `Start-Process -Verb RunAs` on Windows
#[derive(Debug, Clone, Copy, Default)]
pub struct RunAsElevation;

impl RunAsElevation {
    /// PowerShell script that launches `program` elevated and forwards its exit code
    pub fn script(program: &str, args: &[String]) -> String {
        let mut script = format!("$p = Start-Process -FilePath {}", ps_quote(program));
        if !args.is_empty() {
            let list: Vec<String> = args.iter().map(|a| ps_quote(&cmd_quote(a))).collect();
            script.push_str(" -ArgumentList @(");
            script.push_str(&list.join(","));
            script.push(')');
        }
        script.push_str(" -Verb RunAs -Wait -PassThru -WindowStyle Hidden; exit $p.ExitCode");
        script
    }
}

impl ElevationStrategy for RunAsElevation {
    async fn run_elevated(&self, program: &str, args: &[String]) -> Result<(), ElevationError> {
        LoggingTransformer::log_elevation_request(program, "powershell RunAs");
        let ps_args = vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            Self::script(program, args),
        ];
        process::run_interactive("powershell", &ps_args).await
    }

    async fn copy_elevated(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), ElevationError> {
        let args = vec![
            "/c".to_string(),
            "copy".to_string(),
            "/y".to_string(),
            source.display().to_string(),
            destination.display().to_string(),
        ];
        self.run_elevated("cmd", &args).await
    }
}

/// Elevation flavour of the running platform
#[derive(Debug, Clone, Copy)]
pub enum SystemElevation {
    /// `sudo`
    Sudo(SudoElevation),
    /// Windows UAC
    RunAs(RunAsElevation),
}

impl SystemElevation {
    /// Pick the elevation front-end for `platform`
    pub fn for_platform(platform: Platform) -> Self {
        if platform.is_unix() {
            Self::Sudo(SudoElevation)
        } else {
            Self::RunAs(RunAsElevation)
        }
    }
}

impl ElevationStrategy for SystemElevation {
    async fn run_elevated(&self, program: &str, args: &[String]) -> Result<(), ElevationError> {
        match self {
            Self::Sudo(sudo) => sudo.run_elevated(program, args).await,
            Self::RunAs(run_as) => run_as.run_elevated(program, args).await,
        }
    }

    async fn copy_elevated(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), ElevationError> {
        match self {
            Self::Sudo(sudo) => sudo.copy_elevated(source, destination).await,
            Self::RunAs(run_as) => run_as.copy_elevated(source, destination).await,
        }
    }
}

/// Single-quoted PowerShell literal
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Start-Process joins arguments with spaces, so quote the ones that need it
fn cmd_quote(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
