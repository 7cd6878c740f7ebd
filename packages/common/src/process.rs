//! Subprocess helpers
//!
//! Every external helper (elevation front-ends, `certutil`, `security`,
//! `update-ca-certificates`) is spawned through these functions so spawn
//! failures and exit codes are classified the same way everywhere.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::error::{ElevationError, LoggingTransformer};

/// Render a command line for logs and error messages
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

/// Run a command attached to the terminal so it can prompt the user
pub async fn run_interactive(program: &str, args: &[String]) -> Result<(), ElevationError> {
    let rendered = render_command(program, args);
    LoggingTransformer::log_spawn(&rendered);

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| spawn_error(program, &rendered, e))?;

    check_status(rendered, status)
}

/// Run a command with its stdin fed from `input`, discarding stdout
///
/// Used for `tee`-style copies where the helper echoes its input.
pub async fn run_with_input(
    program: &str,
    args: &[String],
    input: &Path,
) -> Result<(), ElevationError> {
    let rendered = format!("{} < {}", render_command(program, args), input.display());
    LoggingTransformer::log_spawn(&rendered);

    let file = std::fs::File::open(input).map_err(|source| ElevationError::Io {
        command: rendered.clone(),
        source,
    })?;

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::from(file))
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| spawn_error(program, &rendered, e))?;

    check_status(rendered, status)
}

/// Run a non-interactive command and return its stdout
pub async fn run_captured(program: &str, args: &[String]) -> Result<String, ElevationError> {
    let rendered = render_command(program, args);
    LoggingTransformer::log_spawn(&rendered);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error(program, &rendered, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(command = %rendered, stderr = %stderr.trim(), "command failed");
        return Err(ElevationError::Denied {
            command: rendered,
            status: output.status.to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn spawn_error(program: &str, rendered: &str, source: std::io::Error) -> ElevationError {
    if source.kind() == std::io::ErrorKind::NotFound {
        ElevationError::HelperMissing {
            helper: program.to_string(),
        }
    } else {
        ElevationError::Io {
            command: rendered.to_string(),
            source,
        }
    }
}

fn check_status(command: String, status: ExitStatus) -> Result<(), ElevationError> {
    if status.success() {
        Ok(())
    } else {
        Err(ElevationError::Denied {
            command,
            status: status.to_string(),
        })
    }
}
