//! `locom hosts [--verify | --remove]`

use std::io::Write;

use locom_common::ElevationStrategy;
use locom_hosts::editor::STATE_FILE;
use locom_hosts::{HostsEditor, LoopbackEntry, ProbeOutcome};

use super::Context;
use crate::config::{project_name, StageConfig};
use crate::error::CliError;

/// Write or remove the stage's hosts block
pub async fn handle_hosts<E: ElevationStrategy>(
    verify: bool,
    remove: bool,
    ctx: &Context<E>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let config = StageConfig::load(&ctx.stage_dir).await?;
    let project = project_name(&ctx.stage_dir)?;
    let editor = HostsEditor::new(
        &ctx.elevation,
        &ctx.hosts_path,
        ctx.stage_dir.join(STATE_FILE),
    );

    if remove {
        let report = editor.remove(&project).await?;
        if report.blocks_removed == 0 {
            writeln!(out, "No locom entries for {project} in {}", ctx.hosts_path.display())?;
        } else {
            writeln!(out, "Hosts file entries for {project} removed.")?;
        }
        return Ok(());
    }

    let (address, suffix) = config.loopback()?;
    let entry = LoopbackEntry::new(address, suffix, &project)?;
    let report = editor.setup(&entry, verify).await?;
    writeln!(out, "Hosts file updated with locom stage entries.")?;

    match report.verification {
        None => {}
        Some(Ok(verification)) => {
            writeln!(
                out,
                "DNS resolution successful: {} -> {}",
                verification.hostname, entry.address
            )?;
            match verification.probe {
                ProbeOutcome::Connected => {
                    writeln!(out, "TCP connection successful to {}", verification.probed)?
                }
                ProbeOutcome::Refused => writeln!(
                    out,
                    "Warning: TCP connection to {} refused (no service), but DNS resolution succeeded.",
                    verification.probed
                )?,
                ProbeOutcome::Failed(reason) => writeln!(
                    out,
                    "Warning: TCP connection failed to {}: {reason}",
                    verification.probed
                )?,
            }
        }
        Some(Err(e)) => writeln!(out, "Warning: verification failed: {e}")?,
    }
    Ok(())
}
