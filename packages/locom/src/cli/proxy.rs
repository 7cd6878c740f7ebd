//! `locom proxy`

use std::io::Write;

use locom_common::ElevationStrategy;

use super::{display_relative, Context};
use crate::compose::{write_proxy_compose, ComposeFile};
use crate::config::StageConfig;
use crate::error::CliError;

/// Generate the traefik compose files for the stage
pub async fn handle_proxy<E: ElevationStrategy>(
    ctx: &Context<E>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let config = StageConfig::load(&ctx.stage_dir).await?;
    let network_name = config.network_name()?;
    let compose = ComposeFile::traefik(network_name, &config.stage.network)?;
    let report = write_proxy_compose(&ctx.stage_dir, &compose).await?;

    let working = display_relative(&report.working, &ctx.stage_dir);
    if report.working_written {
        writeln!(out, "Created {working} from template")?;
    } else {
        writeln!(out, "Skipped writing {working} (already exists)")?;
    }
    Ok(())
}
