//! `locom network`

use std::io::Write;

use locom_common::ElevationStrategy;

use super::Context;
use crate::config::StageConfig;
use crate::error::CliError;

/// Create the stage's docker network unless it exists
pub async fn handle_network<E: ElevationStrategy>(
    ctx: &Context<E>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let config = StageConfig::load(&ctx.stage_dir).await?;
    let name = config.network_name()?;

    writeln!(out, "Ensuring Docker network \"{name}\" exists...")?;
    if ctx.docker.network_exists(name).await? {
        writeln!(out, "Network already exists.")?;
        return Ok(());
    }

    writeln!(out, "Creating Docker network \"{name}\"...")?;
    out.flush()?;
    ctx.docker.create_network(name).await?;
    writeln!(out, "Network created successfully.")?;
    Ok(())
}
