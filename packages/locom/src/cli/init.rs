//! `locom init [folder]`

use std::io::Write;
use std::path::Path;

use locom_common::ElevationStrategy;

use super::Context;
use crate::config::CONFIG_DIR;
use crate::error::CliError;
use crate::stage;

/// Create a stage; relative folders resolve against the context's stage dir
pub async fn handle_init<E: ElevationStrategy>(
    folder: &Path,
    ctx: &Context<E>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    stage::init(&ctx.stage_dir.join(folder)).await?;

    writeln!(
        out,
        "Initialized empty Locom stage in {}/",
        folder.join(CONFIG_DIR).display()
    )?;
    Ok(())
}
