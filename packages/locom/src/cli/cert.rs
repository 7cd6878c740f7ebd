//! `locom cert selfsigned ...`

use std::io::Write;

use locom_common::ElevationStrategy;
use locom_tls::{TrustReport, TrustStore, TrustStoreAdapter};

use super::commands::{CertCommands, SelfSignedCommands};
use super::{display_relative, Context};
use crate::error::CliError;

/// Dispatch `cert` subcommands
pub async fn handle_cert<E: ElevationStrategy>(
    command: CertCommands,
    ctx: &Context<E>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let CertCommands::Selfsigned { command } = command;
    match command {
        SelfSignedCommands::Setup => handle_setup(ctx, out).await,
        SelfSignedCommands::Trust => handle_trust(ctx, out).await,
        SelfSignedCommands::Untrust { fingerprint } => {
            handle_untrust(ctx, fingerprint.as_deref(), out).await
        }
        SelfSignedCommands::Cleanup => handle_cleanup(ctx, out).await,
    }
}

async fn handle_setup<E>(ctx: &Context<E>, out: &mut impl Write) -> Result<(), CliError> {
    let report = ctx.builder.setup().await?;

    writeln!(out, "Generated local CA (SHA-1 {})", report.ca_fingerprint)?;
    writeln!(out, "Generated server certificate (SHA-1 {})", report.server_fingerprint)?;
    for file in &report.files {
        writeln!(
            out,
            "  wrote {} ({} bytes)",
            display_relative(&file.path, &ctx.stage_dir),
            file.size_bytes
        )?;
    }
    if let Some(old) = &report.replaced_ca_fingerprint {
        writeln!(
            out,
            "Warning: replaced CA {old}. If it was trusted, run 'locom cert selfsigned untrust --fingerprint {old}' \
             and then 'locom cert selfsigned trust'."
        )?;
    }
    Ok(())
}

async fn handle_trust<E: ElevationStrategy>(
    ctx: &Context<E>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let ca_cert = ctx.builder.layout().ca_cert();
    let store = TrustStore::select(ctx.platform, &ctx.elevation);
    let report = store.trust(&ca_cert).await?;
    print_warnings(&report, out)?;
    writeln!(
        out,
        "Trusted local CA {} in the {} trust store",
        display_relative(&ca_cert, &ctx.stage_dir),
        ctx.platform
    )?;
    Ok(())
}

async fn handle_untrust<E: ElevationStrategy>(
    ctx: &Context<E>,
    fingerprint: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let store = TrustStore::select(ctx.platform, &ctx.elevation);
    let report = match fingerprint {
        Some(fingerprint) => store.untrust(fingerprint).await?,
        None => store.untrust_ca_file(&ctx.builder.layout().ca_cert()).await?,
    };
    print_warnings(&report, out)?;
    writeln!(out, "Removed local CA from the {} trust store", ctx.platform)?;
    Ok(())
}

async fn handle_cleanup<E>(ctx: &Context<E>, out: &mut impl Write) -> Result<(), CliError> {
    let report = locom_tls::cleanup(ctx.builder.layout()).await?;
    if report.removed.is_empty() {
        writeln!(out, "Nothing to remove")?;
    }
    for path in &report.removed {
        writeln!(out, "  removed {}", display_relative(path, &ctx.stage_dir))?;
    }
    Ok(())
}

fn print_warnings(report: &TrustReport, out: &mut impl Write) -> Result<(), CliError> {
    for warning in &report.warnings {
        writeln!(out, "Warning: {warning}")?;
    }
    Ok(())
}
