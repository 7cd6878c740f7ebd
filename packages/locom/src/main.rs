//! Main entry point for the locom CLI

use std::process::ExitCode;

use locom::cli::{self, Context};
use locom::CliError;
use locom_common::error::LoggingTransformer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    LoggingTransformer::init();

    let result = match Context::system() {
        Ok(ctx) => cli::run(std::env::args_os(), &ctx, &mut std::io::stdout()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // clap prints help/usage itself and picks the exit code
        Err(CliError::Usage(e)) => e.exit(),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
