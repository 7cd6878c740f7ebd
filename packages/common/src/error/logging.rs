//! Structured logging bootstrap
//!
//! Library code logs through `tracing`; with its `log` feature enabled the
//! events are forwarded to whatever `log` logger is installed here.

use log::{debug, info, warn};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Logging infrastructure using `env_logger`
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging (call once at application startup)
    ///
    /// Levels are configured via `RUST_LOG`; without it only warnings and
    /// errors are shown so command output stays readable:
    /// - `RUST_LOG=debug` - Enable all debug logs, including spawned commands
    /// - `RUST_LOG=locom_hosts=debug` - Module-specific levels
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    ///
    /// Safe to call from every test; repeated initialization is ignored.
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log a request for elevated privileges before the prompt appears
    pub fn log_elevation_request(action: &str, program: &str) {
        info!("Requesting elevation to {action} (helper: {program})");
    }

    /// Log a subprocess about to be spawned
    pub fn log_spawn(command_line: &str) {
        debug!("Spawning: {command_line}");
    }

    /// Log cleanup failures that should not abort the command
    pub fn log_cleanup_warning(component: &str, error: &dyn std::error::Error) {
        warn!("Cleanup of {component} failed: {error}");
    }
}
