//! locom manages a local stage of Docker Compose stacks
//!
//! The binary wires stage configuration into the TLS and hosts crates:
//! - [`config`] loads `.locom/locom.yml`
//! - [`stage`] creates a new stage
//! - [`compose`] renders the proxy's Docker Compose file
//! - [`network`] talks to the docker client about networks
//! - [`cli`] builds the command tree and dispatches commands

pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod network;
pub mod stage;

pub use error::CliError;
