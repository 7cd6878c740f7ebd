//! Hosts file management for locom stages
//!
//! [`HostsEditor`] owns one delimited block per project inside the system
//! hosts file and rewrites it idempotently, escalating through an
//! [`ElevationStrategy`](locom_common::ElevationStrategy) when the file is
//! not writable. [`DnsVerifier`] checks the result resolves.

pub mod block;
pub mod editor;
pub mod error;
pub mod platform;
pub mod verify;

pub use block::{HostsBlock, LineEnding};
pub use editor::{HostsEditor, LoopbackEntry, RemoveReport, ReplaceMethod, SetupReport};
pub use error::{HostsError, Result, VerifyError};
pub use platform::hosts_path;
pub use verify::{DnsVerifier, ProbeOutcome, Verification};
