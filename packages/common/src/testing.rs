//! Test doubles shared with downstream test suites

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::elevation::ElevationStrategy;
use crate::error::ElevationError;

/// An elevated call captured by [`RecordingElevation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElevatedCall {
    /// `run_elevated(program, args)`
    Run {
        /// Program name
        program: String,
        /// Arguments
        args: Vec<String>,
    },
    /// `copy_elevated(source, destination)`
    Copy {
        /// Staged source file
        source: PathBuf,
        /// Protected destination
        destination: PathBuf,
    },
}

/// Elevation fake that records calls instead of prompting
#[derive(Debug, Default)]
pub struct RecordingElevation {
    calls: Mutex<Vec<ElevatedCall>>,
    deny: bool,
    perform_copies: bool,
}

impl RecordingElevation {
    /// Accept every call without doing anything
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every call and answer it with [`ElevationError::Denied`]
    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    /// Accept every call and actually perform copies with `std::fs::copy`
    pub fn copying() -> Self {
        Self {
            perform_copies: true,
            ..Self::default()
        }
    }

    /// Calls seen so far, in order
    pub fn calls(&self) -> Vec<ElevatedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: ElevatedCall) -> Result<(), ElevationError> {
        let command = format!("{call:?}");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.deny {
            return Err(ElevationError::Denied {
                command,
                status: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

impl ElevationStrategy for RecordingElevation {
    async fn run_elevated(&self, program: &str, args: &[String]) -> Result<(), ElevationError> {
        self.record(ElevatedCall::Run {
            program: program.to_string(),
            args: args.to_vec(),
        })
    }

    async fn copy_elevated(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), ElevationError> {
        self.record(ElevatedCall::Copy {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        })?;
        if self.perform_copies {
            std::fs::copy(source, destination).map_err(|source_err| ElevationError::Io {
                command: format!("copy {} {}", source.display(), destination.display()),
                source: source_err,
            })?;
        }
        Ok(())
    }
}
