//! Invoker error types.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Configuration and execution-precondition errors.
#[derive(Debug, Error)]
pub enum PrinceError {
    #[error("invalid prince(1) option: \"{0}\" (but can be forced)")]
    InvalidOption(String),
    #[error("prince(1) option \"{0}\" requires an argument")]
    MissingArgument(String),
    #[error("cannot resolve binary \"{0}\" to a filesystem path")]
    BinaryNotFound(String),
    #[error("no output file configured and no raster output requested")]
    MissingOutput,
}

/// Why an execution failed.
#[derive(Debug, Error)]
pub enum Failure {
    /// Raised before the child process was spawned.
    #[error(transparent)]
    Prepare(#[from] PrinceError),
    /// prince(1) reported `prince: error: <message>` on stderr.
    #[error("{0}")]
    Tool(String),
    #[error("prince(1) exited with {0}")]
    Exit(ExitStatus),
    #[error("prince(1) timed out after {0:?}")]
    Timeout(Duration),
    #[error("prince(1) output exceeded {0} bytes")]
    BufferExceeded(usize),
    #[error("failed to spawn prince(1): {0}")]
    Spawn(#[source] io::Error),
    #[error("failed to capture prince(1) output: {0}")]
    Io(#[source] io::Error),
}

/// A failed execution, with whatever output was captured up to the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ExecuteError {
    pub error: Failure,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecuteError {
    pub(crate) fn new(error: Failure, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            error,
            stdout,
            stderr,
        }
    }

    /// Failure raised while preparing, before any output existed.
    pub(crate) fn prepare(error: PrinceError) -> Self {
        Self::new(Failure::Prepare(error), Vec::new(), Vec::new())
    }

    /// Human-readable failure message.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}
