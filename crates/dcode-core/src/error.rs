//! Error types for directive expansion.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error raised while expanding a directive.
///
/// Every variant is fatal for the build: nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    /// No script is configured for the key, neither directly nor by default.
    #[error("No script configured for key \"{}\"", .key.as_deref().unwrap_or("default"))]
    Configuration {
        /// Directive key (`None` for the default key).
        key: Option<String>,
    },

    /// The script command line could not be split into words.
    #[error("Invalid script command line `{script}`: {message}")]
    InvalidScript {
        /// Script as configured.
        script: String,
        /// Reason the split failed.
        message: String,
    },

    /// A recognized option has a value it cannot take.
    #[error("Invalid value `{value}` for option `{option}`")]
    InvalidOption {
        /// Option name (e.g., `cache`).
        option: String,
        /// Rejected value.
        value: String,
    },

    /// The script exited unsuccessfully.
    #[error(transparent)]
    Execution(#[from] Box<ExecutionFailure>),

    /// The script could not be started.
    #[error("Failed to run `{program}`")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The audit record file could not be appended to.
    #[error("Failed to write record file {}", .path.display())]
    Record {
        /// Record file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// I/O error while talking to the script.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A script that ran to completion with a nonzero exit status.
///
/// Carries everything needed to diagnose the failure: the quoted command line,
/// the exit code, and the captured output streams byte for byte.
#[derive(Debug)]
pub struct ExecutionFailure {
    /// Shell-quoted command line.
    pub command: String,
    /// Exit code, or `None` if the script was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

impl ExecutionFailure {
    /// Standard output decoded lossily as UTF-8.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error decoded lossily as UTF-8.
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "{} - failed with exit code {code}", self.command),
            None => write!(f, "{} - terminated by signal", self.command),
        }
    }
}

impl std::error::Error for ExecutionFailure {}
