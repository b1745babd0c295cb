//! Error types and exit status for archwarden.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for every session-terminating failure
pub const EXIT_FAILURE: i32 = 1;

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Cannot create log directory {path}: {source}")]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file already exists: {0}")]
    SessionClash(PathBuf),

    #[error("Privilege elevation failed: {0}")]
    Elevation(String),

    #[error("Step '{step}' failed: {reason}")]
    FatalStep { step: String, reason: String },

    #[error("Operator aborted the session during '{step}'")]
    Aborted { step: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WardenError {
    /// Process exit code for this failure.
    ///
    /// Every error ends the session with the same status; the message in the
    /// session log tells them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            WardenError::LogDirectory { .. }
            | WardenError::SessionClash(_)
            | WardenError::Elevation(_)
            | WardenError::FatalStep { .. }
            | WardenError::Aborted { .. }
            | WardenError::Config(_)
            | WardenError::Io(_) => EXIT_FAILURE,
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, WardenError::Aborted { .. })
    }
}

pub type WardenResult<T> = std::result::Result<T, WardenError>;
