//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The policy file given with `--policy` does not exist.
    #[error("policy file not found at {path}")]
    PolicyNotFound { path: PathBuf },

    /// The command to run after the guard could not be started.
    #[error("failed to run '{command}': {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An error occurred in the guard.
    #[error(transparent)]
    Guard(#[from] guard::Error),

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),

    /// Failed to encode output.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
