use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the supervisor's own plumbing.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The crash report could not be encoded as JSON.
    #[error("failed to serialize crash report: {0}")]
    CrashReport(#[from] serde_json::Error),

    /// The crash artifact could not be written.
    #[error("failed to write crash artifact to {}: {source}", .path.display())]
    CrashArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
