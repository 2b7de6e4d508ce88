//! Fatal-exit path taken when a crash guard runs out of budget.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;
use session::SessionContext;

use crate::error::SupervisorError;
use crate::guard::GuardError;

/// Which guarded loop gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashPath {
    /// The host update loop.
    Update,
    /// The host draw loop.
    Render,
}

impl CrashPath {
    /// Human-readable reason recorded for the crash.
    pub fn reason(self) -> &'static str {
        match self {
            CrashPath::Update => {
                "the host crashed while updating and the supervisor could not recover it"
            }
            CrashPath::Render => {
                "the host crashed while drawing and the supervisor could not recover it"
            }
        }
    }
}

/// Everything known about an unrecoverable crash.
#[derive(Clone, Debug, Serialize)]
pub struct CrashReport {
    /// Loop whose guard gave up.
    pub path: CrashPath,
    /// Human-readable summary of the crash.
    pub reason: String,
    /// Failure that spent the budget.
    pub last_error: String,
    /// Consecutive failures observed, equal to the guard's threshold.
    pub consecutive_failures: u32,
    /// Normal-path tick at the time of the crash.
    pub tick: u64,
    /// Session as it stood when the guard gave up.
    pub session: SessionContext,
}

impl CrashReport {
    pub(crate) fn new(
        path: CrashPath,
        error: &GuardError,
        consecutive_failures: u32,
        session: &SessionContext,
    ) -> Self {
        Self {
            path,
            reason: path.reason().to_string(),
            last_error: error.to_string(),
            consecutive_failures,
            tick: session.tick,
            session: session.clone(),
        }
    }
}

/// Terminates the supervised process after a crash guard is exhausted.
///
/// Implementations are called at most once per supervisor. The production
/// implementation does not return; test doubles record the report instead.
pub trait FatalExit {
    fn fatal(&mut self, report: &CrashReport);
}

impl<F> FatalExit for F
where
    F: FnMut(&CrashReport),
{
    fn fatal(&mut self, report: &CrashReport) {
        self(report)
    }
}

/// Writes the crash report as JSON next to the host, then exits the process.
#[derive(Clone, Debug)]
pub struct CrashLogExit {
    artifact: PathBuf,
    exit_code: i32,
}

impl CrashLogExit {
    /// Exit that writes to `artifact` and ends the process with status 1.
    pub fn new(artifact: impl Into<PathBuf>) -> Self {
        Self {
            artifact: artifact.into(),
            exit_code: 1,
        }
    }

    /// Overrides the process exit status.
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Path the crash report is written to.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Serializes `report` to the artifact path.
    pub fn write_artifact(&self, report: &CrashReport) -> Result<(), SupervisorError> {
        let bytes = serde_json::to_vec_pretty(report)?;
        fs::write(&self.artifact, bytes).map_err(|source| SupervisorError::CrashArtifact {
            path: self.artifact.clone(),
            source,
        })
    }
}

impl FatalExit for CrashLogExit {
    fn fatal(&mut self, report: &CrashReport) {
        match self.write_artifact(report) {
            Ok(()) => info!("crash report written to {}", self.artifact.display()),
            Err(err) => error!("{err}"),
        }
        std::process::exit(self.exit_code);
    }
}
