//! Load-stage state machine.
//!
//! Stages move forward as a session is created or loaded and fall back to
//! [`LoadStage::None`] when the player returns to the main menu. The tracker only
//! rejects no-op transitions; backward jumps are legitimate (return-to-title can
//! happen from any stage) and are not validated.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::context::SessionContext;

/// Named point in session-establishment progress.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LoadStage {
    /// No session is loaded (title screen or between sessions).
    #[default]
    None,
    /// A new save file is being written for the first time.
    CreatingSaveFile,
    /// The new save file has been written.
    SaveCreated,
    /// An existing save is being read and applied.
    SaveLoading,
    /// Save data is applied but the world is not yet interactive.
    Loaded,
    /// The world is fully ready for extensions.
    Ready,
}

impl LoadStage {
    /// Returns a stable label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStage::None => "None",
            LoadStage::CreatingSaveFile => "CreatingSaveFile",
            LoadStage::SaveCreated => "SaveCreated",
            LoadStage::SaveLoading => "SaveLoading",
            LoadStage::Loaded => "Loaded",
            LoadStage::Ready => "Ready",
        }
    }

    /// True once save data has been applied to the world.
    pub fn is_world_loaded(self) -> bool {
        matches!(self, LoadStage::Loaded | LoadStage::Ready)
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition reported by [`LoadStageTracker::set_stage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageChange {
    /// Stage observed before the transition.
    pub previous: LoadStage,
    /// Stage observed after the transition.
    pub current: LoadStage,
}

/// Single writer of [`SessionContext::load_stage`].
#[derive(Debug, Default)]
pub struct LoadStageTracker {
    transitions: u64,
}

impl LoadStageTracker {
    /// Creates a tracker with no recorded transitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the session to `new_stage`.
    ///
    /// Returns `None` when the session is already at `new_stage`; otherwise the
    /// stage is updated and the transition is returned so the caller can decide
    /// which notifications to raise.
    pub fn set_stage(
        &mut self,
        session: &mut SessionContext,
        new_stage: LoadStage,
    ) -> Option<StageChange> {
        let previous = session.load_stage();
        if previous == new_stage {
            return None;
        }

        session.set_load_stage(new_stage);
        self.transitions = self.transitions.saturating_add(1);
        debug!("context: load stage changed {previous} -> {new_stage}");

        Some(StageChange {
            previous,
            current: new_stage,
        })
    }

    /// Number of real transitions applied since creation.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}
