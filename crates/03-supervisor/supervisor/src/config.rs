//! Supervisor configuration.

use std::collections::BTreeSet;

use event_bus::EventKind;
use serde::{Deserialize, Serialize};

/// Consecutive failures tolerated by each crash guard.
pub const DEFAULT_CRASH_THRESHOLD: u32 = 60;

/// Successful ticks after a save loads before the world counts as ready.
pub const DEFAULT_POST_LOAD_GRACE_TICKS: u32 = 5;

/// Tunables for a [`TickSupervisor`](crate::TickSupervisor).
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Failure budget of the update guard.
    pub update_crash_threshold: u32,
    /// Failure budget of the render guard.
    pub render_crash_threshold: u32,
    /// Grace ticks between save load and world readiness.
    pub post_load_grace_ticks: u32,
    /// Notifications allowed while the host is saving.
    pub saving_policy: SavingPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            update_crash_threshold: DEFAULT_CRASH_THRESHOLD,
            render_crash_threshold: DEFAULT_CRASH_THRESHOLD,
            post_load_grace_ticks: DEFAULT_POST_LOAD_GRACE_TICKS,
            saving_policy: SavingPolicy::default(),
        }
    }
}

impl SupervisorConfig {
    /// Parses a JSON config, filling missing fields with defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Which notifications may be raised while a save is being written.
///
/// Anything outside the allow list is dropped for the duration of the save
/// window. The default only lets the save lifecycle notifications through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingPolicy {
    allowed: BTreeSet<EventKind>,
}

impl SavingPolicy {
    /// Policy that suppresses every notification while saving.
    pub fn silent() -> Self {
        Self {
            allowed: BTreeSet::new(),
        }
    }

    /// Adds `kind` to the allow list.
    pub fn allow(mut self, kind: EventKind) -> Self {
        self.allowed.insert(kind);
        self
    }

    /// Removes `kind` from the allow list.
    pub fn deny(mut self, kind: EventKind) -> Self {
        self.allowed.remove(&kind);
        self
    }

    /// Returns `true` if `kind` may be raised while saving.
    pub fn allows(&self, kind: EventKind) -> bool {
        self.allowed.contains(&kind)
    }
}

impl Default for SavingPolicy {
    fn default() -> Self {
        Self::silent()
            .allow(EventKind::SaveCreating)
            .allow(EventKind::Saving)
    }
}
