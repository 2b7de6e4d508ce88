//! Process-wide session state.
//!
//! One [`SessionContext`] exists per supervisor. It is created once and reset in
//! place as sessions start and end. The supervisor is the only writer; extensions
//! receive `&SessionContext` inside every handler call, so they can read but never
//! mutate it. Load stage and instance membership have dedicated writers
//! ([`LoadStageTracker`](crate::LoadStageTracker) and
//! [`InstanceRegistry`](crate::InstanceRegistry)) and are only readable here.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::load_stage::LoadStage;

/// Snapshot of the current session as seen by the supervisor and extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    /// Whether the world is loaded and interactive.
    pub is_world_ready: bool,
    /// Whether the host is serializing a save in the background.
    pub is_saving: bool,
    /// Whether the session is a multiplayer session.
    pub is_multiplayer: bool,
    /// Whether the local participant hosts the session.
    pub is_main_participant: bool,
    /// Whether the first update tick has been observed.
    pub is_game_launched: bool,
    /// Instance currently being updated.
    pub current_instance_id: i32,
    /// Number of normal-path ticks processed.
    pub tick: u64,
    load_stage: LoadStage,
    active_instance_ids: BTreeSet<i32>,
    last_removed_instance_id: Option<i32>,
    is_split_screen: bool,
}

impl SessionContext {
    /// Creates a context for a process with no session loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current load stage.
    pub fn load_stage(&self) -> LoadStage {
        self.load_stage
    }

    /// True once save data has been applied to the world.
    pub fn is_save_loaded(&self) -> bool {
        self.load_stage.is_world_loaded()
    }

    /// Ids of every live host instance.
    pub fn active_instance_ids(&self) -> &BTreeSet<i32> {
        &self.active_instance_ids
    }

    /// Id of the most recently removed instance, if any.
    pub fn last_removed_instance_id(&self) -> Option<i32> {
        self.last_removed_instance_id
    }

    /// True while more than one local instance is alive.
    pub fn is_split_screen(&self) -> bool {
        self.is_split_screen
    }

    /// Instance id to tag log lines with, if players need to be told apart.
    pub fn log_instance_tag(&self) -> Option<i32> {
        if self.current_instance_id != 0 || (self.is_world_ready && self.is_split_screen) {
            Some(self.current_instance_id)
        } else {
            None
        }
    }

    /// Clears per-session flags in place after the world is unloaded.
    ///
    /// Launch state, tick count and instance membership outlive a session and are
    /// left untouched, as is the load stage (owned by the tracker).
    pub fn reset_session(&mut self) {
        self.is_world_ready = false;
        self.is_saving = false;
        self.is_multiplayer = false;
        self.is_main_participant = true;
    }

    pub(crate) fn set_load_stage(&mut self, stage: LoadStage) {
        self.load_stage = stage;
    }

    pub(crate) fn set_instances(
        &mut self,
        active: BTreeSet<i32>,
        last_removed: Option<i32>,
        split_screen: bool,
    ) {
        self.active_instance_ids = active;
        self.last_removed_instance_id = last_removed;
        self.is_split_screen = split_screen;
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            is_world_ready: false,
            is_saving: false,
            is_multiplayer: false,
            is_main_participant: true,
            is_game_launched: false,
            current_instance_id: 0,
            tick: 0,
            load_stage: LoadStage::None,
            active_instance_ids: BTreeSet::new(),
            last_removed_instance_id: None,
            is_split_screen: false,
        }
    }
}
