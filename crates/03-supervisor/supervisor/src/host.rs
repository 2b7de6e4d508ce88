//! Seam between the supervisor and the host it wraps.

/// Host-observable facts the supervisor reads once per frame.
///
/// The supervisor never inspects host internals; everything it needs to drive the
/// lifecycle comes through this snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostSnapshot {
    /// Background content loading is running.
    pub content_loading: bool,
    /// The host is in its loading-screen mode.
    pub loading_mode: bool,
    /// The host is serializing a save this frame.
    pub saving: bool,
    /// A save is being read but not yet applied.
    pub save_loading: bool,
    /// Save data has been applied to the world.
    pub save_loaded: bool,
    /// The host is exiting to its main menu.
    pub exit_to_title: bool,
    /// The local player has been placed in a location.
    pub has_location: bool,
    /// The new-game intro has finished (the in-game calendar started).
    pub intro_finished: bool,
    /// The session is multiplayer.
    pub is_multiplayer: bool,
    /// The local participant hosts the session.
    pub is_main_participant: bool,
    /// Connected participants, including the local one.
    pub online_participants: usize,
    /// Instance the host is updating this frame.
    pub instance_id: i32,
}

impl HostSnapshot {
    /// True while the host's loading path must be left untouched.
    pub fn is_loading(&self) -> bool {
        self.content_loading || self.loading_mode
    }
}

impl Default for HostSnapshot {
    fn default() -> Self {
        Self {
            content_loading: false,
            loading_mode: false,
            saving: false,
            save_loading: false,
            save_loaded: false,
            exit_to_title: false,
            has_location: false,
            intro_finished: false,
            is_multiplayer: false,
            is_main_participant: true,
            online_participants: 1,
            instance_id: 0,
        }
    }
}

/// Host the supervisor wraps.
pub trait HostAdapter {
    /// Reads the host's current state.
    fn snapshot(&self) -> HostSnapshot;

    /// Closes a drawing batch left open by a failed frame.
    ///
    /// Returns `true` if a batch was open. Hosts without batched drawing keep the
    /// default.
    fn abandon_draw_batch(&mut self) -> bool {
        false
    }
}
