//! Notification kinds and the argument each one carries.
//!
//! Arguments are handed to handlers as `&mut`, but only fields documented as
//! writable are meant to be changed. None of the built-in events currently
//! expose writable fields.

use serde::{Deserialize, Serialize};

use session::LoadStage;

/// Every notification the supervisor raises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// First update tick after the host launched.
    GameLaunched,
    /// Before the host's update logic runs.
    UpdateTicking,
    /// After the host's update logic ran.
    UpdateTicked,
    /// Before a new save file is written.
    SaveCreating,
    /// After a new save file was written.
    SaveCreated,
    /// Before an existing save is written.
    Saving,
    /// After an existing save was written.
    Saved,
    /// The load stage changed.
    LoadStageChanged,
    /// The world became fully ready.
    SaveLoaded,
    /// The world was unloaded (return to the main menu).
    ReturnedToTitle,
    /// Before the host draws a frame.
    Rendering,
    /// After the host drew a frame.
    Rendered,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 12] = [
        EventKind::GameLaunched,
        EventKind::UpdateTicking,
        EventKind::UpdateTicked,
        EventKind::SaveCreating,
        EventKind::SaveCreated,
        EventKind::Saving,
        EventKind::Saved,
        EventKind::LoadStageChanged,
        EventKind::SaveLoaded,
        EventKind::ReturnedToTitle,
        EventKind::Rendering,
        EventKind::Rendered,
    ];

    /// Event group the kind belongs to.
    pub fn group(self) -> &'static str {
        match self {
            EventKind::GameLaunched
            | EventKind::UpdateTicking
            | EventKind::UpdateTicked
            | EventKind::SaveCreating
            | EventKind::SaveCreated
            | EventKind::Saving
            | EventKind::Saved
            | EventKind::SaveLoaded
            | EventKind::ReturnedToTitle => "GameLoop",
            EventKind::LoadStageChanged => "Specialized",
            EventKind::Rendering | EventKind::Rendered => "Display",
        }
    }

    /// Short event name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::GameLaunched => "GameLaunched",
            EventKind::UpdateTicking => "UpdateTicking",
            EventKind::UpdateTicked => "UpdateTicked",
            EventKind::SaveCreating => "SaveCreating",
            EventKind::SaveCreated => "SaveCreated",
            EventKind::Saving => "Saving",
            EventKind::Saved => "Saved",
            EventKind::LoadStageChanged => "LoadStageChanged",
            EventKind::SaveLoaded => "SaveLoaded",
            EventKind::ReturnedToTitle => "ReturnedToTitle",
            EventKind::Rendering => "Rendering",
            EventKind::Rendered => "Rendered",
        }
    }

    /// Dotted name used for bus names and logs, e.g. `GameLoop.SaveLoaded`.
    pub fn qualified_name(self) -> String {
        format!("{}.{}", self.group(), self.name())
    }
}

/// Argument for [`EventKind::GameLaunched`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameLaunchedArgs;

/// Argument for [`EventKind::UpdateTicking`] and [`EventKind::UpdateTicked`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickArgs {
    /// Normal-path tick number.
    pub tick: u64,
}

/// Argument for the save creation and save notifications.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveArgs {
    /// Instance the save belongs to.
    pub instance_id: i32,
}

/// Argument for [`EventKind::LoadStageChanged`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadStageChangedArgs {
    /// Stage before the change.
    pub previous: LoadStage,
    /// Stage after the change.
    pub current: LoadStage,
}

/// Argument for [`EventKind::SaveLoaded`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveLoadedArgs {
    /// Instance whose world became ready.
    pub instance_id: i32,
    /// Whether the session is multiplayer.
    pub is_multiplayer: bool,
    /// Whether the local participant hosts the session.
    pub is_main_participant: bool,
}

/// Argument for [`EventKind::ReturnedToTitle`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReturnedToTitleArgs {
    /// Instance that left its world.
    pub instance_id: i32,
}

/// Argument for [`EventKind::Rendering`] and [`EventKind::Rendered`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderArgs {
    /// Render frame number.
    pub frame: u64,
}
