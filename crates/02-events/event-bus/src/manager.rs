//! Startup-time collection of every event bus.

use crate::args::{
    EventKind, GameLaunchedArgs, LoadStageChangedArgs, RenderArgs, ReturnedToTitleArgs,
    SaveArgs, SaveLoadedArgs, TickArgs,
};
use crate::bus::EventBus;
use crate::owner::ExtensionId;

/// One bus per notification type, created once and shared for the process lifetime.
///
/// The supervisor keeps an `Arc<EventManager>` and hands clones to extensions so
/// they can register against the typed buses at any time.
#[derive(Debug)]
pub struct EventManager {
    /// [`EventKind::GameLaunched`].
    pub game_launched: EventBus<GameLaunchedArgs>,
    /// [`EventKind::UpdateTicking`].
    pub update_ticking: EventBus<TickArgs>,
    /// [`EventKind::UpdateTicked`].
    pub update_ticked: EventBus<TickArgs>,
    /// [`EventKind::SaveCreating`].
    pub save_creating: EventBus<SaveArgs>,
    /// [`EventKind::SaveCreated`].
    pub save_created: EventBus<SaveArgs>,
    /// [`EventKind::Saving`].
    pub saving: EventBus<SaveArgs>,
    /// [`EventKind::Saved`].
    pub saved: EventBus<SaveArgs>,
    /// [`EventKind::LoadStageChanged`].
    pub load_stage_changed: EventBus<LoadStageChangedArgs>,
    /// [`EventKind::SaveLoaded`].
    pub save_loaded: EventBus<SaveLoadedArgs>,
    /// [`EventKind::ReturnedToTitle`].
    pub returned_to_title: EventBus<ReturnedToTitleArgs>,
    /// [`EventKind::Rendering`].
    pub rendering: EventBus<RenderArgs>,
    /// [`EventKind::Rendered`].
    pub rendered: EventBus<RenderArgs>,
}

impl EventManager {
    /// Creates every bus with no handlers.
    pub fn new() -> Self {
        fn bus_of<T>(kind: EventKind) -> EventBus<T> {
            EventBus::new(kind.qualified_name())
        }

        Self {
            game_launched: bus_of(EventKind::GameLaunched),
            update_ticking: bus_of(EventKind::UpdateTicking),
            update_ticked: bus_of(EventKind::UpdateTicked),
            save_creating: bus_of(EventKind::SaveCreating),
            save_created: bus_of(EventKind::SaveCreated),
            saving: bus_of(EventKind::Saving),
            saved: bus_of(EventKind::Saved),
            load_stage_changed: bus_of(EventKind::LoadStageChanged),
            save_loaded: bus_of(EventKind::SaveLoaded),
            returned_to_title: bus_of(EventKind::ReturnedToTitle),
            rendering: bus_of(EventKind::Rendering),
            rendered: bus_of(EventKind::Rendered),
        }
    }

    /// Name of the bus for `kind`.
    pub fn name_of(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::GameLaunched => self.game_launched.name(),
            EventKind::UpdateTicking => self.update_ticking.name(),
            EventKind::UpdateTicked => self.update_ticked.name(),
            EventKind::SaveCreating => self.save_creating.name(),
            EventKind::SaveCreated => self.save_created.name(),
            EventKind::Saving => self.saving.name(),
            EventKind::Saved => self.saved.name(),
            EventKind::LoadStageChanged => self.load_stage_changed.name(),
            EventKind::SaveLoaded => self.save_loaded.name(),
            EventKind::ReturnedToTitle => self.returned_to_title.name(),
            EventKind::Rendering => self.rendering.name(),
            EventKind::Rendered => self.rendered.name(),
        }
    }

    /// Handler count of the bus for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::GameLaunched => self.game_launched.len(),
            EventKind::UpdateTicking => self.update_ticking.len(),
            EventKind::UpdateTicked => self.update_ticked.len(),
            EventKind::SaveCreating => self.save_creating.len(),
            EventKind::SaveCreated => self.save_created.len(),
            EventKind::Saving => self.saving.len(),
            EventKind::Saved => self.saved.len(),
            EventKind::LoadStageChanged => self.load_stage_changed.len(),
            EventKind::SaveLoaded => self.save_loaded.len(),
            EventKind::ReturnedToTitle => self.returned_to_title.len(),
            EventKind::Rendering => self.rendering.len(),
            EventKind::Rendered => self.rendered.len(),
        }
    }

    /// Names of every bus, in [`EventKind::ALL`] order.
    pub fn event_names(&self) -> Vec<&str> {
        EventKind::ALL
            .iter()
            .map(|kind| self.name_of(*kind))
            .collect()
    }

    /// Drops every handler `owner` registered on any bus.
    pub fn unregister_owner(&self, owner: &ExtensionId) -> usize {
        self.game_launched.unregister_owner(owner)
            + self.update_ticking.unregister_owner(owner)
            + self.update_ticked.unregister_owner(owner)
            + self.save_creating.unregister_owner(owner)
            + self.save_created.unregister_owner(owner)
            + self.saving.unregister_owner(owner)
            + self.saved.unregister_owner(owner)
            + self.load_stage_changed.unregister_owner(owner)
            + self.save_loaded.unregister_owner(owner)
            + self.returned_to_title.unregister_owner(owner)
            + self.rendering.unregister_owner(owner)
            + self.rendered.unregister_owner(owner)
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}
