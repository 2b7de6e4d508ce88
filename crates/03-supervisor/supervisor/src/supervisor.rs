//! # Tick supervisor
//!
//! Wraps the host's per-frame update and draw calls. Each update tick goes down
//! exactly one of three paths:
//!
//! ```text
//!   on_tick(run_update)
//!     │ halted? ───────────────────────────────► Halted
//!     │ host loading? ── run_update (guarded) ─► Bypassed
//!     │ host saving?  ── save-window notices
//!     │                  run_update (guarded) ─► Suppressed
//!     └ normal: readiness ─► completion notices ─► stage changes
//!               ─► SaveLoaded ─► GameLaunched ─► UpdateTicking
//!               ─► run_update (guarded) ─► UpdateTicked ─► Completed
//! ```
//!
//! The supervisor is the only writer of [`SessionContext`]. Handlers borrow it
//! read-only for the length of each raise. Update and render failures are counted
//! by two independent [`CrashGuard`]s; when either runs out the supervisor calls
//! its [`FatalExit`] once and refuses all further frames.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use event_bus::{
    EventBus, EventKind, EventManager, GameLaunchedArgs, LoadStageChangedArgs, RenderArgs,
    ReturnedToTitleArgs, SaveArgs, SaveLoadedArgs, TickArgs,
};
use log::{debug, error, info, trace, warn};
use session::{InstanceRegistry, LoadStage, LoadStageTracker, SessionContext, StageChange};

use crate::config::SupervisorConfig;
use crate::countdown::Countdown;
use crate::fatal::{CrashPath, CrashReport, FatalExit};
use crate::guard::{CrashGuard, GuardOutcome};
use crate::host::{HostAdapter, HostSnapshot};

/// What happened to one update or render frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The host was loading; its call ran with no lifecycle work.
    Bypassed,
    /// The host was saving; only save-window notices were raised.
    Suppressed,
    /// Normal frame, guarded call succeeded.
    Completed,
    /// The guarded call failed and the frame was skipped.
    Recovered {
        /// Failures left before the fatal exit.
        remaining: u32,
    },
    /// The guarded call failed and the budget ran out; the fatal exit was invoked.
    Fatal,
    /// A previous frame took the fatal exit; nothing ran.
    Halted,
}

/// Per-instance lifecycle flags. Dropped when the instance is removed.
#[derive(Clone, Debug)]
struct InstanceTickState {
    between_create: bool,
    between_save: bool,
    after_load: Countdown,
    first_tick: bool,
}

impl InstanceTickState {
    fn new(grace_ticks: u32) -> Self {
        Self {
            between_create: false,
            between_save: false,
            after_load: Countdown::new(grace_ticks),
            first_tick: true,
        }
    }
}

/// Drives the load/save/ready lifecycle for one host process.
pub struct TickSupervisor<H> {
    config: SupervisorConfig,
    host: H,
    events: Arc<EventManager>,
    fatal_exit: Box<dyn FatalExit>,
    session: SessionContext,
    stages: LoadStageTracker,
    registry: InstanceRegistry,
    instances: HashMap<i32, InstanceTickState>,
    update_guard: CrashGuard,
    render_guard: CrashGuard,
    render_frame: u64,
    handler_failures: u64,
    halted: bool,
}

/// Assembles a [`TickSupervisor`].
pub struct SupervisorBuilder<H> {
    config: SupervisorConfig,
    host: Option<H>,
    fatal_exit: Option<Box<dyn FatalExit>>,
    events: Option<Arc<EventManager>>,
}

impl<H: HostAdapter> SupervisorBuilder<H> {
    /// Host the supervisor reads snapshots from. Required.
    pub fn host(mut self, host: H) -> Self {
        self.host = Some(host);
        self
    }

    /// Path taken when a crash guard runs out of budget. Required.
    pub fn fatal_exit(mut self, fatal_exit: impl FatalExit + 'static) -> Self {
        self.fatal_exit = Some(Box::new(fatal_exit));
        self
    }

    /// Shares an existing event manager. A fresh one is created otherwise.
    pub fn events(mut self, events: Arc<EventManager>) -> Self {
        self.events = Some(events);
        self
    }

    /// Finishes the supervisor, failing if the host or the fatal exit is missing.
    pub fn build(self) -> anyhow::Result<TickSupervisor<H>> {
        let host = self.host.ok_or_else(|| anyhow!("supervisor requires a host"))?;
        let fatal_exit = self
            .fatal_exit
            .ok_or_else(|| anyhow!("supervisor requires a fatal exit"))?;
        let events = self.events.unwrap_or_default();
        let config = self.config;

        debug!(
            "supervisor: update budget {}, render budget {}, grace {} ticks",
            config.update_crash_threshold,
            config.render_crash_threshold,
            config.post_load_grace_ticks
        );

        Ok(TickSupervisor {
            update_guard: CrashGuard::new("update", config.update_crash_threshold),
            render_guard: CrashGuard::new("render", config.render_crash_threshold),
            config,
            host,
            events,
            fatal_exit,
            session: SessionContext::new(),
            stages: LoadStageTracker::new(),
            registry: InstanceRegistry::new(),
            instances: HashMap::new(),
            render_frame: 0,
            handler_failures: 0,
            halted: false,
        })
    }
}

impl<H: HostAdapter> TickSupervisor<H> {
    /// Starts building a supervisor with `config`.
    pub fn builder(config: SupervisorConfig) -> SupervisorBuilder<H> {
        SupervisorBuilder {
            config,
            host: None,
            fatal_exit: None,
            events: None,
        }
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Event buses; clone the `Arc` to hand to extensions.
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// Configuration the supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Wrapped host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the wrapped host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Live host instances.
    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Failure budget around the host update.
    pub fn update_guard(&self) -> &CrashGuard {
        &self.update_guard
    }

    /// Failure budget around the host draw.
    pub fn render_guard(&self) -> &CrashGuard {
        &self.render_guard
    }

    /// Load-stage transitions recorded so far.
    pub fn stage_transitions(&self) -> u64 {
        self.stages.transitions()
    }

    /// Handler failures isolated across every raise.
    pub fn handler_failures(&self) -> u64 {
        self.handler_failures
    }

    /// True once a crash guard was exhausted.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Runs one update frame around the host's own update logic.
    pub fn on_tick<F>(&mut self, run_update: F) -> TickOutcome
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        if self.halted {
            trace!("supervisor: halted, skipping update");
            return TickOutcome::Halted;
        }

        let host = self.host.snapshot();

        if host.is_loading() {
            trace!("supervisor: host loading, bypassing lifecycle");
            return self.guard_update(run_update, TickOutcome::Bypassed);
        }

        let events = Arc::clone(&self.events);
        self.session.current_instance_id = host.instance_id;

        if host.saving {
            self.session.is_saving = true;
            self.enter_save_window(&events, &host);
            return self.guard_update(run_update, TickOutcome::Suppressed);
        }
        self.session.is_saving = false;

        let grace = self.config.post_load_grace_ticks;
        let mut state = self
            .instances
            .remove(&host.instance_id)
            .unwrap_or_else(|| InstanceTickState::new(grace));

        let was_world_ready = self.session.is_world_ready;
        self.update_world_ready(&mut state, &host);

        if state.between_create {
            state.between_create = false;
            info!("{}context: after save creation", self.log_prefix());
            self.change_stage(&events, LoadStage::SaveCreated);
            let args = SaveArgs {
                instance_id: host.instance_id,
            };
            self.raise(EventKind::SaveCreated, &events.save_created, args);
        }
        if state.between_save {
            state.between_save = false;
            info!("{}context: after save", self.log_prefix());
            let args = SaveArgs {
                instance_id: host.instance_id,
            };
            self.raise(EventKind::Saved, &events.saved, args);
        }

        let stage = self.session.load_stage();
        let left_world = (was_world_ready && !self.session.is_world_ready)
            || (host.exit_to_title && stage != LoadStage::None);
        if left_world {
            info!("{}context: returned to title", self.log_prefix());
            self.change_stage(&events, LoadStage::None);
            self.session.reset_session();
            let args = ReturnedToTitleArgs {
                instance_id: host.instance_id,
            };
            self.raise(EventKind::ReturnedToTitle, &events.returned_to_title, args);
        } else if host.exit_to_title {
            trace!("supervisor: exit to title pending, holding stage {stage}");
        } else if host.save_loaded && host.intro_finished && !stage.is_world_loaded() {
            self.change_stage(&events, LoadStage::Loaded);
        } else if host.save_loading && !host.save_loaded && stage < LoadStage::SaveLoading {
            self.change_stage(&events, LoadStage::SaveLoading);
        }

        if self.session.is_world_ready && self.session.load_stage() != LoadStage::Ready {
            self.session.is_multiplayer = host.is_multiplayer;
            self.session.is_main_participant = host.is_main_participant;
            info!("{}context: {}", self.log_prefix(), describe_ready(&host));
            self.change_stage(&events, LoadStage::Ready);
            let args = SaveLoadedArgs {
                instance_id: host.instance_id,
                is_multiplayer: host.is_multiplayer,
                is_main_participant: host.is_main_participant,
            };
            self.raise(EventKind::SaveLoaded, &events.save_loaded, args);
        }

        let first_tick = std::mem::replace(&mut state.first_tick, false);
        self.instances.insert(host.instance_id, state);

        if first_tick && !self.session.is_game_launched {
            self.session.is_game_launched = true;
            info!("context: game launched");
            self.raise(EventKind::GameLaunched, &events.game_launched, GameLaunchedArgs);
        }

        self.session.tick += 1;
        let tick = self.session.tick;
        self.raise(EventKind::UpdateTicking, &events.update_ticking, TickArgs { tick });

        let outcome = self.guard_update(run_update, TickOutcome::Completed);
        if outcome == TickOutcome::Completed {
            self.raise(EventKind::UpdateTicked, &events.update_ticked, TickArgs { tick });
        }
        outcome
    }

    /// Runs one draw frame around the host's own drawing logic.
    pub fn on_render<F>(&mut self, draw: F) -> TickOutcome
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        if self.halted {
            trace!("supervisor: halted, skipping render");
            return TickOutcome::Halted;
        }

        let host = self.host.snapshot();
        let quiet = if host.is_loading() {
            Some(TickOutcome::Bypassed)
        } else if host.saving || self.session.is_saving {
            Some(TickOutcome::Suppressed)
        } else {
            None
        };
        let notify = quiet.is_none() && self.session.is_world_ready;

        self.render_frame += 1;
        let frame = self.render_frame;
        let events = Arc::clone(&self.events);

        if notify {
            self.raise(EventKind::Rendering, &events.rendering, RenderArgs { frame });
        }

        match self.render_guard.run(draw) {
            GuardOutcome::Succeeded => {
                if notify {
                    self.raise(EventKind::Rendered, &events.rendered, RenderArgs { frame });
                }
                quiet.unwrap_or(TickOutcome::Completed)
            }
            GuardOutcome::Recovered { remaining, .. } => {
                self.recover_draw_batch();
                TickOutcome::Recovered { remaining }
            }
            GuardOutcome::Exhausted { error } => {
                self.recover_draw_batch();
                let report = CrashReport::new(
                    CrashPath::Render,
                    &error,
                    self.render_guard.threshold(),
                    &self.session,
                );
                self.escalate(report);
                TickOutcome::Fatal
            }
        }
    }

    /// Registers a new host instance.
    pub fn on_instance_added(&mut self, instance_id: i32) -> bool {
        if !self.registry.add_instance(instance_id) {
            return false;
        }
        let grace = self.config.post_load_grace_ticks;
        self.instances
            .entry(instance_id)
            .or_insert_with(|| InstanceTickState::new(grace));
        self.registry.sync_into(&mut self.session);
        true
    }

    /// Drops a host instance and its lifecycle flags.
    pub fn on_instance_removed(&mut self, instance_id: i32) -> bool {
        if !self.registry.remove_instance(instance_id) {
            return false;
        }
        self.instances.remove(&instance_id);
        self.registry.sync_into(&mut self.session);
        true
    }

    /// Records which participant plays in `instance_id`.
    pub fn assign_participant(&mut self, instance_id: i32, participant: Option<i64>) -> bool {
        self.registry.assign_participant(instance_id, participant)
    }

    /// Finds the local instance hosting `participant`.
    pub fn resolve_instance_for(&self, participant: i64) -> Option<i32> {
        self.registry.resolve_instance_for(participant)
    }

    fn enter_save_window(&mut self, events: &EventManager, host: &HostSnapshot) {
        let grace = self.config.post_load_grace_ticks;
        let state = self
            .instances
            .entry(host.instance_id)
            .or_insert_with(|| InstanceTickState::new(grace));

        let creating = !self.session.is_world_ready && !state.between_create;
        let saving = self.session.is_world_ready && !state.between_save;
        if creating {
            state.between_create = true;
        }
        if saving {
            state.between_save = true;
        }

        let args = SaveArgs {
            instance_id: host.instance_id,
        };
        if creating {
            info!("{}context: before save creation", self.log_prefix());
            self.change_stage(events, LoadStage::CreatingSaveFile);
            self.raise(EventKind::SaveCreating, &events.save_creating, args);
        } else if saving {
            info!("{}context: before save", self.log_prefix());
            self.raise(EventKind::Saving, &events.saving, args);
        }
    }

    fn update_world_ready(&mut self, state: &mut InstanceTickState, host: &HostSnapshot) {
        if (self.session.is_world_ready && !host.save_loaded) || host.exit_to_title {
            self.session.is_world_ready = false;
            state.after_load.reset();
        } else if host.save_loaded && host.has_location && !self.session.is_world_ready {
            if host.intro_finished && !state.after_load.is_exhausted() {
                state.after_load.decrement();
            }
            self.session.is_world_ready = host.intro_finished && state.after_load.is_exhausted();
        }
    }

    fn change_stage(&mut self, events: &EventManager, stage: LoadStage) {
        if let Some(StageChange { previous, current }) =
            self.stages.set_stage(&mut self.session, stage)
        {
            let args = LoadStageChangedArgs { previous, current };
            self.raise(EventKind::LoadStageChanged, &events.load_stage_changed, args);
        }
    }

    fn raise<T>(&mut self, kind: EventKind, bus: &EventBus<T>, mut args: T) {
        if self.session.is_saving && !self.config.saving_policy.allows(kind) {
            trace!("supervisor: {} suppressed while saving", bus.name());
            return;
        }
        let summary = bus.raise(&self.session, &mut args);
        self.handler_failures += summary.failures.len() as u64;
    }

    fn guard_update<F>(&mut self, run_update: F, success: TickOutcome) -> TickOutcome
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        match self.update_guard.run(run_update) {
            GuardOutcome::Succeeded => success,
            GuardOutcome::Recovered { remaining, .. } => TickOutcome::Recovered { remaining },
            GuardOutcome::Exhausted { error } => {
                let report = CrashReport::new(
                    CrashPath::Update,
                    &error,
                    self.update_guard.threshold(),
                    &self.session,
                );
                self.escalate(report);
                TickOutcome::Fatal
            }
        }
    }

    fn recover_draw_batch(&mut self) {
        if self.host.abandon_draw_batch() {
            warn!("supervisor: closed a draw batch left open by the failed frame");
        }
    }

    fn escalate(&mut self, report: CrashReport) {
        error!(
            target: "fatal",
            "{} after {} consecutive failures; last error: {}",
            report.reason, report.consecutive_failures, report.last_error
        );
        self.halted = true;
        self.fatal_exit.fatal(&report);
    }

    fn log_prefix(&self) -> String {
        match self.session.log_instance_tag() {
            Some(id) => format!("[instance {id}] "),
            None => String::new(),
        }
    }
}

fn describe_ready(host: &HostSnapshot) -> String {
    if !host.is_multiplayer {
        return "world ready, single-player".to_string();
    }
    let role = if host.is_main_participant {
        "main participant"
    } else {
        "secondary participant"
    };
    format!(
        "world ready, multiplayer {role} with {} participant(s) online",
        host.online_participants
    )
}
