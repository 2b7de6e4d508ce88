//! Scripted host, recording fatal exit, and an event recorder for driving a
//! [`TickSupervisor`] without a real host process.

use std::sync::Arc;

use event_bus::{EventKind, EventManager, ExtensionId, HandlerId};
use parking_lot::Mutex;
use session::{LoadStage, SessionContext};
use smallvec::SmallVec;
use supervisor::{CrashReport, FatalExit, HostAdapter, HostSnapshot, SupervisorConfig, TickSupervisor};

/// Owner name used for every handler the recorder installs.
pub const RECORDER_OWNER: &str = "mock.recorder";

#[derive(Debug, Default)]
struct HostState {
    snapshot: HostSnapshot,
    draw_batch_open: bool,
    abandoned_batches: usize,
}

/// Host whose snapshot is set by the test through a [`HostHandle`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    state: Arc<Mutex<HostState>>,
}

/// Shared control surface for a [`ScriptedHost`].
#[derive(Debug, Clone)]
pub struct HostHandle {
    state: Arc<Mutex<HostState>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> HostHandle {
        HostHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl HostAdapter for ScriptedHost {
    fn snapshot(&self) -> HostSnapshot {
        self.state.lock().snapshot.clone()
    }

    fn abandon_draw_batch(&mut self) -> bool {
        let mut state = self.state.lock();
        if !state.draw_batch_open {
            return false;
        }
        state.draw_batch_open = false;
        state.abandoned_batches += 1;
        true
    }
}

impl HostHandle {
    /// Applies `edit` to the next snapshot the host reports.
    pub fn update(&self, edit: impl FnOnce(&mut HostSnapshot)) {
        edit(&mut self.state.lock().snapshot);
    }

    pub fn snapshot(&self) -> HostSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Puts the host on its loading screen.
    pub fn set_loading(&self, loading: bool) {
        self.update(|snapshot| snapshot.loading_mode = loading);
    }

    pub fn set_saving(&self, saving: bool) {
        self.update(|snapshot| snapshot.saving = saving);
    }

    /// Marks the save as applied and the player placed with the intro finished.
    pub fn load_world(&self) {
        self.update(|snapshot| {
            snapshot.save_loading = false;
            snapshot.save_loaded = true;
            snapshot.has_location = true;
            snapshot.intro_finished = true;
            snapshot.exit_to_title = false;
        });
    }

    /// Unloads the world as if the player quit to the main menu.
    pub fn exit_to_title(&self) {
        self.update(|snapshot| {
            snapshot.save_loaded = false;
            snapshot.has_location = false;
            snapshot.exit_to_title = true;
        });
    }

    pub fn set_instance(&self, instance_id: i32) {
        self.update(|snapshot| snapshot.instance_id = instance_id);
    }

    /// Simulates a draw call that opened a batch and then failed.
    pub fn open_draw_batch(&self) {
        self.state.lock().draw_batch_open = true;
    }

    pub fn abandoned_batches(&self) -> usize {
        self.state.lock().abandoned_batches
    }
}

/// Fatal exit that records reports instead of ending the process.
#[derive(Debug, Clone, Default)]
pub struct RecordingExit {
    reports: Arc<Mutex<Vec<CrashReport>>>,
}

impl RecordingExit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<CrashReport> {
        self.reports.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.reports.lock().len()
    }
}

impl FatalExit for RecordingExit {
    fn fatal(&mut self, report: &CrashReport) {
        self.reports.lock().push(report.clone());
    }
}

/// One notification observed by an [`EventRecorder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub kind: EventKind,
    /// Stage change carried by `LoadStageChanged`.
    pub stage: Option<(LoadStage, LoadStage)>,
    pub world_ready: bool,
    pub saving: bool,
}

/// Records every notification raised on an [`EventManager`], in raise order.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    seen: Arc<Mutex<Vec<RecordedEvent>>>,
    handlers: SmallVec<[HandlerId; 12]>,
}

impl EventRecorder {
    /// Subscribes to every bus of `events`.
    pub fn attach(events: &EventManager) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let owner = ExtensionId::new(RECORDER_OWNER);
        let mut handlers = SmallVec::new();

        fn push(seen: &Mutex<Vec<RecordedEvent>>, kind: EventKind, session: &SessionContext) {
            seen.lock().push(RecordedEvent {
                kind,
                stage: None,
                world_ready: session.is_world_ready,
                saving: session.is_saving,
            });
        }

        macro_rules! record {
            ($bus:ident, $kind:expr) => {{
                let seen = Arc::clone(&seen);
                handlers.push(events.$bus.register(owner.clone(), move |session, _| {
                    push(&seen, $kind, session);
                    Ok(())
                }));
            }};
        }

        record!(game_launched, EventKind::GameLaunched);
        record!(update_ticking, EventKind::UpdateTicking);
        record!(update_ticked, EventKind::UpdateTicked);
        record!(save_creating, EventKind::SaveCreating);
        record!(save_created, EventKind::SaveCreated);
        record!(saving, EventKind::Saving);
        record!(saved, EventKind::Saved);
        record!(save_loaded, EventKind::SaveLoaded);
        record!(returned_to_title, EventKind::ReturnedToTitle);
        record!(rendering, EventKind::Rendering);
        record!(rendered, EventKind::Rendered);

        let stage_seen = Arc::clone(&seen);
        handlers.push(events.load_stage_changed.register(owner, move |session, args| {
            stage_seen.lock().push(RecordedEvent {
                kind: EventKind::LoadStageChanged,
                stage: Some((args.previous, args.current)),
                world_ready: session.is_world_ready,
                saving: session.is_saving,
            });
            Ok(())
        }));

        Self { seen, handlers }
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.seen.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.seen.lock().iter().map(|event| event.kind).collect()
    }

    /// Observed notifications other than the per-tick update pair.
    pub fn lifecycle_kinds(&self) -> Vec<EventKind> {
        self.kinds()
            .into_iter()
            .filter(|kind| !matches!(kind, EventKind::UpdateTicking | EventKind::UpdateTicked))
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.seen
            .lock()
            .iter()
            .filter(|event| event.kind == kind)
            .count()
    }

    /// Stage transitions in the order they were announced.
    pub fn stage_changes(&self) -> Vec<(LoadStage, LoadStage)> {
        self.seen
            .lock()
            .iter()
            .filter_map(|event| event.stage)
            .collect()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

/// Supervisor over a [`ScriptedHost`] plus the handles needed to script it.
pub struct MockRig {
    pub supervisor: TickSupervisor<ScriptedHost>,
    pub host: HostHandle,
    pub exit: RecordingExit,
    pub recorder: EventRecorder,
}

/// Builds a supervisor with default configuration.
pub fn make_rig() -> MockRig {
    make_rig_with_config(SupervisorConfig::default())
}

/// Builds a supervisor with a custom configuration.
pub fn make_rig_with_config(config: SupervisorConfig) -> MockRig {
    let host = ScriptedHost::new();
    let handle = host.handle();
    let exit = RecordingExit::new();
    let supervisor = TickSupervisor::builder(config)
        .host(host)
        .fatal_exit(exit.clone())
        .build()
        .expect("mock supervisor build");
    let recorder = EventRecorder::attach(supervisor.events());

    MockRig {
        supervisor,
        host: handle,
        exit,
        recorder,
    }
}
