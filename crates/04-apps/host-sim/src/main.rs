//! Drives a scripted host through a full session under the tick supervisor.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use event_bus::{EventKind, EventManager};
use mock_host::{EventRecorder, HostHandle, ScriptedHost};
use supervisor::{CrashLogExit, SupervisorConfig, TickOutcome, TickSupervisor};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a scripted host session under the tick supervisor")]
struct Args {
    /// Session script to play.
    #[arg(value_enum, default_value_t = Scenario::NewGame)]
    scenario: Scenario,

    /// JSON supervisor config; missing fields use defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where the crash report is written if a guard gives up.
    #[arg(long, default_value = "crash.json")]
    crash_log: PathBuf,

    /// First frame (1-based) at which injected failures start.
    #[arg(long, default_value_t = 1)]
    fail_from: u64,

    /// Consecutive update failures to inject.
    #[arg(long, default_value_t = 0)]
    fail_updates: u64,

    /// Consecutive render failures to inject.
    #[arg(long, default_value_t = 0)]
    fail_renders: u64,

    /// Register an extension whose UpdateTicked handler always fails.
    #[arg(long)]
    flaky_extension: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Create a save, play, save again, quit to title.
    NewGame,
    /// Load an existing save, play, quit to title.
    LoadSave,
    /// Load an existing save and keep playing.
    Idle,
}

struct Step {
    label: &'static str,
    frames: u64,
    apply: fn(&HostHandle),
}

fn script(scenario: Scenario) -> Vec<Step> {
    let title = Step {
        label: "title",
        frames: 3,
        apply: |_| {},
    };
    let loading = Step {
        label: "loading",
        frames: 3,
        apply: |host| {
            host.set_saving(false);
            host.update(|snapshot| snapshot.save_loading = true);
            host.set_loading(true);
        },
    };
    let in_world = Step {
        label: "in world",
        frames: 8,
        apply: |host| {
            host.set_loading(false);
            host.load_world();
        },
    };
    let quit = Step {
        label: "quit to title",
        frames: 2,
        apply: |host| host.exit_to_title(),
    };

    match scenario {
        Scenario::NewGame => vec![
            title,
            Step {
                label: "creating save",
                frames: 2,
                apply: |host| host.set_saving(true),
            },
            loading,
            in_world,
            Step {
                label: "saving",
                frames: 2,
                apply: |host| host.set_saving(true),
            },
            Step {
                label: "saved",
                frames: 2,
                apply: |host| host.set_saving(false),
            },
            quit,
        ],
        Scenario::LoadSave => vec![title, loading, in_world, quit],
        Scenario::Idle => vec![
            title,
            loading,
            Step {
                label: "idle",
                frames: 120,
                apply: |host| {
                    host.set_loading(false);
                    host.load_world();
                },
            },
        ],
    }
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let host = ScriptedHost::new();
    let handle = host.handle();
    let mut supervisor = TickSupervisor::builder(config)
        .host(host)
        .fatal_exit(CrashLogExit::new(&args.crash_log))
        .build()?;

    let recorder = EventRecorder::attach(supervisor.events());
    if args.flaky_extension {
        install_flaky_extension(supervisor.events());
    }

    let failures = Injector {
        from: args.fail_from,
        updates: args.fail_updates,
        renders: args.fail_renders,
    };

    let mut frame = 0u64;
    for step in script(args.scenario) {
        (step.apply)(&handle);
        let mut last = TickOutcome::Completed;
        for _ in 0..step.frames {
            frame += 1;
            last = supervisor.on_tick(|| failures.update(frame));
            let render = supervisor.on_render(|| failures.render(frame));
            if matches!(render, TickOutcome::Recovered { .. }) {
                last = render;
            }
            if supervisor.is_halted() {
                bail!("supervisor halted at frame {frame}");
            }
        }
        info!(
            "{:<14} frames={:<4} outcome={:?} stage={} ready={}",
            step.label,
            step.frames,
            last,
            supervisor.session().load_stage(),
            supervisor.session().is_world_ready
        );
    }

    print_summary(&recorder, &supervisor);
    Ok(())
}

struct Injector {
    from: u64,
    updates: u64,
    renders: u64,
}

impl Injector {
    fn update(&self, frame: u64) -> Result<()> {
        if self.hits(frame, self.updates) {
            bail!("injected update failure at frame {frame}");
        }
        Ok(())
    }

    fn render(&self, frame: u64) -> Result<()> {
        if self.hits(frame, self.renders) {
            bail!("injected render failure at frame {frame}");
        }
        Ok(())
    }

    fn hits(&self, frame: u64, count: u64) -> bool {
        frame >= self.from && frame < self.from.saturating_add(count)
    }
}

fn install_flaky_extension(events: &EventManager) {
    events
        .update_ticked
        .register("sim.flaky", |session, _| {
            bail!("flaky extension failed on tick {}", session.tick)
        });
    warn!("registered flaky extension 'sim.flaky'");
}

fn print_summary(recorder: &EventRecorder, supervisor: &TickSupervisor<ScriptedHost>) {
    println!("event counts:");
    for kind in EventKind::ALL {
        let count = recorder.count(kind);
        if count > 0 {
            println!("  {:<28} {count}", kind.qualified_name());
        }
    }
    println!("stage changes:");
    for (previous, current) in recorder.stage_changes() {
        println!("  {previous} -> {current}");
    }
    println!(
        "ticks={} stage transitions={} handler failures={} update failures={} render failures={}",
        supervisor.session().tick,
        supervisor.stage_transitions(),
        supervisor.handler_failures(),
        supervisor.update_guard().total_failures(),
        supervisor.render_guard().total_failures()
    );
}

fn load_config(path: Option<&Path>) -> Result<SupervisorConfig> {
    let Some(path) = path else {
        return Ok(SupervisorConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read config {path:?}"))?;
    SupervisorConfig::from_json(&text).with_context(|| format!("invalid config {path:?}"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Ignore error if already set.
    let _ = fmt().with_env_filter(env_filter).try_init();
}
