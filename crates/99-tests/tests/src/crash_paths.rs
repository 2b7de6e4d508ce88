//! Crash guard budgets, fatal exit and halting.

use anyhow::anyhow;
use event_bus::EventKind;
use mock_host::{make_rig, make_rig_with_config};
use supervisor::{CrashPath, SupervisorConfig, TickOutcome};

/// Sixty failing updates end in exactly one fatal exit and no sixty-first tick.
#[test]
fn sixty_update_failures_are_fatal() {
    let mut rig = make_rig();
    let mut attempts = 0;

    for _ in 0..60 {
        rig.supervisor.on_tick(|| {
            attempts += 1;
            Err(anyhow!("update exploded"))
        });
    }
    assert_eq!(rig.exit.count(), 1);
    assert!(rig.supervisor.is_halted());

    assert_eq!(
        rig.supervisor.on_tick(|| {
            attempts += 1;
            Ok(())
        }),
        TickOutcome::Halted
    );
    assert_eq!(rig.supervisor.on_render(|| Ok(())), TickOutcome::Halted);
    assert_eq!(attempts, 60);
    assert_eq!(rig.exit.count(), 1);

    let reports = rig.exit.reports();
    let report = &reports[0];
    assert_eq!(report.path, CrashPath::Update);
    assert_eq!(report.consecutive_failures, 60);
    assert_eq!(report.last_error, "update exploded");
    assert_eq!(report.tick, 60);

    assert_eq!(rig.recorder.count(EventKind::UpdateTicking), 60);
    assert_eq!(rig.recorder.count(EventKind::UpdateTicked), 0);
}

/// A single success between failure runs refills the budget.
#[test]
fn intermittent_failures_recover() {
    let mut rig = make_rig();

    for _ in 0..59 {
        rig.supervisor.on_tick(|| Err(anyhow!("flaky")));
    }
    assert_eq!(rig.supervisor.update_guard().remaining(), 1);
    assert_eq!(rig.supervisor.on_tick(|| Ok(())), TickOutcome::Completed);

    for _ in 0..59 {
        rig.supervisor.on_tick(|| Err(anyhow!("flaky")));
    }
    assert_eq!(rig.exit.count(), 0);
    assert!(!rig.supervisor.is_halted());
    assert_eq!(rig.supervisor.update_guard().total_failures(), 118);
}

/// Panics from the host update are contained and counted.
#[test]
fn update_panics_count_against_budget() {
    let config = SupervisorConfig {
        update_crash_threshold: 2,
        ..SupervisorConfig::default()
    };
    let mut rig = make_rig_with_config(config);

    assert_eq!(
        rig.supervisor.on_tick(|| panic!("host panic")),
        TickOutcome::Recovered { remaining: 1 }
    );
    assert_eq!(
        rig.supervisor.on_tick(|| panic!("host panic")),
        TickOutcome::Fatal
    );
    assert_eq!(rig.exit.reports()[0].last_error, "panicked: host panic");
}

/// Failures while loading still spend the update budget.
#[test]
fn bypassed_failures_are_counted() {
    let config = SupervisorConfig {
        update_crash_threshold: 3,
        ..SupervisorConfig::default()
    };
    let mut rig = make_rig_with_config(config);
    rig.host.set_loading(true);

    for _ in 0..3 {
        rig.supervisor.on_tick(|| Err(anyhow!("load failed")));
    }
    assert_eq!(rig.exit.count(), 1);
    assert!(rig.recorder.kinds().is_empty());
}

/// Render failures close the open draw batch each time and escalate on their own budget.
#[test]
fn render_exhaustion_abandons_batch_then_exits() {
    let mut rig = make_rig();
    let host = rig.host.clone();

    for frame in 1..=60 {
        let outcome = rig.supervisor.on_render(|| {
            host.open_draw_batch();
            Err(anyhow!("draw exploded"))
        });
        if frame < 60 {
            assert!(matches!(outcome, TickOutcome::Recovered { .. }));
        } else {
            assert_eq!(outcome, TickOutcome::Fatal);
        }
    }

    assert_eq!(rig.host.abandoned_batches(), 60);
    assert_eq!(rig.exit.count(), 1);
    assert_eq!(rig.exit.reports()[0].path, CrashPath::Render);
    assert_eq!(rig.supervisor.update_guard().total_failures(), 0);
    assert_eq!(rig.supervisor.on_tick(|| Ok(())), TickOutcome::Halted);
}

/// Failures on one path never spend the other path's budget.
#[test]
fn guards_are_independent() {
    let mut rig = make_rig();

    for _ in 0..59 {
        rig.supervisor.on_tick(|| Err(anyhow!("update")));
        rig.supervisor.on_render(|| Err(anyhow!("render")));
    }

    assert_eq!(rig.supervisor.update_guard().remaining(), 1);
    assert_eq!(rig.supervisor.render_guard().remaining(), 1);
    assert_eq!(rig.supervisor.on_render(|| Ok(())), TickOutcome::Completed);
    assert_eq!(rig.supervisor.update_guard().remaining(), 1);
    assert_eq!(rig.supervisor.render_guard().remaining(), 60);
    assert_eq!(rig.exit.count(), 0);
}
