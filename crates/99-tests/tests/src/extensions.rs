//! Extension handlers running under the supervisor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use event_bus::{EventKind, ExtensionId};
use mock_host::make_rig;
use supervisor::TickOutcome;

/// A failing handler is logged and skipped without touching the crash budget.
#[test]
fn failing_handler_never_stops_the_tick() {
    let mut rig = make_rig();
    let after = Arc::new(AtomicUsize::new(0));

    rig.supervisor
        .events()
        .update_ticked
        .register("broken.mod", |_, _| Err(anyhow!("handler failed")));
    let counter = Arc::clone(&after);
    rig.supervisor
        .events()
        .update_ticked
        .register("healthy.mod", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    for _ in 0..3 {
        assert_eq!(rig.supervisor.on_tick(|| Ok(())), TickOutcome::Completed);
    }

    assert_eq!(after.load(Ordering::SeqCst), 3);
    assert_eq!(rig.supervisor.handler_failures(), 3);
    assert_eq!(rig.supervisor.update_guard().remaining(), 60);
}

/// A panicking SaveLoaded handler does not undo readiness.
#[test]
fn panicking_ready_handler_is_contained() {
    let mut rig = make_rig();
    rig.supervisor
        .events()
        .save_loaded
        .register("broken.mod", |_, _| panic!("ready handler bug"));

    rig.host.load_world();
    for _ in 0..5 {
        rig.supervisor.on_tick(|| Ok(()));
    }

    assert!(rig.supervisor.session().is_world_ready);
    assert_eq!(rig.recorder.count(EventKind::SaveLoaded), 1);
    assert_eq!(rig.supervisor.handler_failures(), 1);
}

/// A handler added from inside UpdateTicking first runs on the following tick.
#[test]
fn handler_registered_mid_tick_runs_next_tick() {
    let mut rig = make_rig();
    let late_calls = Arc::new(AtomicUsize::new(0));
    let registered = Arc::new(AtomicUsize::new(0));

    let events = Arc::downgrade(rig.supervisor.events());
    let late = Arc::clone(&late_calls);
    let once = Arc::clone(&registered);
    rig.supervisor
        .events()
        .update_ticking
        .register("registrar", move |_, _| {
            if once.fetch_add(1, Ordering::SeqCst) > 0 {
                return Ok(());
            }
            if let Some(events) = events.upgrade() {
                let late = Arc::clone(&late);
                events.update_ticking.register("late", move |_, _| {
                    late.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
            Ok(())
        });

    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);

    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
}

/// Unloading an extension removes every handler it owns.
#[test]
fn unloading_an_extension_detaches_it() {
    let mut rig = make_rig();
    let calls = Arc::new(AtomicUsize::new(0));
    let owner = ExtensionId::new("some.mod");

    for _ in 0..2 {
        let counter = Arc::clone(&calls);
        rig.supervisor
            .events()
            .update_ticked
            .register(owner.clone(), move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
    }
    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert_eq!(rig.supervisor.events().unregister_owner(&owner), 2);
    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Handlers read the session the supervisor is maintaining.
#[test]
fn handlers_observe_live_session() {
    let mut rig = make_rig();
    let seen_ticks = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen_ticks);
    rig.supervisor
        .events()
        .update_ticked
        .register("observer", move |session, args| {
            sink.lock().push((session.tick, args.tick));
            Ok(())
        });

    rig.supervisor.on_tick(|| Ok(()));
    rig.supervisor.on_tick(|| Ok(()));

    assert_eq!(*seen_ticks.lock(), vec![(1, 1), (2, 2)]);
}
