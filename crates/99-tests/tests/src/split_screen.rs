//! Multiple local instances sharing one supervisor.

use std::collections::BTreeSet;
use std::sync::Arc;

use event_bus::EventKind;
use mock_host::{make_rig, MockRig};
use parking_lot::Mutex;

fn two_instance_rig() -> MockRig {
    let mut rig = make_rig();
    assert!(rig.supervisor.on_instance_added(0));
    assert!(rig.supervisor.on_instance_added(1));
    rig.host.load_world();
    for _ in 0..5 {
        rig.supervisor.on_tick(|| Ok(()));
    }
    assert!(rig.supervisor.session().is_world_ready);
    rig
}

/// Membership changes are mirrored into the session.
#[test]
fn membership_is_visible_in_session() {
    let mut rig = make_rig();
    assert!(rig.supervisor.on_instance_added(0));
    assert!(rig.supervisor.on_instance_added(1));
    assert!(!rig.supervisor.on_instance_added(1));

    let session = rig.supervisor.session();
    assert!(session.is_split_screen());
    assert_eq!(session.active_instance_ids(), &BTreeSet::from([0, 1]));

    assert!(rig.supervisor.on_instance_removed(1));
    assert!(!rig.supervisor.on_instance_removed(7));

    let session = rig.supervisor.session();
    assert!(!session.is_split_screen());
    assert_eq!(session.active_instance_ids(), &BTreeSet::from([0]));
    assert_eq!(session.last_removed_instance_id(), Some(1));
}

/// Log lines are tagged once instances need to be told apart.
#[test]
fn log_tags_follow_current_instance() {
    let mut rig = two_instance_rig();
    assert_eq!(rig.supervisor.session().log_instance_tag(), Some(0));

    rig.host.set_instance(1);
    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(rig.supervisor.session().current_instance_id, 1);
    assert_eq!(rig.supervisor.session().log_instance_tag(), Some(1));

    rig.supervisor.on_instance_removed(1);
    rig.host.set_instance(0);
    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(rig.supervisor.session().log_instance_tag(), None);
}

/// A secondary instance does not relaunch the game or re-announce readiness.
#[test]
fn secondary_instance_is_quiet() {
    let mut rig = two_instance_rig();
    rig.recorder.clear();

    rig.host.set_instance(1);
    rig.supervisor.on_tick(|| Ok(()));

    assert_eq!(
        rig.recorder.kinds(),
        vec![EventKind::UpdateTicking, EventKind::UpdateTicked]
    );
}

/// Save windows are tracked per instance and forgotten when it leaves.
#[test]
fn save_windows_are_per_instance() {
    let mut rig = two_instance_rig();
    let saving_ids = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&saving_ids);
    rig.supervisor
        .events()
        .saving
        .register("observer", move |_, args| {
            sink.lock().push(args.instance_id);
            Ok(())
        });

    rig.host.set_saving(true);
    rig.supervisor.on_tick(|| Ok(()));
    rig.host.set_instance(1);
    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(*saving_ids.lock(), vec![0, 1]);

    rig.supervisor.on_instance_removed(1);
    rig.supervisor.on_instance_added(1);
    rig.host.set_saving(false);
    rig.recorder.clear();
    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(rig.recorder.count(EventKind::Saved), 0);

    rig.host.set_instance(0);
    rig.supervisor.on_tick(|| Ok(()));
    assert_eq!(rig.recorder.count(EventKind::Saved), 1);
}

/// Participants resolve to the instance they play in.
#[test]
fn participants_resolve_to_instances() {
    let mut rig = two_instance_rig();
    assert!(rig.supervisor.assign_participant(1, Some(9001)));
    assert!(!rig.supervisor.assign_participant(5, Some(1)));

    assert_eq!(rig.supervisor.resolve_instance_for(9001), Some(1));
    assert_eq!(rig.supervisor.resolve_instance_for(42), None);
}
