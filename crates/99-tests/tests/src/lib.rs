//! End-to-end scenarios for the tick supervisor over a scripted host.

#[cfg(test)]
mod crash_paths;

#[cfg(test)]
mod extensions;


#[cfg(test)]
mod split_screen;

#[cfg(test)]
mod tests {
    use event_bus::EventKind;
    use mock_host::make_rig;
    use session::LoadStage;
    use supervisor::TickOutcome;

    /// While the host is loading the update runs and nothing else happens.
    #[test]
    fn loading_frames_are_bypassed() {
        let mut rig = make_rig();
        rig.host.set_loading(true);
        let before = rig.supervisor.session().clone();

        let mut calls = 0;
        let outcome = rig.supervisor.on_tick(|| {
            calls += 1;
            Ok(())
        });

        assert_eq!(outcome, TickOutcome::Bypassed);
        assert_eq!(calls, 1);
        assert_eq!(rig.supervisor.session(), &before);
        assert!(rig.recorder.kinds().is_empty());
        assert_eq!(rig.supervisor.on_render(|| Ok(())), TickOutcome::Bypassed);
    }

    /// Loading an existing save: Loaded on the first loaded tick, Ready five ticks in.
    #[test]
    fn load_existing_save_reaches_ready_once() {
        let mut rig = make_rig();
        rig.supervisor.on_tick(|| Ok(()));
        rig.host.load_world();

        for _ in 0..4 {
            rig.supervisor.on_tick(|| Ok(()));
            assert!(!rig.supervisor.session().is_world_ready);
        }
        rig.supervisor.on_tick(|| Ok(()));
        assert!(rig.supervisor.session().is_world_ready);

        for _ in 0..10 {
            rig.supervisor.on_tick(|| Ok(()));
        }

        assert_eq!(rig.recorder.count(EventKind::SaveLoaded), 1);
        assert_eq!(
            rig.recorder.stage_changes(),
            vec![
                (LoadStage::None, LoadStage::Loaded),
                (LoadStage::Loaded, LoadStage::Ready),
            ]
        );

        let ready_event = rig
            .recorder
            .events()
            .into_iter()
            .find(|event| event.kind == EventKind::SaveLoaded)
            .expect("save loaded raised");
        assert!(ready_event.world_ready);
    }

    /// Quitting to title resets the session and announces it once.
    #[test]
    fn return_to_title_resets_session() {
        let mut rig = make_rig();
        rig.host.update(|snapshot| snapshot.is_multiplayer = true);
        rig.host.load_world();
        for _ in 0..5 {
            rig.supervisor.on_tick(|| Ok(()));
        }
        assert!(rig.supervisor.session().is_multiplayer);

        rig.host.exit_to_title();
        rig.supervisor.on_tick(|| Ok(()));
        rig.supervisor.on_tick(|| Ok(()));

        let session = rig.supervisor.session();
        assert!(!session.is_world_ready);
        assert!(!session.is_multiplayer);
        assert_eq!(session.load_stage(), LoadStage::None);
        assert_eq!(rig.recorder.count(EventKind::ReturnedToTitle), 1);

        rig.host.load_world();
        for _ in 0..5 {
            rig.supervisor.on_tick(|| Ok(()));
        }
        assert!(rig.supervisor.session().is_world_ready);
        assert_eq!(rig.recorder.count(EventKind::SaveLoaded), 2);
    }

    /// A host holding its exit flag with save data still applied leaves the world once.
    #[test]
    fn held_exit_flag_returns_to_title_once() {
        let mut rig = make_rig();
        rig.host.load_world();
        for _ in 0..5 {
            rig.supervisor.on_tick(|| Ok(()));
        }
        assert!(rig.supervisor.session().is_world_ready);

        rig.host.update(|snapshot| snapshot.exit_to_title = true);
        for _ in 0..4 {
            rig.supervisor.on_tick(|| Ok(()));
        }

        assert_eq!(rig.recorder.count(EventKind::ReturnedToTitle), 1);
        assert_eq!(rig.supervisor.session().load_stage(), LoadStage::None);
        assert_eq!(
            rig.recorder.stage_changes(),
            vec![
                (LoadStage::None, LoadStage::Loaded),
                (LoadStage::Loaded, LoadStage::Ready),
                (LoadStage::Ready, LoadStage::None),
            ]
        );
    }

    /// A save being read moves the stage to SaveLoading before Loaded.
    #[test]
    fn save_loading_precedes_loaded() {
        let mut rig = make_rig();
        rig.host.update(|snapshot| snapshot.save_loading = true);
        rig.supervisor.on_tick(|| Ok(()));
        rig.supervisor.on_tick(|| Ok(()));
        assert_eq!(
            rig.supervisor.session().load_stage(),
            LoadStage::SaveLoading
        );

        rig.host.load_world();
        for _ in 0..5 {
            rig.supervisor.on_tick(|| Ok(()));
        }

        assert_eq!(
            rig.recorder.stage_changes(),
            vec![
                (LoadStage::None, LoadStage::SaveLoading),
                (LoadStage::SaveLoading, LoadStage::Loaded),
                (LoadStage::Loaded, LoadStage::Ready),
            ]
        );
        assert_eq!(rig.recorder.count(EventKind::SaveLoaded), 1);
    }

    /// Quitting during the post-load grace period resets without a ready notice.
    #[test]
    fn exit_before_ready_resets_stage() {
        let mut rig = make_rig();
        rig.host.load_world();
        rig.supervisor.on_tick(|| Ok(()));
        rig.supervisor.on_tick(|| Ok(()));
        assert_eq!(rig.supervisor.session().load_stage(), LoadStage::Loaded);
        assert!(!rig.supervisor.session().is_world_ready);

        rig.host.exit_to_title();
        for _ in 0..3 {
            rig.supervisor.on_tick(|| Ok(()));
        }

        assert_eq!(rig.supervisor.session().load_stage(), LoadStage::None);
        assert_eq!(rig.recorder.count(EventKind::ReturnedToTitle), 1);
        assert_eq!(rig.recorder.count(EventKind::SaveLoaded), 0);
        assert_eq!(
            rig.recorder.stage_changes(),
            vec![
                (LoadStage::None, LoadStage::Loaded),
                (LoadStage::Loaded, LoadStage::None),
            ]
        );
    }

    /// Draw notifications only fire once the world is ready.
    #[test]
    fn render_notifications_follow_readiness() {
        let mut rig = make_rig();
        assert_eq!(rig.supervisor.on_render(|| Ok(())), TickOutcome::Completed);
        assert_eq!(rig.recorder.count(EventKind::Rendering), 0);

        rig.host.load_world();
        for _ in 0..5 {
            rig.supervisor.on_tick(|| Ok(()));
        }
        rig.supervisor.on_render(|| Ok(()));

        assert_eq!(rig.recorder.count(EventKind::Rendering), 1);
        assert_eq!(rig.recorder.count(EventKind::Rendered), 1);
    }
}
