//! Resource ledger teardown semantics.

use std::sync::{Arc, Mutex};

use conductor_core::{
    Directory, ReleaseReport, ResourceKind, ResourceTracker, TrackedResource, TrackerError,
};
use serde_json::Value;

#[test]
fn release_all_handles_every_kind() {
    let directory = Directory::new();
    let tracker = ResourceTracker::new();
    let removed = Arc::new(Mutex::new(Vec::<String>::new()));

    let log = removed.clone();
    tracker.track(TrackedResource::element("panel-root", move || {
        log.lock().unwrap().push("panel-root".into());
        Ok(())
    }));
    let subscription = directory.on("core:loaded", |_| Ok(()));
    tracker.track(TrackedResource::subscription(subscription));
    let log = removed.clone();
    tracker.track(TrackedResource::timer("refresh", move || {
        log.lock().unwrap().push("refresh".into());
        Ok(())
    }));
    let log = removed.clone();
    tracker.track(TrackedResource::command("toggle-panel", move || {
        log.lock().unwrap().push("toggle-panel".into());
        Ok(())
    }));

    let counts = tracker.counts_by_kind();
    assert_eq!(counts.len(), 4);
    assert_eq!(counts[&ResourceKind::Subscription], 1);

    let report = tracker.release_all().expect("release");
    assert_eq!(report, ReleaseReport { released: 4, failed: 0 });
    assert!(tracker.is_empty());
    assert_eq!(directory.emit("core:loaded", &Value::Null), 0);
    assert_eq!(
        *removed.lock().unwrap(),
        vec!["toggle-panel", "refresh", "panel-root"]
    );
}

#[test]
fn track_during_release_is_released_immediately() {
    let tracker = Arc::new(ResourceTracker::new());
    let late_released = Arc::new(Mutex::new(false));

    let inner = tracker.clone();
    let flag = late_released.clone();
    tracker.track(TrackedResource::element("spawner", move || {
        let flag = flag.clone();
        let kept = inner.track(TrackedResource::element("late", move || {
            *flag.lock().unwrap() = true;
            Ok(())
        }));
        assert!(!kept, "late track must not enter the ledger");
        Ok(())
    }));

    let report = tracker.release_all().expect("release");
    assert_eq!(report.released, 1);
    assert!(*late_released.lock().unwrap());
    assert!(tracker.is_empty());
}

#[test]
fn reentrant_release_is_rejected() {
    let tracker = Arc::new(ResourceTracker::new());
    let observed = Arc::new(Mutex::new(None));

    let inner = tracker.clone();
    let slot = observed.clone();
    tracker.track(TrackedResource::command("nested", move || {
        *slot.lock().unwrap() = Some(inner.release_all());
        Ok(())
    }));

    tracker.release_all().expect("outer release");
    let nested = observed.lock().unwrap().take().expect("nested result");
    assert_eq!(nested, Err(TrackerError::ReentrantRelease));
}

#[test]
fn ledger_accepts_tracks_after_release() {
    let tracker = ResourceTracker::new();
    tracker.track(TrackedResource::timer("first-run", || Ok(())));
    tracker.release_all().expect("release");

    assert!(tracker.track(TrackedResource::timer("second-run", || Ok(()))));
    assert_eq!(tracker.len(), 1);
}
