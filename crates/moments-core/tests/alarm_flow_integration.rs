//! End-to-end alarm flow against an on-disk database.
//!
//! Exercises the whole pipeline the way the two execution contexts do:
//! create alarms, run evaluation passes over a moving position, and verify
//! triggering, de-duplication, one-shot deactivation and history.

use chrono::NaiveTime;
use tempfile::TempDir;

use moments_core::{
    run_pass, Alarm, AlarmStore, Config, Database, Event, LocationFix, Notifier,
};

struct SilentNotifier;
impl Notifier for SilentNotifier {
    fn notify(
        &self,
        _alarm: &Alarm,
        _distance_m: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap()
}

fn triggered_ids(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::AlarmTriggered { alarm_id, .. } => Some(alarm_id.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn full_alarm_lifecycle_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("moments.db");
    let config = Config::default();

    let db = Database::open_at(&path).unwrap();
    let store = AlarmStore::new(&db);

    let repeating = store
        .add(Alarm::new("Taksim", 41.0082, 28.9784, 100.0))
        .unwrap();
    let one_shot = store
        .add(Alarm::new("Ferry", 41.0090, 28.9790, 150.0).one_shot())
        .unwrap();

    // First pass at the target: both alarms fire once.
    let at_target = LocationFix::new(41.0082, 28.9784);
    let events = run_pass(&db, &config, &SilentNotifier, &at_target, noon()).unwrap();
    let mut ids = triggered_ids(&events);
    ids.sort();
    let mut expected = vec![repeating.id.clone(), one_shot.id.clone()];
    expected.sort();
    assert_eq!(ids, expected);

    // The one-shot is now off.
    assert!(!store.get(&one_shot.id).unwrap().unwrap().active);

    // Second pass in place: nothing new fires.
    let events = run_pass(&db, &config, &SilentNotifier, &at_target, noon()).unwrap();
    assert!(triggered_ids(&events).is_empty());

    // Walk away, then come back: only the repeating alarm re-fires.
    let away = LocationFix::new(41.0300, 28.9784);
    let events = run_pass(&db, &config, &SilentNotifier, &away, noon()).unwrap();
    assert!(triggered_ids(&events).is_empty());
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::AlarmRearmed { alarm_id, .. } if *alarm_id == repeating.id)));

    let events = run_pass(&db, &config, &SilentNotifier, &at_target, noon()).unwrap();
    assert_eq!(triggered_ids(&events), vec![repeating.id.clone()]);

    // Three firings in history, two for the repeating alarm.
    let history = db.history(10).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(
        history
            .iter()
            .filter(|r| r.alarm_id == repeating.id)
            .count(),
        2
    );
}

#[test]
fn fired_state_survives_reopen_like_separate_processes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("moments.db");
    let config = Config::default();
    let at_target = LocationFix::new(41.0082, 28.9784);

    let alarm_id = {
        let db = Database::open_at(&path).unwrap();
        let store = AlarmStore::new(&db);
        let alarm = store
            .add(Alarm::new("Taksim", 41.0082, 28.9784, 100.0))
            .unwrap();
        let events = run_pass(&db, &config, &SilentNotifier, &at_target, noon()).unwrap();
        assert_eq!(triggered_ids(&events).len(), 1);
        alarm.id
    };

    // A fresh Database stands in for the background task waking up.
    let db = Database::open_at(&path).unwrap();
    let events = run_pass(&db, &config, &SilentNotifier, &at_target, noon()).unwrap();
    assert!(
        triggered_ids(&events).is_empty(),
        "background pass must not re-fire {alarm_id}"
    );
}

#[test]
fn time_gated_alarm_fires_only_in_window() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_at(&dir.path().join("moments.db")).unwrap();
    let config = Config::default();
    let store = AlarmStore::new(&db);

    let gated = store
        .add(
            Alarm::new("School run", 41.0082, 28.9784, 100.0)
                .with_time(NaiveTime::from_hms_opt(8, 30, 0).unwrap()),
        )
        .unwrap();

    let at_target = LocationFix::new(41.0082, 28.9784);

    let events = run_pass(
        &db,
        &config,
        &SilentNotifier,
        &at_target,
        NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    )
    .unwrap();
    assert!(triggered_ids(&events).is_empty());

    let events = run_pass(
        &db,
        &config,
        &SilentNotifier,
        &at_target,
        NaiveTime::from_hms_opt(8, 30, 30).unwrap(),
    )
    .unwrap();
    assert_eq!(triggered_ids(&events), vec![gated.id]);
}
