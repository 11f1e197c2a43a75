//! Escalation tests: threshold classification, monotonicity, lazy
//! recomputation, and change-detection notifications.

use chrono::{Duration, TimeZone, Utc};
use civic_core::{
    clock::ManualClock,
    complaint::{Category, Severity},
    config::{EscalationSettings, StatsConfig, Topology},
    desk::{ComplaintDesk, SubmitRequest},
    error::DeskError,
    escalation::{classify, EscalationLevel},
    notify::{NotificationKind, RecordingSink},
    store::DeskStore,
    types::Role,
};

fn settings() -> EscalationSettings {
    EscalationSettings {
        yellow_threshold_days: 45,
        red_threshold_days: 60,
        notify_on_escalation: true,
        auto_escalation_target: Some("sup-1".into()),
    }
}

fn setup() -> (ComplaintDesk, ManualClock, RecordingSink) {
    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    let sink = RecordingSink::new();
    let store = DeskStore::in_memory().unwrap();
    store.migrate().unwrap();
    let desk = ComplaintDesk::new(
        store,
        Topology::default(),
        settings(),
        StatsConfig::default(),
        Box::new(clock.clone()),
        Box::new(sink.clone()),
    )
    .unwrap();
    (desk, clock, sink)
}

fn submit(desk: &ComplaintDesk) -> String {
    desk.submit(
        "citizen-1",
        Role::Citizen,
        SubmitRequest {
            title: "Transformer sparking".into(),
            description: "Sparks from the pole transformer at night".into(),
            category: Some(Category::Electricity),
            severity: Some(Severity::Critical),
            address: "4 Park Ave".into(),
            lat: None,
            lng: None,
            attachments: vec![],
        },
    )
    .unwrap()
    .complaint_id
}

/// With thresholds 45/60: day 44 is still green, day 46 is yellow, day
/// 61 is red.
#[test]
fn thresholds_classify_by_whole_days() {
    let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let s = settings();

    let at = |days: i64| created + Duration::days(days);
    assert_eq!(classify(created, at(0), &s).unwrap(), EscalationLevel::Green);
    assert_eq!(classify(created, at(44), &s).unwrap(), EscalationLevel::Green);
    assert_eq!(classify(created, at(45), &s).unwrap(), EscalationLevel::Yellow);
    assert_eq!(classify(created, at(46), &s).unwrap(), EscalationLevel::Yellow);
    assert_eq!(classify(created, at(61), &s).unwrap(), EscalationLevel::Red);
}

#[test]
fn classification_is_monotonic_in_age() {
    let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let s = settings();
    let mut previous = EscalationLevel::Green;
    for days in 0..120 {
        let level = classify(created, created + Duration::days(days), &s).unwrap();
        assert!(
            level >= previous,
            "level dropped from {previous:?} to {level:?} at day {days}"
        );
        previous = level;
    }
}

#[test]
fn misordered_thresholds_are_invalid_configuration() {
    let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let bad = EscalationSettings {
        yellow_threshold_days: 60,
        red_threshold_days: 45,
        notify_on_escalation: false,
        auto_escalation_target: None,
    };
    let err = classify(created, created, &bad).unwrap_err();
    assert!(matches!(err, DeskError::InvalidConfiguration { .. }), "got {err:?}");
}

#[test]
fn read_recomputes_level_lazily() {
    let (desk, clock, _sink) = setup();
    let id = submit(&desk);

    assert_eq!(desk.complaint(&id).unwrap().escalation_cached, EscalationLevel::Green);

    // Nothing is written between reads; only time passes.
    clock.advance(Duration::days(46));
    assert_eq!(desk.complaint(&id).unwrap().escalation_cached, EscalationLevel::Yellow);

    clock.advance(Duration::days(15));
    assert_eq!(desk.complaint(&id).unwrap().escalation_cached, EscalationLevel::Red);
}

#[test]
fn escalation_notification_fires_once_per_level_change() {
    let (desk, clock, sink) = setup();
    let id = submit(&desk);
    desk.reassign("sup-1", Role::Supervisor, &id, "off-1").unwrap();

    clock.advance(Duration::days(46));
    desk.complaint(&id).unwrap();
    desk.complaint(&id).unwrap();
    desk.complaint(&id).unwrap();

    let escalations: Vec<_> = sink
        .sent()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::Escalation)
        .collect();
    assert_eq!(escalations.len(), 1, "cache dedups repeated reads");
    assert_eq!(escalations[0].user_id, "off-1", "assignee is notified first");

    clock.advance(Duration::days(20));
    desk.complaint(&id).unwrap();
    let escalations = sink
        .sent()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::Escalation)
        .count();
    assert_eq!(escalations, 2, "red transition fires one more");
}

#[test]
fn unassigned_complaint_escalates_to_configured_target() {
    let (desk, clock, sink) = setup();
    let id = submit(&desk);

    clock.advance(Duration::days(50));
    desk.complaint(&id).unwrap();

    let escalations: Vec<_> = sink
        .sent()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::Escalation)
        .collect();
    assert_eq!(escalations.len(), 1);
    assert_eq!(escalations[0].user_id, "sup-1");
}

#[test]
fn settings_update_applies_on_next_classification() {
    let (mut desk, clock, _sink) = setup();
    let id = submit(&desk);
    clock.advance(Duration::days(10));
    assert_eq!(desk.complaint(&id).unwrap().escalation_cached, EscalationLevel::Green);

    desk.update_escalation_settings(
        "adm-1",
        Role::Admin,
        EscalationSettings {
            yellow_threshold_days: 5,
            red_threshold_days: 8,
            notify_on_escalation: false,
            auto_escalation_target: None,
        },
    )
    .unwrap();

    // Same instant, tighter thresholds: ten days old is now red.
    assert_eq!(desk.complaint(&id).unwrap().escalation_cached, EscalationLevel::Red);
}

#[test]
fn settings_update_is_admin_only_and_validated() {
    let (mut desk, _clock, _sink) = setup();

    let err = desk
        .update_escalation_settings("sup-1", Role::Supervisor, settings())
        .unwrap_err();
    assert!(matches!(err, DeskError::Forbidden { .. }), "got {err:?}");

    let err = desk
        .update_escalation_settings(
            "adm-1",
            Role::Admin,
            EscalationSettings {
                yellow_threshold_days: 30,
                red_threshold_days: 10,
                notify_on_escalation: true,
                auto_escalation_target: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidConfiguration { .. }), "got {err:?}");
}
