//! Vote ledger tests: toggle semantics, dedup, concurrency.

use chrono::{TimeZone, Utc};
use civic_core::{
    clock::ManualClock,
    complaint::{Category, Severity},
    config::{EscalationSettings, StatsConfig, Topology},
    desk::{ComplaintDesk, SubmitRequest},
    error::DeskError,
    notify::RecordingSink,
    store::DeskStore,
    types::Role,
};
use std::sync::{Arc, Mutex};
use std::thread;

fn setup() -> ComplaintDesk {
    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 4, 2, 12, 0, 0).unwrap());
    let store = DeskStore::in_memory().unwrap();
    store.migrate().unwrap();
    ComplaintDesk::new(
        store,
        Topology::default(),
        EscalationSettings::default(),
        StatsConfig::default(),
        Box::new(clock),
        Box::new(RecordingSink::new()),
    )
    .unwrap()
}

fn submit(desk: &ComplaintDesk) -> String {
    desk.submit(
        "citizen-1",
        Role::Citizen,
        SubmitRequest {
            title: "Dark underpass".into(),
            description: "No working lights in the underpass".into(),
            category: Some(Category::StreetLighting),
            severity: Some(Severity::Medium),
            address: "Station Rd".into(),
            lat: None,
            lng: None,
            attachments: vec![],
        },
    )
    .unwrap()
    .complaint_id
}

#[test]
fn toggle_adds_then_removes() {
    let desk = setup();
    let id = submit(&desk);

    let first = desk.vote(Some("citizen-2"), &id).unwrap();
    assert!(first.added);
    assert_eq!(first.count, 1);

    let second = desk.vote(Some("citizen-2"), &id).unwrap();
    assert!(!second.added, "second toggle removes the vote");
    assert_eq!(second.count, 0);

    let third = desk.vote(Some("citizen-2"), &id).unwrap();
    assert!(third.added);
    assert_eq!(third.count, 1);
}

#[test]
fn distinct_voters_accumulate() {
    let desk = setup();
    let id = submit(&desk);

    for (i, voter) in ["v-1", "v-2", "v-3"].iter().enumerate() {
        let outcome = desk.vote(Some(voter), &id).unwrap();
        assert!(outcome.added);
        assert_eq!(outcome.count, i as i64 + 1);
    }
    assert_eq!(desk.vote_count(&id).unwrap(), 3);
}

#[test]
fn retried_vote_cannot_double_count() {
    let desk = setup();
    let id = submit(&desk);

    desk.vote(Some("v-1"), &id).unwrap();
    desk.vote(Some("v-1"), &id).unwrap();
    desk.vote(Some("v-1"), &id).unwrap();
    // Three calls: add, remove, add. Never a count of 2+ for one identity.
    assert_eq!(desk.vote_count(&id).unwrap(), 1);
}

#[test]
fn anonymous_votes_get_one_shot_identities() {
    let desk = setup();
    let id = submit(&desk);

    let a = desk.vote(None, &id).unwrap();
    let b = desk.vote(None, &id).unwrap();
    assert!(a.added && b.added, "anonymous votes never toggle each other");
    assert_eq!(b.count, 2);
}

#[test]
fn vote_on_missing_complaint_is_not_found() {
    let desk = setup();
    let err = desk.vote(Some("v-1"), "no-such-complaint").unwrap_err();
    assert!(matches!(err, DeskError::NotFound { .. }), "got {err:?}");
}

/// Two concurrent votes from distinct identities both land; the count is
/// 2, never 1 or lost.
#[test]
fn concurrent_votes_from_distinct_identities_both_count() {
    let desk = setup();
    let id = submit(&desk);
    let desk = Arc::new(Mutex::new(desk));

    let handles: Vec<_> = ["voter-a", "voter-b"]
        .into_iter()
        .map(|voter| {
            let desk = Arc::clone(&desk);
            let id = id.clone();
            thread::spawn(move || {
                let guard = desk.lock().unwrap();
                guard.vote(Some(voter), &id).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.join().unwrap();
        assert!(outcome.added);
    }

    let guard = desk.lock().unwrap();
    assert_eq!(guard.vote_count(&id).unwrap(), 2);
}

#[test]
fn votes_do_not_touch_the_timeline() {
    let desk = setup();
    let id = submit(&desk);
    desk.vote(Some("v-1"), &id).unwrap();
    desk.vote(Some("v-2"), &id).unwrap();
    // The audit timeline tracks lifecycle actions; the ledger is separate.
    assert_eq!(desk.timeline(&id).unwrap().len(), 1);
}
