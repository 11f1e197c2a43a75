//! Zone routing tests: overlap priority, manual assignment, topology
//! replacement.

use chrono::{TimeZone, Utc};
use civic_core::{
    clock::ManualClock,
    complaint::{Category, Severity},
    config::{EscalationSettings, SquadConfig, StatsConfig, Topology, ZoneConfig},
    desk::{ComplaintDesk, SubmitRequest},
    error::DeskError,
    notify::RecordingSink,
    store::DeskStore,
    types::Role,
    zone::ZoneResolver,
};

fn zone(zone_id: &str, squad_id: &str, min_lat: f64, max_lat: f64) -> ZoneConfig {
    ZoneConfig {
        zone_id: zone_id.into(),
        label: zone_id.into(),
        squad_id: squad_id.into(),
        min_lat,
        max_lat,
        min_lng: 70.0,
        max_lng: 80.0,
    }
}

fn squad(squad_id: &str) -> SquadConfig {
    SquadConfig {
        squad_id: squad_id.into(),
        label: squad_id.into(),
        supervisor: "sup-1".into(),
        members: vec![],
    }
}

fn topology() -> Topology {
    Topology {
        // zone-a and zone-b overlap on lat 10..15; file order is priority.
        zones: vec![
            zone("zone-a", "squad-a", 5.0, 15.0),
            zone("zone-b", "squad-b", 10.0, 20.0),
        ],
        squads: vec![squad("squad-a"), squad("squad-b")],
    }
}

fn setup() -> ComplaintDesk {
    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap());
    let store = DeskStore::in_memory().unwrap();
    store.migrate().unwrap();
    ComplaintDesk::new(
        store,
        topology(),
        EscalationSettings::default(),
        StatsConfig::default(),
        Box::new(clock),
        Box::new(RecordingSink::new()),
    )
    .unwrap()
}

fn submit(desk: &ComplaintDesk, lat: Option<f64>, lng: Option<f64>) -> String {
    desk.submit(
        "cit-1",
        Role::Citizen,
        SubmitRequest {
            title: "Fallen tree".into(),
            description: "Tree blocking the carriageway".into(),
            category: Some(Category::Roads),
            severity: Some(Severity::High),
            address: "Ring Road".into(),
            lat,
            lng,
            attachments: vec![],
        },
    )
    .unwrap()
    .complaint_id
}

#[test]
fn overlapping_zones_resolve_to_the_first_match() {
    let resolver = ZoneResolver::new(topology());
    // (12, 75) sits in both boxes; zone-a is listed first and wins.
    assert_eq!(
        resolver.resolve(12.0, 75.0),
        Some(("zone-a".into(), "squad-a".into()))
    );
    assert_eq!(
        resolver.resolve(18.0, 75.0),
        Some(("zone-b".into(), "squad-b".into()))
    );
    assert_eq!(resolver.resolve(50.0, 75.0), None);
}

#[test]
fn zone_boundaries_are_inclusive() {
    let resolver = ZoneResolver::new(topology());
    assert_eq!(
        resolver.resolve(5.0, 70.0),
        Some(("zone-a".into(), "squad-a".into()))
    );
    assert_eq!(
        resolver.resolve(20.0, 80.0),
        Some(("zone-b".into(), "squad-b".into()))
    );
}

#[test]
fn unrouted_complaint_can_be_assigned_a_zone_manually() {
    let desk = setup();
    let id = submit(&desk, Some(50.0), Some(75.0));
    assert!(desk.complaint(&id).unwrap().location.zone_id.is_none());

    let c = desk.assign_zone("off-1", Role::Official, &id, &"zone-b".to_string()).unwrap();
    assert_eq!(c.location.zone_id.as_deref(), Some("zone-b"));
    assert_eq!(c.location.squad_id.as_deref(), Some("squad-b"));

    let timeline = desk.timeline(&id).unwrap();
    assert_eq!(timeline.last().unwrap().action, "zone_assigned");
}

#[test]
fn citizens_cannot_assign_zones() {
    let desk = setup();
    let id = submit(&desk, None, None);
    let err = desk
        .assign_zone("cit-1", Role::Citizen, &id, &"zone-a".to_string())
        .unwrap_err();
    assert!(matches!(err, DeskError::Forbidden { .. }), "got {err:?}");
}

#[test]
fn assigning_an_unknown_zone_is_not_found() {
    let desk = setup();
    let id = submit(&desk, None, None);
    let err = desk
        .assign_zone("sup-1", Role::Supervisor, &id, &"zone-z".to_string())
        .unwrap_err();
    assert!(matches!(err, DeskError::NotFound { .. }), "got {err:?}");
}

#[test]
fn topology_replacement_is_admin_only() {
    let mut desk = setup();
    let err = desk
        .replace_topology("sup-1", Role::Supervisor, topology())
        .unwrap_err();
    assert!(matches!(err, DeskError::Forbidden { .. }), "got {err:?}");
}

#[test]
fn replaced_topology_routes_new_submissions_only() {
    let mut desk = setup();
    let before = submit(&desk, Some(12.0), Some(75.0));
    assert_eq!(
        desk.complaint(&before).unwrap().location.zone_id.as_deref(),
        Some("zone-a")
    );

    // zone-b now covers everything zone-a did, under a different squad.
    desk.replace_topology(
        "adm-1",
        Role::Admin,
        Topology {
            zones: vec![zone("zone-b", "squad-b", 0.0, 30.0)],
            squads: vec![squad("squad-b")],
        },
    )
    .unwrap();

    let after = submit(&desk, Some(12.0), Some(75.0));
    assert_eq!(
        desk.complaint(&after).unwrap().location.zone_id.as_deref(),
        Some("zone-b")
    );
    // The earlier routing was a point-in-time decision and stands.
    assert_eq!(
        desk.complaint(&before).unwrap().location.zone_id.as_deref(),
        Some("zone-a")
    );
}

#[test]
fn topology_with_dangling_squad_reference_is_rejected() {
    let mut desk = setup();
    let err = desk
        .replace_topology(
            "adm-1",
            Role::Admin,
            Topology {
                zones: vec![zone("zone-a", "squad-missing", 0.0, 10.0)],
                squads: vec![],
            },
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidConfiguration { .. }), "got {err:?}");
}
