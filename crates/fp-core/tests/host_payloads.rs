//! Integration tests: host JSON → model → registry → surface.
//!
//! Exercises the `fp-core` pipeline the way a host hands data over: a hall
//! map payload with embedded stands, ids spelled as numbers and strings.

use fp_core::config::EditorConfig;
use fp_core::id::{ExhibitionId, HallMapId, StandId};
use fp_core::model::{HallMap, Stand, StandDimension, StandStatus, StandType};
use fp_core::registry::StandRegistry;
use fp_core::surface::MapSurface;
use fp_core::Point;
use pretty_assertions::assert_eq;

fn fixture() -> HallMap {
    serde_json::from_str(include_str!("fixtures/hall_map.json")).unwrap()
}

fn stands() -> Vec<Stand> {
    fixture().stands.unwrap()
}

// ─── Payload decoding ────────────────────────────────────────────────────

#[test]
fn hall_map_ids_match_across_spellings() {
    let map = fixture();
    assert_eq!(map.id, HallMapId::from_number(3));
    assert_eq!(map.exhibition_event_id, Some(ExhibitionId::intern("9")));
    assert_eq!(map.stands.unwrap()[0].hall_map_id, Some(map.id));
}

#[test]
fn stand_fields_are_normalized_on_ingestion() {
    let stands = stands();
    let [a1, b2, c3] = [&stands[0], &stands[1], &stands[2]];

    assert_eq!(a1.status, StandStatus::Available);
    assert_eq!(b2.status, StandStatus::Booked);
    assert_eq!(b2.stand_type, StandType::Sculpture);
    assert_eq!(b2.width, StandDimension::new(StandDimension::MAX));
    assert_eq!(b2.height, StandDimension::new(StandDimension::MIN));

    // Unknown values survive as-is instead of failing the payload.
    assert_eq!(c3.status, StandStatus::Other("RESERVED".to_string()));
    assert_eq!(c3.stand_type, StandType::Other("INSTALLATION".to_string()));
    assert_eq!(c3.width, StandDimension::default());
    assert_eq!(c3.id, StandId::from_number(3));
}

#[test]
fn stands_serialize_back_with_numeric_ids() {
    let json = serde_json::to_value(&stands()[1]).unwrap();
    assert_eq!(json["id"], serde_json::json!(2));
    assert_eq!(json["status"], serde_json::json!("BOOKED"));
    assert_eq!(json["type"], serde_json::json!("SCULPTURE"));
}

// ─── Registry ────────────────────────────────────────────────────────────

#[test]
fn registry_lookups_ignore_id_spelling() {
    let registry = StandRegistry::from_host(stands());
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.get(StandId::intern("1")).unwrap().stand_number, "A1");
    assert_eq!(registry.get(StandId::from_number(2)).unwrap().stand_number, "B2");
    assert!(registry.has_stand_number("C3"));
    assert!(!registry.has_stand_number("D4"));
}

#[test]
fn status_changes_and_removal_touch_one_stand() {
    let mut registry = StandRegistry::from_host(stands());
    let before = registry.revision();

    assert!(registry.apply_status_change(StandId::from_number(1), StandStatus::Pending));
    assert!(!registry.apply_status_change(StandId::from_number(99), StandStatus::Booked));
    assert_eq!(
        registry.get(StandId::from_number(1)).unwrap().status,
        StandStatus::Pending
    );
    assert_eq!(
        registry.get(StandId::from_number(2)).unwrap().status,
        StandStatus::Booked
    );

    let removed = registry.remove(StandId::intern("2")).unwrap();
    assert_eq!(removed.stand_number, "B2");
    assert_eq!(registry.len(), 2);
    assert!(registry.revision() > before);
}

#[test]
fn host_refresh_supersedes_local_stands() {
    let stands = stands();
    let mut registry = StandRegistry::from_host(stands[..1].to_vec());

    let mut local = stands[1].clone();
    local.id = StandId::placeholder();
    registry.add_local(local);
    assert_eq!(registry.local_count(), 1);
    assert!(registry.has_stand_number("B2"));

    registry.replace_from_host(stands.clone());
    assert_eq!(registry.local_count(), 0);
    assert_eq!(registry.len(), 3);
    assert!(registry.all().all(|s| !s.id.is_placeholder()));
}

// ─── Surface ─────────────────────────────────────────────────────────────

#[test]
fn every_stand_projects_inside_the_loaded_image() {
    let map = fixture();
    let mut surface = MapSurface::new(&EditorConfig::default());
    surface.initialize(1024.0, 768.0);
    let ticket = surface.begin_load(map.map_image_url.as_deref().unwrap());
    surface.finish_load(ticket, Ok((800.0, 400.0))).unwrap().unwrap();

    for stand in map.stands.as_deref().unwrap_or_default() {
        assert!(surface.is_within_bounds(stand.position()), "{} outside", stand.stand_number);
        let screen = surface.image_to_screen(stand.position());
        let back = surface.screen_to_image(screen);
        assert!(
            back.distance(stand.position()) < 1e-9,
            "{} drifted to {back:?}",
            stand.stand_number
        );
    }
    assert!(!surface.is_within_bounds(Point::new(801.0, 10.0)));
}
