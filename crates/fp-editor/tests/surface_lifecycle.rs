//! Integration tests: hall map image lifecycle and click → image coordinates
//! through the editor session (fp-editor ↔ fp-core surface ↔ fp-render).

mod common;

use common::{HALL_URL, click, hall_map, stand};
use fp_core::config::EditorConfig;
use fp_core::id::HallMapId;
use fp_core::model::{HallMap, StandStatus};
use fp_core::surface::{ImageBounds, LoadError, LoadStatus};
use fp_editor::input::InputEvent;
use fp_editor::{EditorEvent, MapEditor, Mode};
use kurbo::Point;
use std::cell::RefCell;

fn attached(mode: Mode) -> MapEditor {
    common::init_logging();
    let mut editor = MapEditor::new(mode, EditorConfig::default());
    editor.attach(800.0, 600.0);
    editor
}

#[test]
fn failed_image_load_falls_back_to_placeholder_space() {
    let mut editor = attached(Mode::Owner);
    let request = editor.set_hall_map(Some(hall_map())).unwrap();
    assert_eq!(request.url, HALL_URL);

    editor.finish_image_load(
        request.ticket,
        Err(LoadError {
            url: request.url.clone(),
            reason: "decode failed".into(),
        }),
    );
    let events = editor.take_events();
    assert!(events.contains(&EditorEvent::ImageFailed {
        url: HALL_URL.into(),
        reason: "decode failed".into(),
    }));
    assert_eq!(editor.surface().bounds(), ImageBounds::new(500.0, 500.0));
    assert!(editor.surface().status().shows_placeholder());

    // Placement still works relative to the placeholder.
    editor.toggle_add_stand(true);
    let editor = RefCell::new(editor);
    click(&editor, 400.0, 300.0, 0.0);
    let placement = *editor.borrow().interaction().pending_placement().unwrap();
    assert!((placement.lng - 250.0).abs() < 1e-9);
    assert!((placement.lat - 250.0).abs() < 1e-9);
}

#[test]
fn clicks_outside_the_image_do_not_place() {
    let mut editor = attached(Mode::Owner);
    let request = editor.set_hall_map(Some(hall_map())).unwrap();
    editor.finish_image_load(request.ticket, Ok((200.0, 300.0)));
    editor.toggle_add_stand(true);
    let editor = RefCell::new(editor);

    // A 200×300 image fitted at zoom 1 spans screen x 200..600.
    assert_eq!(editor.borrow().surface().view().zoom, 1.0);
    click(&editor, 50.0, 300.0, 0.0);
    assert!(editor.borrow().interaction().pending_placement().is_none());
    assert!(editor.borrow().interaction().is_drawing());
}

#[test]
fn placed_marker_lands_under_the_click_at_any_zoom() {
    let mut editor = attached(Mode::Owner);
    let request = editor.set_hall_map(Some(hall_map())).unwrap();
    editor.finish_image_load(request.ticket, Ok((1000.0, 800.0)));
    editor.toggle_add_stand(true);

    for (zoom_steps, screen) in [
        (0i32, Point::new(137.0, 411.0)),
        (2, Point::new(400.0, 300.0)),
        (-1, Point::new(450.0, 250.5)),
    ] {
        editor.fit();
        let key = if zoom_steps > 0 { "=" } else { "-" };
        for _ in 0..zoom_steps.abs() {
            editor.handle_input(InputEvent::Key {
                key: key.into(),
                modifiers: Default::default(),
            });
        }
        let cell = RefCell::new(editor);
        click(&cell, screen.x, screen.y, 0.0);
        editor = cell.into_inner();

        let placement = *editor
            .interaction()
            .pending_placement()
            .unwrap_or_else(|| panic!("no placement at zoom step {zoom_steps}"));
        let back = editor.surface().image_to_screen(placement.position());
        assert!(
            back.distance(screen) < 1e-6,
            "marker at {back:?}, clicked {screen:?}"
        );
        editor.cancel_form();
        editor.toggle_add_stand(true);
    }
}

#[test]
fn stale_image_load_is_ignored() {
    let mut editor = attached(Mode::Artist);
    let first = editor.set_hall_map(Some(hall_map())).unwrap();
    let mut second_map = hall_map();
    second_map.id = HallMapId::from_number(4);
    second_map.map_image_url = Some("https://cdn.example/hall-b.png".into());
    let second = editor.set_hall_map(Some(second_map)).unwrap();
    editor.take_events();

    editor.finish_image_load(first.ticket, Ok((1000.0, 800.0)));
    assert!(editor.take_events().is_empty());
    assert!(matches!(editor.surface().status(), LoadStatus::Loading { .. }));

    editor.finish_image_load(second.ticket, Ok((640.0, 480.0)));
    assert_eq!(editor.surface().bounds(), ImageBounds::new(640.0, 480.0));
}

#[test]
fn same_hall_map_does_not_reload() {
    let mut editor = attached(Mode::Artist);
    let request = editor.set_hall_map(Some(hall_map())).unwrap();
    editor.finish_image_load(request.ticket, Ok((800.0, 600.0)));
    assert!(editor.set_hall_map(Some(hall_map())).is_none());
    assert!(matches!(editor.surface().status(), LoadStatus::Loaded { .. }));
}

#[test]
fn switching_hall_maps_never_keeps_the_previous_stands() {
    let mut editor = attached(Mode::Owner);
    editor.set_hall_map(Some(hall_map()));
    editor.set_stands(vec![stand(1, "B4", 100.0, 100.0, StandStatus::Available)]);

    // Same map again without embedded stands: the fetched list stays.
    editor.set_hall_map(Some(hall_map()));
    assert_eq!(editor.registry().len(), 1);

    // Another map that says it has no stands.
    let empty = HallMap {
        id: HallMapId::from_number(4),
        stands: Some(vec![]),
        ..hall_map()
    };
    editor.set_hall_map(Some(empty));
    assert!(editor.registry().is_empty());
    assert!(!editor.registry().has_stand_number("B4"));

    // Back to the first map, stands not yet fetched.
    editor.set_stands(vec![stand(2, "C1", 50.0, 50.0, StandStatus::Available)]);
    editor.set_hall_map(Some(hall_map()));
    assert!(editor.registry().is_empty());
}

#[test]
fn teardown_is_repeatable_and_drops_in_flight_loads() {
    let mut editor = attached(Mode::Owner);
    let request = editor.set_hall_map(Some(hall_map())).unwrap();
    editor.teardown();
    editor.teardown();

    editor.finish_image_load(request.ticket, Ok((800.0, 600.0)));
    assert!(editor.take_events().is_empty());
    assert!(!editor.surface().is_initialized());

    // Remount on a fresh container; the host re-supplies the same map.
    editor.attach(800.0, 600.0);
    assert!(editor.surface().is_initialized());
    let reload = editor.set_hall_map(Some(hall_map()));
    assert_eq!(reload.map(|r| r.url), Some(HALL_URL.to_string()));
}
