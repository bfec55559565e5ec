//! Integration tests for loading scene files and driving them end to end.

use std::path::PathBuf;

use anchorboard::layout::BoundingBox;
use anchorboard::{Scene, SceneError};
use pretty_assertions::assert_eq;

const EPSILON: f64 = 0.001;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

#[test]
fn test_demo_scene_resolves_completely() {
    let scene = Scene::from_file(&demo("status_panel.toml")).expect("demo scene should load");
    let container = scene.container.bounds();
    let mut dashboard = scene.into_dashboard().unwrap();
    dashboard.validate().expect("demo scene references should be valid");

    let result = dashboard.resolve_layout(container).unwrap();
    assert!(result.is_complete(), "unresolved: {:?}", result.unresolved_ids());

    assert_eq!(
        result.get("nav.panel"),
        Some(BoundingBox::new(100.0, 50.0, 100.0, 40.0))
    );
    // "STATUS" at 14px is 42 x 14, centred on the panel's right edge
    assert_eq!(
        result.get("nav.label"),
        Some(BoundingBox::new(208.0, 63.0, 42.0, 14.0))
    );
    // "OK" at 10px is 10 x 10, sitting on the label's top-right corner
    assert_eq!(
        result.get("nav.badge"),
        Some(BoundingBox::new(250.0, 53.0, 10.0, 10.0))
    );
    let bar = result.get("nav.bar").unwrap();
    assert!(approx_eq(bar.x, 100.0) && approx_eq(bar.y, 94.0));
    assert!(approx_eq(bar.right(), 780.0), "bar right {}", bar.right());
}

#[test]
fn test_demo_pulse_moves_chained_dependents() {
    let scene = Scene::from_file(&demo("status_panel.toml")).unwrap();
    let container = scene.container.bounds();
    let pulse = scene.animation("pulse").unwrap().clone();
    let mut dashboard = scene.into_dashboard().unwrap();
    dashboard.resolve_layout(container);

    // panel, label, badge and bar
    assert_eq!(pulse.play(&mut dashboard).unwrap(), 4);
    for _ in 0..30 {
        dashboard.tick(16.0);
    }
    assert!(dashboard.backend().is_idle());

    // centerRight (200, 70) about the centre (150, 70) moves 10px right
    let label = dashboard.displayed_transform("nav.label");
    assert!(approx_eq(label.translate_x, 10.0) && approx_eq(label.translate_y, 0.0));
    let badge = dashboard.displayed_transform("nav.badge");
    assert!(approx_eq(badge.translate_x, 10.0) && approx_eq(badge.translate_y, 0.0));
}

#[test]
fn test_demo_intro_sequence_ends_in_place() {
    let scene = Scene::from_file(&demo("status_panel.toml")).unwrap();
    let container = scene.container.bounds();
    let intro = scene.animation("intro").unwrap().clone();
    let mut dashboard = scene.into_dashboard().unwrap();
    dashboard.resolve_layout(container);

    assert!(intro.play(&mut dashboard).unwrap() > 0);
    for _ in 0..50 {
        dashboard.tick(16.0);
    }
    assert!(dashboard.backend().is_idle());

    let panel = dashboard.displayed_transform("nav.panel");
    assert!(approx_eq(panel.rotation, 5.0), "rotation {}", panel.rotation);
    assert!(approx_eq(panel.translate_x, 0.0), "translate {}", panel.translate_x);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Scene::from_file(&demo("does_not_exist.toml")).unwrap_err();
    assert!(matches!(err, SceneError::IoError(_)));
    assert!(err.to_string().starts_with("Failed to read scene file"));
}

#[test]
fn test_unknown_kind_is_parse_error() {
    let err = Scene::from_str(
        r#"
[[elements]]
id = "x"
kind = "hexagon"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SceneError::ParseError(_)));
}
