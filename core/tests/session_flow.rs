use sketch_core::config::EngineConfig;
use sketch_core::picking::{Camera, PickResult, PickTarget, Viewport};
use sketch_core::protocol::{Command, ParameterValue, SKETCH_DATA_KEY};
use sketch_core::session::{SketchEvent, SketchSession};
use sketch_core::sketch::tools::{DimensionMode, PointerEvent, ToolKind};
use sketch_core::sketch::types::{Sketch, SketchConstraint, SketchGeometry, SketchPlane};
use sketch_core::topo::EntityId;
use std::sync::{Arc, Mutex};

fn session_with_view() -> (SketchSession, Camera, Viewport) {
    let plane = SketchPlane::default();
    let camera = Camera::facing_plane(&plane, 40.0);
    let viewport = Viewport::new(800.0, 600.0);
    let mut session = SketchSession::new(
        EntityId::new_deterministic("Sketch1"),
        Sketch::new(plane),
        EngineConfig::default(),
    );
    session.set_view(camera.clone(), viewport);
    (session, camera, viewport)
}

/// Screen position of sketch point (u, v).
fn screen_of(session: &SketchSession, camera: &Camera, viewport: &Viewport, u: f64, v: f64) -> [f64; 2] {
    camera.project(&session.sketch().plane.to_world(u, v), viewport).unwrap()
}

fn click_screen(session: &mut SketchSession, screen: [f64; 2]) {
    let event = PointerEvent::primary();
    session.screen_move(screen, &event);
    session.screen_down(screen, &event);
    session.screen_up(screen, &event);
}

fn sent_sketch(command: &Command) -> &Sketch {
    match command {
        Command::UpdateFeature { params, .. } => match &params[SKETCH_DATA_KEY] {
            ParameterValue::Sketch(sketch) => sketch,
            other => panic!("unexpected parameter {:?}", other),
        },
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_rectangle_drawn_in_screen_space() {
    let (mut session, camera, viewport) = session_with_view();
    session.set_tool(Some(ToolKind::Rectangle));

    let a = screen_of(&session, &camera, &viewport, 0.0, 0.0);
    let b = screen_of(&session, &camera, &viewport, 4.0, 3.0);
    click_screen(&mut session, a);
    session.screen_move(b, &PointerEvent::primary());
    assert_eq!(session.sketch().preview_count(), 4);
    click_screen(&mut session, b);

    assert_eq!(session.sketch().preview_count(), 0);
    let outbox = session.drain_outbox();
    assert_eq!(outbox.len(), 1);
    let sent = sent_sketch(&outbox[0]);
    assert_eq!(sent.entities.len(), 4);
    assert!(sent.entities.iter().all(|e| !e.id.is_preview()));

    let corner = sent.entities.iter().find_map(|e| match e.geometry {
        SketchGeometry::Line { end, .. } if (end[0] - 4.0).abs() < 1e-6 && (end[1] - 3.0).abs() < 1e-6 => Some(end),
        _ => None,
    });
    assert!(corner.is_some(), "far corner should land on (4, 3)");

    let json = outbox[0].to_json().unwrap();
    assert!(json.starts_with("{\"command\":\"UpdateFeature\""));
}

#[test]
fn test_dimension_dragged_from_screen() {
    let (mut session, camera, viewport) = session_with_view();

    session.set_tool(Some(ToolKind::Line));
    let start = screen_of(&session, &camera, &viewport, 0.0, 0.0);
    let end = screen_of(&session, &camera, &viewport, 4.0, 0.0);
    click_screen(&mut session, start);
    click_screen(&mut session, end);
    assert_eq!(session.sketch().committed_entities().count(), 1);

    session.set_tool(Some(ToolKind::Dimension(DimensionMode::Distance)));
    let on_line = screen_of(&session, &camera, &viewport, 2.0, 0.1);
    click_screen(&mut session, on_line);
    let index = session
        .sketch()
        .constraints
        .iter()
        .position(|c| matches!(c.constraint, SketchConstraint::Distance { .. }))
        .expect("distance dimension");
    session.set_tool(None);
    session.drain_outbox();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    session.subscribe(Box::new(move |e: &SketchEvent| sink.lock().unwrap().push(e.clone())));

    let hitbox = session.dimension_hitboxes().into_iter().find(|h| h.constraint_index == index).unwrap();
    let grab = screen_of(&session, &camera, &viewport, hitbox.center[0], hitbox.center[1]);
    match session.pick(grab) {
        PickResult::Hit(hit) => assert_eq!(hit.target, PickTarget::Dimension { constraint_index: index }),
        other => panic!("expected the dimension, got {:?}", other),
    }

    let event = PointerEvent::primary();
    session.screen_down(grab, &event);
    assert!(session.is_dragging_dimension());
    assert!(!session.camera_enabled());

    let drop = screen_of(&session, &camera, &viewport, hitbox.center[0], hitbox.center[1] + 1.0);
    session.screen_move(drop, &event);
    session.screen_up(drop, &event);

    assert!(session.camera_enabled());
    assert!(!session.is_dragging_dimension());
    let constraint = &session.sketch().constraints[index].constraint;
    let style = constraint.dimension_style().unwrap();
    assert!(style.offset[0].abs() < 1e-6);
    assert!((style.offset[1] - 1.5).abs() < 1e-6);
    assert!((constraint.value().unwrap() - 4.0).abs() < 1e-6);

    assert_eq!(session.drain_outbox().len(), 1);
    let events = events.lock().unwrap();
    assert!(events.contains(&SketchEvent::CameraEnabled(false)));
    assert!(events.contains(&SketchEvent::DimensionMoved { constraint_index: index }));
    assert_eq!(events.last(), Some(&SketchEvent::SketchChanged));
}

#[test]
fn test_status_and_bad_lines() {
    let (mut session, _, _) = session_with_view();
    session
        .handle_inbound_line(r#"SKETCH_STATUS:{"converged":true,"iterations":3,"max_error":0.0,"dof":2}"#)
        .unwrap();
    let status = session.status().unwrap();
    assert_eq!(status.dof, 2);
    assert!(!status.is_fully_constrained());

    assert!(session.handle_inbound_line("garbage").is_err());
    assert!(session.handle_inbound_line("NOT_A_TAG:{}").is_err());
    assert!(session.outbox().is_empty());
}

#[test]
fn test_echo_cancels_gesture_in_progress() {
    let (mut session, _, _) = session_with_view();
    session.set_tool(Some(ToolKind::Circle));
    let event = PointerEvent::primary();
    session.pointer_down(1.0, 1.0, &event);
    session.pointer_move(3.0, 1.0, &event);
    assert!(session.sketch().preview_count() > 0);

    let mut remote = Sketch::new(SketchPlane::default());
    remote.add_entity(SketchGeometry::Point { pos: [7.0, 7.0] });
    session.replace_sketch(remote);
    assert_eq!(session.sketch().preview_count(), 0);

    // The circle gesture restarted: one more click is a new center, not a commit.
    session.pointer_down(5.0, 1.0, &event);
    assert!(session.outbox().is_empty());
    assert_eq!(session.sketch().committed_entities().count(), 1);
}

#[test]
fn test_projection_of_picked_solid_edge() {
    use sketch_core::geometry::{Point3, Tessellation};
    use sketch_core::topo::naming::{TopoId, TopoRank};

    let (mut session, camera, viewport) = session_with_view();
    let edge = TopoId::new(EntityId::new_deterministic("Extrude1"), 12, TopoRank::Edge);
    let mut solid = Tessellation::new();
    solid.add_line(Point3::new(0.0, 3.0, -1.0), Point3::new(4.0, 3.0, -1.0), edge);
    session.set_solid(Some(solid));

    session.set_tool(Some(ToolKind::Projection));
    assert_eq!(session.tool_kind(), Some(ToolKind::Projection));

    let on_edge = camera.project(&Point3::new(2.0, 3.0, -1.0), &viewport).unwrap();
    match session.pick(on_edge) {
        PickResult::Hit(hit) => assert_eq!(hit.target, PickTarget::Solid(edge)),
        other => panic!("expected the edge, got {:?}", other),
    }
    click_screen(&mut session, on_edge);

    let sketch = session.sketch();
    assert_eq!(sketch.external_references.len(), 1);
    let (line_id, topo) = sketch.external_references.iter().next().unwrap();
    assert_eq!(*topo, edge);
    let line = sketch.entities.iter().find(|e| e.id == *line_id).unwrap();
    assert!(line.is_construction);
    assert_eq!(line.geometry, SketchGeometry::Line { start: [0.0, 3.0], end: [4.0, 3.0] });
    assert_eq!(session.drain_outbox().len(), 1);

    // Projecting the same edge twice is declined.
    click_screen(&mut session, on_edge);
    assert!(session.outbox().is_empty());
}
