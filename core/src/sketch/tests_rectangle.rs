//! Rectangle tool end to end: two clicks, one committed loop.

use crate::config::EngineConfig;
use crate::sketch::query::resolve_point;
use crate::sketch::tools::test_support::{click_all, commit_of, empty_sketch};
use crate::sketch::tools::{PointerEvent, RectangleTool, SketchTool, ToolContext};
use crate::sketch::types::{SketchConstraint, SketchGeometry};

#[test]
fn test_rectangle_is_closed_loop() {
    let config = EngineConfig::default();
    let mut sketch = empty_sketch();
    let mut tool = RectangleTool::default();

    let delta = commit_of(click_all(&mut tool, &mut sketch, &config, &[[0.0, 0.0], [4.0, 3.0]]));
    assert_eq!(sketch.preview_count(), 0, "commit must clear previews");
    delta.apply(&mut sketch);

    let lines: Vec<_> = sketch
        .entities
        .iter()
        .filter(|e| matches!(e.geometry, SketchGeometry::Line { .. }))
        .collect();
    assert_eq!(lines.len(), 4);

    let count = |f: fn(&SketchConstraint) -> bool| sketch.active_constraints().filter(|c| f(c)).count();
    assert_eq!(count(|c| matches!(c, SketchConstraint::Horizontal { .. })), 2);
    assert_eq!(count(|c| matches!(c, SketchConstraint::Vertical { .. })), 2);
    assert_eq!(count(|c| matches!(c, SketchConstraint::Coincident { .. })), 4);

    // Every Coincident joins two corners that already sit on top of each other.
    for constraint in sketch.active_constraints() {
        if let SketchConstraint::Coincident { points } = constraint {
            let a = resolve_point(&sketch, &points[0]).unwrap();
            let b = resolve_point(&sketch, &points[1]).unwrap();
            assert!((a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9);
        }
    }

    let SketchGeometry::Line { start, end } = lines[0].geometry else { unreachable!() };
    assert_eq!(start, [0.0, 0.0]);
    assert_eq!(end, [4.0, 0.0]);
    let SketchGeometry::Line { end, .. } = lines[1].geometry else { unreachable!() };
    assert_eq!(end, [4.0, 3.0]);
}

#[test]
fn test_rectangle_preview_follows_cursor() {
    let config = EngineConfig::default();
    let mut sketch = empty_sketch();
    let mut tool = RectangleTool::default();
    let event = PointerEvent::primary();

    let mut ctx = ToolContext::new(&mut sketch, &config);
    tool.pointer_down(0.0, 0.0, &event, &mut ctx);
    tool.pointer_move(2.0, 1.0, &event, &mut ctx);
    assert_eq!(ctx.sketch.preview_count(), 4);
    tool.pointer_move(5.0, 2.0, &event, &mut ctx);
    assert_eq!(ctx.sketch.preview_count(), 4, "previews are replaced, not stacked");
    assert!(ctx.sketch.history.is_empty());
}

#[test]
fn test_flat_rectangle_is_declined() {
    let config = EngineConfig::default();
    let mut sketch = empty_sketch();
    let mut tool = RectangleTool::default();
    let outcome = click_all(&mut tool, &mut sketch, &config, &[[0.0, 0.0], [4.0, 0.0]]);
    assert!(!matches!(outcome, crate::sketch::tools::ToolOutcome::Commit(_)));
}
