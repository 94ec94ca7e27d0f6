//! Cancelling any tool mid-gesture leaves only committed geometry behind.

use crate::config::EngineConfig;
use crate::sketch::tools::{
    create_tool, ConstraintKind, DimensionMode, PointerEvent, SketchTool, ToolContext, ToolKind,
};
use crate::sketch::types::{Sketch, SketchGeometry, SketchPlane};

fn every_tool() -> Vec<ToolKind> {
    vec![
        ToolKind::Point,
        ToolKind::Line,
        ToolKind::Circle,
        ToolKind::Arc,
        ToolKind::Ellipse,
        ToolKind::Rectangle,
        ToolKind::Polygon,
        ToolKind::Slot,
        ToolKind::Dimension(DimensionMode::Distance),
        ToolKind::Dimension(DimensionMode::Angle),
        ToolKind::Measure,
        ToolKind::Constraint(ConstraintKind::Coincident),
        ToolKind::Constraint(ConstraintKind::Parallel),
        ToolKind::Projection,
    ]
}

fn sketch_with_line() -> Sketch {
    let mut sketch = Sketch::new(SketchPlane::default());
    sketch.add_entity(SketchGeometry::Line { start: [1.0, 1.0], end: [6.0, 1.0] });
    sketch
}

/// Leave `tool` half way through a gesture: one click, then a hover.
fn start_gesture(tool: &mut dyn SketchTool, ctx: &mut ToolContext) {
    let event = PointerEvent::primary();
    tool.pointer_move(3.0, 1.2, &event, ctx);
    tool.pointer_down(3.0, 1.2, &event, ctx);
    tool.pointer_up(3.0, 1.2, &event, ctx);
    tool.pointer_move(4.5, 3.5, &event, ctx);
}

#[test]
fn test_cancel_clears_previews_for_every_tool() {
    let config = EngineConfig::default();
    for kind in every_tool() {
        let mut sketch = sketch_with_line();
        let before = sketch.clone();
        let mut tool = create_tool(kind, &config);
        assert_eq!(tool.kind(), kind);

        let mut ctx = ToolContext::new(&mut sketch, &config);
        start_gesture(tool.as_mut(), &mut ctx);
        tool.cancel(&mut ctx);
        assert_eq!(ctx.sketch.preview_count(), 0, "{:?} left previews behind", kind);

        // A second cancel is a no-op.
        tool.cancel(&mut ctx);
        assert_eq!(*ctx.sketch, before, "{:?} changed the sketch on cancel", kind);
    }
}

#[test]
fn test_cancel_resets_click_state() {
    let config = EngineConfig::default();
    let event = PointerEvent::primary();
    let mut sketch = Sketch::new(SketchPlane::default());
    let mut tool = create_tool(ToolKind::Line, &config);

    let mut ctx = ToolContext::new(&mut sketch, &config);
    tool.pointer_down(2.0, 2.0, &event, &mut ctx);
    tool.cancel(&mut ctx);

    // After cancel the next click is a first click again, so nothing commits.
    let outcome = tool.pointer_down(5.0, 2.0, &event, &mut ctx);
    assert_eq!(outcome, crate::sketch::tools::ToolOutcome::None);
}

#[test]
fn test_deactivate_cancels() {
    let config = EngineConfig::default();
    let event = PointerEvent::primary();
    let mut sketch = Sketch::new(SketchPlane::default());
    let mut tool = create_tool(ToolKind::Circle, &config);

    let mut ctx = ToolContext::new(&mut sketch, &config);
    tool.activate(&mut ctx);
    tool.pointer_down(2.0, 2.0, &event, &mut ctx);
    tool.pointer_move(4.0, 2.0, &event, &mut ctx);
    assert!(ctx.sketch.preview_count() > 0);
    tool.deactivate(&mut ctx);
    assert_eq!(ctx.sketch.preview_count(), 0);
}
