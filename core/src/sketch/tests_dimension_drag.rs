//! A dimension placed with the tool, then dragged by its text.

use crate::config::EngineConfig;
use crate::sketch::dimension::{hitboxes, layout_dimension, CameraControls, DimensionDragController, DragFrame};
use crate::sketch::tools::test_support::{click_all, commit_of};
use crate::sketch::tools::{DimensionMode, DimensionTool};
use crate::sketch::types::{Sketch, SketchGeometry, SketchPlane};

struct Orbit {
    enabled: bool,
}

impl CameraControls for Orbit {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

fn dimensioned_line(config: &EngineConfig) -> Sketch {
    let mut sketch = Sketch::new(SketchPlane::default());
    sketch.add_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [4.0, 0.0] });
    let mut tool = DimensionTool::new(DimensionMode::Distance);
    commit_of(click_all(&mut tool, &mut sketch, config, &[[2.0, 0.1]])).apply(&mut sketch);
    sketch
}

#[test]
fn test_perpendicular_drag_moves_only_the_offset() {
    let config = EngineConfig::default();
    let mut sketch = dimensioned_line(&config);
    let index = sketch.constraints.len() - 1;
    assert_eq!(sketch.constraints[index].constraint.value(), Some(4.0));

    let hitbox = hitboxes(&sketch, &config).remove(0);
    assert!(matches!(hitbox.frame, DragFrame::Linear { .. }));
    let text_before = layout_dimension(&sketch, index, &config).unwrap().text_position;

    let mut orbit = Orbit { enabled: true };
    let mut drag = DimensionDragController::new();
    assert!(drag.begin(&hitbox, hitbox.center, &sketch, &mut orbit));
    assert!(!orbit.enabled);

    let target = [hitbox.center[0], hitbox.center[1] + 1.0];
    assert!(drag.update(target, &mut sketch));
    assert_eq!(drag.end(&mut orbit), Some(index));
    assert!(orbit.enabled);

    let constraint = &sketch.constraints[index].constraint;
    let style = constraint.dimension_style().unwrap();
    assert!(style.offset[0].abs() < 1e-9);
    assert!((style.offset[1] - 1.5).abs() < 1e-9);
    assert_eq!(constraint.value(), Some(4.0));

    let text_after = layout_dimension(&sketch, index, &config).unwrap().text_position;
    assert!((text_after[0] - text_before[0]).abs() < 1e-9);
    assert!((text_after[1] - text_before[1] - 1.0).abs() < 1e-9);
}

#[test]
fn test_parallel_drag_slides_text() {
    let config = EngineConfig::default();
    let mut sketch = dimensioned_line(&config);
    let hitbox = hitboxes(&sketch, &config).remove(0);

    let mut orbit = Orbit { enabled: true };
    let mut drag = DimensionDragController::new();
    drag.begin(&hitbox, hitbox.center, &sketch, &mut orbit);
    drag.update([hitbox.center[0] + 2.0, hitbox.center[1]], &mut sketch);
    drag.end(&mut orbit);

    let style = sketch.constraints[0].constraint.dimension_style().unwrap();
    assert!((style.offset[0] - 2.0).abs() < 1e-9);
    assert!((style.offset[1] - 0.5).abs() < 1e-9);
}

#[test]
fn test_update_without_drag_is_noop() {
    let config = EngineConfig::default();
    let mut sketch = dimensioned_line(&config);
    let before = sketch.clone();
    let mut drag = DimensionDragController::new();
    assert!(!drag.update([9.0, 9.0], &mut sketch));
    assert_eq!(sketch, before);
}
