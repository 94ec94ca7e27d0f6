//! The replay log: appended on commit, untouched by previews.

use crate::sketch::types::{
    ConstraintPoint, Sketch, SketchConstraint, SketchEntity, SketchGeometry, SketchOperation, SketchPlane,
};
use crate::topo::EntityId;

#[test]
fn test_history_appending() {
    let mut sketch = Sketch::new(SketchPlane::default());
    let id = sketch.add_entity(SketchGeometry::Point { pos: [0.0, 0.0] });

    assert_eq!(sketch.history.len(), 1);
    match &sketch.history[0] {
        SketchOperation::AddGeometry { id: op_id, geometry } => {
            assert_eq!(id, *op_id);
            assert_eq!(*geometry, SketchGeometry::Point { pos: [0.0, 0.0] });
        }
        other => panic!("Wrong operation type: {:?}", other),
    }

    let constraint = SketchConstraint::Fix { point: ConstraintPoint::new(id, 0), position: [0.0, 0.0] };
    sketch.add_constraint(constraint.clone());
    assert_eq!(sketch.history.len(), 2);
    assert_eq!(sketch.history[1], SketchOperation::AddConstraint { constraint });
}

#[test]
fn test_previews_never_reach_history() {
    let mut sketch = Sketch::new(SketchPlane::default());
    sketch.set_preview(EntityId::preview(0), SketchGeometry::Point { pos: [1.0, 1.0] }, false);
    sketch.set_preview(EntityId::preview(0), SketchGeometry::Point { pos: [2.0, 1.0] }, false);
    assert_eq!(sketch.preview_count(), 1);
    sketch.clear_previews();
    assert!(sketch.history.is_empty());
    assert!(sketch.entities.is_empty());
}

#[test]
fn test_remove_records_and_cascades() {
    let mut sketch = Sketch::new(SketchPlane::default());
    let a = sketch.add_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [1.0, 0.0] });
    let b = sketch.add_entity(SketchGeometry::Line { start: [1.0, 0.0], end: [1.0, 1.0] });
    sketch.add_constraint(SketchConstraint::Horizontal { entity: a });
    sketch.add_constraint(SketchConstraint::Perpendicular { lines: [a, b] });
    sketch.add_constraint(SketchConstraint::Vertical { entity: b });

    assert!(sketch.remove_entity(a));
    assert_eq!(sketch.constraints.len(), 1);
    assert_eq!(sketch.history.last(), Some(&SketchOperation::RemoveGeometry { id: a }));
    assert!(sketch.dangling_constraints().is_empty());

    let len = sketch.history.len();
    assert!(!sketch.remove_entity(a));
    assert_eq!(sketch.history.len(), len);
}

#[test]
fn test_migration() {
    let mut sketch = Sketch::new(SketchPlane::default());
    // Bypass add_entity/add_constraint, which would record history.
    let id = EntityId::new();
    sketch.entities.push(SketchEntity {
        id,
        geometry: SketchGeometry::Line { start: [0.0, 0.0], end: [10.0, 0.0] },
        is_construction: false,
    });
    sketch.constraints.push(SketchConstraint::Horizontal { entity: id }.into());
    sketch.set_preview(EntityId::preview(1), SketchGeometry::Point { pos: [3.0, 3.0] }, false);
    assert!(sketch.history.is_empty());

    sketch.ensure_history();
    assert_eq!(sketch.history.len(), 2);
    assert!(matches!(sketch.history[0], SketchOperation::AddGeometry { id: op_id, .. } if op_id == id));
    assert!(matches!(sketch.history[1], SketchOperation::AddConstraint { .. }));

    // A populated log is left alone.
    sketch.ensure_history();
    assert_eq!(sketch.history.len(), 2);
}

#[test]
fn test_committed_copy_keeps_history() {
    let mut sketch = Sketch::new(SketchPlane::default());
    sketch.add_entity(SketchGeometry::Circle { center: [0.0, 0.0], radius: 1.0 });
    sketch.set_preview(EntityId::preview(2), SketchGeometry::Point { pos: [3.0, 3.0] }, false);
    let committed = sketch.committed();
    assert_eq!(committed.entities.len(), 1);
    assert_eq!(committed.history, sketch.history);
    let json = serde_json::to_string(&committed).unwrap();
    let back: Sketch = serde_json::from_str(&json).unwrap();
    assert_eq!(back, committed);
}

#[test]
fn test_suppressed_constraints_are_logged_but_inactive() {
    let mut sketch = Sketch::new(SketchPlane::default());
    let line = sketch.add_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [3.0, 4.0] });
    sketch.add_constraint_with_suppression(SketchConstraint::Horizontal { entity: line }, true);
    let length = SketchConstraint::Distance {
        points: [ConstraintPoint::new(line, 0), ConstraintPoint::new(line, 1)],
        value: 5.0,
        style: None,
    };
    assert!(length.is_dimensional());
    sketch.add_constraint(length);

    assert_eq!(sketch.history.len(), 3);
    assert_eq!(sketch.active_constraints().count(), 1);

    assert!(!sketch.toggle_constraint_suppression(0));
    assert_eq!(sketch.active_constraints().count(), 2);
    assert!(!sketch.toggle_constraint_suppression(7));
    // Suppression is state, not an operation.
    assert_eq!(sketch.history.len(), 3);
}

#[test]
fn test_delta_drops_constraints_to_missing_entities() {
    use crate::sketch::tools::SketchDelta;

    let mut sketch = Sketch::new(SketchPlane::default());
    let gone = EntityId::new();
    let line = SketchEntity::new(SketchGeometry::Line { start: [0.0, 0.0], end: [3.0, 0.0] });
    let delta = SketchDelta {
        constraints: vec![
            SketchConstraint::Coincident { points: [ConstraintPoint::new(line.id, 0), ConstraintPoint::new(gone, 0)] },
            SketchConstraint::Coincident { points: [ConstraintPoint::new(line.id, 0), ConstraintPoint::new(EntityId::origin(), 0)] },
            SketchConstraint::Horizontal { entity: line.id },
        ],
        entities: vec![line],
        ..SketchDelta::default()
    };
    delta.apply(&mut sketch);

    assert_eq!(sketch.constraints.len(), 2);
    assert!(sketch.dangling_constraints().is_empty());
    assert!(sketch.history.iter().all(|op| match op {
        SketchOperation::AddConstraint { constraint } => !constraint.references(gone),
        _ => true,
    }));
}
