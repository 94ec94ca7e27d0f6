//! Circular pattern applied to a sketch, copies checked by position.

use crate::sketch::pattern::{circular_pattern, CircularPatternParams, PatternCenter};
use crate::sketch::types::{ConstraintPoint, Sketch, SketchConstraint, SketchGeometry, SketchPlane};

fn close(a: [f64; 2], b: [f64; 2]) -> bool {
    (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
}

#[test]
fn test_full_turn_of_a_line() {
    let mut sketch = Sketch::new(SketchPlane::default());
    let line = sketch.add_entity(SketchGeometry::Line { start: [5.0, 0.0], end: [6.0, 0.0] });
    let params = CircularPatternParams { center: PatternCenter::Origin, count: 4, total_angle_deg: 360.0 };

    let result = circular_pattern(&sketch, &[line], &params).unwrap();
    assert_eq!(result.entities.len(), 3);

    // 90, 180 and 270 degrees.
    let expected = [([0.0, 5.0], [0.0, 6.0]), ([-5.0, 0.0], [-6.0, 0.0]), ([0.0, -5.0], [0.0, -6.0])];
    for (entity, (want_start, want_end)) in result.entities.iter().zip(expected) {
        match entity.geometry {
            SketchGeometry::Line { start, end } => {
                assert!(close(start, want_start), "got {:?}, want {:?}", start, want_start);
                assert!(close(end, want_end), "got {:?}, want {:?}", end, want_end);
            }
            ref other => panic!("unexpected {:?}", other),
        }
    }

    let ids: Vec<_> = result.entities.iter().map(|e| e.id).collect();
    result.apply(&mut sketch);
    for id in ids {
        let equal = sketch
            .active_constraints()
            .filter(|c| matches!(c, SketchConstraint::Equal { entities } if entities.contains(&id)))
            .count();
        assert_eq!(equal, 1);
        assert!(sketch.active_constraints().any(|c| *c == SketchConstraint::Equal { entities: [line, id] }));
    }
    assert_eq!(sketch.entities.len(), 4);
    assert!(sketch.dangling_constraints().is_empty());
}

#[test]
fn test_circle_copies_keep_radius() {
    let mut sketch = Sketch::new(SketchPlane::default());
    let circle = sketch.add_entity(SketchGeometry::Circle { center: [5.0, 0.0], radius: 1.0 });
    let params = CircularPatternParams { center: PatternCenter::Origin, count: 3, total_angle_deg: 90.0 };

    let result = circular_pattern(&sketch, &[circle], &params).unwrap();
    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.constraints.len(), 2);
    // Step is 90 / 3 = 30 degrees.
    let step = 30f64.to_radians();
    for (i, entity) in result.entities.iter().enumerate() {
        let angle = step * (i + 1) as f64;
        match entity.geometry {
            SketchGeometry::Circle { center, radius } => {
                assert!(close(center, [5.0 * angle.cos(), 5.0 * angle.sin()]));
                assert!((radius - 1.0).abs() < 1e-12);
            }
            ref other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn test_center_on_sketch_point() {
    let mut sketch = Sketch::new(SketchPlane::default());
    let pivot = sketch.add_entity(SketchGeometry::Point { pos: [1.0, 1.0] });
    let line = sketch.add_entity(SketchGeometry::Line { start: [2.0, 1.0], end: [3.0, 1.0] });
    let params = CircularPatternParams {
        center: PatternCenter::Point(ConstraintPoint::new(pivot, 0)),
        count: 2,
        total_angle_deg: 180.0,
    };

    let result = circular_pattern(&sketch, &[line], &params).unwrap();
    assert_eq!(result.entities.len(), 1);
    match result.entities[0].geometry {
        SketchGeometry::Line { start, end } => {
            assert!(close(start, [1.0, 2.0]));
            assert!(close(end, [1.0, 3.0]));
        }
        ref other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unresolved_center_declines() {
    let mut sketch = Sketch::new(SketchPlane::default());
    let line = sketch.add_entity(SketchGeometry::Line { start: [2.0, 1.0], end: [3.0, 1.0] });
    let params = CircularPatternParams {
        center: PatternCenter::Point(ConstraintPoint::new(crate::topo::EntityId::new(), 0)),
        count: 3,
        total_angle_deg: 360.0,
    };
    assert!(circular_pattern(&sketch, &[line], &params).is_none());
}
