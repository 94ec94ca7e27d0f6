//! Pure lookups over a `Sketch`.
//!
//! Every helper returns `None` for an unresolved reference: constraints may
//! still point at an entity that a concurrent echo from the solver removed.

use super::types::{ConstraintPoint, Sketch, SketchEntity, SketchGeometry};
use crate::geometry::utils_2d::{
    angle_in_sweep, angle_of, arc_point, distance, distance_point_to_segment, ellipse_point, midpoint, sub,
    try_normalize_2d,
};
use crate::topo::EntityId;

/// Samples used when measuring distance to an ellipse outline.
const ELLIPSE_SAMPLES: usize = 64;

/// Canonical point `index` of an entity.
/// Line: 0 start, 1 end. Arc: 0 center, 1 start, 2 end. Others: 0 only.
pub fn point_position(entity: &SketchEntity, index: u8) -> Option<[f64; 2]> {
    match (&entity.geometry, index) {
        (SketchGeometry::Line { start, .. }, 0) => Some(*start),
        (SketchGeometry::Line { end, .. }, 1) => Some(*end),
        (SketchGeometry::Arc { center, .. }, 0) => Some(*center),
        (SketchGeometry::Arc { center, radius, start_angle, .. }, 1) => Some(arc_point(*center, *radius, *start_angle)),
        (SketchGeometry::Arc { center, radius, end_angle, .. }, 2) => Some(arc_point(*center, *radius, *end_angle)),
        (SketchGeometry::Circle { center, .. }, 0) => Some(*center),
        (SketchGeometry::Point { pos }, 0) => Some(*pos),
        (SketchGeometry::Ellipse { center, .. }, 0) => Some(*center),
        _ => None,
    }
}

/// All canonical points of an entity paired with their index.
pub fn entity_points(entity: &SketchEntity) -> Vec<(u8, [f64; 2])> {
    (0..3u8).filter_map(|i| point_position(entity, i).map(|p| (i, p))).collect()
}

/// Resolve a constraint point to its 2D position. The origin sentinel is `[0, 0]`.
pub fn resolve_point(sketch: &Sketch, point: &ConstraintPoint) -> Option<[f64; 2]> {
    if point.is_origin() {
        return Some([0.0, 0.0]);
    }
    point_position(sketch.entity(point.id)?, point.index)
}

pub fn line_endpoints(sketch: &Sketch, id: EntityId) -> Option<([f64; 2], [f64; 2])> {
    match sketch.entity(id)?.geometry {
        SketchGeometry::Line { start, end } => Some((start, end)),
        _ => None,
    }
}

pub fn line_midpoint(sketch: &Sketch, id: EntityId) -> Option<[f64; 2]> {
    line_endpoints(sketch, id).map(|(s, e)| midpoint(s, e))
}

/// Unit direction start→end; `None` for a degenerate line.
pub fn line_direction(sketch: &Sketch, id: EntityId) -> Option<[f64; 2]> {
    let (s, e) = line_endpoints(sketch, id)?;
    try_normalize_2d(sub(e, s))
}

pub fn line_length(sketch: &Sketch, id: EntityId) -> Option<f64> {
    line_endpoints(sketch, id).map(|(s, e)| distance(s, e))
}

/// Center and radius of a Circle or Arc.
pub fn circle_center_radius(sketch: &Sketch, id: EntityId) -> Option<([f64; 2], f64)> {
    match sketch.entity(id)?.geometry {
        SketchGeometry::Circle { center, radius } | SketchGeometry::Arc { center, radius, .. } => Some((center, radius)),
        _ => None,
    }
}

/// Shortest distance from `p` to the drawn outline of a geometry.
pub fn distance_to_geometry(geometry: &SketchGeometry, p: [f64; 2]) -> f64 {
    match geometry {
        SketchGeometry::Point { pos } => distance(*pos, p),
        SketchGeometry::Line { start, end } => distance_point_to_segment(*start, *end, p),
        SketchGeometry::Circle { center, radius } => (distance(*center, p) - radius).abs(),
        SketchGeometry::Arc { center, radius, start_angle, end_angle } => {
            let angle = angle_of(sub(p, *center));
            if angle_in_sweep(angle, *start_angle, *end_angle) {
                (distance(*center, p) - radius).abs()
            } else {
                distance(arc_point(*center, *radius, *start_angle), p)
                    .min(distance(arc_point(*center, *radius, *end_angle), p))
            }
        }
        SketchGeometry::Ellipse { center, semi_major, semi_minor, rotation } => (0..=ELLIPSE_SAMPLES)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / ELLIPSE_SAMPLES as f64;
                ellipse_point(*center, *semi_major, *semi_minor, *rotation, t)
            })
            .collect::<Vec<_>>()
            .windows(2)
            .map(|w| distance_point_to_segment(w[0], w[1], p))
            .fold(f64::INFINITY, f64::min),
    }
}

pub fn distance_to_entity(entity: &SketchEntity, p: [f64; 2]) -> f64 {
    distance_to_geometry(&entity.geometry, p)
}

/// Nearest committed line within `threshold`.
pub fn nearest_line(sketch: &Sketch, p: [f64; 2], threshold: f64) -> Option<EntityId> {
    sketch
        .committed_entities()
        .filter(|e| matches!(e.geometry, SketchGeometry::Line { .. }))
        .map(|e| (e.id, distance_to_entity(e, p)))
        .filter(|(_, d)| *d <= threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Nearest canonical point (including the origin) within `threshold`.
pub fn nearest_point(sketch: &Sketch, p: [f64; 2], threshold: f64) -> Option<(ConstraintPoint, [f64; 2])> {
    let origin = std::iter::once((ConstraintPoint::origin(), [0.0, 0.0]));
    let points = sketch.committed_entities().flat_map(|e| {
        entity_points(e)
            .into_iter()
            .map(move |(i, pos)| (ConstraintPoint::new(e.id, i), pos))
    });
    points
        .chain(origin)
        .map(|(cp, pos)| (cp, pos, distance(pos, p)))
        .filter(|(_, _, d)| *d <= threshold)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(cp, pos, _)| (cp, pos))
}

/// Nearest committed entity of any kind within `threshold`.
pub fn nearest_entity(sketch: &Sketch, p: [f64; 2], threshold: f64) -> Option<EntityId> {
    sketch
        .committed_entities()
        .map(|e| (e.id, distance_to_entity(e, p)))
        .filter(|(_, d)| *d <= threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::types::SketchPlane;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> (Sketch, EntityId, EntityId) {
        let mut sketch = Sketch::new(SketchPlane::default());
        let line = sketch.add_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [4.0, 0.0] });
        let arc = sketch.add_entity(SketchGeometry::Arc {
            center: [10.0, 0.0],
            radius: 2.0,
            start_angle: 0.0,
            end_angle: FRAC_PI_2,
        });
        (sketch, line, arc)
    }

    #[test]
    fn test_point_indices() {
        let (sketch, line, arc) = sample();
        assert_eq!(resolve_point(&sketch, &ConstraintPoint::new(line, 1)), Some([4.0, 0.0]));
        let start = resolve_point(&sketch, &ConstraintPoint::new(arc, 1)).unwrap();
        let end = resolve_point(&sketch, &ConstraintPoint::new(arc, 2)).unwrap();
        assert!((start[0] - 12.0).abs() < 1e-12 && start[1].abs() < 1e-12);
        assert!((end[0] - 10.0).abs() < 1e-12 && (end[1] - 2.0).abs() < 1e-12);
        assert!(resolve_point(&sketch, &ConstraintPoint::new(line, 2)).is_none());
        assert_eq!(resolve_point(&sketch, &ConstraintPoint::origin()), Some([0.0, 0.0]));
    }

    #[test]
    fn test_unresolved_reference_is_none() {
        let (sketch, _, _) = sample();
        let ghost = EntityId::new();
        assert!(resolve_point(&sketch, &ConstraintPoint::new(ghost, 0)).is_none());
        assert!(line_direction(&sketch, ghost).is_none());
        assert!(circle_center_radius(&sketch, ghost).is_none());
    }

    #[test]
    fn test_line_accessors() {
        let (mut sketch, line, _) = sample();
        assert_eq!(line_midpoint(&sketch, line), Some([2.0, 0.0]));
        assert_eq!(line_length(&sketch, line), Some(4.0));
        assert_eq!(line_direction(&sketch, line), Some([1.0, 0.0]));

        let degenerate = sketch.add_entity(SketchGeometry::Line { start: [1.0, 1.0], end: [1.0, 1.0] });
        assert!(line_direction(&sketch, degenerate).is_none());
    }

    #[test]
    fn test_nearest_queries() {
        let (sketch, line, arc) = sample();
        assert_eq!(nearest_line(&sketch, [2.0, 1.5], 2.0), Some(line));
        assert_eq!(nearest_line(&sketch, [2.0, 3.0], 2.0), None);
        let (cp, _) = nearest_point(&sketch, [11.9, 0.2], 1.5).unwrap();
        assert_eq!(cp, ConstraintPoint::new(arc, 1));
        let (cp, _) = nearest_point(&sketch, [-0.5, -0.5], 1.5).unwrap();
        assert!(cp.id == line || cp.is_origin());
        assert_eq!(nearest_entity(&sketch, [10.0, 2.1], 0.5), Some(arc));
    }
}
