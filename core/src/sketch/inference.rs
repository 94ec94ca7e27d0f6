//! Derive the constraints that accompany a freshly drawn entity.
//!
//! Tools record what the cursor snapped onto while placing each defining
//! point (`SnapInfo`). Snapping onto an existing canonical point becomes a
//! Coincident constraint; horizontal/vertical angle snapping and alignment
//! with a reference line become Horizontal/Vertical/Parallel/Perpendicular.

use super::query::line_endpoints;
use super::types::{ConstraintPoint, Sketch, SketchConstraint, SketchGeometry};
use crate::geometry::utils_2d::{
    add, angle_of, distance, dot_2d, DEGENERATE_LENGTH, line_angle_deviation, perpendicular_ccw, scale, sub, try_normalize_2d,
};
use crate::topo::EntityId;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Angular relation a line snapped to while it was being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Alignment {
    Horizontal,
    Vertical,
    Parallel(EntityId),
    Perpendicular(EntityId),
}

/// Everything a tool observed while placing one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapInfo {
    /// Defining-point index of the new entity paired with the existing
    /// point it landed on.
    pub coincident: Vec<(u8, ConstraintPoint)>,
    pub alignment: Option<Alignment>,
}

impl SnapInfo {
    pub fn record(&mut self, index: u8, target: Option<ConstraintPoint>) {
        if let Some(target) = target {
            self.coincident.retain(|(i, _)| *i != index);
            self.coincident.push((index, target));
        }
    }

    pub fn clear(&mut self) {
        self.coincident.clear();
        self.alignment = None;
    }
}

/// Which alignment (if any) a segment from `start` to `end` is within
/// `tolerance_deg` of. Horizontal and vertical win over reference lines;
/// otherwise the committed line with the smallest deviation wins.
pub fn detect_alignment(start: [f64; 2], end: [f64; 2], sketch: &Sketch, tolerance_deg: f64) -> Option<Alignment> {
    let dir = try_normalize_2d(sub(end, start))?;
    let tol = tolerance_deg.to_radians();
    let angle = angle_of(dir);

    if line_angle_deviation(angle, 0.0) <= tol {
        return Some(Alignment::Horizontal);
    }
    if line_angle_deviation(angle, FRAC_PI_2) <= tol {
        return Some(Alignment::Vertical);
    }

    sketch
        .committed_entities()
        .filter_map(|e| match e.geometry {
            SketchGeometry::Line { start: s, end: t } => try_normalize_2d(sub(t, s)).map(|d| (e.id, angle_of(d))),
            _ => None,
        })
        .flat_map(|(id, ref_angle)| {
            [
                (Alignment::Parallel(id), line_angle_deviation(angle, ref_angle)),
                (Alignment::Perpendicular(id), line_angle_deviation(angle, ref_angle + FRAC_PI_2)),
            ]
        })
        .filter(|(_, dev)| *dev <= tol)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(alignment, _)| alignment)
}

/// Move `end` so the segment from `start` matches `alignment` exactly,
/// preserving the projected length along the aligned direction.
pub fn apply_alignment(start: [f64; 2], end: [f64; 2], alignment: Alignment, sketch: &Sketch) -> [f64; 2] {
    let axis = match alignment {
        Alignment::Horizontal => Some([1.0, 0.0]),
        Alignment::Vertical => Some([0.0, 1.0]),
        Alignment::Parallel(id) => line_endpoints(sketch, id).and_then(|(s, e)| try_normalize_2d(sub(e, s))),
        Alignment::Perpendicular(id) => line_endpoints(sketch, id)
            .and_then(|(s, e)| try_normalize_2d(sub(e, s)))
            .map(perpendicular_ccw),
    };
    match axis {
        Some(axis) => add(start, scale(axis, dot_2d(sub(end, start), axis))),
        None => end,
    }
}

/// Constraints implied by `snap` for a new entity `new_id`. Coincident
/// targets are de-duplicated and never point back at the new entity;
/// alignment only applies to lines.
pub fn infer_constraints(new_id: EntityId, geometry: &SketchGeometry, snap: &SnapInfo) -> Vec<SketchConstraint> {
    let mut out = Vec::new();
    let mut seen: Vec<(u8, ConstraintPoint)> = Vec::new();

    for (index, target) in &snap.coincident {
        if target.id == new_id || seen.iter().any(|(i, t)| i == index && t == target) {
            continue;
        }
        seen.push((*index, *target));
        out.push(SketchConstraint::Coincident { points: [ConstraintPoint::new(new_id, *index), *target] });
    }

    if let (SketchGeometry::Line { start, end }, Some(alignment)) = (geometry, snap.alignment) {
        if distance(*start, *end) > DEGENERATE_LENGTH {
            match alignment {
                Alignment::Horizontal => out.push(SketchConstraint::Horizontal { entity: new_id }),
                Alignment::Vertical => out.push(SketchConstraint::Vertical { entity: new_id }),
                Alignment::Parallel(other) if other != new_id => {
                    out.push(SketchConstraint::Parallel { lines: [new_id, other] })
                }
                Alignment::Perpendicular(other) if other != new_id => {
                    out.push(SketchConstraint::Perpendicular { lines: [new_id, other] })
                }
                _ => {}
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::types::SketchPlane;

    #[test]
    fn test_horizontal_within_tolerance() {
        let sketch = Sketch::new(SketchPlane::default());
        assert_eq!(detect_alignment([0.0, 0.0], [10.0, 0.3], &sketch, 3.0), Some(Alignment::Horizontal));
        assert_eq!(detect_alignment([0.0, 0.0], [-0.2, -5.0], &sketch, 3.0), Some(Alignment::Vertical));
        assert_eq!(detect_alignment([0.0, 0.0], [5.0, 5.0], &sketch, 3.0), None);
        assert_eq!(detect_alignment([1.0, 1.0], [1.0, 1.0], &sketch, 3.0), None);
    }

    #[test]
    fn test_parallel_and_perpendicular_to_reference() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let diag = sketch.add_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [10.0, 10.0] });
        assert_eq!(detect_alignment([5.0, 0.0], [8.0, 3.05], &sketch, 3.0), Some(Alignment::Parallel(diag)));
        assert_eq!(detect_alignment([5.0, 0.0], [2.0, 3.05], &sketch, 3.0), Some(Alignment::Perpendicular(diag)));

        let snapped = apply_alignment([5.0, 0.0], [8.0, 3.05], Alignment::Parallel(diag), &sketch);
        assert!(((snapped[0] - 5.0) - snapped[1]).abs() < 1e-9);
    }

    #[test]
    fn test_infer_coincident_and_horizontal() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let existing = sketch.add_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [0.0, 5.0] });
        let new_id = EntityId::new();
        let geometry = SketchGeometry::Line { start: [0.0, 5.0], end: [4.0, 5.0] };

        let mut snap = SnapInfo::default();
        snap.record(0, Some(ConstraintPoint::new(existing, 1)));
        snap.record(0, Some(ConstraintPoint::new(existing, 1)));
        snap.record(1, None);
        snap.alignment = Some(Alignment::Horizontal);

        let constraints = infer_constraints(new_id, &geometry, &snap);
        assert_eq!(constraints.len(), 2);
        assert!(matches!(constraints[0], SketchConstraint::Coincident { points } if points[0] == ConstraintPoint::new(new_id, 0)));
        assert!(matches!(constraints[1], SketchConstraint::Horizontal { entity } if entity == new_id));
    }

    #[test]
    fn test_alignment_ignored_for_circles() {
        let snap = SnapInfo { coincident: vec![(0, ConstraintPoint::origin())], alignment: Some(Alignment::Vertical) };
        let constraints = infer_constraints(EntityId::new(), &SketchGeometry::Circle { center: [0.0, 0.0], radius: 1.0 }, &snap);
        assert_eq!(constraints.len(), 1);
    }

    #[test]
    fn test_self_reference_skipped() {
        let new_id = EntityId::new();
        let snap = SnapInfo { coincident: vec![(1, ConstraintPoint::new(new_id, 0))], alignment: None };
        let geometry = SketchGeometry::Line { start: [0.0, 0.0], end: [1.0, 1.0] };
        assert!(infer_constraints(new_id, &geometry, &snap).is_empty());
    }
}
