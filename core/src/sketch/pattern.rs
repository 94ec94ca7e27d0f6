//! Mirror, linear and circular replication of sketch entities.
//!
//! Every copy gets a fresh id and is tied back to its source by
//! constraints: Symmetric point pairs for mirrors, one Equal per non-Point
//! copy for linear and circular patterns (plus Equal on mirrored curves).

use super::query::{line_endpoints, resolve_point};
use super::types::{ConstraintPoint, Sketch, SketchConstraint, SketchEntity, SketchGeometry};
use crate::geometry::utils_2d::{add, angle_of, dot_2d, scale, sub, try_normalize_2d, DEGENERATE_LENGTH};
use crate::topo::EntityId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Preview slots used by pattern previews; tools use the low slots.
const PREVIEW_SLOT_BASE: u64 = 1 << 16;

// =============================================================================
// Point transforms
// =============================================================================

/// Reflect `p` across the infinite line through `a` and `b`.
/// A degenerate axis leaves the point unchanged.
pub fn reflect(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    let d = sub(b, a);
    let len_sq = dot_2d(d, d);
    if len_sq < DEGENERATE_LENGTH * DEGENERATE_LENGTH {
        return p;
    }
    let t = dot_2d(sub(p, a), d) / len_sq;
    let foot = add(a, scale(d, t));
    sub(scale(foot, 2.0), p)
}

/// `p + direction * distance`; `direction` is expected to be unit length.
pub fn translate(p: [f64; 2], direction: [f64; 2], distance: f64) -> [f64; 2] {
    add(p, scale(direction, distance))
}

/// Rotate `p` counter-clockwise about `center`.
pub fn rotate(p: [f64; 2], center: [f64; 2], angle: f64) -> [f64; 2] {
    let (s, c) = angle.sin_cos();
    let [dx, dy] = sub(p, center);
    [center[0] + dx * c - dy * s, center[1] + dx * s + dy * c]
}

// =============================================================================
// Geometry transforms
// =============================================================================

pub fn reflect_geometry(geometry: &SketchGeometry, a: [f64; 2], b: [f64; 2]) -> SketchGeometry {
    let r = |p: [f64; 2]| reflect(p, a, b);
    match geometry {
        SketchGeometry::Point { pos } => SketchGeometry::Point { pos: r(*pos) },
        SketchGeometry::Line { start, end } => SketchGeometry::Line { start: r(*start), end: r(*end) },
        SketchGeometry::Circle { center, radius } => SketchGeometry::Circle { center: r(*center), radius: *radius },
        SketchGeometry::Arc { center, radius, start_angle, end_angle } => {
            // Reflection reverses orientation, so the mirrored CCW arc runs
            // from the image of the old end to the image of the old start.
            let c = r(*center);
            let old_start = add(*center, scale([start_angle.cos(), start_angle.sin()], *radius));
            let old_end = add(*center, scale([end_angle.cos(), end_angle.sin()], *radius));
            SketchGeometry::Arc {
                center: c,
                radius: *radius,
                start_angle: angle_of(sub(r(old_end), c)),
                end_angle: angle_of(sub(r(old_start), c)),
            }
        }
        SketchGeometry::Ellipse { center, semi_major, semi_minor, rotation } => {
            let axis_angle = angle_of(sub(b, a));
            SketchGeometry::Ellipse {
                center: r(*center),
                semi_major: *semi_major,
                semi_minor: *semi_minor,
                rotation: 2.0 * axis_angle - rotation,
            }
        }
    }
}

pub fn translate_geometry(geometry: &SketchGeometry, direction: [f64; 2], distance: f64) -> SketchGeometry {
    let t = |p: [f64; 2]| translate(p, direction, distance);
    match geometry {
        SketchGeometry::Point { pos } => SketchGeometry::Point { pos: t(*pos) },
        SketchGeometry::Line { start, end } => SketchGeometry::Line { start: t(*start), end: t(*end) },
        SketchGeometry::Circle { center, radius } => SketchGeometry::Circle { center: t(*center), radius: *radius },
        SketchGeometry::Arc { center, radius, start_angle, end_angle } => SketchGeometry::Arc {
            center: t(*center),
            radius: *radius,
            start_angle: *start_angle,
            end_angle: *end_angle,
        },
        SketchGeometry::Ellipse { center, semi_major, semi_minor, rotation } => SketchGeometry::Ellipse {
            center: t(*center),
            semi_major: *semi_major,
            semi_minor: *semi_minor,
            rotation: *rotation,
        },
    }
}

pub fn rotate_geometry(geometry: &SketchGeometry, center: [f64; 2], angle: f64) -> SketchGeometry {
    let rot = |p: [f64; 2]| rotate(p, center, angle);
    match geometry {
        SketchGeometry::Point { pos } => SketchGeometry::Point { pos: rot(*pos) },
        SketchGeometry::Line { start, end } => SketchGeometry::Line { start: rot(*start), end: rot(*end) },
        SketchGeometry::Circle { center: c, radius } => SketchGeometry::Circle { center: rot(*c), radius: *radius },
        SketchGeometry::Arc { center: c, radius, start_angle, end_angle } => SketchGeometry::Arc {
            center: rot(*c),
            radius: *radius,
            start_angle: start_angle + angle,
            end_angle: end_angle + angle,
        },
        SketchGeometry::Ellipse { center: c, semi_major, semi_minor, rotation } => SketchGeometry::Ellipse {
            center: rot(*c),
            semi_major: *semi_major,
            semi_minor: *semi_minor,
            rotation: rotation + angle,
        },
    }
}

// =============================================================================
// Pattern operations
// =============================================================================

/// New entities and constraints produced by a pattern, not yet applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternResult {
    pub entities: Vec<SketchEntity>,
    pub constraints: Vec<SketchConstraint>,
}

impl PatternResult {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Append everything to the sketch, recording history.
    pub fn apply(self, sketch: &mut Sketch) {
        for entity in self.entities {
            sketch.insert_entity(entity);
        }
        for constraint in self.constraints {
            sketch.add_constraint(constraint);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPatternParams {
    /// Line whose direction (start→end) the copies follow.
    pub direction_line: EntityId,
    /// Total instances including the source; copies are `count - 1`.
    pub count: usize,
    pub spacing: f64,
    #[serde(default)]
    pub flip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PatternCenter {
    Origin,
    /// Any canonical point: a sketch point, circle center or arc center.
    Point(ConstraintPoint),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularPatternParams {
    pub center: PatternCenter,
    /// Total instances including the source; copies are `count - 1`.
    pub count: usize,
    /// Copy `i` sits at `total_angle_deg * i / count`.
    pub total_angle_deg: f64,
}

/// Selected entities that resolve, in selection order, without repeats.
fn resolve_selection<'a>(sketch: &'a Sketch, selection: &[EntityId]) -> Vec<&'a SketchEntity> {
    let mut seen = Vec::new();
    selection
        .iter()
        .filter(|id| {
            if seen.contains(*id) {
                false
            } else {
                seen.push(**id);
                true
            }
        })
        .filter_map(|id| sketch.entity(*id))
        .filter(|e| !e.is_preview())
        .collect()
}

fn copy_of(source: &SketchEntity, geometry: SketchGeometry, id: EntityId) -> SketchEntity {
    SketchEntity { id, geometry, is_construction: source.is_construction }
}

/// Canonical point pairs (source index, mirrored index) that stay symmetric.
fn symmetric_pairs(geometry: &SketchGeometry) -> &'static [(u8, u8)] {
    match geometry {
        SketchGeometry::Line { .. } => &[(0, 0), (1, 1)],
        SketchGeometry::Arc { .. } => &[(0, 0), (1, 2), (2, 1)],
        SketchGeometry::Point { .. } | SketchGeometry::Circle { .. } | SketchGeometry::Ellipse { .. } => &[(0, 0)],
    }
}

/// Mirror `selection` across the line `axis`. Returns `None` when the axis
/// is not a line or is degenerate. The axis itself is never mirrored.
pub fn mirror(sketch: &Sketch, selection: &[EntityId], axis: EntityId) -> Option<PatternResult> {
    let (a, b) = line_endpoints(sketch, axis)?;
    try_normalize_2d(sub(b, a))?;

    let mut result = PatternResult::default();
    for source in resolve_selection(sketch, selection).into_iter().filter(|e| e.id != axis) {
        let copy = copy_of(source, reflect_geometry(&source.geometry, a, b), EntityId::new());
        for (from, to) in symmetric_pairs(&source.geometry) {
            result.constraints.push(SketchConstraint::Symmetric {
                p1: ConstraintPoint::new(source.id, *from),
                p2: ConstraintPoint::new(copy.id, *to),
                axis,
            });
        }
        if matches!(
            source.geometry,
            SketchGeometry::Circle { .. } | SketchGeometry::Arc { .. } | SketchGeometry::Ellipse { .. }
        ) {
            result.constraints.push(SketchConstraint::Equal { entities: [source.id, copy.id] });
        }
        result.entities.push(copy);
    }

    info!(copies = result.entities.len(), constraints = result.constraints.len(), "mirror");
    Some(result)
}

/// Copies as `(source id, copy)` pairs with ids drawn from `next_id`.
fn linear_copies(
    sketch: &Sketch,
    selection: &[EntityId],
    params: &LinearPatternParams,
    mut next_id: impl FnMut() -> EntityId,
) -> Option<Vec<(EntityId, SketchEntity)>> {
    if params.count < 2 || params.spacing.abs() < DEGENERATE_LENGTH {
        debug!(count = params.count, spacing = params.spacing, "linear pattern declined");
        return None;
    }
    let (s, e) = line_endpoints(sketch, params.direction_line)?;
    let mut dir = try_normalize_2d(sub(e, s))?;
    if params.flip {
        dir = scale(dir, -1.0);
    }

    let sources = resolve_selection(sketch, selection);
    let mut copies = Vec::with_capacity(sources.len() * (params.count - 1));
    for i in 1..params.count {
        let distance = params.spacing * i as f64;
        for source in &sources {
            let geometry = translate_geometry(&source.geometry, dir, distance);
            copies.push((source.id, copy_of(source, geometry, next_id())));
        }
    }
    Some(copies)
}

fn circular_copies(
    sketch: &Sketch,
    selection: &[EntityId],
    params: &CircularPatternParams,
    mut next_id: impl FnMut() -> EntityId,
) -> Option<Vec<(EntityId, SketchEntity)>> {
    if params.count < 2 {
        debug!(count = params.count, "circular pattern declined");
        return None;
    }
    let center = match params.center {
        PatternCenter::Origin => [0.0, 0.0],
        PatternCenter::Point(cp) => resolve_point(sketch, &cp)?,
    };
    let step = params.total_angle_deg.to_radians() / params.count as f64;

    let sources = resolve_selection(sketch, selection);
    let mut copies = Vec::with_capacity(sources.len() * (params.count - 1));
    for i in 1..params.count {
        let angle = step * i as f64;
        for source in &sources {
            let geometry = rotate_geometry(&source.geometry, center, angle);
            copies.push((source.id, copy_of(source, geometry, next_id())));
        }
    }
    Some(copies)
}

fn with_equal_constraints(copies: Vec<(EntityId, SketchEntity)>) -> PatternResult {
    let mut result = PatternResult::default();
    for (source, copy) in copies {
        if !matches!(copy.geometry, SketchGeometry::Point { .. }) {
            result.constraints.push(SketchConstraint::Equal { entities: [source, copy.id] });
        }
        result.entities.push(copy);
    }
    result
}

fn preview_ids() -> impl FnMut() -> EntityId {
    let mut slot = PREVIEW_SLOT_BASE;
    move || {
        slot += 1;
        EntityId::preview(slot)
    }
}

pub fn linear_pattern(sketch: &Sketch, selection: &[EntityId], params: &LinearPatternParams) -> Option<PatternResult> {
    let result = with_equal_constraints(linear_copies(sketch, selection, params, EntityId::new)?);
    info!(copies = result.entities.len(), count = params.count, "linear pattern");
    Some(result)
}

pub fn circular_pattern(sketch: &Sketch, selection: &[EntityId], params: &CircularPatternParams) -> Option<PatternResult> {
    let result = with_equal_constraints(circular_copies(sketch, selection, params, EntityId::new)?);
    info!(copies = result.entities.len(), count = params.count, "circular pattern");
    Some(result)
}

/// Copies a linear pattern would create, with preview ids. No constraints.
pub fn preview_linear_pattern(sketch: &Sketch, selection: &[EntityId], params: &LinearPatternParams) -> Vec<SketchEntity> {
    linear_copies(sketch, selection, params, preview_ids())
        .map(|copies| copies.into_iter().map(|(_, e)| e).collect())
        .unwrap_or_default()
}

/// Copies a circular pattern would create, with preview ids. No constraints.
pub fn preview_circular_pattern(sketch: &Sketch, selection: &[EntityId], params: &CircularPatternParams) -> Vec<SketchEntity> {
    circular_copies(sketch, selection, params, preview_ids())
        .map(|copies| copies.into_iter().map(|(_, e)| e).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::query::point_position;
    use crate::sketch::types::SketchPlane;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn test_reflect_involution() {
        let axes = [([0.0, 0.0], [1.0, 0.0]), ([1.0, 2.0], [3.0, -5.0]), ([-4.0, 4.0], [-4.0, 9.0])];
        let points = [[0.0, 0.0], [3.5, -2.0], [-7.0, 11.0]];
        for (a, b) in axes {
            for p in points {
                assert!(close(reflect(reflect(p, a, b), a, b), p));
            }
        }
    }

    #[test]
    fn test_reflect_degenerate_axis() {
        assert_eq!(reflect([2.0, 3.0], [1.0, 1.0], [1.0, 1.0]), [2.0, 3.0]);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        assert!(close(rotate([2.0, 1.0], [1.0, 1.0], FRAC_PI_2), [1.0, 2.0]));
    }

    #[test]
    fn test_mirror_arc_keeps_endpoints_symmetric() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let axis = sketch.add_construction_entity(SketchGeometry::Line { start: [0.0, -5.0], end: [0.0, 5.0] });
        let arc = sketch.add_entity(SketchGeometry::Arc { center: [3.0, 0.0], radius: 1.0, start_angle: 0.0, end_angle: FRAC_PI_2 });

        let result = mirror(&sketch, &[arc, axis], axis).unwrap();
        assert_eq!(result.entities.len(), 1);
        let copy = &result.entities[0];
        let source = sketch.entity(arc).unwrap();

        // Index 1 of the source mirrors onto index 2 of the copy and vice versa.
        for (from, to) in [(1u8, 2u8), (2, 1), (0, 0)] {
            let p = point_position(source, from).unwrap();
            let q = point_position(copy, to).unwrap();
            assert!(close(reflect(p, [0.0, -5.0], [0.0, 5.0]), q));
        }
        let symmetric = result.constraints.iter().filter(|c| matches!(c, SketchConstraint::Symmetric { .. })).count();
        let equal = result.constraints.iter().filter(|c| matches!(c, SketchConstraint::Equal { .. })).count();
        assert_eq!(symmetric, 3);
        assert_eq!(equal, 1);
    }

    #[test]
    fn test_mirror_requires_line_axis() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let circle = sketch.add_entity(SketchGeometry::Circle { center: [0.0, 0.0], radius: 1.0 });
        assert!(mirror(&sketch, &[circle], circle).is_none());
    }

    #[test]
    fn test_linear_count_law() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let dir = sketch.add_construction_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [1.0, 0.0] });
        let a = sketch.add_entity(SketchGeometry::Circle { center: [0.0, 2.0], radius: 0.5 });
        let b = sketch.add_entity(SketchGeometry::Point { pos: [0.0, 4.0] });

        let params = LinearPatternParams { direction_line: dir, count: 5, spacing: 2.0, flip: true };
        let result = linear_pattern(&sketch, &[a, b], &params).unwrap();
        assert_eq!(result.entities.len(), 4 * 2);
        // Only the circle copies get Equal constraints.
        assert_eq!(result.constraints.len(), 4);
        match result.entities[0].geometry {
            SketchGeometry::Circle { center, .. } => assert!(close(center, [-2.0, 2.0])),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_circular_step_divides_by_count() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let p = sketch.add_entity(SketchGeometry::Point { pos: [1.0, 0.0] });
        let params = CircularPatternParams { center: PatternCenter::Origin, count: 3, total_angle_deg: 180.0 };
        let result = circular_pattern(&sketch, &[p], &params).unwrap();
        assert_eq!(result.entities.len(), 2);
        assert!(result.constraints.is_empty());
        let expected = [rotate([1.0, 0.0], [0.0, 0.0], PI / 3.0), rotate([1.0, 0.0], [0.0, 0.0], 2.0 * PI / 3.0)];
        for (entity, want) in result.entities.iter().zip(expected) {
            match entity.geometry {
                SketchGeometry::Point { pos } => assert!(close(pos, want)),
                ref other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_preview_has_no_side_effects() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let line = sketch.add_entity(SketchGeometry::Line { start: [1.0, 0.0], end: [2.0, 0.0] });
        let history = sketch.history.len();
        let params = CircularPatternParams { center: PatternCenter::Origin, count: 6, total_angle_deg: 360.0 };
        let preview = preview_circular_pattern(&sketch, &[line], &params);
        assert_eq!(preview.len(), 5);
        assert!(preview.iter().all(|e| e.is_preview()));
        assert_eq!(sketch.history.len(), history);
    }

    #[test]
    fn test_degenerate_inputs_decline() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let dot = sketch.add_entity(SketchGeometry::Line { start: [1.0, 1.0], end: [1.0, 1.0] });
        let c = sketch.add_entity(SketchGeometry::Circle { center: [0.0, 0.0], radius: 1.0 });
        let params = LinearPatternParams { direction_line: dot, count: 3, spacing: 1.0, flip: false };
        assert!(linear_pattern(&sketch, &[c], &params).is_none());
        let params = CircularPatternParams { center: PatternCenter::Origin, count: 1, total_angle_deg: 360.0 };
        assert!(circular_pattern(&sketch, &[c], &params).is_none());
    }
}
