//! Dimension annotations: layout and interactive drag.
//!
//! Each visible dimensional constraint gets a `DimensionGeometry` (lines,
//! text anchor, hitbox). The hitbox carries the constraint's own local
//! frame, so a drag only has to project the pointer delta onto it.
//!
//! Offset conventions per kind:
//! - linear: `[slide along the measurement axis, distance from the base line]`
//! - radius: `[leader angle, leader extension past the radius]`
//! - angle: `[unused, arc radius beyond the base offset]`

use super::query::{circle_center_radius, line_endpoints, resolve_point};
use super::types::{ConstraintPoint, Sketch, SketchConstraint};
use crate::config::EngineConfig;
use crate::geometry::utils_2d::{
    add, angle_of, arc_point, ccw_sweep, direction_at, discretize_arc, distance, dot_2d, foot_on_line,
    line_line_intersect_unbounded, midpoint, perpendicular_ccw, scale, sub, try_normalize_2d, DEGENERATE_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use tracing::debug;

/// Angle arcs never collapse below this radius.
const MIN_ANGLE_RADIUS: f64 = 0.1;
const ANGLE_ARC_SEGMENTS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionKind {
    Distance,
    HorizontalDistance,
    VerticalDistance,
    DistancePointLine,
    DistanceParallelLines,
    Radius,
    Angle,
}

/// Basis a drag is measured in, fixed when the drag starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DragFrame {
    Linear { parallel: [f64; 2], perpendicular: [f64; 2] },
    Radial { center: [f64; 2], radius: f64 },
    Angular { center: [f64; 2] },
}

/// Invisible square pick region over a dimension's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionHitbox {
    pub constraint_index: usize,
    pub center: [f64; 2],
    pub half_extent: f64,
    pub frame: DragFrame,
}

impl DimensionHitbox {
    pub fn contains(&self, p: [f64; 2]) -> bool {
        (p[0] - self.center[0]).abs() <= self.half_extent && (p[1] - self.center[1]).abs() <= self.half_extent
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionGeometry {
    pub constraint_index: usize,
    pub kind: DimensionKind,
    pub extension_lines: Vec<([f64; 2], [f64; 2])>,
    /// Polyline; two points for linear dimensions, an arc for angles.
    pub dimension_line: Vec<[f64; 2]>,
    pub leader: Option<([f64; 2], [f64; 2])>,
    pub text_position: [f64; 2],
    pub text: String,
    pub value: f64,
    pub driven: bool,
    pub hitbox: DimensionHitbox,
}

fn format_value(kind: DimensionKind, value: f64, driven: bool) -> String {
    let body = match kind {
        DimensionKind::Radius => format!("R{:.2}", value),
        DimensionKind::Angle => format!("{:.1}°", value.to_degrees()),
        _ => format!("{:.2}", value),
    };
    if driven {
        format!("({})", body)
    } else {
        body
    }
}

/// Shared placement for every linear dimension. `a` and `b` are the measured
/// points, `parallel` the unit measurement axis.
struct LinearLayout {
    extension_lines: Vec<([f64; 2], [f64; 2])>,
    dimension_line: Vec<[f64; 2]>,
    text_position: [f64; 2],
    frame: DragFrame,
}

fn layout_linear(a: [f64; 2], b: [f64; 2], parallel: [f64; 2], offset: [f64; 2], base: f64) -> LinearLayout {
    let perpendicular = perpendicular_ccw(parallel);
    let lift = scale(perpendicular, base + offset[1]);
    let b_on_axis = add(a, scale(parallel, dot_2d(sub(b, a), parallel)));

    let d1 = add(a, lift);
    let d2 = add(b_on_axis, lift);
    let text_position = add(midpoint(d1, d2), scale(parallel, offset[0]));

    LinearLayout {
        extension_lines: vec![(a, d1), (b, d2)],
        dimension_line: vec![d1, d2],
        text_position,
        frame: DragFrame::Linear { parallel, perpendicular },
    }
}

/// Unit vector from `from` toward `to`, or `fallback` when they coincide.
fn toward(from: [f64; 2], to: [f64; 2], fallback: [f64; 2]) -> [f64; 2] {
    try_normalize_2d(sub(to, from)).unwrap_or(fallback)
}

fn line_normal(s: [f64; 2], e: [f64; 2]) -> [f64; 2] {
    perpendicular_ccw(toward(s, e, [1.0, 0.0]))
}

/// Axis of a point-to-point distance. When one end sits on a line (and the
/// other does not), the dimension is placed square to that line.
fn distance_axis(sketch: &Sketch, points: &[ConstraintPoint; 2], a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    let direct = toward(a, b, [1.0, 0.0]);
    if points[0].id == points[1].id {
        return direct;
    }
    let Some((s, e)) = line_endpoints(sketch, points[0].id).or_else(|| line_endpoints(sketch, points[1].id)) else {
        return direct;
    };
    let normal = line_normal(s, e);
    let across = dot_2d(sub(b, a), normal);
    if across.abs() < DEGENERATE_LENGTH {
        direct
    } else if across > 0.0 {
        normal
    } else {
        scale(normal, -1.0)
    }
}

/// Farther endpoint of a line as seen from `center`.
fn far_end(center: [f64; 2], (s, e): ([f64; 2], [f64; 2])) -> [f64; 2] {
    if distance(center, s) > distance(center, e) {
        s
    } else {
        e
    }
}

/// Layout for the constraint at `index`, or `None` when it has no style,
/// is not dimensional, or references something that no longer resolves.
pub fn layout_dimension(sketch: &Sketch, index: usize, config: &EngineConfig) -> Option<DimensionGeometry> {
    let entry = sketch.constraints.get(index)?;
    if entry.suppressed {
        return None;
    }
    let constraint = &entry.constraint;
    let style = constraint.dimension_style()?;
    let value = constraint.value()?;
    let base = config.dimension_base_offset;
    let offset = style.offset;

    let (kind, linear) = match constraint {
        SketchConstraint::Distance { points, .. } => {
            let a = resolve_point(sketch, &points[0])?;
            let b = resolve_point(sketch, &points[1])?;
            (DimensionKind::Distance, Some(layout_linear(a, b, distance_axis(sketch, points, a, b), offset, base)))
        }
        SketchConstraint::HorizontalDistance { points, .. } => {
            let a = resolve_point(sketch, &points[0])?;
            let b = resolve_point(sketch, &points[1])?;
            (DimensionKind::HorizontalDistance, Some(layout_linear(a, b, [1.0, 0.0], offset, base)))
        }
        SketchConstraint::VerticalDistance { points, .. } => {
            let a = resolve_point(sketch, &points[0])?;
            let b = resolve_point(sketch, &points[1])?;
            // Perpendicular of +Y is -X: dimension lines sit to the left by default.
            (DimensionKind::VerticalDistance, Some(layout_linear(a, b, [0.0, 1.0], offset, base)))
        }
        SketchConstraint::DistancePointLine { point, line, .. } => {
            let p = resolve_point(sketch, point)?;
            let (s, e) = line_endpoints(sketch, *line)?;
            let foot = foot_on_line(s, e, p);
            let axis = toward(foot, p, line_normal(s, e));
            (DimensionKind::DistancePointLine, Some(layout_linear(foot, p, axis, offset, base)))
        }
        SketchConstraint::DistanceParallelLines { lines, .. } => {
            let (s1, e1) = line_endpoints(sketch, lines[0])?;
            let (s2, e2) = line_endpoints(sketch, lines[1])?;
            let a = midpoint(s1, e1);
            let b = foot_on_line(s2, e2, a);
            let axis = toward(a, b, line_normal(s1, e1));
            (DimensionKind::DistanceParallelLines, Some(layout_linear(a, b, axis, offset, base)))
        }
        SketchConstraint::Radius { .. } => (DimensionKind::Radius, None),
        SketchConstraint::Angle { .. } => (DimensionKind::Angle, None),
        _ => return None,
    };

    let hitbox = |center: [f64; 2], frame: DragFrame| DimensionHitbox {
        constraint_index: index,
        center,
        half_extent: config.hitbox_size,
        frame,
    };
    let text = format_value(kind, value, style.driven);

    if let Some(l) = linear {
        return Some(DimensionGeometry {
            constraint_index: index,
            kind,
            extension_lines: l.extension_lines,
            dimension_line: l.dimension_line,
            leader: None,
            text_position: l.text_position,
            text,
            value,
            driven: style.driven,
            hitbox: hitbox(l.text_position, l.frame),
        });
    }

    match constraint {
        SketchConstraint::Radius { entity, .. } => {
            let (center, radius) = circle_center_radius(sketch, *entity)?;
            let dir = direction_at(offset[0]);
            let tip = add(center, scale(dir, radius + offset[1].max(0.0)));
            Some(DimensionGeometry {
                constraint_index: index,
                kind,
                extension_lines: Vec::new(),
                dimension_line: Vec::new(),
                leader: Some((center, tip)),
                text_position: tip,
                text,
                value,
                driven: style.driven,
                hitbox: hitbox(tip, DragFrame::Radial { center, radius }),
            })
        }
        SketchConstraint::Angle { lines, .. } => {
            let l1 = line_endpoints(sketch, lines[0])?;
            let l2 = line_endpoints(sketch, lines[1])?;
            let center = match line_line_intersect_unbounded(l1.0, l1.1, l2.0, l2.1) {
                Some((p, _, _)) => p,
                None => midpoint(midpoint(l1.0, l1.1), midpoint(l2.0, l2.1)),
            };
            let a1 = angle_of(toward(center, far_end(center, l1), [1.0, 0.0]));
            let a2 = angle_of(toward(center, far_end(center, l2), [0.0, 1.0]));
            let sweep = ccw_sweep(a1, a2);
            let (start, sweep) = if sweep > PI { (a2, TAU - sweep) } else { (a1, sweep) };

            let radius = (base + offset[1]).max(MIN_ANGLE_RADIUS);
            let arc = discretize_arc(center, radius, start, start + sweep, ANGLE_ARC_SEGMENTS);
            let text_position = arc_point(center, radius, start + sweep / 2.0);
            Some(DimensionGeometry {
                constraint_index: index,
                kind,
                extension_lines: vec![
                    (center, arc_point(center, radius, start)),
                    (center, arc_point(center, radius, start + sweep)),
                ],
                dimension_line: arc,
                leader: None,
                text_position,
                text,
                value,
                driven: style.driven,
                hitbox: hitbox(text_position, DragFrame::Angular { center }),
            })
        }
        _ => None,
    }
}

/// Layouts for every visible dimension in constraint order.
pub fn layout_dimensions(sketch: &Sketch, config: &EngineConfig) -> Vec<DimensionGeometry> {
    (0..sketch.constraints.len())
        .filter_map(|i| layout_dimension(sketch, i, config))
        .collect()
}

pub fn hitboxes(sketch: &Sketch, config: &EngineConfig) -> Vec<DimensionHitbox> {
    layout_dimensions(sketch, config).into_iter().map(|d| d.hitbox).collect()
}

/// New style offset for a drag from `start_local` to `current`.
pub fn drag_offset(frame: &DragFrame, start_local: [f64; 2], start_offset: [f64; 2], current: [f64; 2]) -> [f64; 2] {
    match *frame {
        DragFrame::Linear { parallel, perpendicular } => {
            let delta = sub(current, start_local);
            [start_offset[0] + dot_2d(delta, parallel), start_offset[1] + dot_2d(delta, perpendicular)]
        }
        DragFrame::Radial { center, .. } => {
            let turn = angle_of(sub(current, center)) - angle_of(sub(start_local, center));
            let reach = distance(current, center) - distance(start_local, center);
            [start_offset[0] + turn.sin().atan2(turn.cos()), start_offset[1] + reach]
        }
        DragFrame::Angular { center } => {
            let reach = distance(current, center) - distance(start_local, center);
            [start_offset[0], start_offset[1] + reach]
        }
    }
}

/// Orbit/pan control the drag must suspend.
pub trait CameraControls {
    fn set_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionDrag {
    pub constraint_index: usize,
    pub start_local: [f64; 2],
    pub start_offset: [f64; 2],
    pub frame: DragFrame,
}

#[derive(Debug, Default)]
pub struct DimensionDragController {
    active: Option<DimensionDrag>,
}

impl DimensionDragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&DimensionDrag> {
        self.active.as_ref()
    }

    /// Start dragging the dimension under `hitbox`. Returns false if the
    /// constraint has no editable style.
    pub fn begin(
        &mut self,
        hitbox: &DimensionHitbox,
        local: [f64; 2],
        sketch: &Sketch,
        camera: &mut dyn CameraControls,
    ) -> bool {
        let Some(style) = sketch
            .constraints
            .get(hitbox.constraint_index)
            .and_then(|entry| entry.constraint.dimension_style())
        else {
            return false;
        };
        camera.set_enabled(false);
        debug!(index = hitbox.constraint_index, "dimension drag start");
        self.active = Some(DimensionDrag {
            constraint_index: hitbox.constraint_index,
            start_local: local,
            start_offset: style.offset,
            frame: hitbox.frame,
        });
        true
    }

    /// Write the offset for the current pointer position into the sketch.
    /// Only `style.offset` changes; the constraint value never does.
    pub fn update(&mut self, local: [f64; 2], sketch: &mut Sketch) -> bool {
        let Some(drag) = &self.active else { return false };
        let offset = drag_offset(&drag.frame, drag.start_local, drag.start_offset, local);
        match sketch.dimension_style_mut(drag.constraint_index) {
            Some(style) => {
                style.offset = offset;
                true
            }
            None => false,
        }
    }

    /// Finish the drag. The camera is re-enabled whether or not a drag was
    /// in progress.
    pub fn end(&mut self, camera: &mut dyn CameraControls) -> Option<usize> {
        camera.set_enabled(true);
        let finished = self.active.take().map(|d| d.constraint_index);
        if let Some(index) = finished {
            debug!(index, "dimension drag end");
        }
        finished
    }
}
