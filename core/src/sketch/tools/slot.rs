use super::{log_commit, snap_point, PointerEvent, Previews, SketchDelta, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::{add, angle_of, distance, perpendicular_ccw, scale, sub, try_normalize_2d, DEGENERATE_LENGTH};
use crate::sketch::query::point_position;
use crate::sketch::types::{ConstraintPoint, SketchConstraint, SketchEntity, SketchGeometry};
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::debug;

/// Obround from two arc centers.
///
/// A construction axis joins the centers; each end is a half-circle arc
/// facing away from the other center, and two side lines run tangent to
/// both arcs. Moving either center keeps the slot closed.
#[derive(Debug, Default)]
pub struct SlotTool {
    first: Option<([f64; 2], Option<ConstraintPoint>)>,
    previews: Previews,
}

struct SlotShape {
    axis: SketchGeometry,
    arc1: SketchGeometry,
    arc2: SketchGeometry,
    top: SketchGeometry,
    bottom: SketchGeometry,
}

fn slot_shape(c1: [f64; 2], c2: [f64; 2], width_ratio: f64) -> Option<SlotShape> {
    let dir = try_normalize_2d(sub(c2, c1))?;
    let radius = distance(c1, c2) * width_ratio / 2.0;
    if radius < DEGENERATE_LENGTH {
        return None;
    }
    let n = scale(perpendicular_ccw(dir), radius);
    let theta = angle_of(dir);
    Some(SlotShape {
        axis: SketchGeometry::Line { start: c1, end: c2 },
        arc1: SketchGeometry::Arc { center: c1, radius, start_angle: theta + FRAC_PI_2, end_angle: theta + PI + FRAC_PI_2 },
        arc2: SketchGeometry::Arc { center: c2, radius, start_angle: theta - FRAC_PI_2, end_angle: theta + FRAC_PI_2 },
        top: SketchGeometry::Line { start: add(c2, n), end: add(c1, n) },
        bottom: SketchGeometry::Line { start: sub(c1, n), end: sub(c2, n) },
    })
}

/// Boundary index (1 or 2) of `arc` whose position is nearest `target`.
fn arc_end_at(arc: &SketchEntity, target: [f64; 2]) -> u8 {
    let d = |i: u8| point_position(arc, i).map(|p| distance(p, target)).unwrap_or(f64::INFINITY);
    if d(1) <= d(2) {
        1
    } else {
        2
    }
}

pub(crate) fn slot_delta(
    c1: [f64; 2],
    c2: [f64; 2],
    width_ratio: f64,
    targets: [Option<ConstraintPoint>; 2],
) -> Option<SketchDelta> {
    let shape = slot_shape(c1, c2, width_ratio)?;
    let axis = SketchEntity::construction(shape.axis);
    // Arcs and sides form the closed profile, so only the axis is construction.
    let arc1 = SketchEntity::new(shape.arc1);
    let arc2 = SketchEntity::new(shape.arc2);
    let top = SketchEntity::new(shape.top);
    let bottom = SketchEntity::new(shape.bottom);

    let cp = ConstraintPoint::new;
    let joint = |line: &SketchEntity, line_index: u8, arc: &SketchEntity| -> Option<SketchConstraint> {
        let at = point_position(line, line_index)?;
        Some(SketchConstraint::Coincident { points: [cp(line.id, line_index), cp(arc.id, arc_end_at(arc, at))] })
    };

    let mut constraints = vec![
        SketchConstraint::Coincident { points: [cp(axis.id, 0), cp(arc1.id, 0)] },
        SketchConstraint::Coincident { points: [cp(axis.id, 1), cp(arc2.id, 0)] },
        joint(&top, 0, &arc2)?,
        joint(&top, 1, &arc1)?,
        joint(&bottom, 0, &arc1)?,
        joint(&bottom, 1, &arc2)?,
        SketchConstraint::Tangent { entities: [top.id, arc1.id] },
        SketchConstraint::Tangent { entities: [top.id, arc2.id] },
        SketchConstraint::Tangent { entities: [bottom.id, arc1.id] },
        SketchConstraint::Tangent { entities: [bottom.id, arc2.id] },
        SketchConstraint::Parallel { lines: [top.id, bottom.id] },
        SketchConstraint::Equal { entities: [arc1.id, arc2.id] },
    ];
    for (index, target) in targets.iter().enumerate() {
        if let Some(target) = target {
            constraints.push(SketchConstraint::Coincident { points: [cp(axis.id, index as u8), *target] });
        }
    }

    Some(SketchDelta { entities: vec![axis, arc1, arc2, top, bottom], constraints, external_references: Vec::new() })
}

impl SketchTool for SlotTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Slot
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, target) = snap_point(u, v, event, ctx);
        let Some((first, first_target)) = self.first else {
            self.first = Some((pos, target));
            return ToolOutcome::None;
        };
        match slot_delta(first, pos, ctx.config.slot_width_ratio, [first_target, target]) {
            Some(delta) => {
                log_commit("slot", &delta);
                self.cancel(ctx);
                ToolOutcome::Commit(delta)
            }
            None => {
                debug!("slot: coincident centers declined");
                ToolOutcome::None
            }
        }
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        if let Some((first, _)) = self.first {
            let (pos, _) = snap_point(u, v, event, ctx);
            if let Some(shape) = slot_shape(first, pos, ctx.config.slot_width_ratio) {
                let shapes = vec![
                    (shape.axis, true),
                    (shape.arc1, false),
                    (shape.arc2, false),
                    (shape.top, false),
                    (shape.bottom, false),
                ];
                self.previews.show(ctx.sketch, shapes);
            }
        }
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.first = None;
        self.previews.clear(ctx.sketch);
    }
}
