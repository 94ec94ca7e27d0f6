use super::{log_commit, PointerEvent, SketchDelta, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::DEGENERATE_LENGTH;
use crate::sketch::query::{line_length, nearest_entity, nearest_line, nearest_point};
use crate::sketch::types::{ConstraintPoint, Sketch, SketchConstraint};
use crate::topo::EntityId;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Horizontal,
    Vertical,
    Coincident,
    Parallel,
    Perpendicular,
    Equal,
    Fix,
}

impl ConstraintKind {
    fn is_binary(&self) -> bool {
        matches!(
            self,
            ConstraintKind::Coincident | ConstraintKind::Parallel | ConstraintKind::Perpendicular | ConstraintKind::Equal
        )
    }

    fn targets_points(&self) -> bool {
        matches!(self, ConstraintKind::Coincident | ConstraintKind::Fix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Point(ConstraintPoint, [f64; 2]),
    Entity(EntityId),
}

/// Applies one geometric relation. Single-argument kinds commit on the
/// first valid pick; binary kinds hold the first pick until a second,
/// distinct one arrives.
#[derive(Debug)]
pub struct ConstraintTool {
    kind: ConstraintKind,
    first: Option<Target>,
}

impl ConstraintTool {
    pub fn new(kind: ConstraintKind) -> Self {
        Self { kind, first: None }
    }

    pub fn has_pending_selection(&self) -> bool {
        self.first.is_some()
    }

    fn pick(&self, p: [f64; 2], ctx: &ToolContext) -> Option<Target> {
        let (sketch, config) = (&*ctx.sketch, ctx.config);
        match self.kind {
            k if k.targets_points() => {
                nearest_point(sketch, p, config.point_pick_threshold).map(|(cp, pos)| Target::Point(cp, pos))
            }
            ConstraintKind::Equal => nearest_entity(sketch, p, config.line_pick_threshold).map(Target::Entity),
            _ => nearest_line(sketch, p, config.line_pick_threshold).map(Target::Entity),
        }
    }
}

fn usable_line(sketch: &Sketch, id: EntityId) -> bool {
    line_length(sketch, id).is_some_and(|l| l >= DEGENERATE_LENGTH)
}

fn unary(kind: ConstraintKind, sketch: &Sketch, target: Target) -> Option<SketchConstraint> {
    match (kind, target) {
        (ConstraintKind::Horizontal, Target::Entity(entity)) if usable_line(sketch, entity) => {
            Some(SketchConstraint::Horizontal { entity })
        }
        (ConstraintKind::Vertical, Target::Entity(entity)) if usable_line(sketch, entity) => {
            Some(SketchConstraint::Vertical { entity })
        }
        // The origin is fixed already.
        (ConstraintKind::Fix, Target::Point(point, position)) if !point.is_origin() => {
            Some(SketchConstraint::Fix { point, position })
        }
        _ => None,
    }
}

fn binary(kind: ConstraintKind, sketch: &Sketch, a: Target, b: Target) -> Option<SketchConstraint> {
    match (kind, a, b) {
        (ConstraintKind::Coincident, Target::Point(p1, _), Target::Point(p2, _)) if p1 != p2 => {
            Some(SketchConstraint::Coincident { points: [p1, p2] })
        }
        (_, Target::Entity(e1), Target::Entity(e2)) if e1 != e2 => match kind {
            ConstraintKind::Parallel if usable_line(sketch, e1) && usable_line(sketch, e2) => {
                Some(SketchConstraint::Parallel { lines: [e1, e2] })
            }
            ConstraintKind::Perpendicular if usable_line(sketch, e1) && usable_line(sketch, e2) => {
                Some(SketchConstraint::Perpendicular { lines: [e1, e2] })
            }
            ConstraintKind::Equal => {
                let (g1, g2) = (&sketch.entity(e1)?.geometry, &sketch.entity(e2)?.geometry);
                g1.equal_compatible(g2).then_some(SketchConstraint::Equal { entities: [e1, e2] })
            }
            _ => None,
        },
        _ => None,
    }
}

impl SketchTool for ConstraintTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Constraint(self.kind)
    }

    fn pointer_down(&mut self, u: f64, v: f64, _event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let Some(target) = self.pick([u, v], ctx) else {
            return ToolOutcome::None;
        };

        let constraint = if self.kind.is_binary() {
            let Some(first) = self.first else {
                self.first = Some(target);
                return ToolOutcome::None;
            };
            binary(self.kind, ctx.sketch, first, target)
        } else {
            unary(self.kind, ctx.sketch, target)
        };

        match constraint {
            Some(constraint) => {
                let delta = SketchDelta::constraint(constraint);
                log_commit("constraint", &delta);
                self.first = None;
                ToolOutcome::Commit(delta)
            }
            None => {
                debug!(kind = ?self.kind, "constraint: selection declined");
                ToolOutcome::None
            }
        }
    }

    fn cancel(&mut self, _ctx: &mut ToolContext) {
        self.first = None;
    }
}
