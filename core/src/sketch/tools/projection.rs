use super::{log_commit, PointerEvent, SketchDelta, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::{distance, DEGENERATE_LENGTH};
use crate::geometry::Tessellation;
use crate::picking::PickTarget;
use crate::sketch::types::{ConstraintPoint, Sketch, SketchConstraint, SketchEntity, SketchGeometry};
use crate::topo::naming::{TopoId, TopoRank};
use tracing::debug;

/// Copies a picked solid edge or vertex onto the sketch plane as fixed
/// reference geometry and records which topology it came from.
///
/// Only the pick matters; the (u, v) of the click is ignored.
#[derive(Debug, Default)]
pub struct ProjectionTool;

fn already_projected(sketch: &Sketch, topo: &TopoId) -> bool {
    sketch.external_references.values().any(|t| t == topo)
}

fn fixed(entity: &SketchEntity, index: u8, position: [f64; 2]) -> SketchConstraint {
    SketchConstraint::Fix { point: ConstraintPoint::new(entity.id, index), position }
}

pub(crate) fn projection_delta(sketch: &Sketch, solid: &Tessellation, topo: TopoId) -> Option<SketchDelta> {
    if already_projected(sketch, &topo) {
        return None;
    }
    let plane = &sketch.plane;
    let mut delta = SketchDelta::default();

    match topo.rank {
        TopoRank::Edge => {
            for (a, b) in solid.edge_segments(&topo) {
                let (start, end) = (plane.to_local(&a), plane.to_local(&b));
                // Edges seen end-on collapse to a point.
                if distance(start, end) < DEGENERATE_LENGTH {
                    continue;
                }
                let line = SketchEntity::construction(SketchGeometry::Line { start, end });
                delta.constraints.push(fixed(&line, 0, start));
                delta.constraints.push(fixed(&line, 1, end));
                delta.external_references.push((line.id, topo));
                delta.entities.push(line);
            }
        }
        TopoRank::Vertex => {
            let pos = plane.to_local(&solid.vertex_position(&topo)?);
            let point = SketchEntity::construction(SketchGeometry::Point { pos });
            delta.constraints.push(fixed(&point, 0, pos));
            delta.external_references.push((point.id, topo));
            delta.entities.push(point);
        }
        _ => return None,
    }

    (!delta.is_empty()).then_some(delta)
}

impl SketchTool for ProjectionTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Projection
    }

    fn pointer_down(&mut self, _u: f64, _v: f64, _event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (Some(hit), Some(solid)) = (ctx.pick, ctx.solid) else {
            return ToolOutcome::None;
        };
        let PickTarget::Solid(topo) = hit.target else {
            return ToolOutcome::None;
        };
        match projection_delta(ctx.sketch, solid, topo) {
            Some(delta) => {
                log_commit("projection", &delta);
                ToolOutcome::Commit(delta)
            }
            None => {
                debug!(?topo, "projection: nothing to project");
                ToolOutcome::None
            }
        }
    }

    fn cancel(&mut self, _ctx: &mut ToolContext) {}
}
