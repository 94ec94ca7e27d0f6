use super::{log_commit, snap_point, PointerEvent, Previews, SketchDelta, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::{angle_of, arc_point, distance, sub, DEGENERATE_LENGTH};
use crate::sketch::types::{ConstraintPoint, SketchConstraint, SketchEntity, SketchGeometry};
use std::f64::consts::TAU;
use tracing::debug;

/// Regular N-gon from a center and one vertex.
///
/// Geometry: N construction spokes from the center to each vertex and N
/// perimeter edges. Constraints: spokes share the center, each spoke ends
/// on its edge's start, edges chain end-to-start, and all spokes and all
/// edges are Equal.
#[derive(Debug)]
pub struct PolygonTool {
    sides: usize,
    center: Option<([f64; 2], Option<ConstraintPoint>)>,
    previews: Previews,
}

impl PolygonTool {
    pub fn new(sides: usize) -> Self {
        Self { sides: sides.max(3), center: None, previews: Previews::default() }
    }
}

fn vertices(center: [f64; 2], vertex: [f64; 2], sides: usize) -> Vec<[f64; 2]> {
    let radius = distance(center, vertex);
    let phase = angle_of(sub(vertex, center));
    (0..sides)
        .map(|i| arc_point(center, radius, phase + TAU * i as f64 / sides as f64))
        .collect()
}

fn shapes(center: [f64; 2], vertex: [f64; 2], sides: usize) -> Vec<(SketchGeometry, bool)> {
    let vs = vertices(center, vertex, sides);
    let spokes = vs.iter().map(|v| (SketchGeometry::Line { start: center, end: *v }, true));
    let edges = (0..sides).map(|i| (SketchGeometry::Line { start: vs[i], end: vs[(i + 1) % sides] }, false));
    spokes.chain(edges).collect()
}

pub(crate) fn polygon_delta(
    center: [f64; 2],
    vertex: [f64; 2],
    sides: usize,
    center_target: Option<ConstraintPoint>,
) -> Option<SketchDelta> {
    if sides < 3 || distance(center, vertex) < DEGENERATE_LENGTH {
        return None;
    }
    let entities: Vec<SketchEntity> = shapes(center, vertex, sides)
        .into_iter()
        .map(|(geometry, construction)| {
            if construction {
                SketchEntity::construction(geometry)
            } else {
                SketchEntity::new(geometry)
            }
        })
        .collect();
    let ids: Vec<_> = entities.iter().map(|e| e.id).collect();
    let (spokes, edges) = ids.split_at(sides);

    let mut constraints = Vec::new();
    for i in 0..sides {
        constraints.push(SketchConstraint::Coincident {
            points: [ConstraintPoint::new(edges[i], 1), ConstraintPoint::new(edges[(i + 1) % sides], 0)],
        });
        constraints.push(SketchConstraint::Coincident {
            points: [ConstraintPoint::new(spokes[i], 1), ConstraintPoint::new(edges[i], 0)],
        });
    }
    for i in 1..sides {
        constraints.push(SketchConstraint::Coincident {
            points: [ConstraintPoint::new(spokes[i], 0), ConstraintPoint::new(spokes[0], 0)],
        });
        constraints.push(SketchConstraint::Equal { entities: [edges[0], edges[i]] });
        constraints.push(SketchConstraint::Equal { entities: [spokes[0], spokes[i]] });
    }
    if let Some(target) = center_target {
        constraints.push(SketchConstraint::Coincident { points: [ConstraintPoint::new(spokes[0], 0), target] });
    }

    Some(SketchDelta { entities, constraints, external_references: Vec::new() })
}

impl SketchTool for PolygonTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Polygon
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, target) = snap_point(u, v, event, ctx);
        let Some((center, center_target)) = self.center else {
            self.center = Some((pos, target));
            return ToolOutcome::None;
        };
        match polygon_delta(center, pos, self.sides, center_target) {
            Some(delta) => {
                log_commit("polygon", &delta);
                self.cancel(ctx);
                ToolOutcome::Commit(delta)
            }
            None => {
                debug!("polygon: vertex on center declined");
                ToolOutcome::None
            }
        }
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        if let Some((center, _)) = self.center {
            let (pos, _) = snap_point(u, v, event, ctx);
            if distance(center, pos) > DEGENERATE_LENGTH {
                self.previews.show(ctx.sketch, shapes(center, pos, self.sides));
            }
        }
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.center = None;
        self.previews.clear(ctx.sketch);
    }
}
