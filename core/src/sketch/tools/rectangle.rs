use super::{log_commit, snap_point, PointerEvent, Previews, SketchDelta, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::DEGENERATE_LENGTH;
use crate::sketch::types::{ConstraintPoint, SketchConstraint, SketchEntity, SketchGeometry};
use tracing::debug;

/// Two opposite corners. Emits four lines in loop order (bottom, right,
/// top, left) closed by Coincident corners and held square by
/// Horizontal/Vertical.
#[derive(Debug, Default)]
pub struct RectangleTool {
    first: Option<[f64; 2]>,
    previews: Previews,
}

/// Edges of the axis-aligned box spanned by `a` and `b`, in loop order.
fn edges(a: [f64; 2], b: [f64; 2]) -> [SketchGeometry; 4] {
    let corners = [[a[0], a[1]], [b[0], a[1]], [b[0], b[1]], [a[0], b[1]]];
    std::array::from_fn(|i| SketchGeometry::Line { start: corners[i], end: corners[(i + 1) % 4] })
}

pub(crate) fn rectangle_delta(a: [f64; 2], b: [f64; 2]) -> Option<SketchDelta> {
    if (b[0] - a[0]).abs() < DEGENERATE_LENGTH || (b[1] - a[1]).abs() < DEGENERATE_LENGTH {
        return None;
    }
    let entities: Vec<SketchEntity> = edges(a, b).into_iter().map(SketchEntity::new).collect();
    let ids: Vec<_> = entities.iter().map(|e| e.id).collect();

    let mut constraints = vec![
        SketchConstraint::Horizontal { entity: ids[0] },
        SketchConstraint::Vertical { entity: ids[1] },
        SketchConstraint::Horizontal { entity: ids[2] },
        SketchConstraint::Vertical { entity: ids[3] },
    ];
    for i in 0..4 {
        constraints.push(SketchConstraint::Coincident {
            points: [ConstraintPoint::new(ids[i], 1), ConstraintPoint::new(ids[(i + 1) % 4], 0)],
        });
    }
    Some(SketchDelta { entities, constraints, external_references: Vec::new() })
}

impl SketchTool for RectangleTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Rectangle
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, _) = snap_point(u, v, event, ctx);
        let Some(first) = self.first else {
            self.first = Some(pos);
            return ToolOutcome::None;
        };
        match rectangle_delta(first, pos) {
            Some(delta) => {
                log_commit("rectangle", &delta);
                self.cancel(ctx);
                ToolOutcome::Commit(delta)
            }
            None => {
                debug!("rectangle: zero width or height declined");
                ToolOutcome::None
            }
        }
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        if let Some(first) = self.first {
            let (pos, _) = snap_point(u, v, event, ctx);
            let shapes = edges(first, pos).into_iter().map(|g| (g, false)).collect();
            self.previews.show(ctx.sketch, shapes);
        }
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.first = None;
        self.previews.clear(ctx.sketch);
    }
}
