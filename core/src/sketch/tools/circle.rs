use super::{log_commit, single_entity_delta, snap_point, PointerEvent, Previews, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::{distance, DEGENERATE_LENGTH};
use crate::sketch::inference::SnapInfo;
use crate::sketch::types::{SketchEntity, SketchGeometry};
use tracing::debug;

/// Two clicks: center, then any point on the circumference.
#[derive(Debug, Default)]
pub struct CircleTool {
    center: Option<[f64; 2]>,
    snap: SnapInfo,
    previews: Previews,
}

impl CircleTool {
    fn reset(&mut self, ctx: &mut ToolContext) {
        self.center = None;
        self.snap.clear();
        self.previews.clear(ctx.sketch);
    }
}

impl SketchTool for CircleTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Circle
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, target) = snap_point(u, v, event, ctx);
        let Some(center) = self.center else {
            self.center = Some(pos);
            self.snap.record(0, target);
            return ToolOutcome::None;
        };

        let radius = distance(center, pos);
        if radius < DEGENERATE_LENGTH {
            debug!("circle: zero radius declined");
            return ToolOutcome::None;
        }
        let delta = single_entity_delta(SketchEntity::new(SketchGeometry::Circle { center, radius }), &self.snap);
        log_commit("circle", &delta);
        self.reset(ctx);
        ToolOutcome::Commit(delta)
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        if let Some(center) = self.center {
            let (pos, _) = snap_point(u, v, event, ctx);
            self.previews.show_one(ctx.sketch, SketchGeometry::Circle { center, radius: distance(center, pos) });
        }
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.reset(ctx);
    }
}
