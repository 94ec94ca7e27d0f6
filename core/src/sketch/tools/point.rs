use super::{log_commit, single_entity_delta, snap_point, PointerEvent, Previews, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::sketch::inference::SnapInfo;
use crate::sketch::types::{SketchEntity, SketchGeometry};

/// One click, one point.
#[derive(Debug, Default)]
pub struct PointTool {
    previews: Previews,
}

impl SketchTool for PointTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Point
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, target) = snap_point(u, v, event, ctx);
        self.previews.clear(ctx.sketch);

        let mut snap = SnapInfo::default();
        snap.record(0, target);
        let delta = single_entity_delta(SketchEntity::new(SketchGeometry::Point { pos }), &snap);
        log_commit("point", &delta);
        ToolOutcome::Commit(delta)
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, _) = snap_point(u, v, event, ctx);
        self.previews.show_one(ctx.sketch, SketchGeometry::Point { pos });
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.previews.clear(ctx.sketch);
    }
}
