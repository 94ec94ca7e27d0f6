use super::{log_commit, single_entity_delta, snap_point, PointerEvent, Previews, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::sketch::inference::{apply_alignment, detect_alignment, Alignment, SnapInfo};
use crate::sketch::types::{ConstraintPoint, SketchEntity, SketchGeometry};
use crate::geometry::utils_2d::{distance, DEGENERATE_LENGTH};
use tracing::debug;

/// Two clicks: start, end. The end point snaps to existing points first,
/// then to horizontal/vertical/parallel/perpendicular directions.
#[derive(Debug, Default)]
pub struct LineTool {
    start: Option<[f64; 2]>,
    snap: SnapInfo,
    previews: Previews,
}

impl LineTool {
    /// End position for the cursor plus the snap facts behind it.
    fn resolve_end(
        &self,
        start: [f64; 2],
        u: f64,
        v: f64,
        event: &PointerEvent,
        ctx: &ToolContext,
    ) -> ([f64; 2], Option<ConstraintPoint>, Option<Alignment>) {
        let (pos, target) = snap_point(u, v, event, ctx);
        if target.is_some() || !event.snapping_enabled() {
            return (pos, target, None);
        }
        match detect_alignment(start, pos, ctx.sketch, ctx.config.angle_snap_tolerance_deg) {
            Some(alignment) => (apply_alignment(start, pos, alignment, ctx.sketch), None, Some(alignment)),
            None => (pos, None, None),
        }
    }

    fn reset(&mut self, ctx: &mut ToolContext) {
        self.start = None;
        self.snap.clear();
        self.previews.clear(ctx.sketch);
    }
}

impl SketchTool for LineTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Line
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let Some(start) = self.start else {
            let (pos, target) = snap_point(u, v, event, ctx);
            self.start = Some(pos);
            self.snap.record(0, target);
            return ToolOutcome::None;
        };

        let (end, target, alignment) = self.resolve_end(start, u, v, event, ctx);
        if distance(start, end) < DEGENERATE_LENGTH {
            debug!("line: zero length, waiting for another end point");
            return ToolOutcome::None;
        }

        let mut snap = self.snap.clone();
        snap.record(1, target);
        snap.alignment = alignment;
        let delta = single_entity_delta(SketchEntity::new(SketchGeometry::Line { start, end }), &snap);
        log_commit("line", &delta);
        self.reset(ctx);
        ToolOutcome::Commit(delta)
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        if let Some(start) = self.start {
            let (end, _, _) = self.resolve_end(start, u, v, event, ctx);
            self.previews.show_one(ctx.sketch, SketchGeometry::Line { start, end });
        }
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.reset(ctx);
    }
}
