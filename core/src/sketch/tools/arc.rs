use super::{log_commit, single_entity_delta, snap_point, PointerEvent, Previews, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::{angle_of, ccw_sweep, distance, sub, DEGENERATE_LENGTH, EPSILON};
use crate::sketch::inference::SnapInfo;
use crate::sketch::types::{SketchEntity, SketchGeometry};
use tracing::debug;

/// Three clicks: center, start, end. The arc runs counter-clockwise from
/// start to end; the end click only fixes the end angle.
#[derive(Debug, Default)]
pub struct ArcTool {
    center: Option<[f64; 2]>,
    start: Option<[f64; 2]>,
    snap: SnapInfo,
    previews: Previews,
}

impl ArcTool {
    fn reset(&mut self, ctx: &mut ToolContext) {
        self.center = None;
        self.start = None;
        self.snap.clear();
        self.previews.clear(ctx.sketch);
    }

    fn arc_through(center: [f64; 2], start: [f64; 2], end: [f64; 2]) -> SketchGeometry {
        SketchGeometry::Arc {
            center,
            radius: distance(center, start),
            start_angle: angle_of(sub(start, center)),
            end_angle: angle_of(sub(end, center)),
        }
    }
}

impl SketchTool for ArcTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Arc
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, target) = snap_point(u, v, event, ctx);
        let Some(center) = self.center else {
            self.center = Some(pos);
            self.snap.record(0, target);
            return ToolOutcome::None;
        };

        let Some(start) = self.start else {
            if distance(center, pos) < DEGENERATE_LENGTH {
                debug!("arc: start on center declined");
                return ToolOutcome::None;
            }
            self.start = Some(pos);
            self.snap.record(1, target);
            return ToolOutcome::None;
        };

        if distance(center, pos) < DEGENERATE_LENGTH {
            debug!("arc: end on center declined");
            return ToolOutcome::None;
        }
        let geometry = Self::arc_through(center, start, pos);
        let SketchGeometry::Arc { radius, start_angle, end_angle, .. } = geometry else {
            return ToolOutcome::None;
        };
        if ccw_sweep(start_angle, end_angle) < EPSILON {
            debug!("arc: empty sweep declined");
            return ToolOutcome::None;
        }

        let mut snap = self.snap.clone();
        // The end point only coincides with the snap target if it lies on the arc.
        if (distance(center, pos) - radius).abs() < EPSILON {
            snap.record(2, target);
        }
        let delta = single_entity_delta(SketchEntity::new(geometry), &snap);
        log_commit("arc", &delta);
        self.reset(ctx);
        ToolOutcome::Commit(delta)
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, _) = snap_point(u, v, event, ctx);
        match (self.center, self.start) {
            (Some(center), None) => {
                let line = SketchGeometry::Line { start: center, end: pos };
                self.previews.show(ctx.sketch, vec![(line, true)]);
            }
            (Some(center), Some(start)) if distance(center, pos) > DEGENERATE_LENGTH => {
                self.previews.show_one(ctx.sketch, Self::arc_through(center, start, pos));
            }
            _ => {}
        }
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.reset(ctx);
    }
}
