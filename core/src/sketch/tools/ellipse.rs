use super::{log_commit, single_entity_delta, snap_point, PointerEvent, Previews, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::{angle_of, distance, distance_point_to_line, sub, DEGENERATE_LENGTH};
use crate::sketch::inference::SnapInfo;
use crate::sketch::types::{SketchEntity, SketchGeometry};
use tracing::debug;

/// Three clicks: center, end of the major axis, then a point whose distance
/// from the major axis sets the minor radius.
#[derive(Debug, Default)]
pub struct EllipseTool {
    center: Option<[f64; 2]>,
    major: Option<[f64; 2]>,
    snap: SnapInfo,
    previews: Previews,
}

impl EllipseTool {
    fn reset(&mut self, ctx: &mut ToolContext) {
        self.center = None;
        self.major = None;
        self.snap.clear();
        self.previews.clear(ctx.sketch);
    }

    fn ellipse(center: [f64; 2], major: [f64; 2], minor_point: [f64; 2]) -> SketchGeometry {
        SketchGeometry::Ellipse {
            center,
            semi_major: distance(center, major),
            semi_minor: distance_point_to_line(center, major, minor_point),
            rotation: angle_of(sub(major, center)),
        }
    }
}

impl SketchTool for EllipseTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Ellipse
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, target) = snap_point(u, v, event, ctx);
        let Some(center) = self.center else {
            self.center = Some(pos);
            self.snap.record(0, target);
            return ToolOutcome::None;
        };
        let Some(major) = self.major else {
            if distance(center, pos) < DEGENERATE_LENGTH {
                debug!("ellipse: zero major axis declined");
                return ToolOutcome::None;
            }
            self.major = Some(pos);
            return ToolOutcome::None;
        };

        let geometry = Self::ellipse(center, major, pos);
        if let SketchGeometry::Ellipse { semi_minor, .. } = geometry {
            if semi_minor < DEGENERATE_LENGTH {
                debug!("ellipse: zero minor axis declined");
                return ToolOutcome::None;
            }
        }
        let delta = single_entity_delta(SketchEntity::new(geometry), &self.snap);
        log_commit("ellipse", &delta);
        self.reset(ctx);
        ToolOutcome::Commit(delta)
    }

    fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let (pos, _) = snap_point(u, v, event, ctx);
        match (self.center, self.major) {
            (Some(center), None) => {
                let axis = SketchGeometry::Line { start: center, end: pos };
                self.previews.show(ctx.sketch, vec![(axis, true)]);
            }
            (Some(center), Some(major)) => {
                let axis = SketchGeometry::Line { start: center, end: major };
                self.previews.show(ctx.sketch, vec![(axis, true), (Self::ellipse(center, major, pos), false)]);
            }
            _ => {}
        }
        ToolOutcome::None
    }

    fn cancel(&mut self, ctx: &mut ToolContext) {
        self.reset(ctx);
    }
}
