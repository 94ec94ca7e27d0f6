use super::selection::{candidate_at, Candidate, CandidateSet};
use super::{log_commit, PointerEvent, SketchDelta, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::geometry::utils_2d::{distance, distance_point_to_line, midpoint, DEGENERATE_LENGTH};
use crate::sketch::measurement::measure_line_line_angle;
use crate::sketch::query::{circle_center_radius, line_endpoints, line_length, resolve_point};
use crate::sketch::types::{ConstraintPoint, DimensionStyle, Sketch, SketchConstraint};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DimensionMode {
    /// Two points, or one line for its length.
    #[default]
    Distance,
    Horizontal,
    Vertical,
    Radius,
    Angle,
    PointLine,
    ParallelLines,
}

impl DimensionMode {
    fn capacity(&self) -> usize {
        match self {
            DimensionMode::Radius => 1,
            _ => 2,
        }
    }
}

/// Accumulates candidates until the active mode has what it needs, then
/// commits a driving dimension measuring the current geometry.
#[derive(Debug, Default)]
pub struct DimensionTool {
    mode: DimensionMode,
    candidates: CandidateSet,
}

impl DimensionTool {
    pub fn new(mode: DimensionMode) -> Self {
        Self { mode, candidates: CandidateSet::default() }
    }

    pub fn mode(&self) -> DimensionMode {
        self.mode
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.candidates.items()
    }
}

/// Two points of a distance-style dimension: two point candidates, or the
/// ends of a single line candidate.
fn point_pair(sketch: &Sketch, candidates: &[Candidate]) -> Option<[ConstraintPoint; 2]> {
    match candidates {
        [a, b] => Some([a.as_point()?, b.as_point()?]),
        [line] => {
            let id = line.line(sketch)?;
            Some([ConstraintPoint::new(id, 0), ConstraintPoint::new(id, 1)])
        }
        _ => None,
    }
}

fn distinct_lines(sketch: &Sketch, candidates: &[Candidate]) -> Option<[crate::topo::EntityId; 2]> {
    match candidates {
        [a, b] => {
            let (l1, l2) = (a.line(sketch)?, b.line(sketch)?);
            if l1 == l2 || line_length(sketch, l1)? < DEGENERATE_LENGTH || line_length(sketch, l2)? < DEGENERATE_LENGTH {
                return None;
            }
            Some([l1, l2])
        }
        _ => None,
    }
}

/// The constraint `mode` builds from `candidates`, if they satisfy it.
pub fn build_dimension(mode: DimensionMode, sketch: &Sketch, candidates: &[Candidate]) -> Option<SketchConstraint> {
    let style = Some(DimensionStyle::default());
    match mode {
        DimensionMode::Distance | DimensionMode::Horizontal | DimensionMode::Vertical => {
            let points = point_pair(sketch, candidates)?;
            let a = resolve_point(sketch, &points[0])?;
            let b = resolve_point(sketch, &points[1])?;
            if points[0] == points[1] {
                return None;
            }
            Some(match mode {
                DimensionMode::Horizontal => {
                    SketchConstraint::HorizontalDistance { points, value: (b[0] - a[0]).abs(), style }
                }
                DimensionMode::Vertical => SketchConstraint::VerticalDistance { points, value: (b[1] - a[1]).abs(), style },
                _ => {
                    let value = distance(a, b);
                    if value < DEGENERATE_LENGTH {
                        return None;
                    }
                    SketchConstraint::Distance { points, value, style }
                }
            })
        }
        DimensionMode::Radius => {
            let [c] = candidates else { return None };
            let entity = c.as_entity()?;
            let (_, radius) = circle_center_radius(sketch, entity)?;
            Some(SketchConstraint::Radius { entity, value: radius, style })
        }
        DimensionMode::Angle => {
            let lines = distinct_lines(sketch, candidates)?;
            let (s1, e1) = line_endpoints(sketch, lines[0])?;
            let (s2, e2) = line_endpoints(sketch, lines[1])?;
            Some(SketchConstraint::Angle { lines, value: measure_line_line_angle(s1, e1, s2, e2), style })
        }
        DimensionMode::PointLine => {
            let [a, b] = candidates else { return None };
            let (point, line) = match (a.as_point(), b.line(sketch)) {
                (Some(p), Some(l)) => (p, l),
                _ => (b.as_point()?, a.line(sketch)?),
            };
            if point.id == line {
                return None;
            }
            let (s, e) = line_endpoints(sketch, line)?;
            if distance(s, e) < DEGENERATE_LENGTH {
                return None;
            }
            let p = resolve_point(sketch, &point)?;
            Some(SketchConstraint::DistancePointLine { point, line, value: distance_point_to_line(s, e, p), style })
        }
        DimensionMode::ParallelLines => {
            let lines = distinct_lines(sketch, candidates)?;
            let (s1, e1) = line_endpoints(sketch, lines[0])?;
            let (s2, e2) = line_endpoints(sketch, lines[1])?;
            let value = distance_point_to_line(s2, e2, midpoint(s1, e1));
            Some(SketchConstraint::DistanceParallelLines { lines, value, style })
        }
    }
}

impl SketchTool for DimensionTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Dimension(self.mode)
    }

    fn pointer_down(&mut self, u: f64, v: f64, _event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let Some(candidate) = candidate_at(ctx.sketch, [u, v], ctx.config) else {
            return ToolOutcome::None;
        };
        if !self.candidates.toggle(candidate, self.mode.capacity()) {
            return ToolOutcome::None;
        }

        // A lone line is a complete Distance/Horizontal/Vertical selection.
        let ready = self.candidates.len() == self.mode.capacity()
            || (self.candidates.len() == 1
                && matches!(self.mode, DimensionMode::Distance | DimensionMode::Horizontal | DimensionMode::Vertical)
                && candidate.line(ctx.sketch).is_some());
        if !ready {
            return ToolOutcome::None;
        }

        match build_dimension(self.mode, ctx.sketch, self.candidates.items()) {
            Some(constraint) => {
                let delta = SketchDelta::constraint(constraint);
                log_commit("dimension", &delta);
                self.candidates.clear();
                ToolOutcome::Commit(delta)
            }
            None => {
                debug!(mode = ?self.mode, "dimension: selection does not fit mode");
                ToolOutcome::None
            }
        }
    }

    fn cancel(&mut self, _ctx: &mut ToolContext) {
        self.candidates.clear();
    }
}
