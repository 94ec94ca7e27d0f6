use super::selection::{candidate_at, Candidate, CandidateSet};
use super::{PointerEvent, SketchTool, ToolContext, ToolKind, ToolOutcome};
use crate::sketch::measurement::measure_selection;
use tracing::debug;

/// Read-only inspection. Each click updates the selection and reports what
/// it measures; the sketch is never modified. A full pair starts over on the
/// next click.
#[derive(Debug, Default)]
pub struct MeasureTool {
    candidates: CandidateSet,
}

impl MeasureTool {
    pub fn candidates(&self) -> &[Candidate] {
        self.candidates.items()
    }
}

impl SketchTool for MeasureTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Measure
    }

    fn pointer_down(&mut self, u: f64, v: f64, _event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome {
        let Some(candidate) = candidate_at(ctx.sketch, [u, v], ctx.config) else {
            return ToolOutcome::None;
        };
        if self.candidates.len() == 2 && !self.candidates.items().iter().any(|c| c.kind == candidate.kind) {
            self.candidates.clear();
        }
        self.candidates.toggle(candidate, 2);

        match measure_selection(ctx.sketch, self.candidates.items()) {
            Some(result) => {
                debug!(?result, "measure");
                ToolOutcome::Measurement(result)
            }
            None => ToolOutcome::None,
        }
    }

    fn cancel(&mut self, _ctx: &mut ToolContext) {
        self.candidates.clear();
    }
}
