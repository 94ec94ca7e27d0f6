//! Pointer-driven sketch tools.
//!
//! A tool owns its click state and its preview entities. Previews are
//! written straight into the sketch (they carry preview ids and never reach
//! the solver); a finished gesture is returned as a `SketchDelta` for the
//! session to apply and send.

pub mod selection;

mod arc;
mod circle;
mod constraint;
mod dimension;
mod ellipse;
mod line;
mod measure;
mod point;
mod polygon;
mod projection;
mod rectangle;
mod slot;

pub use arc::ArcTool;
pub use circle::CircleTool;
pub use constraint::{ConstraintKind, ConstraintTool};
pub use dimension::{DimensionMode, DimensionTool};
pub use ellipse::EllipseTool;
pub use line::LineTool;
pub use measure::MeasureTool;
pub use point::PointTool;
pub use polygon::PolygonTool;
pub use projection::ProjectionTool;
pub use rectangle::RectangleTool;
pub use slot::SlotTool;

use super::inference::{infer_constraints, SnapInfo};
use super::measurement::MeasurementResult;
use super::snap::snap_or_raw;
use super::types::{ConstraintPoint, Sketch, SketchConstraint, SketchEntity, SketchGeometry};
use crate::config::EngineConfig;
use crate::geometry::Tessellation;
use crate::picking::PickHit;
use crate::topo::naming::TopoId;
use crate::topo::EntityId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointerEvent {
    #[serde(default)]
    pub button: PointerButton,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn primary() -> Self {
        Self::default()
    }

    /// Holding shift places points exactly where the cursor is.
    pub fn snapping_enabled(&self) -> bool {
        !self.modifiers.shift
    }
}

/// What a tool may read and touch while handling one event.
pub struct ToolContext<'a> {
    pub sketch: &'a mut Sketch,
    pub config: &'a EngineConfig,
    /// What the pointer is over, when the caller ran a pick.
    pub pick: Option<&'a PickHit>,
    /// Solid render buffers, for projection.
    pub solid: Option<&'a Tessellation>,
}

impl<'a> ToolContext<'a> {
    pub fn new(sketch: &'a mut Sketch, config: &'a EngineConfig) -> Self {
        Self { sketch, config, pick: None, solid: None }
    }
}

/// A finished gesture: everything to append to the sketch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SketchDelta {
    pub entities: Vec<SketchEntity>,
    pub constraints: Vec<SketchConstraint>,
    pub external_references: Vec<(EntityId, TopoId)>,
}

impl SketchDelta {
    pub fn constraint(constraint: SketchConstraint) -> Self {
        Self { constraints: vec![constraint], ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.constraints.is_empty()
    }

    /// Append entities first, then constraints, recording history.
    /// Constraints whose references no longer resolve are dropped.
    pub fn apply(self, sketch: &mut Sketch) {
        for entity in self.entities {
            sketch.insert_entity(entity);
        }
        for constraint in self.constraints {
            if constraint.referenced_entities().iter().all(|id| sketch.contains(*id)) {
                sketch.add_constraint(constraint);
            } else {
                debug!(?constraint, "dropping constraint with a missing reference");
            }
        }
        sketch.external_references.extend(self.external_references);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    None,
    Commit(SketchDelta),
    Measurement(MeasurementResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolKind {
    Point,
    Line,
    Circle,
    Arc,
    Ellipse,
    Rectangle,
    Polygon,
    Slot,
    Dimension(DimensionMode),
    Measure,
    Constraint(ConstraintKind),
    Projection,
}

pub trait SketchTool: Send {
    fn kind(&self) -> ToolKind;

    fn activate(&mut self, _ctx: &mut ToolContext) {}

    fn deactivate(&mut self, ctx: &mut ToolContext) {
        self.cancel(ctx);
    }

    fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent, ctx: &mut ToolContext) -> ToolOutcome;

    fn pointer_move(&mut self, _u: f64, _v: f64, _event: &PointerEvent, _ctx: &mut ToolContext) -> ToolOutcome {
        ToolOutcome::None
    }

    fn pointer_up(&mut self, _u: f64, _v: f64, _event: &PointerEvent, _ctx: &mut ToolContext) -> ToolOutcome {
        ToolOutcome::None
    }

    /// Drop previews and return to the initial state.
    fn cancel(&mut self, ctx: &mut ToolContext);
}

pub fn create_tool(kind: ToolKind, config: &EngineConfig) -> Box<dyn SketchTool> {
    match kind {
        ToolKind::Point => Box::new(PointTool::default()),
        ToolKind::Line => Box::new(LineTool::default()),
        ToolKind::Circle => Box::new(CircleTool::default()),
        ToolKind::Arc => Box::new(ArcTool::default()),
        ToolKind::Ellipse => Box::new(EllipseTool::default()),
        ToolKind::Rectangle => Box::new(RectangleTool::default()),
        ToolKind::Polygon => Box::new(PolygonTool::new(config.polygon_sides)),
        ToolKind::Slot => Box::new(SlotTool::default()),
        ToolKind::Dimension(mode) => Box::new(DimensionTool::new(mode)),
        ToolKind::Measure => Box::new(MeasureTool::default()),
        ToolKind::Constraint(kind) => Box::new(ConstraintTool::new(kind)),
        ToolKind::Projection => Box::new(ProjectionTool::default()),
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Preview entities owned by one tool, keyed by slot.
#[derive(Debug, Default)]
pub(crate) struct Previews {
    ids: Vec<EntityId>,
}

impl Previews {
    /// Replace the previews with `shapes`, reusing slots in order.
    pub fn show(&mut self, sketch: &mut Sketch, shapes: Vec<(SketchGeometry, bool)>) {
        for stale in self.ids.drain(shapes.len().min(self.ids.len())..) {
            sketch.remove_preview(stale);
        }
        for (slot, (geometry, construction)) in shapes.into_iter().enumerate() {
            let id = EntityId::preview(slot as u64);
            sketch.set_preview(id, geometry, construction);
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn show_one(&mut self, sketch: &mut Sketch, geometry: SketchGeometry) {
        self.show(sketch, vec![(geometry, false)]);
    }

    pub fn clear(&mut self, sketch: &mut Sketch) {
        for id in self.ids.drain(..) {
            sketch.remove_preview(id);
        }
    }
}

/// Cursor position after snapping, plus the canonical point it landed on.
pub(crate) fn snap_point(u: f64, v: f64, event: &PointerEvent, ctx: &ToolContext) -> ([f64; 2], Option<ConstraintPoint>) {
    if !event.snapping_enabled() {
        return ([u, v], None);
    }
    let (pos, snap) = snap_or_raw([u, v], ctx.sketch, &ctx.config.snap);
    (pos, snap.and_then(|s| s.point))
}

/// Delta for one new entity plus whatever its snap info implies.
pub(crate) fn single_entity_delta(entity: SketchEntity, snap: &SnapInfo) -> SketchDelta {
    let constraints = infer_constraints(entity.id, &entity.geometry, snap);
    SketchDelta { entities: vec![entity], constraints, external_references: Vec::new() }
}

pub(crate) fn log_commit(tool: &str, delta: &SketchDelta) {
    info!(tool, entities = delta.entities.len(), constraints = delta.constraints.len(), "tool commit");
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::sketch::types::SketchPlane;

    pub fn empty_sketch() -> Sketch {
        Sketch::new(SketchPlane::default())
    }

    /// Click through `points` with the primary button and return the last
    /// outcome.
    pub fn click_all(tool: &mut dyn SketchTool, sketch: &mut Sketch, config: &EngineConfig, points: &[[f64; 2]]) -> ToolOutcome {
        let event = PointerEvent::primary();
        let mut last = ToolOutcome::None;
        for p in points {
            let mut ctx = ToolContext::new(sketch, config);
            tool.pointer_move(p[0], p[1], &event, &mut ctx);
            last = tool.pointer_down(p[0], p[1], &event, &mut ctx);
            tool.pointer_up(p[0], p[1], &event, &mut ctx);
        }
        last
    }

    pub fn commit_of(outcome: ToolOutcome) -> SketchDelta {
        match outcome {
            ToolOutcome::Commit(delta) => delta,
            other => panic!("expected a commit, got {:?}", other),
        }
    }
}
