//! The single writer of a sketch.
//!
//! `SketchSession` owns the current sketch and routes every mutation
//! through itself: tool input, dimension drags, patterns, and inbound echoes
//! from the solver. Committed changes are applied locally first and queued
//! as `UpdateFeature` commands; a later echo replaces the local sketch
//! wholesale, so the last message wins.

use crate::config::EngineConfig;
use crate::geometry::Tessellation;
use crate::geometry::utils_3d::ray_plane_intersect;
use crate::picking::{pick_screen, Camera, PickHit, PickResult, PickScene, PickTarget, Viewport};
use crate::protocol::{extract_sketch, parse_inbound, Command, InboundMessage, ProtocolError, SketchStatus};
use crate::sketch::dimension::{hitboxes, CameraControls, DimensionDragController, DimensionHitbox};
use crate::sketch::measurement::MeasurementResult;
use crate::sketch::pattern::{
    circular_pattern, linear_pattern, mirror, preview_circular_pattern, preview_linear_pattern, CircularPatternParams,
    LinearPatternParams, PatternResult,
};
use crate::sketch::snap::find_snap_points;
use crate::sketch::tools::{
    create_tool, PointerButton, PointerEvent, SketchDelta, SketchTool, ToolContext, ToolKind, ToolOutcome,
};
use crate::sketch::types::{Sketch, SketchEntity};
use crate::topo::{EntityId, SelectionFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Notification sent to observers after the session changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchEvent {
    /// Committed geometry or constraints changed.
    SketchChanged,
    /// Only preview entities changed.
    PreviewChanged,
    /// A dimension style changed during a drag.
    DimensionMoved { constraint_index: usize },
    Measured(MeasurementResult),
    StatusChanged,
    CameraEnabled(bool),
    ToolChanged(Option<ToolKind>),
}

pub type Observer = Box<dyn FnMut(&SketchEvent) + Send>;

/// Orbit/pan gate toggled by dimension drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CameraGate {
    enabled: bool,
}

impl CameraControls for CameraGate {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

pub struct SketchSession {
    feature_id: EntityId,
    sketch: Sketch,
    config: EngineConfig,
    tool: Option<Box<dyn SketchTool>>,
    drag: DimensionDragController,
    camera_gate: CameraGate,
    camera: Camera,
    viewport: Viewport,
    solid: Option<Tessellation>,
    filter: SelectionFilter,
    selection: Vec<EntityId>,
    pattern_preview: Vec<EntityId>,
    status: Option<SketchStatus>,
    outbox: Vec<Command>,
    observers: Vec<Observer>,
}

impl SketchSession {
    pub fn new(feature_id: EntityId, mut sketch: Sketch, config: EngineConfig) -> Self {
        sketch.ensure_history();
        let camera = Camera::facing_plane(&sketch.plane, 50.0);
        Self {
            feature_id,
            sketch,
            config,
            tool: None,
            drag: DimensionDragController::new(),
            camera_gate: CameraGate { enabled: true },
            camera,
            viewport: Viewport::new(1280.0, 720.0),
            solid: None,
            filter: SelectionFilter::Any,
            selection: Vec::new(),
            pattern_preview: Vec::new(),
            status: None,
            outbox: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn feature_id(&self) -> EntityId {
        self.feature_id
    }

    pub fn sketch(&self) -> &Sketch {
        &self.sketch
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> Option<&SketchStatus> {
        self.status.as_ref()
    }

    pub fn tool_kind(&self) -> Option<ToolKind> {
        self.tool.as_ref().map(|t| t.kind())
    }

    pub fn camera_enabled(&self) -> bool {
        self.camera_gate.enabled
    }

    pub fn is_dragging_dimension(&self) -> bool {
        self.drag.is_active()
    }

    pub fn selection(&self) -> &[EntityId] {
        &self.selection
    }

    pub fn outbox(&self) -> &[Command] {
        &self.outbox
    }

    /// Take every queued outbound command.
    pub fn drain_outbox(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn emit(&mut self, event: SketchEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    pub fn set_view(&mut self, camera: Camera, viewport: Viewport) {
        self.camera = camera;
        self.viewport = viewport;
    }

    pub fn set_solid(&mut self, solid: Option<Tessellation>) {
        self.solid = solid;
    }

    pub fn set_filter(&mut self, filter: SelectionFilter) {
        self.filter = filter;
        self.outbox.push(Command::SetFilter { filter });
    }

    // ---- tools ----

    /// Run `f` against the active tool with a fresh context.
    fn with_tool<F>(&mut self, pick: Option<&PickHit>, f: F) -> Option<ToolOutcome>
    where
        F: FnOnce(&mut dyn SketchTool, &mut ToolContext) -> ToolOutcome,
    {
        let tool = self.tool.as_mut()?;
        let mut ctx = ToolContext { sketch: &mut self.sketch, config: &self.config, pick, solid: self.solid.as_ref() };
        Some(f(tool.as_mut(), &mut ctx))
    }

    /// Switch tools. The old tool is deactivated first, which drops its
    /// previews.
    pub fn set_tool(&mut self, kind: Option<ToolKind>) {
        self.with_tool(None, |tool, ctx| {
            tool.deactivate(ctx);
            ToolOutcome::None
        });
        self.tool = kind.map(|k| create_tool(k, &self.config));
        self.with_tool(None, |tool, ctx| {
            tool.activate(ctx);
            ToolOutcome::None
        });
        debug!(?kind, "tool changed");
        self.emit(SketchEvent::ToolChanged(kind));
    }

    pub fn cancel_tool(&mut self) {
        let had_previews = self.sketch.preview_count() > 0;
        self.with_tool(None, |tool, ctx| {
            tool.cancel(ctx);
            ToolOutcome::None
        });
        if had_previews {
            self.emit(SketchEvent::PreviewChanged);
        }
    }

    fn handle_outcome(&mut self, outcome: ToolOutcome) {
        match outcome {
            ToolOutcome::None => {}
            ToolOutcome::Commit(delta) => self.commit(delta),
            ToolOutcome::Measurement(result) => self.emit(SketchEvent::Measured(result)),
        }
    }

    fn dispatch<F>(&mut self, pick: Option<&PickHit>, f: F)
    where
        F: FnOnce(&mut dyn SketchTool, &mut ToolContext) -> ToolOutcome,
    {
        if let Some(outcome) = self.with_tool(pick, f) {
            self.handle_outcome(outcome);
        }
    }

    /// Pointer press in sketch-local coordinates. The secondary button
    /// cancels the active tool.
    pub fn pointer_down(&mut self, u: f64, v: f64, event: &PointerEvent) {
        self.pointer_down_with_pick(u, v, event, None);
    }

    fn pointer_down_with_pick(&mut self, u: f64, v: f64, event: &PointerEvent, pick: Option<&PickHit>) {
        match event.button {
            PointerButton::Secondary => self.cancel_tool(),
            PointerButton::Middle => {}
            PointerButton::Primary => self.dispatch(pick, |tool, ctx| tool.pointer_down(u, v, event, ctx)),
        }
    }

    pub fn pointer_move(&mut self, u: f64, v: f64, event: &PointerEvent) {
        if self.drag.is_active() {
            self.drag_to([u, v]);
            return;
        }
        if self.tool.is_some() {
            self.dispatch(None, |tool, ctx| tool.pointer_move(u, v, event, ctx));
            self.emit(SketchEvent::PreviewChanged);
        }
    }

    pub fn pointer_up(&mut self, u: f64, v: f64, event: &PointerEvent) {
        if self.drag.is_active() {
            self.end_dimension_drag();
            return;
        }
        self.dispatch(None, |tool, ctx| tool.pointer_up(u, v, event, ctx));
    }

    // ---- screen-space input ----

    /// Current dimension hitboxes, for rendering and picking.
    pub fn dimension_hitboxes(&self) -> Vec<DimensionHitbox> {
        hitboxes(&self.sketch, &self.config)
    }

    /// Resolve a screen position against everything pickable.
    pub fn pick(&self, screen: [f64; 2]) -> PickResult {
        let hitboxes = self.dimension_hitboxes();
        let markers = match self.screen_to_local(screen) {
            Some(c) if self.tool.is_some() => find_snap_points(c, &self.sketch, &self.config.snap),
            _ => Vec::new(),
        };
        let scene = PickScene {
            plane: &self.sketch.plane,
            sketch: Some(&self.sketch),
            hitboxes: &hitboxes,
            snap_markers: &markers,
            solid: self.solid.as_ref(),
            filter: self.filter,
            config: &self.config,
        };
        pick_screen(&scene, &self.camera, &self.viewport, screen)
    }

    /// Screen-space press: a dimension hitbox starts a drag, anything else
    /// goes to the active tool at the sketch-plane position under the cursor.
    pub fn screen_down(&mut self, screen: [f64; 2], event: &PointerEvent) {
        let result = self.pick(screen);
        if event.button == PointerButton::Primary {
            if let Some(PickTarget::Dimension { constraint_index }) = result.hit().map(|h| h.target) {
                if let Some(local) = result.local() {
                    self.begin_dimension_drag(constraint_index, local);
                    return;
                }
            }
        }
        if let Some([u, v]) = result.local() {
            self.pointer_down_with_pick(u, v, event, result.hit());
        }
    }

    pub fn screen_move(&mut self, screen: [f64; 2], event: &PointerEvent) {
        if let Some([u, v]) = self.screen_to_local(screen) {
            self.pointer_move(u, v, event);
        }
    }

    pub fn screen_up(&mut self, screen: [f64; 2], event: &PointerEvent) {
        match self.screen_to_local(screen) {
            Some([u, v]) => self.pointer_up(u, v, event),
            // Off-plane release still ends a drag.
            None if self.drag.is_active() => self.end_dimension_drag(),
            None => {}
        }
    }

    fn screen_to_local(&self, screen: [f64; 2]) -> Option<[f64; 2]> {
        let ray = self.camera.screen_ray(screen, &self.viewport)?;
        let (_, world) = ray_plane_intersect(&ray, &self.sketch.plane.as_plane())?;
        Some(self.sketch.plane.to_local(&world))
    }

    // ---- dimension drag ----

    pub fn begin_dimension_drag(&mut self, constraint_index: usize, local: [f64; 2]) -> bool {
        let Some(hitbox) = self.dimension_hitboxes().into_iter().find(|h| h.constraint_index == constraint_index) else {
            return false;
        };
        if !self.drag.begin(&hitbox, local, &self.sketch, &mut self.camera_gate) {
            return false;
        }
        self.emit(SketchEvent::CameraEnabled(false));
        true
    }

    fn drag_to(&mut self, local: [f64; 2]) {
        if self.drag.update(local, &mut self.sketch) {
            if let Some(index) = self.drag.active().map(|d| d.constraint_index) {
                self.emit(SketchEvent::DimensionMoved { constraint_index: index });
            }
        }
    }

    /// End the drag, re-enable the camera and send the restyled sketch.
    pub fn end_dimension_drag(&mut self) {
        let finished = self.drag.end(&mut self.camera_gate);
        self.emit(SketchEvent::CameraEnabled(true));
        if finished.is_some() {
            self.send_sketch();
            self.emit(SketchEvent::SketchChanged);
        }
    }

    // ---- committed changes ----

    fn send_sketch(&mut self) {
        self.outbox.push(Command::update_sketch(self.feature_id, &self.sketch));
    }

    /// Apply a delta locally and queue the resulting sketch.
    pub fn commit(&mut self, delta: SketchDelta) {
        if delta.is_empty() {
            return;
        }
        delta.apply(&mut self.sketch);
        self.send_sketch();
        self.emit(SketchEvent::SketchChanged);
    }

    fn commit_pattern(&mut self, result: Option<PatternResult>) -> bool {
        match result {
            Some(result) if !result.is_empty() => {
                self.commit(SketchDelta { entities: result.entities, constraints: result.constraints, external_references: Vec::new() });
                true
            }
            _ => false,
        }
    }

    /// Remove an entity and its constraints. Any gesture in progress may
    /// hold references to it, so the active tool and drag are cancelled.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if self.sketch.entity(id).is_none() {
            return false;
        }
        self.cancel_tool();
        if self.drag.is_active() {
            self.drag.end(&mut self.camera_gate);
            self.emit(SketchEvent::CameraEnabled(true));
        }
        if !self.sketch.remove_entity(id) {
            return false;
        }
        self.selection.retain(|s| *s != id);
        self.send_sketch();
        self.emit(SketchEvent::SketchChanged);
        true
    }

    pub fn toggle_constraint_suppression(&mut self, index: usize) -> Option<bool> {
        if index >= self.sketch.constraints.len() {
            return None;
        }
        let suppressed = self.sketch.toggle_constraint_suppression(index);
        self.send_sketch();
        self.emit(SketchEvent::SketchChanged);
        Some(suppressed)
    }

    // ---- selection and patterns ----

    pub fn select(&mut self, id: EntityId, additive: bool) {
        if !additive {
            self.selection.clear();
        }
        if self.sketch.entity(id).is_some_and(|e| !e.is_preview()) && !self.selection.contains(&id) {
            self.selection.push(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Mirror the selection across `axis`.
    pub fn mirror(&mut self, axis: EntityId) -> bool {
        let result = mirror(&self.sketch, &self.selection, axis);
        self.commit_pattern(result)
    }

    pub fn linear_pattern(&mut self, params: &LinearPatternParams) -> bool {
        self.clear_pattern_preview();
        let result = linear_pattern(&self.sketch, &self.selection, params);
        self.commit_pattern(result)
    }

    pub fn circular_pattern(&mut self, params: &CircularPatternParams) -> bool {
        self.clear_pattern_preview();
        let result = circular_pattern(&self.sketch, &self.selection, params);
        self.commit_pattern(result)
    }

    fn show_pattern_preview(&mut self, entities: Vec<SketchEntity>) {
        self.clear_pattern_preview();
        for entity in entities {
            self.pattern_preview.push(entity.id);
            self.sketch.set_preview(entity.id, entity.geometry, entity.is_construction);
        }
        self.emit(SketchEvent::PreviewChanged);
    }

    pub fn preview_linear_pattern(&mut self, params: &LinearPatternParams) {
        let entities = preview_linear_pattern(&self.sketch, &self.selection, params);
        self.show_pattern_preview(entities);
    }

    pub fn preview_circular_pattern(&mut self, params: &CircularPatternParams) {
        let entities = preview_circular_pattern(&self.sketch, &self.selection, params);
        self.show_pattern_preview(entities);
    }

    /// Drop pattern previews; tool previews are left alone.
    pub fn clear_pattern_preview(&mut self) {
        for id in self.pattern_preview.drain(..) {
            self.sketch.remove_preview(id);
        }
    }

    // ---- inbound ----

    pub fn handle_inbound(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::GraphUpdate(graph) => match extract_sketch(&graph, self.feature_id) {
                Some(sketch) => {
                    info!(entities = sketch.entities.len(), constraints = sketch.constraints.len(), "sketch echo replaces local state");
                    self.replace_sketch(sketch);
                }
                None => debug!("graph update without this sketch"),
            },
            InboundMessage::SketchStatus(status) => {
                debug!(converged = status.converged, dof = status.dof, "sketch status");
                self.status = Some(status);
                self.emit(SketchEvent::StatusChanged);
            }
            InboundMessage::ErrorUpdate(report) => {
                warn!(code = %report.code, severity = %report.severity, "solver error: {}", report.message);
            }
            _ => {}
        }
    }

    /// Decode and apply one inbound line.
    pub fn handle_inbound_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        let message = parse_inbound(line)?;
        self.handle_inbound(message);
        Ok(())
    }

    /// Adopt `sketch` as the current state. Tool state and drags are reset
    /// since their references may no longer resolve.
    pub fn replace_sketch(&mut self, mut sketch: Sketch) {
        sketch.ensure_history();
        self.cancel_tool();
        if self.drag.is_active() {
            self.drag.end(&mut self.camera_gate);
            self.emit(SketchEvent::CameraEnabled(true));
        }
        sketch.clear_previews();
        self.pattern_preview.clear();
        self.sketch = sketch;
        let sketch = &self.sketch;
        self.selection.retain(|id| sketch.entity(*id).is_some());
        self.emit(SketchEvent::SketchChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::tools::{ConstraintKind, DimensionMode};
    use crate::sketch::types::{SketchConstraint, SketchGeometry, SketchPlane};
    use std::sync::{Arc, Mutex};

    fn session() -> SketchSession {
        SketchSession::new(EntityId::new_deterministic("Sketch1"), Sketch::new(SketchPlane::default()), EngineConfig::default())
    }

    fn click(session: &mut SketchSession, points: &[[f64; 2]]) {
        let event = PointerEvent::primary();
        for p in points {
            session.pointer_move(p[0], p[1], &event);
            session.pointer_down(p[0], p[1], &event);
            session.pointer_up(p[0], p[1], &event);
        }
    }

    #[test]
    fn test_commit_queues_update_and_notifies() {
        let mut s = session();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        s.subscribe(Box::new(move |e: &SketchEvent| sink.lock().unwrap().push(e.clone())));

        s.set_tool(Some(ToolKind::Line));
        click(&mut s, &[[1.0, 1.0], [5.0, 3.0]]);

        assert_eq!(s.sketch().committed_entities().count(), 1);
        assert_eq!(s.outbox().len(), 1);
        assert!(matches!(s.outbox()[0], Command::UpdateFeature { .. }));
        assert!(events.lock().unwrap().contains(&SketchEvent::SketchChanged));
    }

    #[test]
    fn test_secondary_button_cancels() {
        let mut s = session();
        s.set_tool(Some(ToolKind::Circle));
        click(&mut s, &[[3.0, 3.0]]);
        s.pointer_move(5.0, 3.0, &PointerEvent::primary());
        assert!(s.sketch().preview_count() > 0);

        let right = PointerEvent { button: PointerButton::Secondary, ..PointerEvent::default() };
        s.pointer_down(5.0, 3.0, &right);
        assert_eq!(s.sketch().preview_count(), 0);
        assert!(s.outbox().is_empty());
    }

    #[test]
    fn test_echo_replaces_local_sketch() {
        let mut s = session();
        s.set_tool(Some(ToolKind::Point));
        click(&mut s, &[[4.0, 4.0]]);

        let mut remote = Sketch::new(SketchPlane::default());
        remote.add_entity(SketchGeometry::Circle { center: [1.0, 1.0], radius: 1.0 });
        remote.add_entity(SketchGeometry::Circle { center: [9.0, 1.0], radius: 1.0 });
        let graph = serde_json::json!({
            "nodes": { s.feature_id().to_string(): { "parameters": {
                "sketch_data": crate::protocol::ParameterValue::Sketch(remote.clone())
            } } }
        });
        s.handle_inbound_line(&format!("GRAPH_UPDATE:{}", graph)).unwrap();
        assert_eq!(s.sketch().entities, remote.entities);
    }

    #[test]
    fn test_dimension_drag_toggles_camera() {
        let mut s = session();
        s.sketch.add_entity(SketchGeometry::Line { start: [0.0, 0.0], end: [4.0, 0.0] });
        s.set_tool(Some(ToolKind::Dimension(DimensionMode::Distance)));
        click(&mut s, &[[2.0, 0.1]]);
        let index = s.sketch().constraints.len() - 1;
        assert!(matches!(s.sketch().constraints[index].constraint, SketchConstraint::Distance { .. }));
        s.drain_outbox();

        let center = s.dimension_hitboxes()[0].center;
        assert!(s.begin_dimension_drag(index, center));
        assert!(!s.camera_enabled());
        s.pointer_move(center[0], center[1] + 1.0, &PointerEvent::primary());
        s.pointer_up(center[0], center[1] + 1.0, &PointerEvent::primary());

        assert!(s.camera_enabled());
        assert_eq!(s.outbox().len(), 1);
        let style = s.sketch().constraints[index].constraint.dimension_style().unwrap();
        assert!((style.offset[1] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_remove_mid_gesture_leaves_no_dangling_coincident() {
        let mut s = session();
        let a = s.sketch.add_entity(SketchGeometry::Point { pos: [1.0, 1.0] });
        s.sketch.add_entity(SketchGeometry::Point { pos: [6.0, 2.0] });
        s.set_tool(Some(ToolKind::Constraint(ConstraintKind::Coincident)));
        click(&mut s, &[[1.0, 1.0]]);

        assert!(s.remove_entity(a));
        click(&mut s, &[[6.0, 2.0]]);
        assert!(s.sketch().constraints.is_empty());
        assert!(s.sketch().dangling_constraints().is_empty());
    }

    #[test]
    fn test_remove_snapped_point_before_line_ends() {
        let mut s = session();
        let a = s.sketch.add_entity(SketchGeometry::Point { pos: [2.0, 2.0] });
        s.set_tool(Some(ToolKind::Line));
        click(&mut s, &[[2.0, 2.0]]);
        s.pointer_move(5.0, 4.0, &PointerEvent::primary());
        assert!(s.sketch().preview_count() > 0);

        assert!(s.remove_entity(a));
        assert_eq!(s.sketch().preview_count(), 0);
        click(&mut s, &[[7.0, 5.0]]);
        assert!(s.sketch().dangling_constraints().is_empty());
    }

    #[test]
    fn test_remove_unknown_entity_keeps_gesture() {
        let mut s = session();
        s.set_tool(Some(ToolKind::Line));
        click(&mut s, &[[0.0, 0.0]]);
        s.pointer_move(3.0, 1.0, &PointerEvent::primary());
        let previews = s.sketch().preview_count();

        assert!(!s.remove_entity(EntityId::new()));
        assert_eq!(s.sketch().preview_count(), previews);
        assert!(s.outbox().is_empty());
    }

    #[test]
    fn test_mirror_uses_selection() {
        let mut s = session();
        let axis = s.sketch.add_entity(SketchGeometry::Line { start: [0.0, -5.0], end: [0.0, 5.0] });
        let point = s.sketch.add_entity(SketchGeometry::Point { pos: [2.0, 1.0] });
        s.select(point, false);
        s.select(axis, true);
        assert!(s.mirror(axis));
        assert_eq!(s.sketch().committed_entities().count(), 3);
        assert!(s.sketch().entities.iter().any(|e| match e.geometry {
            SketchGeometry::Point { pos } => (pos[0] + 2.0).abs() < 1e-9 && (pos[1] - 1.0).abs() < 1e-9,
            _ => false,
        }));
        assert!(s.sketch().constraints.iter().any(|c| matches!(c.constraint, SketchConstraint::Symmetric { .. })));
    }
}
