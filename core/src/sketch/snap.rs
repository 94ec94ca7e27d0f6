//! Snap point detection while drawing.
//!
//! Endpoint, midpoint, center, intersection, origin and grid snaps. A snap
//! that lands on a canonical entity point also reports that point as a
//! `ConstraintPoint`, which is what auto-inference turns into Coincident.

use super::query::entity_points;
use super::types::{ConstraintPoint, Sketch, SketchGeometry};
use crate::geometry::utils_2d::{distance, line_line_intersect, midpoint};
use crate::topo::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapType {
    /// Line and arc endpoints, standalone points
    Endpoint,
    Midpoint,
    /// Circle, arc and ellipse centers
    Center,
    /// Crossing of two committed lines
    Intersection,
    Origin,
    Grid,
}

impl SnapType {
    /// Lower wins when several snaps are in range.
    pub fn priority(&self) -> u8 {
        match self {
            SnapType::Endpoint => 1,
            SnapType::Center => 2,
            SnapType::Intersection => 3,
            SnapType::Midpoint => 4,
            SnapType::Origin => 5,
            SnapType::Grid => 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    pub position: [f64; 2],
    pub snap_type: SnapType,
    pub entity_id: Option<EntityId>,
    /// Set when the snap target is a canonical point (or the origin).
    pub point: Option<ConstraintPoint>,
    /// Distance from the cursor
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Sketch-unit radius within which a snap activates
    pub snap_radius: f64,
    pub enable_endpoint: bool,
    pub enable_midpoint: bool,
    pub enable_center: bool,
    pub enable_intersection: bool,
    pub enable_origin: bool,
    pub enable_grid: bool,
    pub grid_spacing: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_radius: 0.5,
            enable_endpoint: true,
            enable_midpoint: true,
            enable_center: true,
            enable_intersection: true,
            enable_origin: true,
            enable_grid: false,
            grid_spacing: 1.0,
        }
    }
}

impl SnapConfig {
    fn kind_enabled(&self, kind: SnapType) -> bool {
        match kind {
            SnapType::Endpoint => self.enable_endpoint,
            SnapType::Midpoint => self.enable_midpoint,
            SnapType::Center => self.enable_center,
            SnapType::Intersection => self.enable_intersection,
            SnapType::Origin => self.enable_origin,
            SnapType::Grid => self.enable_grid,
        }
    }
}

/// Accumulates in-range candidates for one cursor position.
struct Collector<'a> {
    cursor: [f64; 2],
    config: &'a SnapConfig,
    found: Vec<SnapPoint>,
}

impl Collector<'_> {
    fn offer(&mut self, position: [f64; 2], snap_type: SnapType, entity_id: Option<EntityId>, point: Option<ConstraintPoint>) {
        if !self.config.kind_enabled(snap_type) {
            return;
        }
        let d = distance(self.cursor, position);
        if d <= self.config.snap_radius {
            self.found.push(SnapPoint { position, snap_type, entity_id, point, distance: d });
        }
    }
}

/// Which snap kind a canonical point index represents for each geometry.
fn canonical_kind(geometry: &SketchGeometry, index: u8) -> SnapType {
    match (geometry, index) {
        (SketchGeometry::Circle { .. } | SketchGeometry::Ellipse { .. }, _) => SnapType::Center,
        (SketchGeometry::Arc { .. }, 0) => SnapType::Center,
        _ => SnapType::Endpoint,
    }
}

/// All snap candidates within the snap radius of `cursor`. Preview entities
/// never act as snap targets.
pub fn find_snap_points(cursor: [f64; 2], sketch: &Sketch, config: &SnapConfig) -> Vec<SnapPoint> {
    let mut c = Collector { cursor, config, found: Vec::new() };

    for entity in sketch.committed_entities() {
        for (index, pos) in entity_points(entity) {
            let kind = canonical_kind(&entity.geometry, index);
            c.offer(pos, kind, Some(entity.id), Some(ConstraintPoint::new(entity.id, index)));
        }
        if let SketchGeometry::Line { start, end } = entity.geometry {
            c.offer(midpoint(start, end), SnapType::Midpoint, Some(entity.id), None);
        }
    }

    if config.enable_intersection {
        let lines: Vec<([f64; 2], [f64; 2])> = sketch
            .committed_entities()
            .filter_map(|e| match e.geometry {
                SketchGeometry::Line { start, end } => Some((start, end)),
                _ => None,
            })
            .collect();
        for (i, (s1, e1)) in lines.iter().enumerate() {
            for (s2, e2) in &lines[i + 1..] {
                if let Some(hit) = line_line_intersect(*s1, *e1, *s2, *e2) {
                    c.offer(hit, SnapType::Intersection, None, None);
                }
            }
        }
    }

    c.offer([0.0, 0.0], SnapType::Origin, None, Some(ConstraintPoint::origin()));

    if config.enable_grid && config.grid_spacing > 0.0 {
        let g = config.grid_spacing;
        c.offer([(cursor[0] / g).round() * g, (cursor[1] / g).round() * g], SnapType::Grid, None, None);
    }

    c.found
}

/// Highest-priority snap in range; ties go to the closer one.
pub fn snap_cursor(cursor: [f64; 2], sketch: &Sketch, config: &SnapConfig) -> Option<SnapPoint> {
    find_snap_points(cursor, sketch, config).into_iter().min_by(|a, b| {
        a.snap_type
            .priority()
            .cmp(&b.snap_type.priority())
            .then(a.distance.total_cmp(&b.distance))
    })
}

/// Snapped position (or the raw cursor) plus the snap that produced it.
pub fn snap_or_raw(cursor: [f64; 2], sketch: &Sketch, config: &SnapConfig) -> ([f64; 2], Option<SnapPoint>) {
    match snap_cursor(cursor, sketch, config) {
        Some(snap) => (snap.position, Some(snap)),
        None => (cursor, None),
    }
}
