use crate::geometry::{Point3, Vector3};
use crate::topo::naming::TopoId;
use crate::topo::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Oriented plane a sketch lives on. `x_axis × y_axis == normal`, all unit
/// length. Immutable for the lifetime of a sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    pub origin: Point3,
    pub normal: Vector3,
    pub x_axis: Vector3,
    pub y_axis: Vector3,
}

impl Default for SketchPlane {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            normal: Vector3::z_axis().into_inner(),
            x_axis: Vector3::x_axis().into_inner(),
            y_axis: Vector3::y_axis().into_inner(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchGeometry {
    Line { start: [f64; 2], end: [f64; 2] },
    Circle { center: [f64; 2], radius: f64 },
    /// Counter-clockwise from `start_angle` to `end_angle` (radians).
    Arc { center: [f64; 2], radius: f64, start_angle: f64, end_angle: f64 },
    Point { pos: [f64; 2] },
    /// Ellipse defined by center, semi-major axis, semi-minor axis, and rotation
    Ellipse { center: [f64; 2], semi_major: f64, semi_minor: f64, rotation: f64 },
}

impl SketchGeometry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SketchGeometry::Line { .. } => "Line",
            SketchGeometry::Circle { .. } => "Circle",
            SketchGeometry::Arc { .. } => "Arc",
            SketchGeometry::Point { .. } => "Point",
            SketchGeometry::Ellipse { .. } => "Ellipse",
        }
    }

    /// Whether an Equal constraint between two geometries of these kinds is meaningful.
    pub fn equal_compatible(&self, other: &SketchGeometry) -> bool {
        use SketchGeometry::*;
        matches!(
            (self, other),
            (Line { .. }, Line { .. })
                | (Circle { .. } | Arc { .. }, Circle { .. } | Arc { .. })
                | (Ellipse { .. }, Ellipse { .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchEntity {
    pub id: EntityId,
    pub geometry: SketchGeometry,
    #[serde(default)]
    pub is_construction: bool,
}

impl SketchEntity {
    pub fn new(geometry: SketchGeometry) -> Self {
        Self { id: EntityId::new(), geometry, is_construction: false }
    }

    pub fn construction(geometry: SketchGeometry) -> Self {
        Self { id: EntityId::new(), geometry, is_construction: true }
    }

    pub fn is_preview(&self) -> bool {
        self.id.is_preview()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintPoint {
    pub id: EntityId,
    pub index: u8, // 0=Start/Center/Pos, 1=End or first arc boundary, 2=second arc boundary
}

impl ConstraintPoint {
    pub fn new(id: EntityId, index: u8) -> Self {
        Self { id, index }
    }

    /// The sketch origin sentinel.
    pub fn origin() -> Self {
        Self { id: EntityId::origin(), index: 0 }
    }

    pub fn is_origin(&self) -> bool {
        self.id.is_origin()
    }
}

/// Style configuration for visible dimension annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionStyle {
    /// If true, dimension is reference-only (driven). If false, it drives the geometry (driving).
    pub driven: bool,
    /// Annotation placement in the constraint's own frame: `[along, across]`
    /// for linear dimensions, `[angle, extension]` for radius, `[_, radius]` for angles.
    pub offset: [f64; 2],
    /// Optional expression string (e.g., "@thickness" or "@base * 2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Default for DimensionStyle {
    fn default() -> Self {
        Self {
            driven: false,
            offset: [0.0, 0.5], // Default offset above the dimension line
            expression: None,
        }
    }
}

impl DimensionStyle {
    pub fn driven() -> Self {
        Self { driven: true, ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchConstraint {
    Coincident { points: [ConstraintPoint; 2] },
    Horizontal { entity: EntityId },
    Vertical { entity: EntityId },
    /// Distance constraint between two points
    Distance {
        points: [ConstraintPoint; 2],
        value: f64,
        /// If Some, renders as a visible dimension annotation
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DimensionStyle>,
    },
    /// Horizontal Distance (X-axis) between two points
    HorizontalDistance {
        points: [ConstraintPoint; 2],
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DimensionStyle>,
    },
    /// Vertical Distance (Y-axis) between two points
    VerticalDistance {
        points: [ConstraintPoint; 2],
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DimensionStyle>,
    },
    /// Angle constraint between two lines
    Angle {
        lines: [EntityId; 2],
        value: f64, // radians
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DimensionStyle>,
    },
    /// Radius constraint for a Circle or Arc
    Radius {
        entity: EntityId,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DimensionStyle>,
    },
    Parallel { lines: [EntityId; 2] },
    Perpendicular { lines: [EntityId; 2] },
    Tangent { entities: [EntityId; 2] },
    Equal { entities: [EntityId; 2] },
    /// Symmetric constraint: p2 is the reflection of p1 across the axis line
    Symmetric { p1: ConstraintPoint, p2: ConstraintPoint, axis: EntityId },
    Fix { point: ConstraintPoint, position: [f64; 2] },
    /// Distance between a point and an infinite line (perpendicular distance)
    DistancePointLine {
        point: ConstraintPoint,
        line: EntityId,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DimensionStyle>,
    },
    /// Distance between two parallel lines (perpendicular distance)
    DistanceParallelLines {
        lines: [EntityId; 2],
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DimensionStyle>,
    },
}

impl SketchConstraint {
    /// Every entity this constraint refers to, origin sentinel excluded.
    pub fn referenced_entities(&self) -> Vec<EntityId> {
        use SketchConstraint::*;
        let ids: Vec<EntityId> = match self {
            Coincident { points } | Distance { points, .. } | HorizontalDistance { points, .. } | VerticalDistance { points, .. } => {
                vec![points[0].id, points[1].id]
            }
            Horizontal { entity } | Vertical { entity } | Radius { entity, .. } => vec![*entity],
            Angle { lines, .. } | Parallel { lines } | Perpendicular { lines } | DistanceParallelLines { lines, .. } => lines.to_vec(),
            Tangent { entities } | Equal { entities } => entities.to_vec(),
            Symmetric { p1, p2, axis } => vec![p1.id, p2.id, *axis],
            Fix { point, .. } => vec![point.id],
            DistancePointLine { point, line, .. } => vec![point.id, *line],
        };
        ids.into_iter().filter(|id| !id.is_origin()).collect()
    }

    pub fn references(&self, id: EntityId) -> bool {
        self.referenced_entities().contains(&id)
    }

    /// Numeric target of a dimensional constraint.
    pub fn value(&self) -> Option<f64> {
        use SketchConstraint::*;
        match self {
            Distance { value, .. }
            | HorizontalDistance { value, .. }
            | VerticalDistance { value, .. }
            | Angle { value, .. }
            | Radius { value, .. }
            | DistancePointLine { value, .. }
            | DistanceParallelLines { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_dimensional(&self) -> bool {
        self.value().is_some()
    }

    pub fn dimension_style(&self) -> Option<&DimensionStyle> {
        use SketchConstraint::*;
        match self {
            Distance { style, .. }
            | HorizontalDistance { style, .. }
            | VerticalDistance { style, .. }
            | Angle { style, .. }
            | Radius { style, .. }
            | DistancePointLine { style, .. }
            | DistanceParallelLines { style, .. } => style.as_ref(),
            _ => None,
        }
    }

    pub fn dimension_style_mut(&mut self) -> Option<&mut DimensionStyle> {
        use SketchConstraint::*;
        match self {
            Distance { style, .. }
            | HorizontalDistance { style, .. }
            | VerticalDistance { style, .. }
            | Angle { style, .. }
            | Radius { style, .. }
            | DistancePointLine { style, .. }
            | DistanceParallelLines { style, .. } => style.as_mut(),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        use SketchConstraint::*;
        match self {
            Coincident { .. } => "Coincident",
            Horizontal { .. } => "Horizontal",
            Vertical { .. } => "Vertical",
            Distance { .. } => "Distance",
            HorizontalDistance { .. } => "HorizontalDistance",
            VerticalDistance { .. } => "VerticalDistance",
            Angle { .. } => "Angle",
            Radius { .. } => "Radius",
            Parallel { .. } => "Parallel",
            Perpendicular { .. } => "Perpendicular",
            Tangent { .. } => "Tangent",
            Equal { .. } => "Equal",
            Symmetric { .. } => "Symmetric",
            Fix { .. } => "Fix",
            DistancePointLine { .. } => "DistancePointLine",
            DistanceParallelLines { .. } => "DistanceParallelLines",
        }
    }
}

/// Wrapper for constraints with suppression state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchConstraintEntry {
    pub constraint: SketchConstraint,
    #[serde(default)]
    pub suppressed: bool,
}

impl SketchConstraintEntry {
    pub fn new(constraint: SketchConstraint) -> Self {
        Self { constraint, suppressed: false }
    }

    pub fn suppressed(constraint: SketchConstraint) -> Self {
        Self { constraint, suppressed: true }
    }
}

impl From<SketchConstraint> for SketchConstraintEntry {
    fn from(constraint: SketchConstraint) -> Self {
        Self::new(constraint)
    }
}

/// Replay log entry. The log is append-only and exists for the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchOperation {
    AddGeometry { id: EntityId, geometry: SketchGeometry },
    AddConstraint { constraint: SketchConstraint },
    RemoveGeometry { id: EntityId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    pub plane: SketchPlane,
    // Vec keeps creation order stable for rendering and for the solver.
    pub entities: Vec<SketchEntity>,
    pub constraints: Vec<SketchConstraintEntry>,
    #[serde(default)]
    pub history: Vec<SketchOperation>,
    /// Maps local EntityId (in the sketch) to the stable TopoId it was projected from.
    #[serde(default)]
    pub external_references: HashMap<EntityId, TopoId>,
}

impl Sketch {
    pub fn new(plane: SketchPlane) -> Self {
        Self {
            plane,
            entities: Vec::new(),
            constraints: Vec::new(),
            history: Vec::new(),
            external_references: HashMap::new(),
        }
    }

    pub fn add_entity(&mut self, geometry: SketchGeometry) -> EntityId {
        self.insert_entity(SketchEntity::new(geometry))
    }

    pub fn add_construction_entity(&mut self, geometry: SketchGeometry) -> EntityId {
        self.insert_entity(SketchEntity::construction(geometry))
    }

    /// Append an entity whose id was assigned by the caller (tools, patterns).
    pub fn insert_entity(&mut self, entity: SketchEntity) -> EntityId {
        let id = entity.id;
        self.history.push(SketchOperation::AddGeometry { id, geometry: entity.geometry.clone() });
        self.entities.push(entity);
        id
    }

    pub fn add_constraint(&mut self, constraint: SketchConstraint) {
        self.constraints.push(SketchConstraintEntry::new(constraint.clone()));
        self.history.push(SketchOperation::AddConstraint { constraint });
    }

    /// Add constraint with explicit suppression state
    pub fn add_constraint_with_suppression(&mut self, constraint: SketchConstraint, suppressed: bool) {
        self.constraints.push(SketchConstraintEntry { constraint: constraint.clone(), suppressed });
        self.history.push(SketchOperation::AddConstraint { constraint });
    }

    /// Toggle suppression state for a constraint by index
    pub fn toggle_constraint_suppression(&mut self, index: usize) -> bool {
        if let Some(entry) = self.constraints.get_mut(index) {
            entry.suppressed = !entry.suppressed;
            entry.suppressed
        } else {
            false
        }
    }

    /// Get active (non-suppressed) constraints
    pub fn active_constraints(&self) -> impl Iterator<Item = &SketchConstraint> {
        self.constraints.iter()
            .filter(|e| !e.suppressed)
            .map(|e| &e.constraint)
    }

    pub fn entity(&self, id: EntityId) -> Option<&SketchEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        id.is_origin() || self.entity(id).is_some()
    }

    /// Remove an entity together with every constraint and external
    /// reference pointing at it. Returns false if the id was unknown.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.id != id);
        if self.entities.len() == before {
            return false;
        }
        self.constraints.retain(|entry| !entry.constraint.references(id));
        self.external_references.remove(&id);
        if !id.is_preview() {
            self.history.push(SketchOperation::RemoveGeometry { id });
        }
        true
    }

    /// Style of the dimensional constraint at `index`, if it carries one.
    pub fn dimension_style_mut(&mut self, index: usize) -> Option<&mut DimensionStyle> {
        self.constraints.get_mut(index)?.constraint.dimension_style_mut()
    }

    // ---- preview handling: never recorded in history, never sent ----

    /// Insert or replace a preview entity.
    pub fn set_preview(&mut self, id: EntityId, geometry: SketchGeometry, is_construction: bool) {
        debug_assert!(id.is_preview());
        match self.entities.iter_mut().find(|e| e.id == id) {
            Some(existing) => {
                existing.geometry = geometry;
                existing.is_construction = is_construction;
            }
            None => self.entities.push(SketchEntity { id, geometry, is_construction }),
        }
    }

    pub fn remove_preview(&mut self, id: EntityId) {
        self.entities.retain(|e| e.id != id);
    }

    pub fn clear_previews(&mut self) {
        self.entities.retain(|e| !e.is_preview());
    }

    pub fn preview_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_preview()).count()
    }

    pub fn committed_entities(&self) -> impl Iterator<Item = &SketchEntity> {
        self.entities.iter().filter(|e| !e.is_preview())
    }

    /// Copy of this sketch without any preview entities; what goes on the wire.
    pub fn committed(&self) -> Sketch {
        let mut out = self.clone();
        out.clear_previews();
        out
    }

    /// Populates history from entities and constraints if history is empty.
    /// Sketches restored from older payloads may arrive without a log.
    pub fn ensure_history(&mut self) {
        if !self.history.is_empty() {
            return;
        }

        let geometry = self.entities.iter().filter(|e| !e.is_preview()).map(|entity| SketchOperation::AddGeometry {
            id: entity.id,
            geometry: entity.geometry.clone(),
        });
        let constraints = self.constraints.iter().map(|entry| SketchOperation::AddConstraint {
            constraint: entry.constraint.clone(),
        });
        self.history = geometry.chain(constraints).collect();
    }

    /// Checks that every constraint reference resolves to an entity
    /// (or the origin). Returns the offending constraint indices.
    pub fn dangling_constraints(&self) -> Vec<usize> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.constraint.referenced_entities().iter().any(|id| !self.contains(*id)))
            .map(|(i, _)| i)
            .collect()
    }
}
