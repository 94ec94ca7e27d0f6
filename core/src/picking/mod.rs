//! Screen-space picking.
//!
//! A click is resolved against target groups in a fixed order: dimension
//! hitboxes, sketch entities, snap markers, then the solid tessellation.
//! The first group with any hit decides. Inside a group, hits are ordered by
//! ray distance; hits within `DISTANCE_TIE` of each other fall back to type
//! priority and then to how close the ray passed. A click that hits nothing
//! resolves to the point where the ray meets the sketch plane.

pub mod camera;

pub use camera::{Camera, Viewport};

use crate::config::EngineConfig;
use crate::geometry::utils_2d::distance;
use crate::geometry::utils_3d::{ray_plane_intersect, ray_point_distance, ray_segment_distance, ray_triangle_intersect, Ray};
use crate::geometry::{Point3, Tessellation};
use crate::sketch::dimension::DimensionHitbox;
use crate::sketch::query::{distance_to_entity, entity_points};
use crate::sketch::snap::SnapPoint;
use crate::sketch::types::{ConstraintPoint, Sketch, SketchPlane};
use crate::topo::naming::{TopoId, TopoRank};
use crate::topo::{EntityId, SelectionFilter};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ray distances closer than this are treated as equal.
pub const DISTANCE_TIE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickTarget {
    Dimension { constraint_index: usize },
    SketchPoint(ConstraintPoint),
    SketchEntity(EntityId),
    SnapMarker { position: [f64; 2], point: Option<ConstraintPoint> },
    Solid(TopoId),
}

impl PickTarget {
    /// Tie-break score: interactive and more specific targets first.
    pub fn priority(&self) -> u8 {
        match self {
            PickTarget::Dimension { .. } => 6,
            PickTarget::SketchPoint(_) => 5,
            PickTarget::SketchEntity(_) => 4,
            PickTarget::SnapMarker { .. } => 3,
            PickTarget::Solid(id) => match id.rank {
                TopoRank::Vertex => 2,
                TopoRank::Edge => 1,
                _ => 0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub target: PickTarget,
    /// Ray parameter of the hit.
    pub distance: f64,
    pub world: Point3,
    /// Sketch-plane coordinates of the hit, if the ray meets the plane.
    pub local: Option<[f64; 2]>,
    /// How far the ray passed from the target (0 for surfaces).
    pub miss: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickResult {
    Hit(PickHit),
    /// Nothing pickable; the ray met the sketch plane here.
    EmptySpace { local: [f64; 2], world: Point3 },
    Nothing,
}

impl PickResult {
    pub fn hit(&self) -> Option<&PickHit> {
        match self {
            PickResult::Hit(hit) => Some(hit),
            _ => None,
        }
    }

    /// Sketch-plane position of the click, whatever it landed on.
    pub fn local(&self) -> Option<[f64; 2]> {
        match self {
            PickResult::Hit(hit) => hit.local,
            PickResult::EmptySpace { local, .. } => Some(*local),
            PickResult::Nothing => None,
        }
    }
}

/// Everything a click can land on.
pub struct PickScene<'a> {
    pub plane: &'a SketchPlane,
    pub sketch: Option<&'a Sketch>,
    pub hitboxes: &'a [DimensionHitbox],
    pub snap_markers: &'a [SnapPoint],
    pub solid: Option<&'a Tessellation>,
    pub filter: SelectionFilter,
    pub config: &'a EngineConfig,
}

impl<'a> PickScene<'a> {
    pub fn new(plane: &'a SketchPlane, config: &'a EngineConfig) -> Self {
        Self { plane, sketch: None, hitboxes: &[], snap_markers: &[], solid: None, filter: SelectionFilter::Any, config }
    }
}

fn compare_hits(a: &PickHit, b: &PickHit) -> Ordering {
    if (a.distance - b.distance).abs() > DISTANCE_TIE {
        return a.distance.total_cmp(&b.distance);
    }
    b.target
        .priority()
        .cmp(&a.target.priority())
        .then(a.miss.total_cmp(&b.miss))
        .then(a.distance.total_cmp(&b.distance))
}

/// Best hit of one group.
fn first_hit(mut hits: Vec<PickHit>) -> Option<PickHit> {
    hits.sort_by(compare_hits);
    hits.into_iter().next()
}

/// Where the ray meets the sketch plane.
struct PlaneHit {
    t: f64,
    world: Point3,
    local: [f64; 2],
}

fn plane_hit(ray: &Ray, plane: &SketchPlane) -> Option<PlaneHit> {
    let (t, world) = ray_plane_intersect(ray, &plane.as_plane())?;
    Some(PlaneHit { t, world, local: plane.to_local(&world) })
}

fn planar(target: PickTarget, at: &PlaneHit, miss: f64) -> PickHit {
    PickHit { target, distance: at.t, world: at.world, local: Some(at.local), miss }
}

fn dimension_hits(scene: &PickScene, at: &PlaneHit) -> Vec<PickHit> {
    scene
        .hitboxes
        .iter()
        .filter(|h| h.contains(at.local))
        .map(|h| planar(PickTarget::Dimension { constraint_index: h.constraint_index }, at, distance(h.center, at.local)))
        .collect()
}

fn sketch_hits(scene: &PickScene, at: &PlaneHit) -> Vec<PickHit> {
    let Some(sketch) = scene.sketch else { return Vec::new() };
    let threshold = scene.config.entity_pick_threshold;
    let mut hits = Vec::new();
    for entity in sketch.committed_entities() {
        for (index, pos) in entity_points(entity) {
            let d = distance(pos, at.local);
            if d <= threshold {
                hits.push(planar(PickTarget::SketchPoint(ConstraintPoint::new(entity.id, index)), at, d));
            }
        }
        let d = distance_to_entity(entity, at.local);
        if d <= threshold {
            hits.push(planar(PickTarget::SketchEntity(entity.id), at, d));
        }
    }
    hits
}

fn snap_marker_hits(scene: &PickScene, at: &PlaneHit) -> Vec<PickHit> {
    let radius = scene.config.snap.snap_radius;
    scene
        .snap_markers
        .iter()
        .filter_map(|m| {
            let d = distance(m.position, at.local);
            (d <= radius).then(|| planar(PickTarget::SnapMarker { position: m.position, point: m.point }, at, d))
        })
        .collect()
}

fn solid_hits(scene: &PickScene, ray: &Ray) -> Vec<PickHit> {
    let Some(solid) = scene.solid else { return Vec::new() };
    let config = scene.config;
    let filter = scene.filter;
    let local = |world: &Point3| Some(scene.plane.to_local(world));
    let mut hits = Vec::new();

    for (a, b, c, id) in solid.triangles() {
        if !filter.accepts(id.rank) {
            continue;
        }
        if let Some((t, _, _)) = ray_triangle_intersect(ray, &a, &b, &c) {
            let world = ray.at(t);
            hits.push(PickHit { target: PickTarget::Solid(id), distance: t, world, local: local(&world), miss: 0.0 });
        }
    }
    for (a, b, id) in solid.segments() {
        if !filter.accepts(id.rank) {
            continue;
        }
        if let Some((t, d)) = ray_segment_distance(ray, &a, &b) {
            if d <= config.edge_pick_tolerance {
                let world = ray.at(t);
                hits.push(PickHit { target: PickTarget::Solid(id), distance: t, world, local: local(&world), miss: d });
            }
        }
    }
    for (p, id) in solid.points() {
        if !filter.accepts(id.rank) {
            continue;
        }
        if let Some((t, d)) = ray_point_distance(ray, &p) {
            if d <= config.vertex_pick_tolerance {
                hits.push(PickHit { target: PickTarget::Solid(id), distance: t, world: p, local: local(&p), miss: d });
            }
        }
    }
    hits
}

/// Resolve a ray against the scene.
pub fn pick(scene: &PickScene, ray: &Ray) -> PickResult {
    let at = plane_hit(ray, scene.plane);

    if let Some(at) = &at {
        let planar_groups: [fn(&PickScene, &PlaneHit) -> Vec<PickHit>; 3] = [dimension_hits, sketch_hits, snap_marker_hits];
        for group in planar_groups {
            if let Some(hit) = first_hit(group(scene, at)) {
                return PickResult::Hit(hit);
            }
        }
    }
    if let Some(hit) = first_hit(solid_hits(scene, ray)) {
        return PickResult::Hit(hit);
    }

    match at {
        Some(at) => PickResult::EmptySpace { local: at.local, world: at.world },
        None => PickResult::Nothing,
    }
}

/// Cast from a screen position and resolve.
pub fn pick_screen(scene: &PickScene, camera: &Camera, viewport: &Viewport, screen: [f64; 2]) -> PickResult {
    match camera.screen_ray(screen, viewport) {
        Some(ray) => pick(scene, &ray),
        None => PickResult::Nothing,
    }
}
