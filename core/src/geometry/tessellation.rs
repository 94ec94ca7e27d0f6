//! Render buffers for solid bodies as delivered by `RENDER_UPDATE:`.
//!
//! The layout mirrors what the solver process serialises: one shared vertex
//! buffer, with triangles, edge segments and vertex points each carrying the
//! `TopoId` of the face/edge/vertex they belong to.

use super::Point3;
use crate::topo::naming::TopoId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tessellation {
    pub vertices: Vec<f32>, // Flattened x, y, z
    pub indices: Vec<u32>,  // Triangle indices
    #[serde(default)]
    pub normals: Vec<f32>,  // Flattened nx, ny, nz
    pub triangle_ids: Vec<TopoId>, // Maps triangle index -> TopoId

    #[serde(default)]
    pub line_indices: Vec<u32>, // Pairs of indices into vertices
    #[serde(default)]
    pub line_ids: Vec<TopoId>, // Maps line segment index -> TopoId

    #[serde(default)]
    pub point_indices: Vec<u32>, // Indices into vertices
    #[serde(default)]
    pub point_ids: Vec<TopoId>, // Maps point index -> TopoId
}

impl Tessellation {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_vertex(&mut self, p: Point3) -> u32 {
        let idx = (self.vertices.len() / 3) as u32;
        self.vertices.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        idx
    }

    pub fn add_triangle(&mut self, p1: Point3, p2: Point3, p3: Point3, id: TopoId) {
        let normal = (p2 - p1).cross(&(p3 - p1)).normalize();
        for p in [p1, p2, p3] {
            let idx = self.push_vertex(p);
            self.indices.push(idx);
            self.normals.extend_from_slice(&[normal.x as f32, normal.y as f32, normal.z as f32]);
        }
        self.triangle_ids.push(id);
    }

    pub fn add_line(&mut self, p1: Point3, p2: Point3, id: TopoId) {
        for p in [p1, p2] {
            let idx = self.push_vertex(p);
            self.line_indices.push(idx);
            self.normals.extend_from_slice(&[0.0, 1.0, 0.0]);
        }
        self.line_ids.push(id);
    }

    pub fn add_point(&mut self, p: Point3, id: TopoId) {
        let idx = self.push_vertex(p);
        self.point_indices.push(idx);
        self.normals.extend_from_slice(&[0.0, 1.0, 0.0]);
        self.point_ids.push(id);
    }

    /// Position of vertex `index`, if the buffer holds it.
    pub fn vertex(&self, index: u32) -> Option<Point3> {
        let base = index as usize * 3;
        let v = self.vertices.get(base..base + 3)?;
        Some(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
    }

    /// Iterate triangles as (v0, v1, v2, id); malformed entries are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = (Point3, Point3, Point3, TopoId)> + '_ {
        self.indices
            .chunks_exact(3)
            .zip(self.triangle_ids.iter())
            .filter_map(|(tri, id)| {
                Some((self.vertex(tri[0])?, self.vertex(tri[1])?, self.vertex(tri[2])?, *id))
            })
    }

    /// Iterate edge segments as (start, end, id).
    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3, TopoId)> + '_ {
        self.line_indices
            .chunks_exact(2)
            .zip(self.line_ids.iter())
            .filter_map(|(seg, id)| Some((self.vertex(seg[0])?, self.vertex(seg[1])?, *id)))
    }

    /// Iterate vertex points as (position, id).
    pub fn points(&self) -> impl Iterator<Item = (Point3, TopoId)> + '_ {
        self.point_indices
            .iter()
            .zip(self.point_ids.iter())
            .filter_map(|(idx, id)| Some((self.vertex(*idx)?, *id)))
    }

    /// All segments belonging to one edge, in buffer order.
    pub fn edge_segments(&self, id: &TopoId) -> Vec<(Point3, Point3)> {
        self.segments()
            .filter(|(_, _, seg_id)| seg_id == id)
            .map(|(a, b, _)| (a, b))
            .collect()
    }

    /// Position of a topological vertex.
    pub fn vertex_position(&self, id: &TopoId) -> Option<Point3> {
        self.points().find(|(_, pid)| pid == id).map(|(p, _)| p)
    }
}
