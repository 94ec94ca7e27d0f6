//! 3D geometry utilities for picking.
//!
//! Ray casting against planes, triangles, segments and points. All
//! intersection routines return `None` instead of failing.

use super::{Point3, Vector3};

/// Tolerance for floating-point comparisons
pub const EPSILON: f64 = 1e-6;

// =============================================================================
// Plane Representation
// =============================================================================

/// A plane defined by a point and a normal vector.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vector3,
}

impl Plane {
    /// Create a new plane from origin point and normal vector.
    pub fn new(origin: Point3, normal: Vector3) -> Self {
        Self {
            origin,
            normal: normal.normalize(),
        }
    }

    /// Signed distance from a point to this plane.
    /// Positive = point is on the side the normal points to.
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Check if a point lies on this plane (within tolerance).
    pub fn contains_point(&self, point: &Point3) -> bool {
        self.signed_distance(point).abs() < EPSILON
    }
}

// =============================================================================
// Ray Representation
// =============================================================================

/// A ray defined by an origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at parameter t.
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

// =============================================================================
// Intersections
// =============================================================================

/// Intersect a ray with a plane.
/// Returns Some(t, point) where t is the ray parameter, or None if parallel.
pub fn ray_plane_intersect(ray: &Ray, plane: &Plane) -> Option<(f64, Point3)> {
    let denom = plane.normal.dot(&ray.direction);

    if denom.abs() < EPSILON {
        return None; // Ray is parallel to plane
    }

    let t = plane.normal.dot(&(plane.origin - ray.origin)) / denom;

    if t < 0.0 {
        return None; // Intersection is behind ray origin
    }

    Some((t, ray.at(t)))
}

/// Ray-triangle intersection using Möller–Trumbore algorithm.
/// Returns Some((t, u, v)) where t is ray param, u,v are barycentric coords.
pub fn ray_triangle_intersect(
    ray: &Ray,
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
) -> Option<(f64, f64, f64)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < EPSILON {
        return None; // Ray is parallel to triangle
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);

    if t > EPSILON {
        Some((t, u, v))
    } else {
        None
    }
}

/// Closest approach between a ray and a point.
/// Returns (t, distance) for the ray parameter of closest approach, or None
/// if the point is behind the ray origin.
pub fn ray_point_distance(ray: &Ray, point: &Point3) -> Option<(f64, f64)> {
    let t = ray.direction.dot(&(point - ray.origin));
    if t < 0.0 {
        return None;
    }
    Some((t, (ray.at(t) - point).norm()))
}

/// Closest approach between a ray and a bounded segment.
/// Returns (t, distance) where t is the ray parameter of the closest point.
pub fn ray_segment_distance(ray: &Ray, a: &Point3, b: &Point3) -> Option<(f64, f64)> {
    let seg = b - a;
    let seg_len_sq = seg.norm_squared();
    if seg_len_sq < EPSILON * EPSILON {
        return ray_point_distance(ray, a);
    }

    let w0 = ray.origin - a;
    let d_dot_s = ray.direction.dot(&seg);
    let d_dot_w = ray.direction.dot(&w0);
    let s_dot_w = seg.dot(&w0);
    let denom = seg_len_sq - d_dot_s * d_dot_s;

    // Parallel: measure from the segment start
    let s = if denom.abs() < EPSILON {
        0.0
    } else {
        ((s_dot_w - d_dot_s * d_dot_w) / denom).clamp(0.0, 1.0)
    };

    let on_segment = a + seg * s;
    let t = ray.direction.dot(&(on_segment - ray.origin));
    if t < 0.0 {
        return None;
    }
    Some((t, (ray.at(t) - on_segment).norm()))
}
