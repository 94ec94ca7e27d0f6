//! Mapping between sketch-local 2D coordinates and 3D world space.
//!
//! `to_world` and `to_local` are exact inverses for points on the plane.
//! Nothing here fails: a `SketchPlane` is assumed well formed, which the
//! constructors below guarantee.

use super::types::SketchPlane;
use crate::geometry::utils_3d::Plane;
use crate::geometry::{Point3, Vector3};

/// Maximum |n · hint| before the hint axis is considered too close to the
/// normal to derive a stable in-plane x axis from.
const HINT_ALIGNMENT_LIMIT: f64 = 0.9;

impl SketchPlane {
    /// Build a plane from explicit axes. `x_axis` and `y_axis` are
    /// normalised and the normal is derived so the frame is right-handed.
    pub fn new(origin: Point3, x_axis: Vector3, y_axis: Vector3) -> Self {
        let x_axis = x_axis.normalize();
        let y_axis = y_axis.normalize();
        Self { origin, normal: x_axis.cross(&y_axis), x_axis, y_axis }
    }

    /// World XY plane, normal +Z.
    pub fn xy() -> Self {
        Self::default()
    }

    /// World XZ plane: local x = +X, local y = +Z, normal -Y.
    pub fn xz() -> Self {
        Self::new(Point3::origin(), Vector3::x(), Vector3::z())
    }

    /// World YZ plane: local x = +Y, local y = +Z, normal +X.
    pub fn yz() -> Self {
        Self::new(Point3::origin(), Vector3::y(), Vector3::z())
    }

    /// Plane through `origin` with the given normal, e.g. a picked face.
    /// The x axis is world X projected into the plane, or world Y when
    /// X is nearly parallel to the normal. Returns `None` for a zero normal.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Option<Self> {
        let n = normal.try_normalize(1e-12)?;
        let hint = if n.dot(&Vector3::x()).abs() < HINT_ALIGNMENT_LIMIT {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let x_axis = (hint - n * n.dot(&hint)).normalize();
        let y_axis = n.cross(&x_axis);
        Some(Self { origin, normal: n, x_axis, y_axis })
    }

    /// Unit axes, mutually perpendicular, and `x × y == normal`.
    pub fn is_orthonormal(&self) -> bool {
        const TOL: f64 = 1e-9;
        let unit = |v: &Vector3| (v.norm() - 1.0).abs() < TOL;
        unit(&self.x_axis)
            && unit(&self.y_axis)
            && unit(&self.normal)
            && self.x_axis.dot(&self.y_axis).abs() < TOL
            && (self.x_axis.cross(&self.y_axis) - self.normal).norm() < TOL
    }

    pub fn to_world(&self, u: f64, v: f64) -> Point3 {
        self.origin + self.x_axis * u + self.y_axis * v
    }

    pub fn to_local(&self, world: &Point3) -> [f64; 2] {
        let d = world - self.origin;
        [d.dot(&self.x_axis), d.dot(&self.y_axis)]
    }

    /// The plane as a raycast target.
    pub fn as_plane(&self) -> Plane {
        Plane::new(self.origin, self.normal)
    }
}

/// `origin + u·x_axis + v·y_axis`.
pub fn to_world(u: f64, v: f64, plane: &SketchPlane) -> Point3 {
    plane.to_world(u, v)
}

/// Dot products of `(world - origin)` with the plane's x and y axes.
pub fn to_local(world: &Point3, plane: &SketchPlane) -> [f64; 2] {
    plane.to_local(world)
}
