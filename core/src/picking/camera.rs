use crate::geometry::utils_3d::Ray;
use crate::geometry::{Matrix4, Point3, Vector3};
use crate::sketch::types::SketchPlane;
use nalgebra::Perspective3;
use serde::{Deserialize, Serialize};

/// Pixel size of the canvas a screen position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Perspective look-at camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Point3,
    pub target: Point3,
    pub up: Vector3,
    /// Vertical field of view (radians)
    pub fov_y: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 50.0), Point3::origin())
    }
}

impl Camera {
    pub fn new(eye: Point3, target: Point3) -> Self {
        Self { eye, target, up: Vector3::y(), fov_y: 45f64.to_radians(), near: 0.1, far: 1000.0 }
    }

    /// Camera looking straight down the plane normal at the sketch origin,
    /// with the sketch y axis pointing up on screen.
    pub fn facing_plane(plane: &SketchPlane, distance: f64) -> Self {
        Self { up: plane.y_axis, ..Self::new(plane.origin + plane.normal * distance, plane.origin) }
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Matrix4 {
        Matrix4::look_at_rh(&self.eye, &self.target, &self.up)
    }

    pub fn projection_matrix(&self, aspect: f64) -> Matrix4 {
        Perspective3::new(aspect, self.fov_y, self.near, self.far).to_homogeneous()
    }

    pub fn view_projection(&self, viewport: &Viewport) -> Matrix4 {
        self.projection_matrix(viewport.aspect()) * self.view_matrix()
    }

    /// Ray from the eye through a screen position (pixels, origin top-left).
    pub fn screen_ray(&self, screen: [f64; 2], viewport: &Viewport) -> Option<Ray> {
        let ndc_x = screen[0] / viewport.width * 2.0 - 1.0;
        let ndc_y = 1.0 - screen[1] / viewport.height * 2.0;

        let inverse = self.view_projection(viewport).try_inverse()?;
        let near = inverse.transform_point(&Point3::new(ndc_x, ndc_y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc_x, ndc_y, 1.0));
        let direction = (far - near).try_normalize(1e-12)?;
        Some(Ray::new(self.eye, direction))
    }

    /// Screen position of a world point, or `None` behind the camera.
    pub fn project(&self, point: &Point3, viewport: &Viewport) -> Option<[f64; 2]> {
        let clip = self.view_projection(viewport) * point.to_homogeneous();
        if clip.w <= 0.0 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some([(ndc_x + 1.0) * 0.5 * viewport.width, (1.0 - ndc_y) * 0.5 * viewport.height])
    }
}
