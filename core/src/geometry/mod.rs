//! Math shared by the sketch layer and picking: plain `[f64; 2]` helpers
//! for sketch-local work, nalgebra types for world space.

use nalgebra as na;

pub type Point3 = na::Point3<f64>;
pub type Vector3 = na::Vector3<f64>;
pub type Matrix4 = na::Matrix4<f64>;

pub mod utils_2d;
pub mod utils_3d;

pub mod tessellation;
pub use tessellation::Tessellation;
