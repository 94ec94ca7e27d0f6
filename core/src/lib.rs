pub mod config;
pub mod geometry;
pub mod picking;
pub mod protocol;
pub mod session;
pub mod sketch;
pub mod topo;

pub fn version() -> &'static str {
    "0.1.0"
}
