//! Laser light sources and the recursive ray tracer.

pub mod laser;
pub mod raytrace;

pub use laser::{Laser, LaserRay, AMBIENT_REFRACTIVE_INDEX};
pub use raytrace::{collect_edges, reflectance, OpticalEdge, TraceContext};
