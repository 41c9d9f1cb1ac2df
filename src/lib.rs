//! Sandbox Physics – a 2D rigid-body, constraint and optics engine.
//!
//! The crate simulates bodies driven by explicit force lists, resolves their
//! collisions with a separating-axis detector and an impulse/force resolver,
//! couples them with damped springs and hinges, and traces laser light
//! through reflective and refractive bodies. A [`World`] owns everything and
//! is advanced with [`World::step`]; [`PhysicsThread`] runs one on a
//! dedicated thread and publishes immutable snapshots.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod optics;
pub mod runner;
pub mod utils;
pub mod world;

pub use glam::DVec2;

pub use collision::{AxisMode, Contact};
pub use config::SimulationSettings;
pub use core::{
    Body, Color, Endpoint, Entity, EntityKind, Material, Shape, Spring, Thruster, Tracer,
    COLLIDE_ALL,
};
pub use dynamics::{Force, ForceKind, ForceList};
pub use error::{Result, SandboxError};
pub use optics::{Laser, LaserRay};
pub use runner::PhysicsThread;
pub use utils::allocator::{Arena, EntityId};
pub use world::{
    EnergyReport, PropertyValue, StepReport, World, WorldEvent, WorldSnapshot,
};
