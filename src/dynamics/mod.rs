//! Simulation dynamics: force accumulation, fields and integration.

pub mod fields;
pub mod forces;
pub mod integrator;

pub use fields::{attraction_energy, attraction_force, buoyancy_force, gravity_force, Attractor};
pub use forces::{Force, ForceKind, ForceList};
pub use integrator::{Integration, Integrator};
