//! Core types describing simulated entities and shared data.

pub mod attachments;
pub mod body;
pub mod constraints;
pub mod entity;
pub mod shape;
pub mod types;

pub use attachments::{Thruster, Tracer};
pub use body::Body;
pub use constraints::{Endpoint, EndpointState, HingeLock, Spring, SpringForces};
pub use entity::{Entity, EntityKind};
pub use shape::Shape;
pub use types::{Color, Material, COLLIDE_ALL};
