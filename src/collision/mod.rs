//! Collision detection and response: oriented-box SAT, contact points, resolver.

pub mod contact;
pub mod resolver;
pub mod sat;

pub use contact::{contact_points, contact_weights, Contact};
pub use resolver::{resolve, restitution_exchange, should_collide};
pub use sat::{detect, detect_bodies, AxisMode};
