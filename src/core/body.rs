use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{
    shape::Shape,
    types::{Color, Material, COLLIDE_ALL},
};
use crate::{
    dynamics::forces::ForceList,
    error::{Result, SandboxError},
    utils::{
        allocator::EntityId,
        math::{cross_scalar, rotate},
    },
};

/// Physical body: kinematic state, mass properties, material and force list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: DVec2,
    pub angle: f64,
    pub velocity: DVec2,
    pub angular_velocity: f64,
    mass: f64,
    pub shape: Shape,
    pub material: Material,
    pub color: Color,
    pub collision_mask: u32,
    /// Immovable scenery.
    pub wall: bool,
    /// Held in place by an external collaborator (e.g. a drag handle).
    pub pinned: bool,
    /// Frozen by the user.
    pub locked: bool,
    /// Placed kinematically by an angle-locked hinge.
    pub hinge_driven: bool,
    pub forces: ForceList,
    /// Bodies this one never collides with (hinge partners).
    pub collision_ignore: BTreeSet<EntityId>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            angle: 0.0,
            velocity: DVec2::ZERO,
            angular_velocity: 0.0,
            mass: 1.0,
            shape: Shape::default(),
            material: Material::default(),
            color: Color::default(),
            collision_mask: COLLIDE_ALL,
            wall: false,
            pinned: false,
            locked: false,
            hinge_driven: false,
            forces: ForceList::new(),
            collision_ignore: BTreeSet::new(),
        }
    }
}

impl Body {
    pub fn new(shape: Shape, position: DVec2) -> Self {
        Self {
            shape,
            position,
            ..Self::default()
        }
    }

    /// A body whose mass follows its area at the given density.
    pub fn with_density(shape: Shape, position: DVec2, density: f64) -> Result<Self> {
        let mut body = Self::new(shape, position);
        body.set_mass(density * body.area())?;
        Ok(body)
    }

    pub fn wall(shape: Shape, position: DVec2) -> Self {
        Self {
            wall: true,
            ..Self::new(shape, position)
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(SandboxError::InvalidArgument(format!(
                "mass must be positive and finite, got {mass}"
            )));
        }
        self.mass = mass;
        Ok(())
    }

    /// Excluded from dynamic integration.
    pub fn is_fixed(&self) -> bool {
        self.wall || self.pinned || self.locked || self.hinge_driven
    }

    /// Mass seen by collisions: infinite for fixed bodies.
    pub fn effective_mass(&self) -> f64 {
        if self.is_fixed() {
            f64::INFINITY
        } else {
            self.mass
        }
    }

    pub fn area(&self) -> f64 {
        self.shape.area()
    }

    pub fn inertia_multiplier(&self) -> f64 {
        self.shape.inertia_multiplier()
    }

    pub fn moment_of_inertia(&self) -> f64 {
        self.mass * self.inertia_multiplier()
    }

    pub fn is_attractor(&self) -> bool {
        self.material.attraction != 0.0
    }

    pub fn world_vertices(&self) -> Vec<DVec2> {
        self.shape.world_vertices(self.position, self.angle)
    }

    pub fn world_point(&self, local: DVec2) -> DVec2 {
        self.position + rotate(local, self.angle)
    }

    pub fn local_point(&self, world: DVec2) -> DVec2 {
        rotate(world - self.position, -self.angle)
    }

    /// Velocity of the material point currently at `world`.
    pub fn point_velocity(&self, world: DVec2) -> DVec2 {
        self.velocity + cross_scalar(self.angular_velocity, world - self.position)
    }

    pub fn kinetic_energy(&self) -> f64 {
        if self.is_fixed() {
            return 0.0;
        }
        0.5 * self.mass * self.velocity.length_squared()
            + 0.5 * self.moment_of_inertia() * self.angular_velocity * self.angular_velocity
    }

    /// Applies an instantaneous impulse at a world point.
    pub fn apply_impulse(&mut self, impulse: DVec2, world_point: DVec2) {
        if self.is_fixed() {
            return;
        }
        self.velocity += impulse / self.mass;
        let inertia = self.moment_of_inertia();
        if inertia > 0.0 {
            self.angular_velocity += (world_point - self.position).perp_dot(impulse) / inertia;
        }
    }
}
