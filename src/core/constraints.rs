use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::{
        DEFAULT_HINGE_CONSTANT, DEFAULT_HINGE_DAMPING, GEOMETRY_EPSILON, SPRING_DAMPING_SCALE,
    },
    error::{Result, SandboxError},
    utils::allocator::EntityId,
};

/// One end of a spring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Endpoint {
    /// Anchored on a body at a local offset.
    Body { id: EntityId, offset: DVec2 },
    /// Anchored to a fixed point of the world.
    World { point: DVec2 },
}

impl Endpoint {
    pub fn body(id: EntityId, offset: DVec2) -> Self {
        Endpoint::Body { id, offset }
    }

    pub fn world(point: DVec2) -> Self {
        Endpoint::World { point }
    }

    pub fn body_id(&self) -> Option<EntityId> {
        match self {
            Endpoint::Body { id, .. } => Some(*id),
            Endpoint::World { .. } => None,
        }
    }
}

/// World-space state of an endpoint, sampled by the world before evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointState {
    pub point: DVec2,
    pub velocity: DVec2,
    /// Bound to a body that dynamics may move.
    pub movable: bool,
}

impl EndpointState {
    pub fn anchored(point: DVec2) -> Self {
        Self {
            point,
            velocity: DVec2::ZERO,
            movable: false,
        }
    }
}

/// Rigid-orientation extension that turns a spring into a locked hinge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HingeLock {
    /// Drive the primary body kinematically around the pivot.
    pub angle_lock: bool,
    /// Angle of the driven body relative to the pivot body when locked.
    pub relative_angle: f64,
}

/// Forces a spring evaluation asks the world to apply, in world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringForces {
    pub on_a: Option<DVec2>,
    pub on_b: Option<DVec2>,
}

/// Damped spring between two endpoints. A hinge is the stiff, zero-length variant.
///
/// The primary endpoint `a` is always a body; `b` may be a body or the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub body_a: EntityId,
    pub offset_a: DVec2,
    pub b: Endpoint,
    pub constant: f64,
    pub damping: f64,
    pub target_length: f64,
    pub hinge: Option<HingeLock>,
    /// Length measured by the last evaluation.
    pub current_length: f64,
    /// Rate at which the endpoints separate (negative when closing).
    pub extension_rate: f64,
    /// Scalar force of the last evaluation, positive when pushing apart.
    pub force: f64,
    /// Constant actually used by the last evaluation.
    pub effective_constant: f64,
}

impl Spring {
    pub fn new(
        body_a: EntityId,
        offset_a: DVec2,
        b: Endpoint,
        constant: f64,
        damping: f64,
        target_length: f64,
    ) -> Result<Self> {
        if !constant.is_finite() || constant < 0.0 {
            return Err(SandboxError::InvalidArgument(format!(
                "spring constant must be finite and non-negative, got {constant}"
            )));
        }
        if !damping.is_finite() || damping < 0.0 {
            return Err(SandboxError::InvalidArgument(format!(
                "spring damping must be finite and non-negative, got {damping}"
            )));
        }
        if !target_length.is_finite() || target_length < 0.0 {
            return Err(SandboxError::InvalidArgument(format!(
                "spring target length must be finite and non-negative, got {target_length}"
            )));
        }
        if b.body_id() == Some(body_a) {
            return Err(SandboxError::InvalidArgument(
                "spring endpoints must be different bodies".to_string(),
            ));
        }

        Ok(Self {
            body_a,
            offset_a,
            b,
            constant,
            damping,
            target_length,
            hinge: None,
            current_length: 0.0,
            extension_rate: 0.0,
            force: 0.0,
            effective_constant: constant,
        })
    }

    /// Hinge driving `body_a` around the pivot described by `pivot`.
    pub fn hinge(body_a: EntityId, offset_a: DVec2, pivot: Endpoint, angle_lock: bool) -> Result<Self> {
        let mut spring = Self::new(
            body_a,
            offset_a,
            pivot,
            DEFAULT_HINGE_CONSTANT,
            DEFAULT_HINGE_DAMPING,
            0.0,
        )?;
        spring.hinge = Some(HingeLock {
            angle_lock,
            relative_angle: 0.0,
        });
        Ok(spring)
    }

    pub fn is_hinge(&self) -> bool {
        self.hinge.is_some()
    }

    pub fn is_angle_locked(&self) -> bool {
        self.hinge.map(|h| h.angle_lock).unwrap_or(false)
    }

    pub fn body_b(&self) -> Option<EntityId> {
        self.b.body_id()
    }

    /// Bodies this spring depends on.
    pub fn bodies(&self) -> impl Iterator<Item = EntityId> {
        std::iter::once(self.body_a).chain(self.body_b())
    }

    /// Computes the spring force from sampled endpoint states.
    ///
    /// `stiffness_limit` caps the constant of hinges so the explicit integrator
    /// stays stable; plain springs ignore it.
    pub fn evaluate(
        &mut self,
        a: EndpointState,
        b: EndpointState,
        stiffness_limit: Option<f64>,
    ) -> SpringForces {
        self.effective_constant = match (self.is_hinge(), stiffness_limit) {
            (true, Some(limit)) => self.constant.min(limit),
            _ => self.constant,
        };

        let delta = b.point - a.point;
        let length = delta.length();
        let direction = if length > GEOMETRY_EPSILON {
            delta / length
        } else {
            DVec2::ZERO
        };

        self.current_length = length;
        self.extension_rate = (b.velocity - a.velocity).dot(direction);
        self.force = self.effective_constant * (self.target_length - length)
            - self.damping * self.extension_rate * SPRING_DAMPING_SCALE;

        let push = direction * self.force;
        match (a.movable, b.movable) {
            (true, true) => SpringForces {
                on_a: Some(-push * 0.5),
                on_b: Some(push * 0.5),
            },
            (true, false) => SpringForces {
                on_a: Some(-push),
                on_b: None,
            },
            (false, true) => SpringForces {
                on_a: None,
                on_b: Some(push),
            },
            (false, false) => SpringForces::default(),
        }
    }

    /// First-order look-ahead of the stored elastic energy half a step ahead.
    pub fn elastic_energy(&self, dt: f64) -> f64 {
        let predicted = self.current_length + self.extension_rate * dt * 0.5;
        let stretch = predicted - self.target_length;
        0.5 * self.effective_constant * stretch * stretch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn free(point: DVec2, velocity: DVec2) -> EndpointState {
        EndpointState {
            point,
            velocity,
            movable: true,
        }
    }

    fn spring(target: f64, damping: f64) -> Spring {
        Spring::new(
            EntityId::new(0, 0),
            DVec2::ZERO,
            Endpoint::body(EntityId::new(1, 0), DVec2::ZERO),
            10.0,
            damping,
            target,
        )
        .unwrap()
    }

    #[test]
    fn rest_length_without_damping_is_force_free() {
        let mut s = spring(2.0, 0.0);
        let out = s.evaluate(
            free(DVec2::ZERO, DVec2::new(0.3, 0.1)),
            free(DVec2::new(2.0, 0.0), DVec2::new(-0.2, 0.4)),
            None,
        );
        assert_eq!(s.force, 0.0);
        assert_eq!(out.on_a, Some(DVec2::ZERO));
        assert_eq!(out.on_b, Some(DVec2::ZERO));
    }

    #[test]
    fn stretched_spring_pulls_both_ends_by_half() {
        let mut s = spring(1.0, 0.0);
        let out = s.evaluate(
            free(DVec2::ZERO, DVec2::ZERO),
            free(DVec2::new(3.0, 0.0), DVec2::ZERO),
            None,
        );
        assert_relative_eq!(s.force, -20.0);
        assert_eq!(out.on_a, Some(DVec2::new(10.0, 0.0)));
        assert_eq!(out.on_b, Some(DVec2::new(-10.0, 0.0)));
    }

    #[test]
    fn anchored_end_hands_full_force_to_movable_end() {
        let mut s = spring(1.0, 0.0);
        let out = s.evaluate(
            free(DVec2::ZERO, DVec2::ZERO),
            EndpointState::anchored(DVec2::new(3.0, 0.0)),
            None,
        );
        assert_eq!(out.on_a, Some(DVec2::new(20.0, 0.0)));
        assert_eq!(out.on_b, None);
    }

    #[test]
    fn damping_opposes_separation() {
        let mut s = spring(1.0, 0.5);
        s.evaluate(
            free(DVec2::ZERO, DVec2::ZERO),
            free(DVec2::new(1.0, 0.0), DVec2::new(1.0, 0.0)),
            None,
        );
        assert_relative_eq!(s.extension_rate, 1.0);
        assert_relative_eq!(s.force, -10.0);
    }

    #[test]
    fn hinge_constant_is_clamped_by_limit() {
        let mut hinge = Spring::hinge(
            EntityId::new(0, 0),
            DVec2::ZERO,
            Endpoint::world(DVec2::ZERO),
            false,
        )
        .unwrap();
        hinge.evaluate(
            free(DVec2::new(0.0, -0.1), DVec2::ZERO),
            EndpointState::anchored(DVec2::ZERO),
            Some(2500.0),
        );
        assert_relative_eq!(hinge.effective_constant, 2500.0);
        assert_relative_eq!(hinge.force, -250.0);
    }

    #[test]
    fn elastic_energy_looks_half_a_step_ahead() {
        let mut s = spring(1.0, 0.0);
        s.evaluate(
            free(DVec2::ZERO, DVec2::ZERO),
            free(DVec2::new(2.0, 0.0), DVec2::new(2.0, 0.0)),
            None,
        );
        // predicted length 2 + 2 * 0.1 * 0.5 = 2.1, stretch 1.1
        assert_relative_eq!(s.elastic_energy(0.1), 0.5 * 10.0 * 1.1 * 1.1, epsilon = 1e-12);
    }

    #[test]
    fn invalid_springs_are_rejected() {
        let id = EntityId::new(0, 0);
        assert!(Spring::new(id, DVec2::ZERO, Endpoint::body(id, DVec2::ZERO), 1.0, 0.0, 1.0).is_err());
        assert!(Spring::new(id, DVec2::ZERO, Endpoint::world(DVec2::ZERO), f64::NAN, 0.0, 1.0).is_err());
        assert!(Spring::new(id, DVec2::ZERO, Endpoint::world(DVec2::ZERO), 1.0, -1.0, 1.0).is_err());
    }
}
