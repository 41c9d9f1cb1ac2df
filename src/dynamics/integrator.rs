use crate::{core::body::Body, utils::math::wrap_angle};

/// Outcome of advancing a single body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    Advanced,
    /// Fixed bodies are held still.
    Held,
    /// Position became NaN or left the world; the body must be removed.
    Diverged,
}

/// Semi-implicit Euler integrator for 2D bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    /// Half-width of the square bodies must stay inside.
    pub world_bound: f64,
    /// Angular air friction coefficient; zero disables the term.
    pub angular_air_friction: f64,
}

impl Integrator {
    pub fn new(world_bound: f64, angular_air_friction: f64) -> Self {
        Self {
            world_bound,
            angular_air_friction,
        }
    }

    /// Advances `body` by `dt` using its current force list, then ages the list.
    pub fn step(&self, body: &mut Body, dt: f64) -> Integration {
        let outcome = if body.is_fixed() {
            body.velocity = glam::DVec2::ZERO;
            body.angular_velocity = 0.0;
            Integration::Held
        } else {
            self.integrate(body, dt);
            if self.diverged(body) {
                Integration::Diverged
            } else {
                Integration::Advanced
            }
        };
        body.forces.tick(dt);
        outcome
    }

    fn integrate(&self, body: &mut Body, dt: f64) {
        let net_force = body.forces.net_force();
        let net_torque = body.forces.net_torque(body.angle);
        let inertia = body.moment_of_inertia();

        body.velocity += net_force / body.mass() * dt;
        let angular_acceleration = if inertia > 0.0 {
            net_torque / inertia
        } else {
            0.0
        };
        let angular_drag = -self.angular_air_friction * body.angular_velocity;
        body.angular_velocity += (angular_acceleration + angular_drag) * dt;

        body.position += body.velocity * dt;
        body.angle = wrap_angle(body.angle + body.angular_velocity * dt);
    }

    fn diverged(&self, body: &Body) -> bool {
        let p = body.position;
        p.is_nan() || p.x.abs() > self.world_bound || p.y.abs() > self.world_bound
    }
}
