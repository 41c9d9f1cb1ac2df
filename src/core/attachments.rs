use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SandboxError},
    utils::{allocator::EntityId, math::from_polar},
};

/// Constant-magnitude engine mounted on a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thruster {
    pub body: EntityId,
    /// Mount point in the body's local frame.
    pub offset: DVec2,
    /// Thrust direction in the body's local frame.
    pub direction: f64,
    pub strength: f64,
    pub enabled: bool,
}

impl Thruster {
    pub fn new(body: EntityId, offset: DVec2, direction: f64, strength: f64) -> Result<Self> {
        if !strength.is_finite() {
            return Err(SandboxError::InvalidArgument(format!(
                "thruster strength must be finite, got {strength}"
            )));
        }
        Ok(Self {
            body,
            offset,
            direction,
            strength,
            enabled: true,
        })
    }

    /// World-frame thrust for a body rotated by `body_angle`.
    pub fn force(&self, body_angle: f64) -> DVec2 {
        if !self.enabled {
            return DVec2::ZERO;
        }
        from_polar(self.strength, self.direction + body_angle)
    }
}

/// Records the world-space trail of a point attached to a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracer {
    pub body: EntityId,
    pub offset: DVec2,
    pub max_points: usize,
    /// Samples closer than this to the previous one are skipped.
    pub min_spacing: f64,
    points: VecDeque<DVec2>,
}

impl Tracer {
    pub fn new(body: EntityId, offset: DVec2, max_points: usize) -> Result<Self> {
        if max_points == 0 {
            return Err(SandboxError::InvalidArgument(
                "tracer needs room for at least one point".to_string(),
            ));
        }
        Ok(Self {
            body,
            offset,
            max_points,
            min_spacing: 0.0,
            points: VecDeque::with_capacity(max_points),
        })
    }

    pub fn sample(&mut self, point: DVec2) {
        if let Some(last) = self.points.back() {
            if last.distance(point) < self.min_spacing {
                return;
            }
        }
        if self.points.len() == self.max_points {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn points(&self) -> impl Iterator<Item = &DVec2> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn thrust_follows_body_rotation() {
        let thruster = Thruster::new(EntityId::new(0, 0), DVec2::ZERO, 0.0, 5.0).unwrap();
        let f = thruster.force(std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(f.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(f.y, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn disabled_thruster_is_silent() {
        let mut thruster = Thruster::new(EntityId::new(0, 0), DVec2::ZERO, 0.0, 5.0).unwrap();
        thruster.enabled = false;
        assert_eq!(thruster.force(0.0), DVec2::ZERO);
    }

    #[test]
    fn tracer_keeps_latest_points() {
        let mut tracer = Tracer::new(EntityId::new(0, 0), DVec2::ZERO, 2).unwrap();
        tracer.sample(DVec2::new(0.0, 0.0));
        tracer.sample(DVec2::new(1.0, 0.0));
        tracer.sample(DVec2::new(2.0, 0.0));
        let xs: Vec<f64> = tracer.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
    }

    #[test]
    fn tracer_skips_close_samples() {
        let mut tracer = Tracer::new(EntityId::new(0, 0), DVec2::ZERO, 8).unwrap();
        tracer.min_spacing = 0.5;
        tracer.sample(DVec2::ZERO);
        tracer.sample(DVec2::new(0.1, 0.0));
        tracer.sample(DVec2::new(0.6, 0.0));
        assert_eq!(tracer.len(), 2);
    }
}
