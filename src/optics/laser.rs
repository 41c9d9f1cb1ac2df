use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::DEFAULT_FADE_DISTANCE,
    core::types::Color,
    error::{Result, SandboxError},
    utils::{allocator::EntityId, math::from_polar},
};

/// Refractive index of the space between bodies.
pub const AMBIENT_REFRACTIVE_INDEX: f64 = 1.0;

/// One straight segment of a laser's ray tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserRay {
    pub origin: DVec2,
    /// Direction of travel in world frame.
    pub angle: f64,
    pub length: f64,
    pub color: Color,
    /// Index of the medium the ray travels through.
    pub refractive_index: f64,
    pub depth: u32,
    /// Position of the parent ray in the owning laser's ray list.
    pub parent: Option<usize>,
}

impl LaserRay {
    pub fn direction(&self) -> DVec2 {
        from_polar(1.0, self.angle)
    }

    pub fn end(&self) -> DVec2 {
        self.origin + self.direction() * self.length
    }
}

/// Light source mounted on a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    pub body: EntityId,
    pub offset: DVec2,
    /// Beam direction in the body's local frame.
    pub direction: f64,
    pub color: Color,
    /// Total path length after which light is gone.
    pub fade_distance: f64,
    pub enabled: bool,
    rays: Vec<LaserRay>,
}

impl Laser {
    pub fn new(body: EntityId, offset: DVec2, direction: f64) -> Self {
        Self {
            body,
            offset,
            direction,
            color: Color::RED,
            fade_distance: DEFAULT_FADE_DISTANCE,
            enabled: true,
            rays: Vec::new(),
        }
    }

    pub fn with_fade_distance(mut self, fade_distance: f64) -> Result<Self> {
        if !(fade_distance > 0.0) {
            return Err(SandboxError::InvalidArgument(format!(
                "fade distance must be positive, got {fade_distance}"
            )));
        }
        self.fade_distance = fade_distance;
        Ok(self)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Rays produced by the most recent step.
    pub fn rays(&self) -> &[LaserRay] {
        &self.rays
    }

    pub(crate) fn set_rays(&mut self, rays: Vec<LaserRay>) {
        self.rays = rays;
    }

    /// Root ray for a source body at `position` rotated by `angle`.
    pub fn root_ray(&self, position: DVec2, angle: f64) -> LaserRay {
        LaserRay {
            origin: position + crate::utils::math::rotate(self.offset, angle),
            angle: angle + self.direction,
            length: self.fade_distance,
            color: self.color,
            refractive_index: AMBIENT_REFRACTIVE_INDEX,
            depth: 0,
            parent: None,
        }
    }
}
