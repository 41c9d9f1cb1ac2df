use serde::{Deserialize, Serialize};

/// Collision mask every body starts with: collides with everything.
pub const COLLIDE_ALL: u32 = u32::MAX;

/// Material coefficients that affect contacts, fields and optics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Bounciness, 0 = fully inelastic, 1 = fully elastic.
    pub restitution: f64,
    pub friction: f64,
    /// `f64::INFINITY` makes the body opaque to lasers.
    pub refractive_index: f64,
    /// Non-zero turns the body into an attractor.
    pub attraction: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            friction: 0.4,
            refractive_index: 1.5,
            attraction: 0.0,
        }
    }
}

impl Material {
    pub fn rubber() -> Self {
        Self {
            restitution: 0.85,
            friction: 1.0,
            ..Self::default()
        }
    }

    pub fn glass() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.2,
            refractive_index: 1.5,
            attraction: 0.0,
        }
    }

    pub fn mirror() -> Self {
        Self {
            refractive_index: f64::INFINITY,
            ..Self::glass()
        }
    }

    /// Averaged restitution of a contact pair.
    pub fn combined_restitution(&self, other: &Self) -> f64 {
        0.5 * (self.restitution + other.restitution)
    }

    /// Geometric-mean friction of a contact pair.
    pub fn combined_friction(&self, other: &Self) -> f64 {
        (self.friction * other.friction).max(0.0).sqrt()
    }
}

/// Straight RGBA colour, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}
