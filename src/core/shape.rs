use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::{CIRCLE_SEGMENTS, GEOMETRY_EPSILON},
    error::{Result, SandboxError},
    utils::math::{
        box_inertia_per_mass, circle_inertia_per_mass, polygon_area, polygon_centroid,
        polygon_inertia_per_mass, polygon_signed_area, regular_polygon, rotate,
    },
};

/// Enumeration of supported body geometries.
///
/// The local origin of every shape is its centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { width: f64, height: f64 },
    Circle { radius: f64 },
    /// Counter-clockwise vertices relative to the centroid; build with [`Shape::polygon`].
    Polygon { vertices: Vec<DVec2> },
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Box {
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Shape {
    pub fn rect(width: f64, height: f64) -> Result<Self> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(SandboxError::InvalidArgument(format!(
                "box extents must be positive, got {width} x {height}"
            )));
        }
        Ok(Shape::Box { width, height })
    }

    pub fn circle(radius: f64) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(SandboxError::InvalidArgument(format!(
                "circle radius must be positive, got {radius}"
            )));
        }
        Ok(Shape::Circle { radius })
    }

    /// Builds a polygon, re-centring it on its centroid and forcing CCW winding.
    ///
    /// Returns the shape and the offset that was subtracted, so callers can
    /// keep the body where the raw vertices were drawn.
    pub fn polygon(mut vertices: Vec<DVec2>) -> Result<(Self, DVec2)> {
        if vertices.len() < 3 {
            return Err(SandboxError::InvalidArgument(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(bad) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(SandboxError::InvalidArgument(format!(
                "polygon vertex must be finite, got {bad}"
            )));
        }
        let signed = polygon_signed_area(&vertices);
        if signed.abs() < GEOMETRY_EPSILON {
            return Err(SandboxError::InvalidArgument(
                "polygon has zero area".to_string(),
            ));
        }
        if signed < 0.0 {
            vertices.reverse();
        }
        let centroid = polygon_centroid(&vertices);
        for v in &mut vertices {
            *v -= centroid;
        }
        Ok((Shape::Polygon { vertices }, centroid))
    }

    /// Re-checks a shape built from its public variants.
    ///
    /// Rejects non-positive extents and re-centres and re-winds polygons like
    /// [`Shape::polygon`]; the returned offset is the centroid that was removed.
    pub fn validated(self) -> Result<(Self, DVec2)> {
        match self {
            Shape::Box { width, height } => Ok((Shape::rect(width, height)?, DVec2::ZERO)),
            Shape::Circle { radius } => Ok((Shape::circle(radius)?, DVec2::ZERO)),
            Shape::Polygon { vertices } => Shape::polygon(vertices),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Shape::Box { width, height } => width * height,
            Shape::Circle { radius } => std::f64::consts::PI * radius * radius,
            Shape::Polygon { vertices } => polygon_area(vertices),
        }
    }

    /// Moment of inertia divided by mass.
    pub fn inertia_multiplier(&self) -> f64 {
        match self {
            Shape::Box { width, height } => box_inertia_per_mass(*width, *height),
            Shape::Circle { radius } => circle_inertia_per_mass(*radius),
            Shape::Polygon { vertices } => polygon_inertia_per_mass(vertices),
        }
    }

    pub fn bounding_radius(&self) -> f64 {
        match self {
            Shape::Box { width, height } => 0.5 * width.hypot(*height),
            Shape::Circle { radius } => *radius,
            Shape::Polygon { vertices } => vertices.iter().map(|v| v.length()).fold(0.0, f64::max),
        }
    }

    /// Counter-clockwise outline in the local frame. Circles are approximated.
    pub fn local_vertices(&self) -> Vec<DVec2> {
        match self {
            Shape::Box { width, height } => {
                let (hx, hy) = (width * 0.5, height * 0.5);
                vec![
                    DVec2::new(-hx, -hy),
                    DVec2::new(hx, -hy),
                    DVec2::new(hx, hy),
                    DVec2::new(-hx, hy),
                ]
            }
            Shape::Circle { radius } => regular_polygon(*radius, CIRCLE_SEGMENTS),
            Shape::Polygon { vertices } => vertices.clone(),
        }
    }

    pub fn world_vertices(&self, position: DVec2, angle: f64) -> Vec<DVec2> {
        self.local_vertices()
            .into_iter()
            .map(|v| position + rotate(v, angle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn polygon_is_recentred_and_wound_ccw() {
        let raw = vec![
            DVec2::new(2.0, 2.0),
            DVec2::new(2.0, 4.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(4.0, 2.0),
        ];
        let (shape, offset) = Shape::polygon(raw).unwrap();
        assert_relative_eq!(offset.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(offset.y, 3.0, epsilon = 1e-12);
        let Shape::Polygon { vertices } = &shape else {
            panic!("expected polygon");
        };
        assert!(polygon_signed_area(vertices) > 0.0);
        assert_relative_eq!(polygon_centroid(vertices).length(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(shape.area(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_shapes_are_rejected() {
        assert!(Shape::rect(0.0, 1.0).is_err());
        assert!(Shape::circle(f64::NAN).is_err());
        assert!(Shape::polygon(vec![DVec2::ZERO, DVec2::X, DVec2::X * 2.0]).is_err());
    }

    #[test]
    fn validated_rechecks_public_variants() {
        let clockwise = Shape::Polygon {
            vertices: vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(0.0, 2.0),
                DVec2::new(2.0, 2.0),
                DVec2::new(2.0, 0.0),
            ],
        };
        let (shape, offset) = clockwise.validated().unwrap();
        assert_relative_eq!(offset.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(offset.y, 1.0, epsilon = 1e-12);
        let Shape::Polygon { vertices } = &shape else {
            panic!("expected polygon");
        };
        assert!(polygon_signed_area(vertices) > 0.0);

        let (square, offset) = Shape::rect(1.0, 2.0).unwrap().validated().unwrap();
        assert_eq!(square, Shape::Box { width: 1.0, height: 2.0 });
        assert_eq!(offset, DVec2::ZERO);

        assert!(Shape::Box { width: -1.0, height: 1.0 }.validated().is_err());
        assert!(Shape::Circle { radius: 0.0 }.validated().is_err());
        let broken = Shape::Polygon {
            vertices: vec![DVec2::ZERO, DVec2::X, DVec2::new(f64::NAN, 1.0)],
        };
        assert!(broken.validated().is_err());
    }

    #[test]
    fn rotated_box_vertices() {
        let shape = Shape::rect(2.0, 2.0).unwrap();
        let verts = shape.world_vertices(DVec2::new(5.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(verts[0].x, 6.0, epsilon = 1e-12);
        assert_relative_eq!(verts[0].y, -1.0, epsilon = 1e-12);
    }
}
