//! 2D vector and geometry helpers layered on top of `glam`.
//!
//! Everything here is a pure function. Polygons are slices of vertices in
//! counter-clockwise order; the functions tolerate clockwise input where noted.

use glam::DVec2;
use std::f64::consts::{PI, TAU};

use crate::config::GEOMETRY_EPSILON;

/// Scalar 2D cross product (`a.x * b.y - a.y * b.x`).
#[inline]
pub fn cross(a: DVec2, b: DVec2) -> f64 {
    a.perp_dot(b)
}

/// Cross product of a scalar angular velocity with a vector (`ω × r`).
#[inline]
pub fn cross_scalar(omega: f64, r: DVec2) -> DVec2 {
    r.perp() * omega
}

/// Rotates `v` counter-clockwise by `angle` radians.
#[inline]
pub fn rotate(v: DVec2, angle: f64) -> DVec2 {
    DVec2::from_angle(angle).rotate(v)
}

pub fn from_polar(length: f64, angle: f64) -> DVec2 {
    DVec2::from_angle(angle) * length
}

/// Returns `(length, angle)` of `v`; the zero vector maps to `(0, 0)`.
pub fn to_polar(v: DVec2) -> (f64, f64) {
    (v.length(), v.y.atan2(v.x))
}

/// Wraps an angle into `[-π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Intersection of segment `p1 → p2` with segment `q1 → q2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub point: DVec2,
    /// Parameter along the first segment, in `[0, 1]`.
    pub t: f64,
    /// Parameter along the second segment, in `[0, 1]`.
    pub u: f64,
}

/// Parallel and collinear segments never intersect.
pub fn segment_intersection(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> Option<SegmentHit> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = cross(r, s);
    if denom.abs() < GEOMETRY_EPSILON {
        return None;
    }

    let qp = q1 - p1;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(SegmentHit {
            point: p1 + r * t,
            t,
            u,
        })
    } else {
        None
    }
}

/// Even-odd point-in-polygon test; works for either winding.
pub fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed shoelace area, positive for counter-clockwise polygons.
pub fn polygon_signed_area(polygon: &[DVec2]) -> f64 {
    edges(polygon).map(|(a, b)| cross(a, b)).sum::<f64>() * 0.5
}

pub fn polygon_area(polygon: &[DVec2]) -> f64 {
    polygon_signed_area(polygon).abs()
}

/// Area centroid; degenerate polygons fall back to the vertex average.
pub fn polygon_centroid(polygon: &[DVec2]) -> DVec2 {
    let area = polygon_signed_area(polygon);
    if area.abs() < GEOMETRY_EPSILON {
        if polygon.is_empty() {
            return DVec2::ZERO;
        }
        return polygon.iter().copied().sum::<DVec2>() / polygon.len() as f64;
    }

    let weighted: DVec2 = edges(polygon).map(|(a, b)| (a + b) * cross(a, b)).sum();
    weighted / (6.0 * area)
}

/// Moment of inertia per unit mass about the centroid of a uniform polygon.
pub fn polygon_inertia_per_mass(polygon: &[DVec2]) -> f64 {
    let centroid = polygon_centroid(polygon);
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (a, b) in edges(polygon) {
        let (a, b) = (a - centroid, b - centroid);
        let c = cross(a, b).abs();
        numerator += c * (a.dot(a) + a.dot(b) + b.dot(b));
        denominator += c;
    }
    if denominator < GEOMETRY_EPSILON {
        return 0.0;
    }
    numerator / (6.0 * denominator)
}

pub fn box_inertia_per_mass(width: f64, height: f64) -> f64 {
    (width * width + height * height) / 12.0
}

pub fn circle_inertia_per_mass(radius: f64) -> f64 {
    0.5 * radius * radius
}

/// Counter-clockwise regular polygon centred on the origin.
pub fn regular_polygon(radius: f64, segments: usize) -> Vec<DVec2> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| from_polar(radius, TAU * i as f64 / segments as f64))
        .collect()
}

/// Projects every vertex onto `axis`, returning the covered `(min, max)` range.
pub fn project(vertices: &[DVec2], axis: DVec2) -> (f64, f64) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

/// Iterates the closed edge loop `(v[i], v[i + 1])` of a polygon.
pub fn edges(polygon: &[DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(half: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(-half, -half),
            DVec2::new(half, -half),
            DVec2::new(half, half),
            DVec2::new(-half, half),
        ]
    }

    #[test]
    fn polar_round_trip_keeps_angle() {
        let v = from_polar(2.0, 0.75);
        let (len, angle) = to_polar(v);
        assert_relative_eq!(len, 2.0, epsilon = 1e-12);
        assert_relative_eq!(angle, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn wrap_angle_stays_in_range() {
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn crossing_segments_intersect_at_midpoint() {
        let hit = segment_intersection(
            DVec2::new(-1.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, -1.0),
            DVec2::new(0.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(hit.point.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(hit.t, 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.u, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(segment_intersection(
            DVec2::ZERO,
            DVec2::X,
            DVec2::Y,
            DVec2::new(1.0, 1.0)
        )
        .is_none());
    }

    #[test]
    fn point_in_square() {
        let poly = square(1.0);
        assert!(point_in_polygon(DVec2::new(0.2, -0.4), &poly));
        assert!(!point_in_polygon(DVec2::new(1.2, 0.0), &poly));
    }

    #[test]
    fn square_area_centroid_and_inertia_match_box_formula() {
        let poly: Vec<DVec2> = square(1.0).into_iter().map(|v| v + DVec2::new(3.0, 1.0)).collect();
        assert_relative_eq!(polygon_area(&poly), 4.0, epsilon = 1e-12);
        let c = polygon_centroid(&poly);
        assert_relative_eq!(c.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            polygon_inertia_per_mass(&poly),
            box_inertia_per_mass(2.0, 2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn projection_covers_extremes() {
        let (lo, hi) = project(&square(0.5), DVec2::X);
        assert_relative_eq!(lo, -0.5);
        assert_relative_eq!(hi, 0.5);
    }
}
