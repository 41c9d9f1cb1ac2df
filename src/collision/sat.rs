use glam::DVec2;

use crate::{
    config::GEOMETRY_EPSILON,
    core::body::Body,
    utils::math::{edges, project},
};

/// Which edge normals the separating-axis test considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    /// The normals of the first two edges of each outline: exact for boxes,
    /// an approximation for every other convex shape.
    #[default]
    BoxPair,
    /// Every edge normal of both outlines (general convex SAT).
    AllEdges,
}

/// Separating-axis test between two convex outlines.
///
/// Returns the minimum translation vector oriented from `b` towards `a`:
/// adding it to `a`'s position (or subtracting it from `b`'s) leaves the
/// outlines touching. Touching outlines do not count as colliding.
pub fn detect(
    vertices_a: &[DVec2],
    position_a: DVec2,
    vertices_b: &[DVec2],
    position_b: DVec2,
    mode: AxisMode,
) -> Option<DVec2> {
    let mut best: Option<(f64, DVec2)> = None;

    for axis in test_axes(vertices_a, mode).chain(test_axes(vertices_b, mode)) {
        let (min_a, max_a) = project(vertices_a, axis);
        let (min_b, max_b) = project(vertices_b, axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= 0.0 {
            return None;
        }
        if best.map_or(true, |(smallest, _)| overlap < smallest) {
            best = Some((overlap, axis));
        }
    }

    let (overlap, axis) = best?;
    let mtv = axis * overlap;
    if (position_a - position_b).dot(mtv) < 0.0 {
        Some(-mtv)
    } else {
        Some(mtv)
    }
}

/// Runs [`detect`] on two bodies' world outlines.
pub fn detect_bodies(a: &Body, b: &Body, mode: AxisMode) -> Option<DVec2> {
    detect(
        &a.world_vertices(),
        a.position,
        &b.world_vertices(),
        b.position,
        mode,
    )
}

fn test_axes(vertices: &[DVec2], mode: AxisMode) -> impl Iterator<Item = DVec2> + '_ {
    let take = match mode {
        AxisMode::BoxPair => 2,
        AxisMode::AllEdges => vertices.len(),
    };
    edges(vertices)
        .take(take)
        .filter_map(|(start, end)| {
            let edge = end - start;
            (edge.length_squared() > GEOMETRY_EPSILON).then(|| edge.perp().normalize())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shape::Shape;
    use approx::assert_relative_eq;

    fn square(at: DVec2) -> Body {
        Body::new(Shape::rect(2.0, 2.0).unwrap(), at)
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let a = square(DVec2::ZERO);
        let b = square(DVec2::new(2.5, 0.0));
        assert!(detect_bodies(&a, &b, AxisMode::BoxPair).is_none());
    }

    #[test]
    fn touching_boxes_do_not_collide() {
        let a = square(DVec2::ZERO);
        let b = square(DVec2::new(2.0, 0.0));
        assert!(detect_bodies(&a, &b, AxisMode::BoxPair).is_none());
    }

    #[test]
    fn mtv_follows_axis_of_least_overlap() {
        let a = square(DVec2::ZERO);
        let b = square(DVec2::new(1.5, 0.5));
        let mtv = detect_bodies(&a, &b, AxisMode::BoxPair).unwrap();
        assert_relative_eq!(mtv.x, -0.5, epsilon = 1e-12);
        assert_relative_eq!(mtv.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mtv_points_from_b_to_a() {
        let a = square(DVec2::new(0.0, 1.8));
        let b = square(DVec2::ZERO);
        let mtv = detect_bodies(&a, &b, AxisMode::BoxPair).unwrap();
        assert!(mtv.y > 0.0);
        assert_relative_eq!(mtv.length(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn rotated_box_uses_its_own_axes() {
        let mut a = square(DVec2::ZERO);
        a.angle = std::f64::consts::FRAC_PI_4;
        // Diamond tip reaches x = √2 ≈ 1.414; the other box starts at x = 1.3.
        let b = square(DVec2::new(2.3, 0.0));
        let mtv = detect_bodies(&a, &b, AxisMode::BoxPair).unwrap();
        assert!(mtv.x < 0.0);
        assert!(mtv.length() < 0.2);
    }

    #[test]
    fn all_edge_mode_agrees_on_boxes() {
        let a = square(DVec2::ZERO);
        let b = square(DVec2::new(1.5, 0.5));
        let pair = detect_bodies(&a, &b, AxisMode::BoxPair).unwrap();
        let all = detect_bodies(&a, &b, AxisMode::AllEdges).unwrap();
        assert_relative_eq!(pair.length(), all.length(), epsilon = 1e-12);
    }
}
