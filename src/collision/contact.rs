use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::GEOMETRY_EPSILON,
    utils::{
        allocator::EntityId,
        math::{edges, point_in_polygon, segment_intersection},
    },
};

/// Contact produced by one resolved pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub body_a: EntityId,
    pub body_b: EntityId,
    /// Unit normal pointing from `body_b` towards `body_a`.
    pub normal: DVec2,
    pub depth: f64,
    /// World-space contact points (0, 1 or 2).
    pub points: Vec<DVec2>,
    /// Magnitude of the momentum exchanged along the normal.
    pub normal_impulse: f64,
}

/// Finds up to two contact points between two overlapping outlines.
///
/// Vertices of either outline lying inside the other are contacts. A single
/// vertex is widened into two points by intersecting its adjacent edges with
/// the other outline; when no vertex is inside, crossing edges are used.
pub fn contact_points(a: &[DVec2], b: &[DVec2]) -> Vec<DVec2> {
    let inside_b = a
        .iter()
        .enumerate()
        .filter(|(_, v)| point_in_polygon(**v, b))
        .map(|(i, v)| (*v, a, b, i));
    let inside_a = b
        .iter()
        .enumerate()
        .filter(|(_, v)| point_in_polygon(**v, a))
        .map(|(i, v)| (*v, b, a, i));
    let found: Vec<(DVec2, &[DVec2], &[DVec2], usize)> = inside_b.chain(inside_a).collect();

    match found.len() {
        0 => {
            let crossings = edge_crossings(a, b);
            farthest_pair(&crossings)
        }
        1 => {
            let (vertex, owner, other, index) = found[0];
            let n = owner.len();
            let prev = owner[(index + n - 1) % n];
            let next = owner[(index + 1) % n];
            let mut widened: Vec<DVec2> = Vec::with_capacity(2);
            for neighbour in [prev, next] {
                if let Some(hit) = first_crossing(vertex, neighbour, other) {
                    widened.push(hit);
                }
            }
            if widened.len() == 2 {
                widened
            } else {
                vec![vertex]
            }
        }
        _ => {
            let points: Vec<DVec2> = found.iter().map(|(v, ..)| *v).collect();
            farthest_pair(&points)
        }
    }
}

/// Per-contact weights for the body centred at `center`.
///
/// Two points are weighted by where the centre projects onto the line joining
/// them; projections outside the segment or a degenerate line fall back to an
/// even split.
pub fn contact_weights(points: &[DVec2], center: DVec2) -> Vec<f64> {
    match points {
        [] => Vec::new(),
        [_] => vec![1.0],
        [p1, p2, ..] => {
            let line = *p2 - *p1;
            let len_sq = line.length_squared();
            if len_sq < GEOMETRY_EPSILON {
                return vec![0.5, 0.5];
            }
            let t = (center - *p1).dot(line) / len_sq;
            let (w1, w2) = (1.0 - t, t);
            if w1 < 0.0 || w2 < 0.0 {
                vec![0.5, 0.5]
            } else {
                vec![w1, w2]
            }
        }
    }
}

fn first_crossing(from: DVec2, to: DVec2, polygon: &[DVec2]) -> Option<DVec2> {
    edges(polygon)
        .filter_map(|(start, end)| segment_intersection(from, to, start, end))
        .min_by(|x, y| x.t.total_cmp(&y.t))
        .map(|hit| hit.point)
}

fn edge_crossings(a: &[DVec2], b: &[DVec2]) -> Vec<DVec2> {
    let mut out: Vec<DVec2> = Vec::new();
    for (a1, a2) in edges(a) {
        for (b1, b2) in edges(b) {
            if let Some(hit) = segment_intersection(a1, a2, b1, b2) {
                if out.iter().all(|p| p.distance_squared(hit.point) > GEOMETRY_EPSILON) {
                    out.push(hit.point);
                }
            }
        }
    }
    out
}

fn farthest_pair(points: &[DVec2]) -> Vec<DVec2> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut best = (0, 1, -1.0);
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = points[i].distance_squared(points[j]);
            if d > best.2 {
                best = (i, j, d);
            }
        }
    }
    vec![points[best.0], points[best.1]]
}
