//! Recursive reflect/refract ray caster.
//!
//! Every step each laser shoots one root ray; a hit splits it into a reflected
//! ray and, for finite refractive indices, a refracted one. Recursion is
//! bounded by a depth limit, a ray budget shared by all lasers of a step and
//! the visibility floor [`MIN_VISIBLE_ALPHA`].

use glam::DVec2;

use super::laser::{LaserRay, AMBIENT_REFRACTIVE_INDEX};
use crate::{
    config::MIN_VISIBLE_ALPHA,
    core::body::Body,
    utils::{
        allocator::EntityId,
        math::{edges, segment_intersection},
    },
};

/// Rays shorter than this are treated as touching their origin edge.
pub const RAY_EPSILON: f64 = 1e-6;

/// A world-space body edge as seen by the optics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticalEdge {
    pub start: DVec2,
    pub end: DVec2,
    pub body: EntityId,
    pub refractive_index: f64,
    /// Alpha of the body's colour; scales transmitted light.
    pub alpha: f32,
}

impl OpticalEdge {
    /// Outward normal for counter-clockwise outlines.
    pub fn outward_normal(&self) -> DVec2 {
        let d = (self.end - self.start).normalize_or_zero();
        DVec2::new(d.y, -d.x)
    }
}

/// Collects every edge of every body.
pub fn collect_edges<'a>(bodies: impl IntoIterator<Item = (EntityId, &'a Body)>) -> Vec<OpticalEdge> {
    let mut out = Vec::new();
    for (id, body) in bodies {
        let vertices = body.world_vertices();
        out.extend(edges(&vertices).map(|(start, end)| OpticalEdge {
            start,
            end,
            body: id,
            refractive_index: body.material.refractive_index,
            alpha: body.color.a,
        }));
    }
    out
}

/// Fraction of light reflected off a surface of index `n`.
///
/// Heuristic `1 - e^(-log10 n)`; opaque (`n = ∞`) surfaces reflect everything.
pub fn reflectance(refractive_index: f64) -> f64 {
    if refractive_index.is_infinite() {
        return 1.0;
    }
    (1.0 - (-refractive_index.log10()).exp()).clamp(0.0, 1.0)
}

/// Mutable state threaded through one step of ray casting.
pub struct TraceContext<'a> {
    pub edges: &'a [OpticalEdge],
    /// Rays any laser may still emit this step.
    pub remaining_budget: usize,
    pub max_depth: u32,
}

impl<'a> TraceContext<'a> {
    pub fn new(edges: &'a [OpticalEdge], budget: usize, max_depth: u32) -> Self {
        Self {
            edges,
            remaining_budget: budget,
            max_depth,
        }
    }

    /// Traces a laser's root ray, skipping the edges of its own body.
    pub fn trace(&mut self, root: LaserRay, source: Option<EntityId>) -> Vec<LaserRay> {
        let mut rays = Vec::new();
        self.shoot_ray(&mut rays, root, source);
        rays
    }

    fn nearest_hit(&self, ray: &LaserRay, skip: Option<EntityId>) -> Option<(f64, DVec2, &'a OpticalEdge)> {
        let start = ray.origin;
        let end = ray.end();
        let edges: &'a [OpticalEdge] = self.edges;
        edges
            .iter()
            .filter(|edge| Some(edge.body) != skip)
            .filter_map(|edge| {
                let hit = segment_intersection(start, end, edge.start, edge.end)?;
                let distance = hit.t * ray.length;
                (distance > RAY_EPSILON).then_some((distance, hit.point, edge))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    fn shoot_ray(&mut self, rays: &mut Vec<LaserRay>, mut ray: LaserRay, skip: Option<EntityId>) {
        let visible = ray.color.a >= MIN_VISIBLE_ALPHA;
        if ray.depth > self.max_depth || self.remaining_budget == 0 || !visible {
            return;
        }
        self.remaining_budget -= 1;

        let Some((distance, point, edge)) = self.nearest_hit(&ray, skip) else {
            rays.push(ray);
            return;
        };

        let travelled_budget = ray.length - distance;
        ray.length = distance;
        let index = rays.len();
        rays.push(ray.clone());

        if travelled_budget <= RAY_EPSILON {
            return;
        }

        let direction = ray.direction();
        let outward = edge.outward_normal();
        let exiting = direction.dot(outward) > 0.0;
        let normal = if exiting { -outward } else { outward };
        let cos_incidence = -direction.dot(normal);

        let body_index = edge.refractive_index;
        let (n1, n2) = if exiting {
            (body_index, AMBIENT_REFRACTIVE_INDEX)
        } else {
            (ray.refractive_index, body_index)
        };

        let alpha = f64::from(ray.color.a);
        let mut reflected_share = reflectance(body_index);

        let refracted = if body_index.is_finite() {
            let eta = n1 / n2;
            let k = 1.0 - eta * eta * (1.0 - cos_incidence * cos_incidence);
            if k >= 0.0 {
                let dir = direction * eta + normal * (eta * cos_incidence - k.sqrt());
                let transmitted = alpha * (1.0 - reflected_share) * f64::from(edge.alpha);
                Some((dir, transmitted))
            } else {
                // Total internal reflection.
                reflected_share = 1.0;
                None
            }
        } else {
            None
        };

        let reflect_dir = direction - normal * (2.0 * direction.dot(normal));
        let reflected = LaserRay {
            origin: point,
            angle: reflect_dir.y.atan2(reflect_dir.x),
            length: travelled_budget,
            color: ray.color.with_alpha((alpha * reflected_share) as f32),
            refractive_index: n1,
            depth: ray.depth + 1,
            parent: Some(index),
        };
        self.shoot_ray(rays, reflected, None);

        if let Some((dir, transmitted)) = refracted {
            let refracted = LaserRay {
                origin: point,
                angle: dir.y.atan2(dir.x),
                length: travelled_budget,
                color: ray.color.with_alpha(transmitted as f32),
                refractive_index: n2,
                depth: ray.depth + 1,
                parent: Some(index),
            };
            self.shoot_ray(rays, refracted, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{shape::Shape, types::Color};
    use approx::assert_relative_eq;

    fn slab(index: f64) -> Vec<OpticalEdge> {
        let mut body = Body::new(Shape::rect(2.0, 10.0).unwrap(), DVec2::new(5.0, 0.0));
        body.material.refractive_index = index;
        body.color = Color::WHITE;
        collect_edges([(EntityId::new(7, 0), &body)])
    }

    fn root(length: f64) -> LaserRay {
        LaserRay {
            origin: DVec2::ZERO,
            angle: 0.0,
            length,
            color: Color::RED,
            refractive_index: AMBIENT_REFRACTIVE_INDEX,
            depth: 0,
            parent: None,
        }
    }

    #[test]
    fn reflectance_heuristic() {
        assert_relative_eq!(reflectance(1.0), 0.0);
        assert_relative_eq!(reflectance(10.0), 1.0 - (-1.0f64).exp());
        assert_eq!(reflectance(f64::INFINITY), 1.0);
        assert_eq!(reflectance(0.5), 0.0);
    }

    #[test]
    fn miss_keeps_full_length() {
        let edges = slab(1.5);
        let mut ctx = TraceContext::new(&edges, 10, 100);
        let mut ray = root(20.0);
        ray.angle = std::f64::consts::PI;
        let rays = ctx.trace(ray, None);
        assert_eq!(rays.len(), 1);
        assert_relative_eq!(rays[0].length, 20.0);
    }

    #[test]
    fn opaque_surface_only_reflects() {
        let edges = slab(f64::INFINITY);
        let mut ctx = TraceContext::new(&edges, 10, 100);
        let rays = ctx.trace(root(20.0), None);
        assert_eq!(rays.len(), 2);
        assert_relative_eq!(rays[0].length, 4.0, epsilon = 1e-9);
        let child = &rays[1];
        assert_eq!(child.parent, Some(0));
        assert_eq!(child.depth, 1);
        assert_relative_eq!(child.direction().x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(child.length, 16.0, epsilon = 1e-9);
    }

    #[test]
    fn normal_incidence_passes_straight_through_glass() {
        let edges = slab(1.5);
        let mut ctx = TraceContext::new(&edges, 50, 100);
        let rays = ctx.trace(root(20.0), None);
        let first_children: Vec<&LaserRay> = rays.iter().filter(|r| r.parent == Some(0)).collect();
        assert_eq!(first_children.len(), 2);
        let transmitted = first_children
            .iter()
            .find(|r| r.refractive_index == 1.5)
            .unwrap();
        assert_relative_eq!(transmitted.direction().x, 1.0, epsilon = 1e-9);
        assert!(transmitted.color.a < Color::RED.a);
    }

    #[test]
    fn budget_and_depth_bound_the_tree() {
        let edges = slab(1.5);
        let mut ctx = TraceContext::new(&edges, 3, 100);
        let rays = ctx.trace(root(20.0), None);
        assert!(rays.len() <= 3);
        assert_eq!(ctx.remaining_budget, 0);

        let mut ctx = TraceContext::new(&edges, 100, 1);
        let rays = ctx.trace(root(20.0), None);
        assert!(rays.iter().all(|r| r.depth <= 1));
    }

    #[test]
    fn faint_branches_leave_the_budget_for_other_lasers() {
        let edges = slab(1.5);
        let mut ctx = TraceContext::new(&edges, 1000, 100);
        let mut tilted = root(20.0);
        tilted.angle = 0.1;
        let rays = ctx.trace(tilted, None);
        assert!(rays.len() < 100, "glass consumed {} rays", rays.len());
        assert!(rays.iter().all(|r| r.color.a >= MIN_VISIBLE_ALPHA));

        let mut away = root(20.0);
        away.angle = std::f64::consts::PI;
        assert_eq!(ctx.trace(away, None).len(), 1);
    }

    #[test]
    fn invisible_root_emits_nothing() {
        let edges = slab(1.5);
        let mut ctx = TraceContext::new(&edges, 10, 100);
        let mut ray = root(20.0);
        ray.color = ray.color.with_alpha(MIN_VISIBLE_ALPHA * 0.5);
        assert!(ctx.trace(ray, None).is_empty());
        assert_eq!(ctx.remaining_budget, 10);
    }

    #[test]
    fn skipped_body_is_transparent() {
        let edges = slab(f64::INFINITY);
        let mut ctx = TraceContext::new(&edges, 10, 100);
        let rays = ctx.trace(root(20.0), Some(EntityId::new(7, 0)));
        assert_eq!(rays.len(), 1);
    }
}
