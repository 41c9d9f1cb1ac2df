use glam::DVec2;

use super::contact::{contact_points, contact_weights, Contact};
use crate::{
    config::GEOMETRY_EPSILON,
    core::body::Body,
    dynamics::forces::{Force, ForceKind},
    utils::allocator::EntityId,
};

/// Pair filter applied before the narrow phase.
///
/// Pairs are skipped when both bodies are fixed, their masks share no bit, every
/// shared bit is self-collision exempt, or either body ignores the other.
pub fn should_collide(
    id_a: EntityId,
    a: &Body,
    id_b: EntityId,
    b: &Body,
    exempt_mask: u32,
) -> bool {
    if a.is_fixed() && b.is_fixed() {
        return false;
    }
    let shared = a.collision_mask & b.collision_mask;
    if shared & !exempt_mask == 0 {
        return false;
    }
    !(a.collision_ignore.contains(&id_b) || b.collision_ignore.contains(&id_a))
}

/// Normal velocities after a restitution exchange along the contact normal.
///
/// Infinite masses stand for fixed bodies, which keep their velocity.
pub fn restitution_exchange(
    mass_a: f64,
    velocity_a: f64,
    mass_b: f64,
    velocity_b: f64,
    restitution: f64,
) -> (f64, f64) {
    match (mass_a.is_infinite(), mass_b.is_infinite()) {
        (true, true) => (velocity_a, velocity_b),
        (true, false) => (
            velocity_a,
            velocity_a + restitution * (velocity_a - velocity_b),
        ),
        (false, true) => (
            velocity_b + restitution * (velocity_b - velocity_a),
            velocity_b,
        ),
        (false, false) => {
            let total = mass_a + mass_b;
            let momentum = mass_a * velocity_a + mass_b * velocity_b;
            (
                (momentum + mass_b * restitution * (velocity_b - velocity_a)) / total,
                (momentum + mass_a * restitution * (velocity_a - velocity_b)) / total,
            )
        }
    }
}

/// Resolves one colliding pair given the MTV from the detector (pointing B → A).
///
/// Separates the bodies, exchanges normal momentum and records short-lived
/// normal (torque-only) and friction forces on both force lists.
pub fn resolve(
    id_a: EntityId,
    a: &mut Body,
    id_b: EntityId,
    b: &mut Body,
    mtv: DVec2,
    dt: f64,
) -> Option<Contact> {
    let depth = mtv.length();
    if depth < GEOMETRY_EPSILON {
        return None;
    }
    let normal = mtv / depth;

    let points = contact_points(&a.world_vertices(), &b.world_vertices());
    separate(a, b, mtv, normal);

    let mass_a = a.effective_mass();
    let mass_b = b.effective_mass();
    let van = a.velocity.dot(normal);
    let vbn = b.velocity.dot(normal);

    let mut normal_impulse = 0.0;
    if van - vbn < 0.0 {
        let restitution = a.material.combined_restitution(&b.material);
        let (new_van, new_vbn) = restitution_exchange(mass_a, van, mass_b, vbn, restitution);
        if !a.is_fixed() {
            a.velocity += normal * (new_van - van);
            normal_impulse = a.mass() * (new_van - van).abs();
        }
        if !b.is_fixed() {
            b.velocity += normal * (new_vbn - vbn);
            if a.is_fixed() {
                normal_impulse = b.mass() * (new_vbn - vbn).abs();
            }
        }
    }

    if dt > 0.0 && !points.is_empty() {
        let friction = a.material.combined_friction(&b.material);
        let reduced_mass = match (a.is_fixed(), b.is_fixed()) {
            (true, _) => b.mass(),
            (_, true) => a.mass(),
            _ => a.mass() * b.mass() / (a.mass() + b.mass()),
        };
        let normal_force = normal_impulse / dt;
        let weights_a = contact_weights(&points, a.position);
        let weights_b = contact_weights(&points, b.position);

        for (i, point) in points.iter().enumerate() {
            let relative = a.point_velocity(*point) - b.point_velocity(*point);
            let tangential = relative - normal * relative.dot(normal);
            let slip = tangential.length();
            // Proportional to slip, capped by the normal force (Coulomb clamp).
            let friction_force = if slip > GEOMETRY_EPSILON {
                -tangential / slip * friction * (reduced_mass * slip / dt).min(normal_force)
            } else {
                DVec2::ZERO
            };

            if !a.is_fixed() {
                let local = a.local_point(*point);
                let w = weights_a[i];
                push_contact_forces(a, id_b, local, normal * normal_force * w, friction_force * w, dt);
            }
            if !b.is_fixed() {
                let local = b.local_point(*point);
                let w = weights_b[i];
                push_contact_forces(b, id_a, local, -normal * normal_force * w, -friction_force * w, dt);
            }
        }
    }

    Some(Contact {
        body_a: id_a,
        body_b: id_b,
        normal,
        depth,
        points,
        normal_impulse,
    })
}

/// Splits the MTV between the bodies in proportion to their normal speeds.
fn separate(a: &mut Body, b: &mut Body, mtv: DVec2, normal: DVec2) {
    if a.is_fixed() {
        b.position -= mtv;
        return;
    }
    if b.is_fixed() {
        a.position += mtv;
        return;
    }
    let speed_a = a.velocity.dot(normal).abs();
    let speed_b = b.velocity.dot(normal).abs();
    let total = speed_a + speed_b;
    let share_a = if total < GEOMETRY_EPSILON {
        0.5
    } else {
        speed_a / total
    };
    a.position += mtv * share_a;
    b.position -= mtv * (1.0 - share_a);
}

fn push_contact_forces(
    body: &mut Body,
    other: EntityId,
    local_point: DVec2,
    normal: DVec2,
    friction: DVec2,
    dt: f64,
) {
    if normal != DVec2::ZERO {
        body.forces.push(
            Force::new(ForceKind::Normal, normal)
                .at(local_point)
                .with_ttl(dt)
                .from_source(other)
                .torque_only(),
        );
    }
    if friction != DVec2::ZERO {
        body.forces.push(
            Force::new(ForceKind::Friction, friction)
                .at(local_point)
                .with_ttl(dt)
                .from_source(other),
        );
    }
}
