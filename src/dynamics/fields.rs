use glam::DVec2;

use crate::{config::SimulationSettings, config::GEOMETRY_EPSILON, utils::allocator::EntityId};

/// Cached view of one attractor, refreshed at the start of every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    pub id: EntityId,
    pub position: DVec2,
    pub mass: f64,
    pub attraction: f64,
}

/// Uniform gravity on a body of `mass`; zero when gravity is disabled.
pub fn gravity_force(settings: &SimulationSettings, mass: f64) -> DVec2 {
    if settings.gravity_enabled {
        settings.gravity * mass
    } else {
        DVec2::ZERO
    }
}

/// Buoyancy of the air displaced by a body of `area`.
///
/// `None` when gravity or air is switched off, so the caller clears the slot.
pub fn buoyancy_force(settings: &SimulationSettings, area: f64) -> Option<DVec2> {
    (settings.gravity_enabled && settings.air_friction_enabled)
        .then(|| -settings.gravity * settings.air_density * area)
}

/// Central attraction of every attractor except `exclude` on a mass at `position`.
///
/// Magnitude `attraction · m₁ · m₂ / dᵖ` with `p = 1` for the linear law and
/// `p = 2` otherwise. Coincident attractors contribute nothing.
pub fn attraction_force(
    position: DVec2,
    mass: f64,
    exclude: Option<EntityId>,
    attractors: &[Attractor],
    linear: bool,
) -> DVec2 {
    attractors
        .iter()
        .filter(|a| Some(a.id) != exclude)
        .fold(DVec2::ZERO, |acc, a| {
            let delta = a.position - position;
            let distance = delta.length();
            if distance < GEOMETRY_EPSILON {
                return acc;
            }
            let falloff = if linear { distance } else { distance * distance };
            acc + delta / distance * (a.attraction * a.mass * mass / falloff)
        })
}

/// Potential energy of a mass at `position` in the attraction field.
///
/// `k · ln d` for the linear law, `-k / d` for the inverse-square law.
pub fn attraction_energy(
    position: DVec2,
    mass: f64,
    exclude: Option<EntityId>,
    attractors: &[Attractor],
    linear: bool,
) -> f64 {
    attractors
        .iter()
        .filter(|a| Some(a.id) != exclude)
        .map(|a| {
            let distance = a.position.distance(position);
            if distance < GEOMETRY_EPSILON {
                return 0.0;
            }
            let k = a.attraction * a.mass * mass;
            if linear {
                k * distance.ln()
            } else {
                -k / distance
            }
        })
        .sum()
}
