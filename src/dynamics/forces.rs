use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::utils::{allocator::EntityId, math::cross, math::rotate};

/// Origin of a force entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForceKind {
    Gravity,
    Attraction,
    /// Linear air drag maintained by the world each step.
    AirFriction,
    /// Drag applied by external code; the world never writes it.
    Drag,
    /// Upward push of the displaced air.
    Buoyancy,
    Friction,
    Normal,
    Spring,
    Hinge,
    Thruster,
    User,
}

/// One force acting on a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Force {
    pub kind: ForceKind,
    /// World-frame force vector.
    pub value: DVec2,
    /// Application point in the owner's local frame.
    pub point: DVec2,
    /// Remaining lifetime in seconds; `f64::INFINITY` for persistent slots.
    pub ttl: f64,
    pub source: Option<EntityId>,
    /// Contributes torque but not linear force.
    pub only_torque: bool,
}

impl Force {
    pub fn new(kind: ForceKind, value: DVec2) -> Self {
        Self {
            kind,
            value,
            point: DVec2::ZERO,
            ttl: f64::INFINITY,
            source: None,
            only_torque: false,
        }
    }

    pub fn at(mut self, point: DVec2) -> Self {
        self.point = point;
        self
    }

    pub fn with_ttl(mut self, ttl: f64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn from_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn torque_only(mut self) -> Self {
        self.only_torque = true;
        self
    }

    /// Torque about the owner's centre for a body rotated by `angle`.
    pub fn torque(&self, angle: f64) -> f64 {
        cross(self.point, rotate(self.value, -angle))
    }
}

/// Per-body force accumulator.
///
/// Persistent slots (gravity, air friction, springs, thrusters) are keyed by
/// `(kind, source)` and overwritten in place; transient entries expire by TTL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceList {
    forces: Vec<Force>,
}

impl ForceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Force> {
        self.forces.iter()
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Sum of every force that is not torque-only.
    pub fn net_force(&self) -> DVec2 {
        self.forces
            .iter()
            .filter(|f| !f.only_torque)
            .fold(DVec2::ZERO, |acc, f| acc + f.value)
    }

    /// Sum of the torque of every force, torque-only entries included.
    pub fn net_torque(&self, angle: f64) -> f64 {
        self.forces.iter().map(|f| f.torque(angle)).sum()
    }

    /// Overwrites (or creates) the persistent slot for `(kind, source)`.
    pub fn set_slot(
        &mut self,
        kind: ForceKind,
        source: Option<EntityId>,
        value: DVec2,
        point: DVec2,
    ) {
        match self.slot_mut(kind, source) {
            Some(slot) => {
                slot.value = value;
                slot.point = point;
            }
            None => {
                let mut force = Force::new(kind, value).at(point);
                force.source = source;
                self.forces.push(force);
            }
        }
    }

    pub fn slot(&self, kind: ForceKind, source: Option<EntityId>) -> Option<&Force> {
        self.forces
            .iter()
            .find(|f| f.kind == kind && f.source == source && f.ttl.is_infinite())
    }

    fn slot_mut(&mut self, kind: ForceKind, source: Option<EntityId>) -> Option<&mut Force> {
        self.forces
            .iter_mut()
            .find(|f| f.kind == kind && f.source == source && f.ttl.is_infinite())
    }

    pub fn clear_slot(&mut self, kind: ForceKind, source: Option<EntityId>) {
        self.forces
            .retain(|f| !(f.kind == kind && f.source == source && f.ttl.is_infinite()));
    }

    pub fn push(&mut self, force: Force) {
        self.forces.push(force);
    }

    /// Ages every finite entry by `dt` and drops the expired ones.
    pub fn tick(&mut self, dt: f64) {
        for force in &mut self.forces {
            if force.ttl.is_finite() {
                force.ttl -= dt;
            }
        }
        self.forces.retain(|f| f.ttl > 0.0);
    }

    /// Drops every entry contributed by `source`; returns how many were removed.
    pub fn remove_from_source(&mut self, source: EntityId) -> usize {
        let before = self.forces.len();
        self.forces.retain(|f| f.source != Some(source));
        before - self.forces.len()
    }

    pub fn clear(&mut self) {
        self.forces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_list_has_zero_net_force() {
        let list = ForceList::new();
        assert_eq!(list.net_force(), DVec2::ZERO);
        assert_eq!(list.net_torque(0.3), 0.0);
    }

    #[test]
    fn torque_only_entries_skip_linear_sum() {
        let mut list = ForceList::new();
        list.push(Force::new(ForceKind::User, DVec2::new(1.0, 0.0)));
        list.push(
            Force::new(ForceKind::Normal, DVec2::new(0.0, 2.0))
                .at(DVec2::new(1.0, 0.0))
                .torque_only(),
        );
        assert_eq!(list.net_force(), DVec2::new(1.0, 0.0));
        assert_relative_eq!(list.net_torque(0.0), 2.0);
    }

    #[test]
    fn torque_uses_local_frame() {
        let force = Force::new(ForceKind::User, DVec2::new(0.0, 1.0)).at(DVec2::new(1.0, 0.0));
        // Body rotated by 90°: the world +Y force points along local +X, parallel to the lever.
        assert_relative_eq!(force.torque(std::f64::consts::FRAC_PI_2), 0.0, epsilon = 1e-12);
        assert_relative_eq!(force.torque(0.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn transient_entries_expire_and_slots_persist() {
        let mut list = ForceList::new();
        list.set_slot(ForceKind::Gravity, None, DVec2::new(0.0, -1.0), DVec2::ZERO);
        list.push(Force::new(ForceKind::Friction, DVec2::X).with_ttl(0.01));

        list.tick(0.005);
        assert_eq!(list.len(), 2);
        list.tick(0.005);
        assert_eq!(list.len(), 1);
        assert!(list.slot(ForceKind::Gravity, None).is_some());
    }

    #[test]
    fn set_slot_overwrites_in_place() {
        let mut list = ForceList::new();
        list.set_slot(ForceKind::Gravity, None, DVec2::new(0.0, -1.0), DVec2::ZERO);
        list.set_slot(ForceKind::Gravity, None, DVec2::new(0.0, -2.0), DVec2::ZERO);
        assert_eq!(list.len(), 1);
        assert_eq!(list.net_force(), DVec2::new(0.0, -2.0));
    }

    #[test]
    fn remove_from_source_only_drops_matching_entries() {
        let source = EntityId::new(3, 0);
        let mut list = ForceList::new();
        list.set_slot(ForceKind::Spring, Some(source), DVec2::X, DVec2::ZERO);
        list.set_slot(ForceKind::Gravity, None, DVec2::Y, DVec2::ZERO);
        assert_eq!(list.remove_from_source(source), 1);
        assert_eq!(list.net_force(), DVec2::Y);
    }
}
