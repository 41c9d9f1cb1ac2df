//! The world: entity storage, the per-step pipeline and the editing surface.
//!
//! [`World::step`] runs the phases in a fixed order:
//!
//! 1. forces: ambient fields, spring and hinge slots, thrusters
//! 2. integration (skipped when `dt == 0`)
//! 3. pairwise collision detection and response (skipped when `dt == 0`)
//! 4. dependents: locked hinges, tracers, lasers
//! 5. `PostUpdate` per object, then `AfterStep`
//!
//! A `dt == 0` step recomputes derived state (spring readouts, laser rays,
//! hinge placement) without advancing time or ageing forces.

pub mod events;
pub mod properties;
pub mod snapshot;

use glam::DVec2;
use log::{debug, info, warn};

pub use events::{EventBus, Listener, ListenerId, WorldEvent};
pub use properties::{
    Binding, BindingId, BindingSource, PropertyAccessor, PropertyRegistry, PropertyValue,
};
pub use snapshot::WorldSnapshot;

use crate::{
    collision::{detect_bodies, resolve, should_collide, AxisMode, Contact},
    config::{SimulationSettings, HINGE_STABILITY},
    core::{Body, Endpoint, EndpointState, Entity, EntityKind, Spring},
    dynamics::{
        attraction_energy, attraction_force, buoyancy_force, gravity_force, Attractor, ForceKind,
        Integration, Integrator,
    },
    error::{Result, SandboxError},
    optics::{collect_edges, TraceContext},
    utils::{logging::ScopedTimer, math::rotate, Arena, EntityId},
};

/// What happened during one call to [`World::step`].
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub dt: f64,
    pub sim_duration: f64,
    /// The world was paused and the step did nothing.
    pub skipped: bool,
    pub contacts: Vec<Contact>,
    /// Entities deleted by the step (diverged bodies and their dependents).
    pub removed: Vec<EntityId>,
    /// Rays emitted by all lasers.
    pub rays: usize,
}

/// Energy accounting over every movable body and spring.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyReport {
    pub kinetic: f64,
    pub gravitational: f64,
    pub elastic: f64,
    pub attraction: f64,
}

impl EnergyReport {
    pub fn total(&self) -> f64 {
        self.kinetic + self.gravitational + self.elastic + self.attraction
    }
}

/// Owns every entity and advances the simulation.
pub struct World {
    entities: Arena<Entity>,
    /// Draw and update order: ascending z-depth, lasers last.
    order: Vec<EntityId>,
    settings: SimulationSettings,
    sim_duration: f64,
    paused: bool,
    attractors: Vec<Attractor>,
    events: EventBus,
    properties: PropertyRegistry,
    bindings: Vec<Binding>,
    next_binding: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimulationSettings::default())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("sim_duration", &self.sim_duration)
            .field("paused", &self.paused)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl World {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            entities: Arena::new(),
            order: Vec::new(),
            settings,
            sim_duration: 0.0,
            paused: false,
            attractors: Vec::new(),
            events: EventBus::new(),
            properties: PropertyRegistry::with_builtin(),
            bindings: Vec::new(),
            next_binding: 0,
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SimulationSettings {
        &mut self.settings
    }

    pub fn sim_duration(&self) -> f64 {
        self.sim_duration
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Entity handles in update order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.entities.get(id).and_then(Entity::as_body)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.entities.get_mut(id).and_then(Entity::as_body_mut)
    }

    pub fn spring(&self, id: EntityId) -> Option<&Spring> {
        self.entities.get(id).and_then(Entity::as_spring)
    }

    /// Bodies in update order.
    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.body(*id).map(|body| (*id, body)))
    }

    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.properties
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&WorldEvent) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Adds an entity, linking it to the bodies it is attached to.
    pub fn add(&mut self, kind: impl Into<EntityKind>) -> Result<EntityId> {
        let mut kind = kind.into();
        let parents = kind.parents();
        for parent in &parents {
            self.require_body(*parent)?;
        }

        match &mut kind {
            EntityKind::Body(body) => {
                if !body.position.is_finite() || !body.angle.is_finite() {
                    return Err(SandboxError::InvalidArgument(format!(
                        "body position must be finite, got {} / {}",
                        body.position, body.angle
                    )));
                }
                // Keep the outline where it was drawn while moving the origin to the centroid.
                let (shape, offset) = std::mem::take(&mut body.shape).validated()?;
                body.shape = shape;
                body.position += rotate(offset, body.angle);
            }
            EntityKind::Spring(spring) => {
                if let Some(lock) = spring.hinge.as_mut() {
                    let angle_a = self.require_body(spring.body_a)?.angle;
                    let angle_b = match spring.b.body_id() {
                        Some(b) => self.require_body(b)?.angle,
                        None => 0.0,
                    };
                    lock.relative_angle = angle_a - angle_b;
                }
            }
            _ => {}
        }

        let hinge_pair = match &kind {
            EntityKind::Spring(spring) if spring.is_hinge() => {
                spring.body_b().map(|b| (spring.body_a, b))
            }
            _ => None,
        };
        let name = kind.name();
        let id = self.entities.insert_with(|id| Entity::new(id, kind));

        for parent in &parents {
            if let Some(entity) = self.entities.get_mut(*parent) {
                entity.dependents.insert(id);
            }
        }
        if let Some(entity) = self.entities.get_mut(id) {
            entity.depends_on.extend(parents.iter().copied());
        }
        if let Some((a, b)) = hinge_pair {
            self.set_collision_ignore(a, b, true);
        }

        self.order.push(id);
        debug!("spawned {name} {id:?}");
        self.events.emit(&WorldEvent::Spawned { id, kind: name });
        self.sort_order();
        self.refresh_hinge_flags();
        Ok(id)
    }

    /// Adds a hinge pinning `driven` to `pivot`, given in world coordinates.
    ///
    /// With `pivot_body == None` the hinge anchors to the world itself.
    pub fn add_hinge(
        &mut self,
        driven: EntityId,
        pivot_body: Option<EntityId>,
        pivot: DVec2,
        angle_lock: bool,
    ) -> Result<EntityId> {
        let offset_a = self.require_body(driven)?.local_point(pivot);
        let endpoint = match pivot_body {
            Some(id) => Endpoint::body(id, self.require_body(id)?.local_point(pivot)),
            None => Endpoint::world(pivot),
        };
        self.add(Spring::hinge(driven, offset_a, endpoint, angle_lock)?)
    }

    /// Adds a spring between two world points on two bodies, at rest at the
    /// current distance.
    pub fn add_spring_between(
        &mut self,
        a: EntityId,
        point_a: DVec2,
        b: EntityId,
        point_b: DVec2,
        constant: f64,
        damping: f64,
    ) -> Result<EntityId> {
        let offset_a = self.require_body(a)?.local_point(point_a);
        let offset_b = self.require_body(b)?.local_point(point_b);
        let spring = Spring::new(
            a,
            offset_a,
            Endpoint::body(b, offset_b),
            constant,
            damping,
            point_a.distance(point_b),
        )?;
        self.add(spring)
    }

    pub fn set_z_depth(&mut self, id: EntityId, z_depth: f64) -> Result<()> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(SandboxError::UnknownEntity(id))?;
        entity.z_depth = z_depth;
        self.sort_order();
        Ok(())
    }

    /// Deletes an entity and, depth-first, everything that depends on it.
    ///
    /// Returns every deleted handle, `id` first.
    pub fn delete(&mut self, id: EntityId) -> Result<Vec<EntityId>> {
        if !self.entities.contains(id) {
            return Err(SandboxError::UnknownEntity(id));
        }
        let mut removed = Vec::new();
        self.delete_cascade(id, None, &mut removed);
        self.refresh_hinge_flags();
        Ok(removed)
    }

    /// Deletes every entity.
    pub fn clear(&mut self) {
        let ids = std::mem::take(&mut self.order);
        self.entities.clear();
        self.bindings.clear();
        self.attractors.clear();
        for id in &ids {
            self.events.emit(&WorldEvent::Deleted { id: *id, by: None });
        }
        info!("cleared world ({} entities)", ids.len());
    }

    fn delete_cascade(&mut self, id: EntityId, by: Option<EntityId>, removed: &mut Vec<EntityId>) {
        if removed.contains(&id) {
            return;
        }
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        removed.push(id);

        let dependents: Vec<EntityId> = entity.dependents.iter().copied().collect();
        let parents: Vec<EntityId> = entity.depends_on.iter().copied().collect();
        let hinge_pair = entity
            .as_spring()
            .filter(|s| s.is_hinge())
            .and_then(|s| s.body_b().map(|b| (s.body_a, b)));

        for dependent in dependents {
            if Some(dependent) != by {
                self.delete_cascade(dependent, Some(id), removed);
            }
        }
        for parent in parents {
            if Some(parent) == by {
                continue;
            }
            if let Some(parent) = self.entities.get_mut(parent) {
                parent.dependents.remove(&id);
            }
        }
        for (_, other) in self.entities.iter_mut() {
            if let Some(body) = other.as_body_mut() {
                body.forces.remove_from_source(id);
                body.collision_ignore.remove(&id);
            }
        }

        self.entities.remove(id);
        if let Some((a, b)) = hinge_pair {
            if !self.hinged_together(a, b) {
                self.set_collision_ignore(a, b, false);
            }
        }
        self.order.retain(|other| *other != id);
        self.bindings.retain(|binding| binding.entity != id);

        debug!("deleted {id:?} (by {by:?})");
        self.events.emit(&WorldEvent::Deleted { id, by });
    }

    fn require_body(&self, id: EntityId) -> Result<&Body> {
        let entity = self
            .entities
            .get(id)
            .ok_or(SandboxError::UnknownEntity(id))?;
        entity.as_body().ok_or(SandboxError::WrongKind {
            id,
            expected: "body",
        })
    }

    fn sort_order(&mut self) {
        let entities = &self.entities;
        let key = |id: &EntityId| {
            entities
                .get(*id)
                .map(|e| (e.is_laser(), e.z_depth))
                .unwrap_or((true, f64::INFINITY))
        };
        self.order.sort_by(|a, b| {
            let (laser_a, z_a) = key(a);
            let (laser_b, z_b) = key(b);
            laser_a.cmp(&laser_b).then(z_a.total_cmp(&z_b))
        });
    }

    fn set_collision_ignore(&mut self, a: EntityId, b: EntityId, ignore: bool) {
        for (this, other) in [(a, b), (b, a)] {
            if let Some(body) = self.body_mut(this) {
                if ignore {
                    body.collision_ignore.insert(other);
                } else {
                    body.collision_ignore.remove(&other);
                }
            }
        }
    }

    fn hinged_together(&self, a: EntityId, b: EntityId) -> bool {
        self.entities.iter().any(|(_, e)| {
            e.as_spring().is_some_and(|s| {
                s.is_hinge()
                    && matches!(
                        (s.body_a, s.body_b()),
                        (x, Some(y)) if (x == a && y == b) || (x == b && y == a)
                    )
            })
        })
    }

    fn refresh_hinge_flags(&mut self) {
        let driven: Vec<EntityId> = self
            .entities
            .iter()
            .filter_map(|(_, e)| e.as_spring())
            .filter(|s| s.is_angle_locked())
            .map(|s| s.body_a)
            .collect();
        for (id, entity) in self.entities.iter_mut() {
            if let Some(body) = entity.as_body_mut() {
                body.hinge_driven = driven.contains(&id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    pub fn get_property(&self, id: EntityId, name: &str) -> Result<PropertyValue> {
        let entity = self
            .entities
            .get(id)
            .ok_or(SandboxError::UnknownEntity(id))?;
        let accessor = self
            .properties
            .lookup(entity.kind.family(), name)
            .ok_or_else(|| SandboxError::UnknownProperty(name.to_string()))?;
        accessor.get(entity)
    }

    /// Writes a property; the change becomes visible on the next step.
    pub fn set_property(&mut self, id: EntityId, name: &str, value: PropertyValue) -> Result<()> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(SandboxError::UnknownEntity(id))?;
        let accessor = self
            .properties
            .lookup(entity.kind.family(), name)
            .ok_or_else(|| SandboxError::UnknownProperty(name.to_string()))?;
        accessor.set(entity, value)
    }

    /// Drives a property from a closure evaluated at the start of every step.
    ///
    /// The closure receives the simulation time. When it fails the error is
    /// logged and the property keeps its previous value.
    pub fn bind<F>(&mut self, id: EntityId, name: &str, source: F) -> Result<BindingId>
    where
        F: FnMut(f64) -> Result<PropertyValue> + Send + 'static,
    {
        let entity = self
            .entities
            .get(id)
            .ok_or(SandboxError::UnknownEntity(id))?;
        if self.properties.lookup(entity.kind.family(), name).is_none() {
            return Err(SandboxError::UnknownProperty(name.to_string()));
        }
        let binding_id = BindingId(self.next_binding);
        self.next_binding += 1;
        self.bindings.push(Binding::new(
            binding_id,
            id,
            name.to_string(),
            Box::new(source),
        ));
        Ok(binding_id)
    }

    pub fn unbind(&mut self, id: BindingId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.id != id);
        before != self.bindings.len()
    }

    fn apply_bindings(&mut self) {
        if self.bindings.is_empty() {
            return;
        }
        let time = self.sim_duration;
        let mut bindings = std::mem::take(&mut self.bindings);
        for binding in &mut bindings {
            let outcome = binding
                .evaluate(time)
                .and_then(|value| self.set_property(binding.entity, &binding.property, value));
            if let Err(err) = outcome {
                warn!("binding {:?} on {:?}: {err}", binding.id, binding.entity);
            }
        }
        self.bindings = bindings;
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advances the simulation by `dt` seconds. See the module docs for phases.
    pub fn step(&mut self, dt: f64) -> StepReport {
        let mut report = StepReport {
            dt,
            sim_duration: self.sim_duration,
            ..StepReport::default()
        };
        if !(dt.is_finite() && dt >= 0.0) {
            warn!("ignoring step with invalid dt {dt}");
            report.skipped = true;
            return report;
        }
        if self.paused && dt != 0.0 {
            report.skipped = true;
            return report;
        }

        let all: Vec<EntityId> = self.order.clone();
        self.refresh_attractors();
        self.apply_bindings();
        self.refresh_hinge_flags();
        self.sim_duration += dt;

        {
            let _timer = ScopedTimer::new("step::forces");
            self.update_forces(&all, dt);
        }

        if dt > 0.0 {
            {
                let _timer = ScopedTimer::new("step::integrate");
                report.removed = self.integrate(&all, dt);
            }
            {
                let _timer = ScopedTimer::new("step::collide");
                report.contacts = self.collide(dt);
            }
        }

        {
            let _timer = ScopedTimer::new("step::dependents");
            self.apply_hinge_locks();
            if dt > 0.0 {
                self.sample_tracers();
            }
            report.rays = self.trace_lasers();
        }

        if dt > 0.0 {
            for id in &all {
                if self.entities.contains(*id) {
                    self.events.emit(&WorldEvent::PostUpdate { id: *id, dt });
                }
            }
        }
        self.events.emit(&WorldEvent::AfterStep {
            dt,
            sim_duration: self.sim_duration,
        });

        report.sim_duration = self.sim_duration;
        report
    }

    fn refresh_attractors(&mut self) {
        self.attractors = self.collect_attractors();
    }

    fn collect_attractors(&self) -> Vec<Attractor> {
        self.entities
            .iter()
            .filter_map(|(id, e)| e.as_body().map(|b| (id, b)))
            .filter(|(_, body)| body.is_attractor())
            .map(|(id, body)| Attractor {
                id,
                position: body.position,
                mass: body.mass(),
                attraction: body.material.attraction,
            })
            .collect()
    }

    fn update_forces(&mut self, all: &[EntityId], dt: f64) {
        let settings = self.settings.clone();
        let attractors = std::mem::take(&mut self.attractors);

        for id in all {
            let Some(body) = self.body_mut(*id) else {
                continue;
            };
            let gravity = gravity_force(&settings, body.mass());
            body.forces
                .set_slot(ForceKind::Gravity, None, gravity, DVec2::ZERO);

            if attractors.iter().any(|a| a.id != *id) {
                let pull = attraction_force(
                    body.position,
                    body.mass(),
                    Some(*id),
                    &attractors,
                    settings.linear_attraction,
                );
                body.forces
                    .set_slot(ForceKind::Attraction, None, pull, DVec2::ZERO);
            } else {
                body.forces.clear_slot(ForceKind::Attraction, None);
            }

            match buoyancy_force(&settings, body.area()) {
                Some(lift) => body
                    .forces
                    .set_slot(ForceKind::Buoyancy, None, lift, DVec2::ZERO),
                None => body.forces.clear_slot(ForceKind::Buoyancy, None),
            }

            if settings.air_friction_enabled {
                let drag = -body.velocity * settings.air_friction;
                body.forces
                    .set_slot(ForceKind::AirFriction, None, drag, DVec2::ZERO);
            } else {
                body.forces.clear_slot(ForceKind::AirFriction, None);
            }
        }
        self.attractors = attractors;

        for id in all {
            match self.entities.get(*id).map(|e| &e.kind) {
                Some(EntityKind::Spring(_)) => self.update_spring(*id, dt),
                Some(EntityKind::Thruster(_)) => self.update_thruster(*id),
                _ => {}
            }
        }
    }

    fn endpoint_state(&self, endpoint: Endpoint) -> Option<EndpointState> {
        match endpoint {
            Endpoint::World { point } => Some(EndpointState::anchored(point)),
            Endpoint::Body { id, offset } => {
                let body = self.body(id)?;
                let point = body.world_point(offset);
                Some(EndpointState {
                    point,
                    velocity: body.point_velocity(point),
                    movable: !body.is_fixed(),
                })
            }
        }
    }

    /// Largest hinge constant the explicit integrator stays stable with.
    fn hinge_stiffness_limit(&self, bodies: impl Iterator<Item = EntityId>, dt: f64) -> Option<f64> {
        let dt = if dt > 0.0 { dt } else { self.settings.time_step() };
        bodies
            .filter_map(|id| self.body(id))
            .filter(|body| !body.is_fixed())
            .map(Body::mass)
            .min_by(f64::total_cmp)
            .map(|mass| HINGE_STABILITY * mass / (dt * dt))
    }

    fn update_spring(&mut self, id: EntityId, dt: f64) {
        let Some(spring) = self.spring(id) else {
            return;
        };
        let (body_a, offset_a, b, is_hinge) =
            (spring.body_a, spring.offset_a, spring.b, spring.is_hinge());
        let limit = if is_hinge {
            self.hinge_stiffness_limit(spring.bodies(), dt)
        } else {
            None
        };
        let (Some(state_a), Some(state_b)) = (
            self.endpoint_state(Endpoint::body(body_a, offset_a)),
            self.endpoint_state(b),
        ) else {
            return;
        };

        let Some(forces) = self
            .entities
            .get_mut(id)
            .and_then(Entity::as_spring_mut)
            .map(|spring| spring.evaluate(state_a, state_b, limit))
        else {
            return;
        };

        let kind = if is_hinge {
            ForceKind::Hinge
        } else {
            ForceKind::Spring
        };
        let mut targets = vec![(body_a, offset_a, forces.on_a)];
        if let Endpoint::Body { id: body_b, offset } = b {
            targets.push((body_b, offset, forces.on_b));
        }
        for (target, offset, force) in targets {
            if let Some(body) = self.body_mut(target) {
                match force {
                    Some(value) => body.forces.set_slot(kind, Some(id), value, offset),
                    None => body.forces.clear_slot(kind, Some(id)),
                }
            }
        }
    }

    fn update_thruster(&mut self, id: EntityId) {
        let Some(thruster) = self.entities.get(id).and_then(Entity::as_thruster) else {
            return;
        };
        let (target, offset, thrust) = (thruster.body, thruster.offset, thruster.clone());
        if let Some(body) = self.body_mut(target) {
            let value = thrust.force(body.angle);
            body.forces
                .set_slot(ForceKind::Thruster, Some(id), value, offset);
        }
    }

    fn integrate(&mut self, all: &[EntityId], dt: f64) -> Vec<EntityId> {
        let angular_drag = if self.settings.air_friction_enabled {
            self.settings.angular_air_friction
        } else {
            0.0
        };
        let integrator = Integrator::new(self.settings.world_bound, angular_drag);

        let mut diverged = Vec::new();
        for id in all {
            if let Some(body) = self.body_mut(*id) {
                if integrator.step(body, dt) == Integration::Diverged {
                    diverged.push(*id);
                }
            }
        }

        let mut removed = Vec::new();
        for id in diverged {
            warn!("body {id:?} diverged and was removed");
            if let Ok(gone) = self.delete(id) {
                removed.extend(gone);
            }
        }
        removed
    }

    fn collide(&mut self, dt: f64) -> Vec<Contact> {
        let ids: Vec<EntityId> = self.bodies().map(|(id, _)| id).collect();
        let mode = if self.settings.all_edge_axes {
            AxisMode::AllEdges
        } else {
            AxisMode::BoxPair
        };
        let exempt = self.settings.self_collision_exempt_mask;

        let mut contacts = Vec::new();
        for (i, &id_a) in ids.iter().enumerate() {
            for &id_b in &ids[i + 1..] {
                let Some((entity_a, entity_b)) = self.entities.get2_mut(id_a, id_b) else {
                    continue;
                };
                let (Some(a), Some(b)) = (entity_a.as_body_mut(), entity_b.as_body_mut()) else {
                    continue;
                };
                if !should_collide(id_a, a, id_b, b, exempt) {
                    continue;
                }
                let reach = a.shape.bounding_radius() + b.shape.bounding_radius();
                if a.position.distance_squared(b.position) > reach * reach {
                    continue;
                }
                let Some(mtv) = detect_bodies(a, b, mode) else {
                    continue;
                };
                if let Some(contact) = resolve(id_a, a, id_b, b, mtv, dt) {
                    contacts.push(contact);
                }
            }
        }
        contacts
    }

    /// Places every angle-locked body at its pivot with the locked orientation.
    fn apply_hinge_locks(&mut self) {
        let mut placements = Vec::new();
        for id in &self.order {
            let Some(spring) = self.spring(*id).filter(|s| s.is_angle_locked()) else {
                continue;
            };
            let relative = spring.hinge.map(|h| h.relative_angle).unwrap_or(0.0);
            let (pivot, base_angle) = match spring.b {
                Endpoint::World { point } => (point, 0.0),
                Endpoint::Body { id, offset } => match self.body(id) {
                    Some(body) => (body.world_point(offset), body.angle),
                    None => continue,
                },
            };
            placements.push((spring.body_a, spring.offset_a, pivot, base_angle + relative));
        }

        for (id, offset, pivot, angle) in placements {
            if let Some(body) = self.body_mut(id) {
                body.angle = angle;
                body.position = pivot - rotate(offset, angle);
                body.velocity = DVec2::ZERO;
                body.angular_velocity = 0.0;
            }
        }
    }

    fn sample_tracers(&mut self) {
        let samples: Vec<(EntityId, DVec2)> = self
            .order
            .iter()
            .filter_map(|id| {
                let tracer = self.entities.get(*id)?.as_tracer()?;
                let body = self.body(tracer.body)?;
                Some((*id, body.world_point(tracer.offset)))
            })
            .collect();
        for (id, point) in samples {
            if let Some(tracer) = self.entities.get_mut(id).and_then(Entity::as_tracer_mut) {
                tracer.sample(point);
            }
        }
    }

    /// Recomputes every laser's ray tree under one shared ray budget.
    fn trace_lasers(&mut self) -> usize {
        let lasers: Vec<EntityId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.entities.get(*id).is_some_and(Entity::is_laser))
            .collect();
        if lasers.is_empty() {
            return 0;
        }

        let edges = collect_edges(self.bodies());
        let mut context = TraceContext::new(
            &edges,
            self.settings.ray_budget,
            self.settings.max_ray_depth,
        );

        let mut total = 0;
        for id in lasers {
            let root = self
                .entities
                .get(id)
                .and_then(Entity::as_laser)
                .filter(|laser| laser.enabled)
                .and_then(|laser| {
                    let body = self.body(laser.body)?;
                    Some((laser.root_ray(body.position, body.angle), laser.body))
                });
            let rays = match root {
                Some((ray, source)) => context.trace(ray, Some(source)),
                None => Vec::new(),
            };
            total += rays.len();
            if let Some(laser) = self.entities.get_mut(id).and_then(Entity::as_laser_mut) {
                laser.set_rays(rays);
            }
        }
        total
    }

    // ------------------------------------------------------------------
    // Read-out
    // ------------------------------------------------------------------

    /// Copies the world into an immutable snapshot in update order.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            sim_duration: self.sim_duration,
            objects: self
                .order
                .iter()
                .filter_map(|id| self.entities.get(*id).cloned())
                .collect(),
        }
    }

    pub fn energy(&self) -> EnergyReport {
        let attractors = self.collect_attractors();
        let mut report = EnergyReport::default();

        for (id, body) in self.bodies() {
            if body.is_fixed() {
                continue;
            }
            report.kinetic += body.kinetic_energy();
            if self.settings.gravity_enabled {
                report.gravitational -= body.mass() * self.settings.gravity.dot(body.position);
            }
            report.attraction += attraction_energy(
                body.position,
                body.mass(),
                Some(id),
                &attractors,
                self.settings.linear_attraction,
            );
        }

        let dt = self.settings.time_step();
        report.elastic = self
            .entities
            .iter()
            .filter_map(|(_, e)| e.as_spring())
            .map(|spring| spring.elastic_energy(dt))
            .sum();
        report
    }
}
