use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    attachments::{Thruster, Tracer},
    body::Body,
    constraints::Spring,
};
use crate::{optics::laser::Laser, utils::allocator::EntityId};

/// Concrete payload of a world entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Body(Body),
    Spring(Spring),
    Thruster(Thruster),
    Tracer(Tracer),
    Laser(Laser),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Body(_) => "body",
            EntityKind::Spring(s) if s.is_hinge() => "hinge",
            EntityKind::Spring(_) => "spring",
            EntityKind::Thruster(_) => "thruster",
            EntityKind::Tracer(_) => "tracer",
            EntityKind::Laser(_) => "laser",
        }
    }

    /// Family used to look up properties; hinges share the spring accessors.
    pub fn family(&self) -> &'static str {
        match self {
            EntityKind::Spring(_) => "spring",
            other => other.name(),
        }
    }

    /// Entities this payload cannot live without.
    pub fn parents(&self) -> Vec<EntityId> {
        match self {
            EntityKind::Body(_) => Vec::new(),
            EntityKind::Spring(spring) => spring.bodies().collect(),
            EntityKind::Thruster(thruster) => vec![thruster.body],
            EntityKind::Tracer(tracer) => vec![tracer.body],
            EntityKind::Laser(laser) => vec![laser.body],
        }
    }
}

impl From<Body> for EntityKind {
    fn from(body: Body) -> Self {
        EntityKind::Body(body)
    }
}

impl From<Spring> for EntityKind {
    fn from(spring: Spring) -> Self {
        EntityKind::Spring(spring)
    }
}

impl From<Thruster> for EntityKind {
    fn from(thruster: Thruster) -> Self {
        EntityKind::Thruster(thruster)
    }
}

impl From<Tracer> for EntityKind {
    fn from(tracer: Tracer) -> Self {
        EntityKind::Tracer(tracer)
    }
}

impl From<Laser> for EntityKind {
    fn from(laser: Laser) -> Self {
        EntityKind::Laser(laser)
    }
}

/// Anything living in the world.
///
/// Dependency links are handle sets: `depends_on` lists the entities this one
/// is attached to, `dependents` the entities deleted together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// Draw order; lower values are drawn first.
    pub z_depth: f64,
    pub(crate) depends_on: BTreeSet<EntityId>,
    pub(crate) dependents: BTreeSet<EntityId>,
    pub kind: EntityKind,
}

impl Entity {
    pub(crate) fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            name: format!("{}#{}", kind.name(), id.index()),
            z_depth: 0.0,
            depends_on: BTreeSet::new(),
            dependents: BTreeSet::new(),
            kind,
        }
    }

    pub fn depends_on(&self) -> &BTreeSet<EntityId> {
        &self.depends_on
    }

    pub fn dependents(&self) -> &BTreeSet<EntityId> {
        &self.dependents
    }

    pub fn is_laser(&self) -> bool {
        matches!(self.kind, EntityKind::Laser(_))
    }

    pub fn as_body(&self) -> Option<&Body> {
        match &self.kind {
            EntityKind::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_body_mut(&mut self) -> Option<&mut Body> {
        match &mut self.kind {
            EntityKind::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_spring(&self) -> Option<&Spring> {
        match &self.kind {
            EntityKind::Spring(spring) => Some(spring),
            _ => None,
        }
    }

    pub fn as_spring_mut(&mut self) -> Option<&mut Spring> {
        match &mut self.kind {
            EntityKind::Spring(spring) => Some(spring),
            _ => None,
        }
    }

    pub fn as_thruster(&self) -> Option<&Thruster> {
        match &self.kind {
            EntityKind::Thruster(thruster) => Some(thruster),
            _ => None,
        }
    }

    pub fn as_thruster_mut(&mut self) -> Option<&mut Thruster> {
        match &mut self.kind {
            EntityKind::Thruster(thruster) => Some(thruster),
            _ => None,
        }
    }

    pub fn as_tracer(&self) -> Option<&Tracer> {
        match &self.kind {
            EntityKind::Tracer(tracer) => Some(tracer),
            _ => None,
        }
    }

    pub fn as_tracer_mut(&mut self) -> Option<&mut Tracer> {
        match &mut self.kind {
            EntityKind::Tracer(tracer) => Some(tracer),
            _ => None,
        }
    }

    pub fn as_laser(&self) -> Option<&Laser> {
        match &self.kind {
            EntityKind::Laser(laser) => Some(laser),
            _ => None,
        }
    }

    pub fn as_laser_mut(&mut self) -> Option<&mut Laser> {
        match &mut self.kind {
            EntityKind::Laser(laser) => Some(laser),
            _ => None,
        }
    }
}
