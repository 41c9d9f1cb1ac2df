use crate::{
    core::{body::Body, entity::Entity},
    optics::laser::LaserRay,
    utils::allocator::EntityId,
};

/// Immutable copy of the world published after a step.
///
/// Objects are kept in draw order (by z-depth, lasers last).
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub sim_duration: f64,
    pub objects: Vec<Entity>,
}

impl WorldSnapshot {
    pub fn all(&self) -> &[Entity] {
        &self.objects
    }

    pub fn physical(&self) -> impl Iterator<Item = (EntityId, &Body)> + '_ {
        self.objects
            .iter()
            .filter_map(|e| e.as_body().map(|body| (e.id, body)))
    }

    pub fn non_laser(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.objects.iter().filter(|e| !e.is_laser())
    }

    pub fn rays(&self) -> impl Iterator<Item = &LaserRay> + '_ {
        self.objects
            .iter()
            .filter_map(Entity::as_laser)
            .flat_map(|laser| laser.rays().iter())
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.objects.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
