//! Authoritative world state.
//!
//! The [`World`] owns the entities, allocates their ids and keeps the ghost
//! table that gives named entities a replication index.

use std::collections::{BTreeMap, HashMap};

use engine_component::{Authority, Entity, EntityAllocator, EntityId, GhostTable};
use engine_net::messages::{EntityDestroyed, EntityUpdate, GhostAssigned};
use engine_net::{NetError, ReplicationSender};
use tracing::{debug, info};

/// The canonical entity set of the authoritative process.
#[derive(Debug, Default)]
pub struct World {
    allocator: EntityAllocator,
    entities: BTreeMap<EntityId, Entity>,
    names: HashMap<EntityId, String>,
    ghosts: GhostTable,
    /// Ghosts assigned since the last drain.
    new_ghosts: Vec<GhostAssigned>,
    /// Entities destroyed since the last drain.
    destroyed: Vec<EntityId>,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id, build the entity and register `name` as a ghost so
    /// other entities can reference it.
    pub fn spawn<F>(&mut self, name: &str, build: F) -> EntityId
    where
        F: FnOnce(EntityId, Authority) -> Entity,
    {
        let id = self.allocator.allocate();
        let entity = build(id, Authority::Server);
        self.entities.insert(id, entity);
        self.names.insert(id, name.to_string());

        let index = self.ghosts.register(name);
        self.new_ghosts.push(GhostAssigned {
            index,
            name: name.to_string(),
        });
        info!(entity = %id, name, ghost = index, "spawned entity");
        id
    }

    /// Remove an entity and its ghost. Returns `false` if it did not exist.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(&id) else {
            return false;
        };
        if let Some(name) = self.names.remove(&id) {
            self.ghosts.remove(&name);
        }
        debug!(entity = %id, components = entity.len(), "despawned entity");
        self.destroyed.push(id);
        true
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Run one simulation step on every entity.
    pub fn process_tick(&mut self) {
        for entity in self.entities.values_mut() {
            entity.process_tick();
        }
    }

    /// Pack the entities that need sending this tick.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if an entity cannot be packed.
    pub fn collect_updates(
        &mut self,
        sender: &mut ReplicationSender,
        tick_id: u64,
    ) -> Result<Vec<EntityUpdate>, NetError> {
        sender.collect(tick_id, self.entities.values_mut(), &self.ghosts)
    }

    /// Ghost assignments made since the last call.
    pub fn drain_new_ghosts(&mut self) -> Vec<GhostAssigned> {
        std::mem::take(&mut self.new_ghosts)
    }

    /// Every current ghost assignment, for a replica that just joined.
    #[must_use]
    pub fn all_ghosts(&self) -> Vec<GhostAssigned> {
        self.ghosts
            .iter()
            .map(|(index, name)| GhostAssigned {
                index,
                name: name.to_string(),
            })
            .collect()
    }

    /// Destroy notices for entities removed since the last call.
    pub fn drain_destroyed(&mut self, tick_id: u64) -> Vec<EntityDestroyed> {
        self.destroyed
            .drain(..)
            .map(|entity| EntityDestroyed { tick_id, entity })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use engine_component::BasicComponent;

    use super::*;

    fn empty(id: EntityId, authority: Authority) -> Entity {
        let mut entity = Entity::new(id, authority);
        entity
            .add_component(Box::new(BasicComponent::new("Marker", authority)))
            .unwrap();
        entity
    }

    #[test]
    fn test_spawn_registers_ghost() {
        let mut world = World::new();
        let a = world.spawn("alpha", empty);
        let b = world.spawn("beta", empty);
        assert_ne!(a, b);
        assert_eq!(world.entity_count(), 2);

        let ghosts = world.drain_new_ghosts();
        assert_eq!(ghosts.len(), 2);
        assert_eq!(ghosts[0].name, "alpha");
        assert!(world.drain_new_ghosts().is_empty());
        assert_eq!(world.all_ghosts().len(), 2);
    }

    #[test]
    fn test_despawn_drops_ghost_and_reports() {
        let mut world = World::new();
        let a = world.spawn("alpha", empty);
        assert!(world.despawn(a));
        assert!(!world.despawn(a));
        assert!(world.all_ghosts().is_empty());

        let destroyed = world.drain_destroyed(9);
        assert_eq!(
            destroyed,
            vec![EntityDestroyed {
                tick_id: 9,
                entity: a
            }]
        );
    }

    #[test]
    fn test_collect_updates_sends_full_state_first() {
        let mut world = World::new();
        world.spawn("alpha", empty);
        let mut sender = ReplicationSender::new();

        let first = world.collect_updates(&mut sender, 1).unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].initial);

        let second = world.collect_updates(&mut sender, 2).unwrap();
        assert!(second.is_empty());
    }
}
