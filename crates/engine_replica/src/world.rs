//! Replica-side entity storage.
//!
//! Entities are created on first sight from a prefab factory so that their
//! component layout matches the authoritative side, then updated in arrival
//! order.

use std::collections::BTreeMap;

use engine_component::{Authority, Entity, EntityId, GhostTable};
use engine_net::NetError;
use engine_net::ReplicationReceiver;
use engine_net::messages::{EntityUpdate, GhostAssigned};
use tracing::{debug, info};

/// Builds a replica entity with the same components, in the same order, as
/// the authoritative entity of that id.
pub type EntityFactory = Box<dyn Fn(EntityId, Authority) -> Entity + Send + Sync>;

/// The replica's view of the world.
pub struct ReplicaWorld {
    entities: BTreeMap<EntityId, Entity>,
    factory: EntityFactory,
    receiver: ReplicationReceiver,
    ghosts: GhostTable,
}

impl ReplicaWorld {
    #[must_use]
    pub fn new(factory: EntityFactory) -> Self {
        Self {
            entities: BTreeMap::new(),
            factory,
            receiver: ReplicationReceiver::new(),
            ghosts: GhostTable::new(),
        }
    }

    /// Apply an update, creating the entity if this is the first time it is
    /// seen. Returns the number of components applied.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the update framing cannot be read.
    pub fn apply_update(&mut self, update: &EntityUpdate) -> Result<usize, NetError> {
        let entity = self.entities.entry(update.entity).or_insert_with(|| {
            info!(entity = %update.entity, "replicating new entity");
            (self.factory)(update.entity, Authority::Replica)
        });
        self.receiver.apply(update, entity, &self.ghosts)
    }

    /// Drop a destroyed entity. Returns `false` if it was unknown.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        self.receiver.forget(id);
        let removed = self.entities.remove(&id).is_some();
        debug!(entity = %id, removed, "entity destroyed");
        removed
    }

    pub fn assign_ghost(&mut self, ghost: &GhostAssigned) {
        self.ghosts.assign(ghost.index, &ghost.name);
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Persisted field lines of every component of `id`, for logging.
    #[must_use]
    pub fn describe(&self, id: EntityId) -> Option<String> {
        let entity = self.entities.get(&id)?;
        let mut out = String::new();
        for component in entity.components() {
            out.push_str(component.type_name());
            out.push_str(if component.core().is_enabled() { " {\n" } else { " (disabled) {\n" });
            component.write_fields(&mut out);
            out.push_str("}\n");
        }
        Some(out)
    }
}

impl std::fmt::Debug for ReplicaWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaWorld")
            .field("entities", &self.entities.len())
            .field("ghosts", &self.ghosts.len())
            .finish_non_exhaustive()
    }
}
