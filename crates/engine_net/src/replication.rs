//! Turning entity bit streams into envelopes and back.
//!
//! [`ReplicationSender`] runs on the authoritative side: each tick it packs
//! the entities with pending state into [`EntityUpdate`]s. A replica feeds
//! received envelopes to a [`ReplicationReceiver`], which unpacks them into
//! its own entities in arrival order.

use std::collections::HashMap;

use engine_component::{BitReader, BitWriter, Entity, EntityId, NetChannel, StreamError};
use tracing::debug;

use crate::error::NetError;
use crate::messages::EntityUpdate;

/// Packs dirty entities into update envelopes.
#[derive(Debug, Default)]
pub struct ReplicationSender {
    full_sync: bool,
    updates_sent: u64,
}

impl ReplicationSender {
    /// A sender whose first collect sends full state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            full_sync: true,
            updates_sent: 0,
        }
    }

    /// Send full state on the next collect, e.g. because a replica joined.
    pub fn request_full_sync(&mut self) {
        self.full_sync = true;
    }

    #[must_use]
    pub fn full_sync_pending(&self) -> bool {
        self.full_sync
    }

    /// Total envelopes produced so far.
    #[must_use]
    pub fn updates_sent(&self) -> u64 {
        self.updates_sent
    }

    /// Pack every entity with pending state, or every entity when a full
    /// sync was requested.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Stream`] if an entity cannot be packed.
    pub fn collect<'a, I>(
        &mut self,
        tick_id: u64,
        entities: I,
        channel: &dyn NetChannel,
    ) -> Result<Vec<EntityUpdate>, NetError>
    where
        I: IntoIterator<Item = &'a mut Entity>,
    {
        let initial = std::mem::take(&mut self.full_sync);
        let mut updates = Vec::new();

        for entity in entities {
            if !initial && !entity.is_dirty() {
                continue;
            }
            let mut writer = BitWriter::new();
            let components = entity.pack_update(channel, initial, &mut writer)?;
            debug!(tick_id, entity = %entity.id(), components, initial, "packed entity");

            let bits = u32::try_from(writer.bits_written()).map_err(|_| {
                StreamError::Framing(format!(
                    "entity {} update of {} bits exceeds the envelope limit",
                    entity.id(),
                    writer.bits_written()
                ))
            })?;
            updates.push(EntityUpdate {
                tick_id,
                entity: entity.id(),
                initial,
                bits,
                payload: writer.to_bytes(),
            });
        }

        self.updates_sent += updates.len() as u64;
        Ok(updates)
    }
}

/// Applies update envelopes to replica entities.
#[derive(Debug, Default)]
pub struct ReplicationReceiver {
    last_tick: HashMap<EntityId, u64>,
}

impl ReplicationReceiver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `update` to `entity`. Updates older than the last one applied
    /// to the same entity are dropped, unless they carry full state.
    /// Returns the number of components applied.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::UnknownEntity`] if `update` addresses a different
    /// entity, and [`NetError::Stream`] if the entity framing is truncated.
    pub fn apply(
        &mut self,
        update: &EntityUpdate,
        entity: &mut Entity,
        channel: &dyn NetChannel,
    ) -> Result<usize, NetError> {
        if update.entity != entity.id() {
            return Err(NetError::UnknownEntity(update.entity));
        }

        if let Some(&last) = self.last_tick.get(&update.entity) {
            if update.tick_id < last && !update.initial {
                debug!(entity = %update.entity, tick_id = update.tick_id, last, "dropping stale update");
                return Ok(0);
            }
        }

        let mut reader = BitReader::with_bit_len(&update.payload, update.bits as usize);
        let applied = entity.unpack_update(channel, &mut reader)?;
        self.last_tick.insert(update.entity, update.tick_id);
        Ok(applied)
    }

    /// Forget an entity that was destroyed.
    pub fn forget(&mut self, entity: EntityId) {
        self.last_tick.remove(&entity);
    }
}
