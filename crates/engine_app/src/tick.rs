//! Authoritative tick loop.
//!
//! Each tick:
//!
//! 1. Run `process_tick` on every entity.
//! 2. Publish ghost assignments made since the last tick.
//! 3. Publish destroy notices.
//! 4. Pack dirty entities and publish their updates.
//!
//! A replica joining between ticks triggers a full sync on the next tick
//! and a republish of the whole ghost table.

use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use tracing::{debug, info, warn};

use engine_net::messages::{EntityUpdate, ReplicaJoin};
use engine_net::{NatsConnection, NetError, ReplicationSender, subjects};

use crate::world::World;

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// The authoritative loop state.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    world: World,
    sender: ReplicationSender,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig, world: World) -> Self {
        Self {
            tick_id: 0,
            config,
            world,
            sender: ReplicationSender::new(),
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// A replica joined: send it everything on the next tick.
    pub fn on_replica_join(&mut self, join: &ReplicaJoin) {
        info!(
            replica = join.name,
            instance_id = join.instance_id,
            "replica joined, scheduling full sync"
        );
        self.sender.request_full_sync();
    }

    /// Advance one tick locally and return the updates to publish.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if an entity cannot be packed.
    pub fn tick(&mut self) -> Result<Vec<EntityUpdate>, NetError> {
        self.tick_id += 1;
        self.world.process_tick();
        let updates = self.world.collect_updates(&mut self.sender, self.tick_id)?;
        debug!(tick_id = self.tick_id, updates = updates.len(), "tick");
        Ok(updates)
    }

    fn finished(&self) -> bool {
        self.config.max_ticks > 0 && self.tick_id >= self.config.max_ticks
    }

    /// Run the loop against NATS until `max_ticks` is reached, or forever.
    ///
    /// # Errors
    ///
    /// Returns an error if a NATS operation fails or an entity cannot be
    /// packed.
    pub async fn run_async(&mut self, conn: &NatsConnection) -> Result<()> {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut interval = tokio::time::interval(tick_duration);
        let mut joins = conn.subscribe(subjects::REPLICATION_JOIN).await?;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            tokio::select! {
                biased;

                Some(msg) = joins.next() => {
                    match engine_net::decode::<ReplicaJoin>(&msg.payload) {
                        Ok(join) => {
                            self.on_replica_join(&join);
                            for ghost in self.world.all_ghosts() {
                                conn.publish(subjects::REPLICATION_GHOST, &ghost).await?;
                            }
                        }
                        Err(err) => warn!(%err, "ignoring malformed join"),
                    }
                }

                _ = interval.tick() => {
                    let updates = self.tick()?;
                    for ghost in self.world.drain_new_ghosts() {
                        conn.publish(subjects::REPLICATION_GHOST, &ghost).await?;
                    }
                    for destroyed in self.world.drain_destroyed(self.tick_id) {
                        conn.publish(subjects::REPLICATION_DESTROY, &destroyed).await?;
                    }
                    for update in &updates {
                        conn.publish(subjects::REPLICATION_UPDATE, update).await?;
                    }

                    if self.finished() {
                        conn.flush().await?;
                        info!(ticks = self.tick_id, "tick loop complete");
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{Behavior, Component, EntityId};

    use super::*;
    use crate::prefab::{self, MOVER};

    fn demo_loop() -> (TickLoop, EntityId) {
        let mut world = World::new();
        let id = world.spawn("alpha", prefab::spawn_mover);
        (TickLoop::new(TickConfig::default(), world), id)
    }

    #[test]
    fn test_tick_advances_counter() {
        let (mut tick_loop, _) = demo_loop();
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick().unwrap();
        tick_loop.tick().unwrap();
        assert_eq!(tick_loop.tick_id(), 2);
    }

    #[test]
    fn test_moving_entity_sends_every_tick() {
        let (mut tick_loop, _) = demo_loop();
        let first = tick_loop.tick().unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].initial);

        let second = tick_loop.tick().unwrap();
        assert_eq!(second.len(), 1);
        assert!(!second[0].initial);
        assert_eq!(second[0].tick_id, 2);
    }

    #[test]
    fn test_join_requests_full_sync() {
        let (mut tick_loop, id) = demo_loop();
        tick_loop.tick().unwrap();

        let entity = tick_loop.world_mut().entity_mut(id).unwrap();
        let component = entity.find_component(MOVER).unwrap().id();
        entity
            .component_as_mut::<Behavior>(component)
            .unwrap()
            .set_enabled(false);
        tick_loop.tick().unwrap();

        // Disabled: nothing moves, nothing to send.
        assert!(tick_loop.tick().unwrap().is_empty());

        tick_loop.on_replica_join(&ReplicaJoin {
            name: "viewer".into(),
            instance_id: "inst-1".into(),
        });
        let full = tick_loop.tick().unwrap();
        assert_eq!(full.len(), 1);
        assert!(full[0].initial);
    }

    #[test]
    fn test_finished_after_max_ticks() {
        let mut world = World::new();
        world.spawn("alpha", prefab::spawn_mover);
        let mut tick_loop = TickLoop::new(
            TickConfig {
                tick_rate: 1000.0,
                max_ticks: 2,
            },
            world,
        );
        tick_loop.tick().unwrap();
        assert!(!tick_loop.finished());
        tick_loop.tick().unwrap();
        assert!(tick_loop.finished());
    }
}
