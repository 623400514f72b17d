//! Replica runner: the process harness around a [`ReplicaWorld`].
//!
//! The runner connects to NATS, announces itself so the authority sends
//! full state, then applies replication traffic in arrival order.

use anyhow::Result;
use futures::StreamExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use engine_net::messages::{EntityDestroyed, EntityUpdate, GhostAssigned, ReplicaJoin};
use engine_net::{NatsConnection, NetError, subjects};

use crate::config::ReplicaConfig;
use crate::world::{EntityFactory, ReplicaWorld};

/// Runs a replica until its subscription closes or the update limit is hit.
#[derive(Debug)]
pub struct ReplicaRunner {
    config: ReplicaConfig,
    instance_id: String,
}

impl ReplicaRunner {
    #[must_use]
    pub fn new(config: ReplicaConfig) -> Self {
        Self {
            config,
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Returns the unique instance ID for this runner.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The join announcement for this replica.
    #[must_use]
    pub fn join_message(&self) -> ReplicaJoin {
        ReplicaJoin {
            name: self.config.name.clone(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Connect, join and apply replication traffic.
    ///
    /// Everything is received on one subscription so updates, ghost
    /// assignments and destroys keep their relative order. Undecodable
    /// messages are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the NATS connection, subscription or join
    /// publish fails.
    pub async fn run(self, factory: EntityFactory) -> Result<ReplicaWorld> {
        let url = engine_net::connection::resolve_url(self.config.nats_url.as_deref());
        info!(
            replica = self.config.name,
            instance_id = self.instance_id,
            url,
            "replica starting"
        );

        let conn = NatsConnection::connect_to(&url).await?;
        let mut sub = conn.subscribe(subjects::REPLICATION_ALL).await?;
        conn.publish(subjects::REPLICATION_JOIN, &self.join_message())
            .await?;
        conn.flush().await?;
        info!(replica = self.config.name, "joined replication");

        let mut world = ReplicaWorld::new(factory);
        let mut applied: u64 = 0;

        while let Some(msg) = sub.next().await {
            let outcome = match msg.subject.as_str() {
                subjects::REPLICATION_UPDATE => {
                    let result = apply_update(&mut world, &msg.payload);
                    if result.is_ok() {
                        applied += 1;
                    }
                    result
                }
                subjects::REPLICATION_GHOST => engine_net::decode::<GhostAssigned>(&msg.payload)
                    .map(|ghost| world.assign_ghost(&ghost)),
                subjects::REPLICATION_DESTROY => {
                    engine_net::decode::<EntityDestroyed>(&msg.payload).map(|destroyed| {
                        if !world.destroy(destroyed.entity) {
                            warn!(entity = %destroyed.entity, "destroy for unknown entity");
                        }
                    })
                }
                _ => Ok(()),
            };

            if let Err(err) = outcome {
                error!(subject = %msg.subject, error = %err, "dropping replication message");
            }

            if self.config.max_updates.is_some_and(|max| applied >= max) {
                info!(applied, "update limit reached");
                break;
            }
        }

        info!(replica = self.config.name, entities = world.len(), "replica stopped");
        Ok(world)
    }
}

fn apply_update(world: &mut ReplicaWorld, payload: &[u8]) -> Result<(), NetError> {
    let update: EntityUpdate = engine_net::decode(payload)?;
    let components = world.apply_update(&update)?;
    tracing::debug!(
        entity = %update.entity,
        tick_id = update.tick_id,
        components,
        "applied update"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_instance_ids_are_unique() {
        let a = ReplicaRunner::new(ReplicaConfig::new("a"));
        let b = ReplicaRunner::new(ReplicaConfig::new("b"));
        assert_ne!(a.instance_id(), b.instance_id());
        assert_eq!(a.name(), "a");
    }

    #[test]
    fn test_join_message_carries_identity() {
        let runner = ReplicaRunner::new(ReplicaConfig::new("viewer").with_max_updates(3));
        let join = runner.join_message();
        assert_eq!(join.name, "viewer");
        assert_eq!(join.instance_id, runner.instance_id());
    }
}
