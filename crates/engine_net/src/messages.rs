//! Message types exchanged between the authoritative side and replicas.
//!
//! All message types derive `Serialize` and `Deserialize` for MessagePack
//! transport. The entity state itself travels as an opaque bit stream inside
//! [`EntityUpdate`]; the envelope only carries routing data.

use engine_component::EntityId;
use serde::{Deserialize, Serialize};

// ── Replication ─────────────────────────────────────────────────────────────

/// Packed state of one entity.
/// Published on [`subjects::REPLICATION_UPDATE`](crate::subjects::REPLICATION_UPDATE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdate {
    /// The tick the state was packed on.
    pub tick_id: u64,
    /// The entity the payload belongs to.
    pub entity: EntityId,
    /// Full state rather than a delta.
    pub initial: bool,
    /// Number of meaningful bits in `payload`.
    pub bits: u32,
    /// The entity bit stream.
    pub payload: Vec<u8>,
}

/// Broadcast when an entity is destroyed on the authoritative side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDestroyed {
    /// The tick the entity was destroyed on.
    pub tick_id: u64,
    /// The entity that was removed.
    pub entity: EntityId,
}

/// Assigns a ghost index to a named object, so object references in field
/// payloads resolve on the replica.
/// Published on [`subjects::REPLICATION_GHOST`](crate::subjects::REPLICATION_GHOST).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostAssigned {
    pub index: u32,
    pub name: String,
}

// ── Replica management ──────────────────────────────────────────────────────

/// A replica announces itself and asks for full state.
/// Published on [`subjects::REPLICATION_JOIN`](crate::subjects::REPLICATION_JOIN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaJoin {
    /// Human-readable replica name.
    pub name: String,
    /// Unique instance identifier (UUID).
    pub instance_id: String,
}
