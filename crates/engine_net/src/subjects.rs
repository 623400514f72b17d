//! NATS subject hierarchy.
//!
//! All engine subjects are prefixed with `engine.` to namespace within a
//! shared NATS cluster.

/// Root prefix for all engine NATS subjects.
pub const PREFIX: &str = "engine";

// ── Replication ─────────────────────────────────────────────────────────────

/// Packed entity state. Authority → Replicas.
pub const REPLICATION_UPDATE: &str = "engine.replication.update";

/// Entity destruction. Authority → Replicas.
pub const REPLICATION_DESTROY: &str = "engine.replication.destroy";

/// Ghost index assignment. Authority → Replicas.
pub const REPLICATION_GHOST: &str = "engine.replication.ghost";

/// Everything on the replication hierarchy, for a single ordered
/// subscription on the replica side.
pub const REPLICATION_ALL: &str = "engine.replication.*";

/// A replica joins and requests full state. Replica → Authority.
pub const REPLICATION_JOIN: &str = "engine.replication.join";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects_share_prefix() {
        for subject in [
            REPLICATION_UPDATE,
            REPLICATION_DESTROY,
            REPLICATION_GHOST,
            REPLICATION_JOIN,
        ] {
            assert!(subject.starts_with(PREFIX));
        }
    }
}
