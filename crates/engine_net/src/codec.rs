//! MessagePack envelope codec.
//!
//! Envelopes are written as MessagePack maps with field names, so a replica
//! built against an older envelope still decodes the fields it knows. The
//! entity bit stream inside [`EntityUpdate`](crate::messages::EntityUpdate)
//! is opaque to this layer.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// Encode an envelope.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode an envelope received on the wire.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if the bytes are not a valid envelope of
/// type `T`.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use engine_component::EntityId;

    use super::*;
    use crate::messages::{EntityDestroyed, GhostAssigned};

    #[test]
    fn test_ghost_assignment_survives_codec() {
        let ghost = GhostAssigned {
            index: 3,
            name: "Door".to_string(),
        };
        let bytes = encode(&ghost).unwrap();
        assert_eq!(decode::<GhostAssigned>(&bytes).unwrap(), ghost);
    }

    #[test]
    fn test_envelope_ignores_unknown_fields() {
        #[derive(Serialize)]
        struct NewerDestroy {
            tick_id: u64,
            entity: EntityId,
            reason: String,
        }
        let bytes = encode(&NewerDestroy {
            tick_id: 4,
            entity: EntityId(9),
            reason: "despawned".to_string(),
        })
        .unwrap();
        let destroyed: EntityDestroyed = decode(&bytes).unwrap();
        assert_eq!(destroyed.entity, EntityId(9));
        assert_eq!(destroyed.tick_id, 4);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode::<GhostAssigned>(&[0xFF, 0xFF]).is_err());
    }
}
