//! Network-layer error types.

use engine_component::{EntityId, StreamError};

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a message to MessagePack.
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a message from MessagePack.
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// An entity bit stream could not be written or read.
    #[error("replication stream error: {0}")]
    Stream(#[from] StreamError),

    /// An update addressed an entity the receiver does not know.
    #[error("update for unknown entity {0}")]
    UnknownEntity(EntityId),

    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS publish error.
    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// NATS flush error.
    #[error("NATS flush error: {0}")]
    Flush(#[from] async_nats::client::FlushError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),
}
