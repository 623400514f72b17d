//! # engine_net
//!
//! NATS transport for entity replication.
//!
//! This crate provides:
//!
//! - [`subjects`]: NATS subject constants.
//! - [`messages`]: envelopes exchanged between the authority and replicas.
//! - [`codec`]: MessagePack serialisation/deserialisation helpers.
//! - [`connection`]: NATS connection management.
//! - [`replication`]: packing entities into envelopes and applying them.
//! - [`error`]: network-layer error types.

pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod replication;
pub mod subjects;

pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use replication::{ReplicationReceiver, ReplicationSender};
