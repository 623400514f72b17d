//! # engine_replica
//!
//! The replica side of entity replication.
//!
//! - [`ReplicaWorld`]: entities rebuilt from replicated state.
//! - [`ReplicaRunner`]: connects to NATS, joins and applies traffic.
//! - [`ReplicaConfig`]: replica name and connection settings.

pub mod config;
pub mod runner;
pub mod world;

pub use config::ReplicaConfig;
pub use runner::ReplicaRunner;
pub use world::{EntityFactory, ReplicaWorld};
