//! # engine_component
//!
//! Component composition and dirty-mask replication for engine entities.
//!
//! This crate provides:
//!
//! - [`Component`] trait and [`ComponentCore`]: lifecycle, dirty bits and the
//!   pack/unpack skeleton shared by every component.
//! - [`Entity`]: the ordered component collection, its sibling signals and
//!   the aggregated replication mask.
//! - [`Behavior`]: a component with declarative, typed fields and named
//!   script callbacks.
//! - [`BitWriter`] / [`BitReader`]: `naia-serde` bit streams with the exact
//!   length bounds the entity framing needs.
//!
//! Replication is driven from outside: an authoritative entity packs its
//! dirty components with [`Entity::pack_update`], a replica applies the
//! result with [`Entity::unpack_update`].

pub mod behavior;
pub mod bitstream;
pub mod component;
pub mod description;
pub mod entity;
pub mod error;
pub mod field;
pub mod mask;
pub mod property;
pub mod signal;

pub use behavior::{Behavior, CallbackRegistry, FIELDS, ScriptCallback, ScriptContext};
pub use bitstream::{BitPayload, BitReader, BitWriter, StreamError};
pub use component::{
    Authority, BasicComponent, Component, ComponentCore, ComponentId, ComponentTypeId,
    FieldChange, GhostTable, NetChannel,
};
pub use entity::{ComponentPolicy, Entity, EntityAllocator, EntityHub, EntityId, OwnerRef};
pub use error::{ComponentError, ScriptError};
pub use field::{FieldDescriptor, FieldParseError, FieldSpec, FieldType, FieldValue};
pub use mask::DirtyMask;
pub use property::{Property, PropertyStore};
pub use signal::{Callback, Signal, SubscriptionToken};
