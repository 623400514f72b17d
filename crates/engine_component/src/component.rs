//! The [`Component`] base contract.
//!
//! A component is an attachable unit of state and per-tick logic. Its base
//! state lives in a [`ComponentCore`]; concrete components embed one and
//! implement the trait's hooks. The lifecycle, dirty-mask bookkeeping and the
//! pack/unpack skeleton are provided methods of the trait, so every component
//! follows the same sequence:
//!
//! ```text
//! Unattached --attach--> Attached --detach--> Unattached --attach--> ...
//! ```
//!
//! Attaching to a different entity while attached runs the full detach
//! sequence first.
//!
//! ## Type identity
//!
//! [`ComponentTypeId`] is derived from the component's type name using the
//! FNV-1a 64-bit hash. It is deterministic and language-neutral, and the
//! entity wire format uses it to check that sender and receiver agree on the
//! component at each position.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::bitstream::{BitReader, BitWriter, StreamError};
use crate::description::load_description;
use crate::entity::{EntityId, OwnerRef};
use crate::error::ScriptError;
use crate::field::parse_bool;
use crate::mask::{DirtyMask, ENABLE, OWNER};
use crate::property::PropertyStore;
use crate::signal::{Callback, Signal, SubscriptionToken};

/// A unique identifier for a component type, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] of a type name.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The low 16 bits, written per component by the entity wire format.
    #[must_use]
    pub const fn wire_tag(self) -> u16 {
        self.0 as u16
    }
}

/// Stable identity of one component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub Uuid);

impl ComponentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which timeline a component lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Authority {
    /// The authoritative, simulating side. Tracks changes and runs callbacks.
    #[default]
    Server,
    /// A replica that only applies decoded state.
    Replica,
}

/// The connection a pack or unpack runs against. Maps named objects to the
/// ghost indices both sides agree on.
pub trait NetChannel {
    /// Ghost index of `object`, or `None` if it has not been replicated yet.
    fn ghost_index(&self, object: &str) -> Option<u32>;

    /// Name of the object behind a ghost index.
    fn resolve_ghost(&self, index: u32) -> Option<String>;
}

/// In-process [`NetChannel`]. The authoritative side assigns indices in
/// registration order; a replica records the assignments it is sent.
#[derive(Debug, Clone, Default)]
pub struct GhostTable {
    indices: HashMap<String, u32>,
    names: BTreeMap<u32, String>,
    next_index: u32,
}

impl GhostTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning its ghost index. Registering twice returns
    /// the same index.
    pub fn register(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.indices.get(name) {
            return index;
        }
        let index = self.next_index;
        self.assign(index, name);
        index
    }

    /// Record that `name` is ghost `index`, replacing any previous holder of
    /// either.
    pub fn assign(&mut self, index: u32, name: &str) {
        if let Some(previous) = self.names.insert(index, name.to_string()) {
            self.indices.remove(&previous);
        }
        if let Some(old_index) = self.indices.insert(name.to_string(), index) {
            if old_index != index {
                self.names.remove(&old_index);
            }
        }
        self.next_index = self.next_index.max(index + 1);
    }

    /// Drop the ghost of `name`.
    pub fn remove(&mut self, name: &str) -> Option<u32> {
        let index = self.indices.remove(name)?;
        self.names.remove(&index);
        Some(index)
    }

    /// All assignments in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names.iter().map(|(index, name)| (*index, name.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NetChannel for GhostTable {
    fn ghost_index(&self, object: &str) -> Option<u32> {
        self.indices.get(object).copied()
    }

    fn resolve_ghost(&self, index: u32) -> Option<String> {
        self.names.get(&index).cloned()
    }
}

/// Arguments of a field-set notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub component: ComponentId,
    pub name: String,
    pub value: String,
}

/// Base state shared by every component.
pub struct ComponentCore {
    id: ComponentId,
    type_name: String,
    type_id: ComponentTypeId,
    authority: Authority,
    friendly_name: Option<String>,
    description: String,
    enabled: bool,
    owner: Option<OwnerRef>,
    subscriptions: Option<(SubscriptionToken, SubscriptionToken)>,
    dirty: DirtyMask,
    dependencies: Vec<String>,
    properties: PropertyStore,
    on_field_set: Signal<Callback<FieldChange>>,
}

impl ComponentCore {
    /// A detached, enabled component core.
    pub fn new(type_name: impl Into<String>, authority: Authority) -> Self {
        let type_name = type_name.into();
        Self {
            id: ComponentId::new(),
            type_id: ComponentTypeId::from_name(&type_name),
            type_name,
            authority,
            friendly_name: None,
            description: String::new(),
            enabled: true,
            owner: None,
            subscriptions: None,
            dirty: DirtyMask::new(),
            dependencies: Vec::new(),
            properties: PropertyStore::new(),
            on_field_set: Signal::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    #[must_use]
    pub fn authority(&self) -> Authority {
        self.authority
    }

    #[must_use]
    pub fn is_server(&self) -> bool {
        self.authority == Authority::Server
    }

    #[must_use]
    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    pub fn set_friendly_name(&mut self, name: impl Into<String>) {
        self.friendly_name = Some(name.into());
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the description from inline text or from the file it names.
    pub fn set_description(&mut self, text_or_path: &str) {
        self.description = load_description(text_or_path);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn owner(&self) -> Option<&OwnerRef> {
        self.owner.as_ref()
    }

    /// The owning entity, if attached.
    #[must_use]
    pub fn owner_id(&self) -> Option<EntityId> {
        self.owner.as_ref().map(OwnerRef::entity)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    /// Enabled and attached: the condition for per-tick logic.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.owner.is_some()
    }

    #[must_use]
    pub fn dirty(&self) -> DirtyMask {
        self.dirty
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    /// Subscribe to field-set notifications. They fire only while attached.
    pub fn on_field_set(&mut self, callback: Callback<FieldChange>) -> SubscriptionToken {
        self.on_field_set.subscribe(callback)
    }

    pub fn remove_field_set_listener(&mut self, token: SubscriptionToken) -> bool {
        self.on_field_set.unsubscribe(token)
    }

    /// Declare a soft prerequisite on another component type.
    pub fn add_dependency(&mut self, type_name: impl Into<String>) {
        let type_name = type_name.into();
        if !self.dependencies.contains(&type_name) {
            self.dependencies.push(type_name);
        }
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Dependencies not satisfied by the `present` type names.
    #[must_use]
    pub fn missing_dependencies<'a>(&'a self, present: &[&str]) -> Vec<&'a str> {
        self.dependencies
            .iter()
            .map(String::as_str)
            .filter(|dep| !present.contains(dep))
            .collect()
    }

    /// OR `bits` into the dirty mask and forward them to the owner.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is zero. Marking nothing dirty is a defect in the
    /// calling component.
    pub fn mark_dirty(&mut self, bits: u32) {
        assert!(
            bits != 0,
            "component '{}' marked zero dirty bits",
            self.type_name
        );
        self.dirty.set(bits);
        if let Some(owner) = &self.owner {
            owner.set_component_net_mask(self.id, bits);
        }
    }

    /// Clear dirty bits after they were written.
    pub fn clear_dirty(&mut self, bits: u32) {
        self.dirty.clear(bits);
    }

    /// Fire field-set listeners. Returns `false` when suppressed because the
    /// component has no owner yet.
    pub fn notify_field_set(&mut self, name: &str, value: &str) -> bool {
        if self.owner.is_none() {
            return false;
        }
        let change = FieldChange {
            component: self.id,
            name: name.to_string(),
            value: value.to_string(),
        };
        self.on_field_set.trigger(&change);
        true
    }

    /// Write the base group: the enable flag and, if set, the enabled state.
    pub fn pack_base(&self, mask: u32, writer: &mut BitWriter) -> u32 {
        if writer.write_flag(mask & ENABLE != 0) {
            writer.write_flag(self.enabled);
        }
        0
    }

    /// Read the base group written by [`pack_base`](Self::pack_base).
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if the reader runs out of bits.
    pub fn unpack_base(&mut self, reader: &mut BitReader<'_>) -> Result<(), StreamError> {
        if reader.read_flag()? {
            self.enabled = reader.read_flag()?;
        }
        Ok(())
    }
}

impl fmt::Debug for ComponentCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCore")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("authority", &self.authority)
            .field("enabled", &self.enabled)
            .field("owner", &self.owner_id())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// The component contract.
///
/// Implementors embed a [`ComponentCore`] and expose it through
/// [`core`](Self::core)/[`core_mut`](Self::core_mut). Every hook has an
/// empty default; the lifecycle and replication sequences are provided
/// methods that call into the hooks.
///
/// # Examples
///
/// ```rust
/// use std::any::Any;
/// use engine_component::{Authority, Component, ComponentCore};
///
/// struct Light {
///     core: ComponentCore,
/// }
///
/// impl Component for Light {
///     fn core(&self) -> &ComponentCore { &self.core }
///     fn core_mut(&mut self) -> &mut ComponentCore { &mut self.core }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
///
/// let mut light = Light { core: ComponentCore::new("Light", Authority::Server) };
/// light.set_enabled(false);
/// assert!(!light.core().is_enabled());
/// ```
pub trait Component: Send + Sync + 'static {
    fn core(&self) -> &ComponentCore;
    fn core_mut(&mut self) -> &mut ComponentCore;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    // ── Hooks ─────────────────────────────────────────────────────

    /// Called after the owner is set.
    fn on_component_add(&mut self) {}

    /// Called while the owner is still set, just before it is cleared.
    fn on_component_remove(&mut self) {}

    /// A sibling was added to the owning entity.
    fn component_added_to_owner(&mut self, _sibling: &dyn Component) {}

    /// A sibling was removed from the owning entity.
    fn component_removed_from_owner(&mut self, _sibling: &dyn Component) {}

    /// One simulation step.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError`] if per-tick logic failed. The entity logs it
    /// and continues with the next component.
    fn process_tick(&mut self) -> Result<(), ScriptError> {
        Ok(())
    }

    /// A property changed. The base implementation notifies field-set
    /// listeners once attached.
    fn on_field_mutation(&mut self, name: &str, value: &str) {
        self.core_mut().notify_field_set(name, value);
    }

    /// Record that `name` changed on the authoritative side.
    fn track_field_change(&mut self, _name: &str) {}

    /// Encode the groups selected by `mask`, base group first. Returns the
    /// bits that could not be satisfied.
    fn pack_update(
        &mut self,
        _channel: &dyn NetChannel,
        mask: u32,
        writer: &mut BitWriter,
    ) -> Result<u32, StreamError> {
        Ok(self.core().pack_base(mask, writer))
    }

    /// Decode what [`pack_update`](Self::pack_update) wrote, in the same
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] on truncated or malformed input.
    fn unpack_update(
        &mut self,
        _channel: &dyn NetChannel,
        reader: &mut BitReader<'_>,
    ) -> Result<(), StreamError> {
        self.core_mut().unpack_base(reader)
    }

    /// Append persisted `name = "value";` lines for non-default fields.
    fn write_fields(&self, _out: &mut String) {}

    // ── Provided ──────────────────────────────────────────────────

    #[must_use]
    fn id(&self) -> ComponentId {
        self.core().id()
    }

    #[must_use]
    fn type_name(&self) -> &str {
        self.core().type_name()
    }

    /// Attach to `owner`. A component owned by another entity is detached
    /// first. On the authoritative side the owner bit is marked and any
    /// pending bits are delivered to the new owner.
    fn attach(&mut self, owner: OwnerRef) {
        match self.core().owner().map(|current| current.same_entity(&owner)) {
            Some(true) => return,
            Some(false) => self.detach(),
            None => {}
        }

        let id = self.id();
        let subscriptions = owner.subscribe(id);
        debug!(component = %id, entity = %owner.entity(), type_name = self.type_name(), "attach");
        {
            let core = self.core_mut();
            core.subscriptions = subscriptions;
            if let Some(authority) = owner.authority() {
                core.authority = authority;
            }
            core.properties.set("owner", &owner.entity().id().to_string());
            core.owner = Some(owner);
        }

        self.on_component_add();

        let core = self.core_mut();
        if core.is_server() {
            core.mark_dirty(OWNER);
            let pending = core.dirty.bits();
            if let Some(owner) = &core.owner {
                owner.set_component_net_mask(core.id, pending);
            }
        }
    }

    /// Detach from the current owner. Detaching an unattached component does
    /// nothing.
    fn detach(&mut self) {
        let Some(owner) = self.core().owner().cloned() else {
            return;
        };
        let id = self.id();
        debug!(component = %id, entity = %owner.entity(), "detach");

        if let Some((added, removed)) = self.core_mut().subscriptions.take() {
            owner.unsubscribe(id, added, removed);
        }
        self.on_component_remove();

        let core = self.core_mut();
        core.owner = None;
        core.properties.remove("owner");
    }

    /// Set the enabled flag. Marks the enable bit even when the value does
    /// not change.
    fn set_enabled(&mut self, enabled: bool) {
        let core = self.core_mut();
        core.enabled = enabled;
        core.mark_dirty(ENABLE);
    }

    /// Mark `bits` dirty.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is zero.
    fn mark_dirty(&mut self, bits: u32) {
        self.core_mut().mark_dirty(bits);
    }

    /// Set a property from text. `"enabled"` routes to
    /// [`set_enabled`](Self::set_enabled).
    fn set_data_field(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("enabled") {
            self.set_enabled(parse_bool(value).unwrap_or(false));
        } else {
            self.core_mut().properties.set(name, value);
            if self.core().is_server() {
                self.track_field_change(name);
            }
        }
        self.on_field_mutation(name, value);
    }

    /// Pack the state selected by `mask`, then clear the dirty bits that were
    /// written. Returns the unresolved bits, which stay dirty.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if a payload could not be written. The dirty
    /// mask is left untouched in that case.
    fn pack(
        &mut self,
        channel: &dyn NetChannel,
        mask: u32,
        writer: &mut BitWriter,
    ) -> Result<u32, StreamError> {
        let effective = self.core().dirty().effective(mask);
        let unresolved = self.pack_update(channel, effective, writer)?;
        self.core_mut().clear_dirty(effective & !unresolved);
        Ok(unresolved)
    }

    /// Apply a packed update.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] on truncated or malformed input.
    fn unpack(
        &mut self,
        channel: &dyn NetChannel,
        reader: &mut BitReader<'_>,
    ) -> Result<(), StreamError> {
        self.unpack_update(channel, reader)
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core().fmt(f)
    }
}

/// A component with only base state. Useful as a tag on an entity.
#[derive(Debug)]
pub struct BasicComponent {
    core: ComponentCore,
}

impl BasicComponent {
    pub fn new(type_name: impl Into<String>, authority: Authority) -> Self {
        Self {
            core: ComponentCore::new(type_name, authority),
        }
    }
}

impl Component for BasicComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Log a failed lock on an entity hub.
pub(crate) fn hub_poisoned(entity: EntityId) {
    error!(entity = %entity, "entity hub lock poisoned");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{INITIAL_UPDATE, NEXT_FREE};

    fn roundtrip<C: Component>(from: &mut C, to: &mut C, mask: u32) -> u32 {
        let channel = GhostTable::new();
        let mut w = BitWriter::new();
        let unresolved = from.pack(&channel, mask, &mut w).unwrap();
        let bits = w.bits_written();
        let bytes = w.to_bytes();
        let mut r = BitReader::with_bit_len(&bytes, bits);
        to.unpack(&channel, &mut r).unwrap();
        assert_eq!(r.remaining_bits(), 0);
        unresolved
    }

    #[test]
    fn test_fnv1a_known_vector() {
        // FNV-1a 64-bit of the empty string is the offset basis itself.
        assert_eq!(
            ComponentTypeId::from_name(""),
            ComponentTypeId(0xcbf2_9ce4_8422_2325)
        );
        assert_ne!(
            ComponentTypeId::from_name("Mesh"),
            ComponentTypeId::from_name("Collision")
        );
    }

    #[test]
    fn test_type_id_follows_type_name() {
        let c = BasicComponent::new("Mesh", Authority::Server);
        assert_eq!(c.core().type_id(), ComponentTypeId::from_name("Mesh"));
    }

    #[test]
    fn test_component_id_serialization_roundtrip() {
        let id = ComponentId::new();
        let bytes = rmp_serde::to_vec(&id).unwrap();
        let restored: ComponentId = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(id, restored);
    }

    #[test]
    #[should_panic(expected = "zero dirty bits")]
    fn test_mark_dirty_zero_is_fatal() {
        let mut c = BasicComponent::new("Mesh", Authority::Server);
        c.mark_dirty(0);
    }

    #[test]
    fn test_detached_marks_are_retained() {
        let mut c = BasicComponent::new("Mesh", Authority::Server);
        c.mark_dirty(NEXT_FREE);
        assert!(c.core().dirty().contains(NEXT_FREE));
        assert!(!c.core().is_attached());
    }

    #[test]
    fn test_set_enabled_always_marks() {
        let mut c = BasicComponent::new("Mesh", Authority::Server);
        c.set_enabled(true);
        assert!(c.core().dirty().contains(ENABLE));
    }

    #[test]
    fn test_enabled_roundtrip_and_idempotent_pack() {
        let mut server = BasicComponent::new("Mesh", Authority::Server);
        let mut replica = BasicComponent::new("Mesh", Authority::Replica);

        server.set_enabled(false);
        assert_eq!(roundtrip(&mut server, &mut replica, ENABLE), 0);
        assert!(!replica.core().is_enabled());
        assert!(server.core().dirty().is_clear());

        // Nothing dirty: only the negative presence flag goes out.
        let channel = GhostTable::new();
        let mut w = BitWriter::new();
        server.pack(&channel, ENABLE, &mut w).unwrap();
        assert_eq!(w.bits_written(), 1);
        assert_eq!(w.as_bytes(), &[0]);
    }

    #[test]
    fn test_initial_update_sends_everything() {
        let mut server = BasicComponent::new("Mesh", Authority::Server);
        let mut replica = BasicComponent::new("Mesh", Authority::Replica);
        replica.core.enabled = false;

        roundtrip(&mut server, &mut replica, INITIAL_UPDATE | ENABLE);
        assert!(replica.core().is_enabled());
    }

    #[test]
    fn test_enabled_field_routes_to_set_enabled() {
        let mut c = BasicComponent::new("Mesh", Authority::Server);
        c.set_data_field("enabled", "0");
        assert!(!c.core().is_enabled());
        assert!(c.core().dirty().contains(ENABLE));
        assert_eq!(c.core().properties().get_text("enabled"), None);
    }

    #[test]
    fn test_dependencies() {
        let mut c = BasicComponent::new("Collision", Authority::Server);
        c.core_mut().add_dependency("Mesh");
        c.core_mut().add_dependency("Mesh");
        c.core_mut().add_dependency("Physics");
        assert_eq!(c.core().dependencies().len(), 2);
        assert_eq!(c.core().missing_dependencies(&["Mesh"]), vec!["Physics"]);
    }

    #[test]
    fn test_ghost_table_is_stable() {
        let mut ghosts = GhostTable::new();
        let a = ghosts.register("Door");
        let b = ghosts.register("Key");
        assert_eq!(ghosts.register("Door"), a);
        assert_eq!(ghosts.ghost_index("Key"), Some(b));
        assert_eq!(ghosts.resolve_ghost(a).as_deref(), Some("Door"));
        assert_eq!(ghosts.resolve_ghost(9), None);
    }

    #[test]
    fn test_ghost_assignment_replaces_previous_holder() {
        let mut ghosts = GhostTable::new();
        ghosts.assign(4, "Door");
        ghosts.assign(4, "Key");
        assert_eq!(ghosts.ghost_index("Door"), None);
        assert_eq!(ghosts.resolve_ghost(4).as_deref(), Some("Key"));
        // Fresh registrations continue after the highest assigned index.
        assert_eq!(ghosts.register("Lamp"), 5);
        assert_eq!(ghosts.remove("Key"), Some(4));
        assert_eq!(ghosts.iter().collect::<Vec<_>>(), vec![(5, "Lamp")]);
    }
}
