//! The entity side of the component contract.
//!
//! An [`Entity`] owns an ordered list of components. The state components
//! need to reach while attached (the added/removed signals and the
//! per-component net masks) lives in an [`EntityHub`] behind an
//! `Arc<RwLock<..>>`; components hold only an [`OwnerRef`], a weak handle to
//! that hub.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::bitstream::{BitReader, BitWriter, StreamError};
use crate::component::{Authority, Component, ComponentId, NetChannel, hub_poisoned};
use crate::error::ComponentError;
use crate::signal::{Signal, SubscriptionToken};

/// A unique entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The null / invalid entity sentinel.
    pub const INVALID: EntityId = EntityId(0);

    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) entity.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates monotonically increasing entity IDs.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator. IDs start at 1 (0 is reserved for [`EntityId::INVALID`]).
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Returns the number of entities allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Entity state reachable from attached components.
#[derive(Debug)]
pub struct EntityHub {
    entity: EntityId,
    authority: Authority,
    on_component_added: Signal<ComponentId>,
    on_component_removed: Signal<ComponentId>,
    net_masks: HashMap<ComponentId, u32>,
}

impl EntityHub {
    fn new(entity: EntityId, authority: Authority) -> Self {
        Self {
            entity,
            authority,
            on_component_added: Signal::new(),
            on_component_removed: Signal::new(),
            net_masks: HashMap::new(),
        }
    }

    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Aggregate a component's dirty bits into the entity's replication mask.
    pub fn set_component_net_mask(&mut self, component: ComponentId, bits: u32) {
        if bits != 0 {
            *self.net_masks.entry(component).or_default() |= bits;
        }
    }

    #[must_use]
    pub fn component_net_mask(&self, component: ComponentId) -> u32 {
        self.net_masks.get(&component).copied().unwrap_or(0)
    }

    /// Returns `true` if any component has bits waiting to be packed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.net_masks.values().any(|bits| *bits != 0)
    }

    /// Components subscribed to sibling additions.
    #[must_use]
    pub fn added_subscribers(&self) -> Vec<ComponentId> {
        self.on_component_added.iter().copied().collect()
    }

    /// Components subscribed to sibling removals.
    #[must_use]
    pub fn removed_subscribers(&self) -> Vec<ComponentId> {
        self.on_component_removed.iter().copied().collect()
    }

    fn sync_component_mask(&mut self, component: ComponentId, bits: u32) {
        if bits == 0 {
            self.net_masks.remove(&component);
        } else {
            self.net_masks.insert(component, bits);
        }
    }

    fn forget(&mut self, component: ComponentId) {
        self.on_component_added.unsubscribe_where(|id| *id == component);
        self.on_component_removed.unsubscribe_where(|id| *id == component);
        self.net_masks.remove(&component);
    }
}

/// Non-owning link from a component to its entity.
#[derive(Debug, Clone)]
pub struct OwnerRef {
    entity: EntityId,
    hub: Weak<RwLock<EntityHub>>,
}

impl OwnerRef {
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Returns `true` if both refer to the same live entity.
    #[must_use]
    pub fn same_entity(&self, other: &OwnerRef) -> bool {
        self.entity == other.entity && Weak::ptr_eq(&self.hub, &other.hub)
    }

    /// Returns `true` while the entity exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hub.strong_count() > 0
    }

    fn with_hub<R>(&self, f: impl FnOnce(&mut EntityHub) -> R) -> Option<R> {
        let hub = self.hub.upgrade()?;
        let Ok(mut guard) = hub.write() else {
            hub_poisoned(self.entity);
            return None;
        };
        Some(f(&mut guard))
    }

    pub(crate) fn authority(&self) -> Option<Authority> {
        self.with_hub(|hub| hub.authority)
    }

    pub(crate) fn set_component_net_mask(&self, component: ComponentId, bits: u32) {
        self.with_hub(|hub| hub.set_component_net_mask(component, bits));
    }

    pub(crate) fn subscribe(
        &self,
        component: ComponentId,
    ) -> Option<(SubscriptionToken, SubscriptionToken)> {
        self.with_hub(|hub| {
            (
                hub.on_component_added.subscribe(component),
                hub.on_component_removed.subscribe(component),
            )
        })
    }

    pub(crate) fn unsubscribe(
        &self,
        component: ComponentId,
        added: SubscriptionToken,
        removed: SubscriptionToken,
    ) {
        self.with_hub(|hub| {
            hub.on_component_added.unsubscribe(added);
            hub.on_component_removed.unsubscribe(removed);
            hub.net_masks.remove(&component);
        });
    }
}

/// Whether an entity accepts more than one component of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentPolicy {
    #[default]
    AllowDuplicates,
    SingletonPerType,
}

/// An ordered collection of components.
pub struct Entity {
    id: EntityId,
    authority: Authority,
    hub: Arc<RwLock<EntityHub>>,
    components: Vec<Box<dyn Component>>,
    policy: ComponentPolicy,
}

impl Entity {
    #[must_use]
    pub fn new(id: EntityId, authority: Authority) -> Self {
        Self {
            id,
            authority,
            hub: Arc::new(RwLock::new(EntityHub::new(id, authority))),
            components: Vec::new(),
            policy: ComponentPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ComponentPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// A weak handle components keep to this entity.
    #[must_use]
    pub fn owner_ref(&self) -> OwnerRef {
        OwnerRef {
            entity: self.id,
            hub: Arc::downgrade(&self.hub),
        }
    }

    fn read_hub<R>(&self, f: impl FnOnce(&EntityHub) -> R) -> Option<R> {
        let Ok(guard) = self.hub.read() else {
            hub_poisoned(self.id);
            return None;
        };
        Some(f(&guard))
    }

    fn write_hub<R>(&self, f: impl FnOnce(&mut EntityHub) -> R) -> Option<R> {
        let Ok(mut guard) = self.hub.write() else {
            hub_poisoned(self.id);
            return None;
        };
        Some(f(&mut guard))
    }

    // ── Composition ───────────────────────────────────────────────

    /// Attach `component` and notify subscribed siblings.
    ///
    /// Missing dependencies are reported but do not prevent the attach.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::DuplicateType`] if the entity enforces one
    /// component per type and already holds one of this type.
    pub fn add_component(
        &mut self,
        mut component: Box<dyn Component>,
    ) -> Result<ComponentId, ComponentError> {
        if self.policy == ComponentPolicy::SingletonPerType
            && self.find_component(component.type_name()).is_some()
        {
            return Err(ComponentError::DuplicateType {
                entity: self.id.id(),
                type_name: component.type_name().to_string(),
            });
        }

        let present: Vec<&str> = self.components.iter().map(|c| c.type_name()).collect();
        let missing = component.core().missing_dependencies(&present);
        if !missing.is_empty() {
            warn!(
                entity = %self.id,
                component = component.type_name(),
                missing = ?missing,
                "component added without its dependencies"
            );
        }

        let subscribers = self
            .read_hub(EntityHub::added_subscribers)
            .unwrap_or_default();
        component.attach(self.owner_ref());
        let id = component.id();
        self.components.push(component);

        let last = self.components.len() - 1;
        let (siblings, added) = self.components.split_at_mut(last);
        let added: &dyn Component = added[0].as_ref();
        for sibling in siblings
            .iter_mut()
            .filter(|sibling| subscribers.contains(&sibling.id()))
        {
            sibling.component_added_to_owner(added);
        }
        Ok(id)
    }

    /// Detach and return the component `id`. With `notify`, siblings that
    /// subscribed to removals are told about it.
    pub fn remove_component(
        &mut self,
        id: ComponentId,
        notify: bool,
    ) -> Option<Box<dyn Component>> {
        let index = self.components.iter().position(|c| c.id() == id)?;
        let subscribers = self
            .read_hub(EntityHub::removed_subscribers)
            .unwrap_or_default();

        let mut component = self.components.remove(index);
        component.detach();
        self.write_hub(|hub| hub.forget(id));

        if notify {
            for sibling in self
                .components
                .iter_mut()
                .filter(|sibling| subscribers.contains(&sibling.id()))
            {
                sibling.component_removed_from_owner(component.as_ref());
            }
        }
        debug!(entity = %self.id, component = %id, notify, "component removed");
        Some(component)
    }

    /// Mark bits dirty on an attached component.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::NotFound`] if `id` is not attached here.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is zero.
    pub fn set_component_net_mask(
        &mut self,
        id: ComponentId,
        bits: u32,
    ) -> Result<(), ComponentError> {
        let component = self
            .component_mut(id)
            .ok_or(ComponentError::NotFound(id.0))?;
        component.mark_dirty(bits);
        Ok(())
    }

    // ── Access ────────────────────────────────────────────────────

    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.as_ref())
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.components
            .iter_mut()
            .find(|c| c.id() == id)
            .map(|c| c.as_mut())
    }

    /// The first component of type `type_name`.
    #[must_use]
    pub fn find_component(&self, type_name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.type_name() == type_name)
            .map(|c| c.as_ref())
    }

    /// Downcast the component `id` to its concrete type.
    #[must_use]
    pub fn component_as<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.component(id)?.as_any().downcast_ref()
    }

    pub fn component_as_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.component_mut(id)?.as_any_mut().downcast_mut()
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    // ── Simulation ────────────────────────────────────────────────

    /// Tick every component in order. A failing component is logged and the
    /// rest still run.
    pub fn process_tick(&mut self) {
        for component in &mut self.components {
            if let Err(err) = component.process_tick() {
                warn!(
                    entity = %self.id,
                    component = %component.id(),
                    type_name = component.type_name(),
                    %err,
                    "component tick failed"
                );
            }
        }
    }

    // ── Replication ───────────────────────────────────────────────

    /// Returns `true` if any component has bits waiting to be packed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.read_hub(EntityHub::is_dirty).unwrap_or(false)
    }

    /// Pack every component's pending state, or its full state when
    /// `initial` is set.
    ///
    /// Layout: u16 component count, then per component a presence flag and,
    /// if present, the u16 type tag, the u16 payload length in bits and the
    /// payload. Returns the number of components written.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if a payload cannot be written or exceeds the
    /// length field.
    pub fn pack_update(
        &mut self,
        channel: &dyn NetChannel,
        initial: bool,
        writer: &mut BitWriter,
    ) -> Result<usize, StreamError> {
        let count = u16::try_from(self.components.len()).map_err(|_| {
            StreamError::Framing(format!(
                "{} components exceed the wire limit",
                self.components.len()
            ))
        })?;
        writer.write_u16(count);

        let mut written = 0;
        for component in &mut self.components {
            let mask = if initial {
                u32::MAX
            } else {
                component.core().dirty().bits()
            };
            if !writer.write_flag(mask != 0) {
                continue;
            }

            let mut payload = BitWriter::new();
            let unresolved = component.pack(channel, mask, &mut payload)?;
            let bits = u16::try_from(payload.bits_written()).map_err(|_| {
                StreamError::Framing(format!(
                    "{} payload of {} bits exceeds the wire limit",
                    component.type_name(),
                    payload.bits_written()
                ))
            })?;
            writer.write_u16(component.core().type_id().wire_tag());
            writer.write_u16(bits);
            writer.append(&payload);
            if unresolved != 0 {
                debug!(
                    entity = %self.id,
                    component = %component.id(),
                    unresolved,
                    "bits left for a later pack"
                );
            }
            written += 1;
        }

        let remaining: Vec<(ComponentId, u32)> = self
            .components
            .iter()
            .map(|c| (c.id(), c.core().dirty().bits()))
            .collect();
        self.write_hub(|hub| {
            for (id, bits) in remaining {
                hub.sync_component_mask(id, bits);
            }
        });
        Ok(written)
    }

    /// Apply an update produced by [`pack_update`](Self::pack_update).
    ///
    /// Each component's payload is bounded by its length prefix. A type
    /// mismatch, a payload that fails to decode, or one that decodes to a
    /// different length is logged and skips only that component. Returns the number of components
    /// applied cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if the framing itself (count, flags, tags,
    /// lengths) is truncated.
    pub fn unpack_update(
        &mut self,
        channel: &dyn NetChannel,
        reader: &mut BitReader<'_>,
    ) -> Result<usize, StreamError> {
        let count = usize::from(reader.read_u16()?);
        if count != self.components.len() {
            warn!(
                entity = %self.id,
                expected = self.components.len(),
                received = count,
                "component count differs from sender"
            );
        }

        let mut applied = 0;
        for index in 0..count {
            if !reader.read_flag()? {
                continue;
            }
            let tag = reader.read_u16()?;
            let bits = usize::from(reader.read_u16()?);
            let payload = reader.take_payload(bits)?;

            let Some(component) = self.components.get_mut(index) else {
                error!(entity = %self.id, index, "update for a component slot this entity lacks");
                continue;
            };
            if component.core().type_id().wire_tag() != tag {
                error!(
                    entity = %self.id,
                    index,
                    type_name = component.type_name(),
                    "component type differs from sender, skipping"
                );
                continue;
            }

            let mut sub = payload.reader();
            match component.unpack(channel, &mut sub) {
                Ok(()) if sub.remaining_bits() == 0 => applied += 1,
                Ok(()) => error!(
                    entity = %self.id,
                    type_name = component.type_name(),
                    unread = sub.remaining_bits(),
                    "component left bits unread"
                ),
                Err(err) => error!(
                    entity = %self.id,
                    type_name = component.type_name(),
                    %err,
                    "component update failed to decode"
                ),
            }
        }
        Ok(applied)
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("authority", &self.authority)
            .field("components", &self.components)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::behavior::Behavior;
    use crate::component::{BasicComponent, ComponentCore, GhostTable};
    use crate::field::FieldSpec;
    use crate::error::ScriptError;
    use crate::mask::{ENABLE, NEXT_FREE, OWNER};

    #[derive(Default)]
    struct Counters {
        added: AtomicUsize,
        removed: AtomicUsize,
        siblings_added: AtomicUsize,
        siblings_removed: AtomicUsize,
        ticks: AtomicUsize,
    }

    struct Tracker {
        core: ComponentCore,
        counters: Arc<Counters>,
        fail_tick: bool,
    }

    impl Tracker {
        fn boxed(type_name: &str, counters: &Arc<Counters>) -> Box<Self> {
            Box::new(Self {
                core: ComponentCore::new(type_name, Authority::Server),
                counters: Arc::clone(counters),
                fail_tick: false,
            })
        }
    }

    impl Component for Tracker {
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
        fn on_component_add(&mut self) {
            self.counters.added.fetch_add(1, Ordering::SeqCst);
        }
        fn on_component_remove(&mut self) {
            assert!(self.core.is_attached());
            self.counters.removed.fetch_add(1, Ordering::SeqCst);
        }
        fn component_added_to_owner(&mut self, _sibling: &dyn Component) {
            self.counters.siblings_added.fetch_add(1, Ordering::SeqCst);
        }
        fn component_removed_from_owner(&mut self, _sibling: &dyn Component) {
            self.counters.siblings_removed.fetch_add(1, Ordering::SeqCst);
        }
        fn process_tick(&mut self) -> Result<(), ScriptError> {
            self.counters.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail_tick {
                return Err(ScriptError::failed("update", "boom"));
            }
            Ok(())
        }
    }

    fn subscriptions(entity: &Entity) -> usize {
        entity
            .read_hub(|hub| hub.on_component_added.len() + hub.on_component_removed.len())
            .unwrap()
    }

    #[test]
    fn test_allocator_produces_unique_ids() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.allocate().id(), 1);
        assert_eq!(alloc.allocate().id(), 2);
        assert_eq!(alloc.count(), 2);
        assert!(!EntityId::INVALID.is_valid());
    }

    #[test]
    fn test_attach_detach_symmetry() {
        let counters = Arc::new(Counters::default());
        let mut e1 = Entity::new(EntityId(1), Authority::Server);
        let mut e2 = Entity::new(EntityId(2), Authority::Server);

        let id = e1.add_component(Tracker::boxed("Tracker", &counters)).unwrap();
        assert_eq!(subscriptions(&e1), 2);

        let mut tracker = e1.remove_component(id, true).unwrap();
        tracker.detach();
        e2.add_component(tracker).unwrap();

        let tracker = e2.component(id).unwrap();
        assert_eq!(tracker.core().owner_id(), Some(EntityId(2)));
        assert_eq!(counters.added.load(Ordering::SeqCst), 2);
        assert_eq!(counters.removed.load(Ordering::SeqCst), 1);
        assert_eq!(subscriptions(&e1), 0);
        assert_eq!(subscriptions(&e2), 2);
    }

    #[test]
    fn test_attach_to_other_entity_detaches_first() {
        let counters = Arc::new(Counters::default());
        let e1 = Entity::new(EntityId(1), Authority::Server);
        let e2 = Entity::new(EntityId(2), Authority::Server);

        let mut tracker = Tracker::boxed("Tracker", &counters);
        tracker.attach(e1.owner_ref());
        tracker.attach(e1.owner_ref());
        assert_eq!(counters.added.load(Ordering::SeqCst), 1);

        tracker.attach(e2.owner_ref());
        assert_eq!(counters.added.load(Ordering::SeqCst), 2);
        assert_eq!(counters.removed.load(Ordering::SeqCst), 1);
        assert_eq!(subscriptions(&e1), 0);
        assert_eq!(tracker.core().owner_id(), Some(EntityId(2)));
    }

    #[test]
    fn test_siblings_are_notified() {
        let counters = Arc::new(Counters::default());
        let mut entity = Entity::new(EntityId(1), Authority::Server);
        let first = entity.add_component(Tracker::boxed("A", &counters)).unwrap();
        let second = entity.add_component(Tracker::boxed("B", &counters)).unwrap();
        // Only A was there to hear about B.
        assert_eq!(counters.siblings_added.load(Ordering::SeqCst), 1);

        entity.remove_component(first, false).unwrap();
        assert_eq!(counters.siblings_removed.load(Ordering::SeqCst), 0);

        entity.add_component(Tracker::boxed("C", &counters)).unwrap();
        entity.remove_component(second, true).unwrap();
        assert_eq!(counters.siblings_removed.load(Ordering::SeqCst), 1);
        assert_eq!(entity.len(), 1);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let counters = Arc::new(Counters::default());
        let mut tracker = Tracker::boxed("Tracker", &counters);
        tracker.detach();
        assert_eq!(counters.removed.load(Ordering::SeqCst), 0);

        let entity = Entity::new(EntityId(1), Authority::Server);
        tracker.attach(entity.owner_ref());
        tracker.detach();
        tracker.detach();
        assert_eq!(counters.removed.load(Ordering::SeqCst), 1);
        assert!(tracker.core().properties().get_text("owner").is_none());
    }

    #[test]
    fn test_singleton_policy_rejects_duplicates() {
        let mut entity =
            Entity::new(EntityId(7), Authority::Server).with_policy(ComponentPolicy::SingletonPerType);
        entity
            .add_component(Box::new(BasicComponent::new("Mesh", Authority::Server)))
            .unwrap();
        let err = entity
            .add_component(Box::new(BasicComponent::new("Mesh", Authority::Server)))
            .unwrap_err();
        assert!(matches!(err, ComponentError::DuplicateType { entity: 7, .. }));
    }

    #[test]
    fn test_pending_bits_reach_owner_on_attach() {
        let mut component = Box::new(BasicComponent::new("Mesh", Authority::Server));
        component.mark_dirty(NEXT_FREE);
        let id = component.id();

        let mut entity = Entity::new(EntityId(1), Authority::Server);
        entity.add_component(component).unwrap();
        let mask = entity.read_hub(|hub| hub.component_net_mask(id)).unwrap();
        assert_eq!(mask, NEXT_FREE | OWNER);
        assert!(entity.is_dirty());
    }

    #[test]
    fn test_replica_attach_does_not_mark_owner() {
        let mut entity = Entity::new(EntityId(1), Authority::Replica);
        let id = entity
            .add_component(Box::new(BasicComponent::new("Mesh", Authority::Server)))
            .unwrap();
        let component = entity.component(id).unwrap();
        assert_eq!(component.core().authority(), Authority::Replica);
        assert!(component.core().dirty().is_clear());
        assert!(!entity.is_dirty());
    }

    #[test]
    fn test_failing_tick_does_not_stop_the_rest() {
        let counters = Arc::new(Counters::default());
        let mut entity = Entity::new(EntityId(1), Authority::Server);
        let mut failing = Tracker::boxed("A", &counters);
        failing.fail_tick = true;
        entity.add_component(failing).unwrap();
        entity.add_component(Tracker::boxed("B", &counters)).unwrap();

        entity.process_tick();
        assert_eq!(counters.ticks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pack_clears_hub_mask() {
        let channel = GhostTable::new();
        let mut server = Entity::new(EntityId(1), Authority::Server);
        let id = server
            .add_component(Box::new(BasicComponent::new("Mesh", Authority::Server)))
            .unwrap();
        server.set_component_net_mask(id, ENABLE).unwrap();
        assert!(server.is_dirty());

        let mut w = BitWriter::new();
        assert_eq!(server.pack_update(&channel, false, &mut w).unwrap(), 1);
        assert!(!server.is_dirty());

        let mut w = BitWriter::new();
        assert_eq!(server.pack_update(&channel, false, &mut w).unwrap(), 0);
        // Count plus one negative presence flag.
        assert_eq!(w.bits_written(), 17);
    }

    #[test]
    fn test_entity_roundtrip() {
        let channel = GhostTable::new();
        let mut server = Entity::new(EntityId(1), Authority::Server);
        let mesh = server
            .add_component(Box::new(BasicComponent::new("Mesh", Authority::Server)))
            .unwrap();
        server
            .add_component(Box::new(BasicComponent::new("Light", Authority::Server)))
            .unwrap();
        server.component_mut(mesh).unwrap().set_enabled(false);

        let mut replica = Entity::new(EntityId(1), Authority::Replica);
        let replica_mesh = replica
            .add_component(Box::new(BasicComponent::new("Mesh", Authority::Replica)))
            .unwrap();
        replica
            .add_component(Box::new(BasicComponent::new("Light", Authority::Replica)))
            .unwrap();

        let mut w = BitWriter::new();
        server.pack_update(&channel, true, &mut w).unwrap();
        let bits = w.bits_written();
        let bytes = w.to_bytes();
        let mut r = BitReader::with_bit_len(&bytes, bits);
        assert_eq!(replica.unpack_update(&channel, &mut r).unwrap(), 2);
        assert_eq!(r.remaining_bits(), 0);
        assert!(!replica.component(replica_mesh).unwrap().core().is_enabled());
    }

    #[test]
    fn test_mismatched_component_is_skipped_locally() {
        let channel = GhostTable::new();
        let mut server = Entity::new(EntityId(1), Authority::Server);
        server
            .add_component(Box::new(BasicComponent::new("Mesh", Authority::Server)))
            .unwrap();
        let light = server
            .add_component(Box::new(BasicComponent::new("Light", Authority::Server)))
            .unwrap();
        server.component_mut(light).unwrap().set_enabled(false);

        let mut replica = Entity::new(EntityId(1), Authority::Replica);
        replica
            .add_component(Box::new(BasicComponent::new("Sound", Authority::Replica)))
            .unwrap();
        let replica_light = replica
            .add_component(Box::new(BasicComponent::new("Light", Authority::Replica)))
            .unwrap();

        let mut w = BitWriter::new();
        server.pack_update(&channel, true, &mut w).unwrap();
        let bytes = w.to_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(replica.unpack_update(&channel, &mut r).unwrap(), 1);
        assert!(!replica.component(replica_light).unwrap().core().is_enabled());
    }

    fn mover(authority: Authority, fields: &[&str]) -> Box<Behavior> {
        let mut b = Behavior::new("Mover", authority);
        for name in fields {
            b.add_field(FieldSpec::new(*name, "float").default_value("1.0"));
        }
        Box::new(b)
    }

    fn light_after_mover(replica_first: Box<dyn Component>) -> (usize, bool, usize) {
        let channel = GhostTable::new();
        let mut server = Entity::new(EntityId(1), Authority::Server);
        server
            .add_component(mover(Authority::Server, &["speed", "mass"]))
            .unwrap();
        let light = server
            .add_component(Box::new(BasicComponent::new("Light", Authority::Server)))
            .unwrap();
        server.component_mut(light).unwrap().set_enabled(false);

        let mut replica = Entity::new(EntityId(1), Authority::Replica);
        replica.add_component(replica_first).unwrap();
        let replica_light = replica
            .add_component(Box::new(BasicComponent::new("Light", Authority::Replica)))
            .unwrap();

        let mut w = BitWriter::new();
        server.pack_update(&channel, true, &mut w).unwrap();
        let bits = w.bits_written();
        let bytes = w.to_bytes();
        let mut r = BitReader::with_bit_len(&bytes, bits);
        let applied = replica.unpack_update(&channel, &mut r).unwrap();
        let light_enabled = replica.component(replica_light).unwrap().core().is_enabled();
        (applied, light_enabled, r.remaining_bits())
    }

    #[test]
    fn test_undecodable_component_is_skipped_locally() {
        // Same type, but the replica registered one field fewer.
        let (applied, light_enabled, remaining) =
            light_after_mover(mover(Authority::Replica, &["speed"]));
        assert_eq!(applied, 1);
        assert!(!light_enabled);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_component_leaving_bits_unread_is_skipped_locally() {
        // A plain component with the behavior's type name reads only the
        // base group and leaves the field group behind.
        let (applied, light_enabled, remaining) =
            light_after_mover(Box::new(BasicComponent::new("Mover", Authority::Replica)));
        assert_eq!(applied, 1);
        assert!(!light_enabled);
        assert_eq!(remaining, 0);
    }
}
