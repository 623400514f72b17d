//! Scriptable components with declarative fields.
//!
//! A [`Behavior`] registers its fields at load time through
//! [`add_field`](Behavior::add_field). Field values live in the component's
//! property store; the descriptors carry metadata for tooling. Lifecycle,
//! tick and inspector events are forwarded to named callbacks registered in
//! a [`CallbackRegistry`], on the authoritative side only.
//!
//! ## Wire layout
//!
//! After the base group a behavior writes one flag for the [`FIELDS`] group.
//! If set, a u16 field count follows and then, in registration order, one
//! flag per field followed by the field's typed payload when set.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Write as _};

use tracing::{debug, warn};

use crate::bitstream::{BitReader, BitWriter, StreamError};
use crate::component::{Authority, Component, ComponentCore, ComponentId, NetChannel};
use crate::description::load_description;
use crate::entity::EntityId;
use crate::error::ScriptError;
use crate::field::{FieldDescriptor, FieldSpec, FieldType, FieldValue};
use crate::mask::{INITIAL_UPDATE, NEXT_FREE};
use crate::property::{PropertyStore, canonical_text};

/// Dirty bit for field values.
pub const FIELDS: u32 = NEXT_FREE;

/// Fired after the behavior is attached.
pub const ON_ADD: &str = "onAdd";
/// Fired before the behavior is detached.
pub const ON_REMOVE: &str = "onRemove";
/// Fired every tick while attached and enabled.
pub const UPDATE: &str = "update";
/// Fired when a registered field changes. Arguments: name, value.
pub const ON_INSPECTOR_UPDATE: &str = "onInspectorUpdate";

/// What a callback sees of its behavior.
///
/// Reads go to the property store as it was when the callback started.
/// Writes are queued and applied after the callback returns.
pub struct ScriptContext<'a> {
    component: ComponentId,
    entity: Option<EntityId>,
    properties: &'a PropertyStore,
    writes: Vec<(String, String)>,
}

impl ScriptContext<'_> {
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.properties.get_text(name)
    }

    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&FieldValue> {
        self.properties.get_value(name)
    }

    /// Queue a field write.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.writes.push((name.into(), value.into()));
    }
}

/// A named script handler.
pub type ScriptCallback =
    Box<dyn FnMut(&mut ScriptContext<'_>, &[&str]) -> Result<(), ScriptError> + Send + Sync>;

/// Name to handler map. A missing handler is not an error.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<String, ScriptCallback>,
}

impl CallbackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`, returning the handler it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        callback: ScriptCallback,
    ) -> Option<ScriptCallback> {
        self.handlers.insert(name.into(), callback)
    }

    pub fn remove(&mut self, name: &str) -> Option<ScriptCallback> {
        self.handlers.remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// A component with reflected fields and script callbacks.
#[derive(Debug)]
pub struct Behavior {
    core: ComponentCore,
    fields: Vec<FieldDescriptor>,
    pending: Vec<bool>,
    current_group: Option<String>,
    callbacks: CallbackRegistry,
}

impl Behavior {
    pub fn new(type_name: impl Into<String>, authority: Authority) -> Self {
        Self {
            core: ComponentCore::new(type_name, authority),
            fields: Vec::new(),
            pending: Vec::new(),
            current_group: None,
            callbacks: CallbackRegistry::new(),
        }
    }

    #[must_use]
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.callbacks
    }

    // ── Field registry ────────────────────────────────────────────

    /// Open a field group applied to the fields registered until
    /// [`end_field_group`](Self::end_field_group). Opening a group while
    /// another is open is reported and ignored; returns `false` then.
    pub fn begin_field_group(&mut self, name: &str) -> bool {
        if let Some(open) = &self.current_group {
            warn!(
                behavior = self.core.type_name(),
                open = %open,
                requested = name,
                "field group already open, close it before opening another"
            );
            return false;
        }
        self.current_group = Some(name.to_string());
        true
    }

    pub fn end_field_group(&mut self) {
        self.current_group = None;
    }

    #[must_use]
    pub fn current_group(&self) -> Option<&str> {
        self.current_group.as_deref()
    }

    /// Register a field. A name that is already registered is ignored and
    /// `false` returned. An unset value is initialised to the default.
    pub fn add_field(&mut self, spec: FieldSpec) -> bool {
        if self.field_index(&spec.name).is_some() {
            debug!(behavior = self.core.type_name(), field = %spec.name, "field already registered");
            return false;
        }

        let field_type = FieldType::from_tag(&spec.type_tag);
        let descriptor = FieldDescriptor {
            label: spec.label.unwrap_or_else(|| spec.name.clone()),
            name: spec.name,
            type_name: spec.type_tag,
            field_type,
            default_value: spec.default_value,
            user_data: spec.user_data,
            group: self.current_group.clone().unwrap_or_default(),
            hidden: spec.hidden,
            description: load_description(&spec.description),
        };

        let properties = self.core.properties_mut();
        properties.declare(&descriptor.name, field_type);
        if properties.is_empty_value(&descriptor.name) {
            properties.set(&descriptor.name, &descriptor.default_value);
        }

        self.fields.push(descriptor);
        self.pending.push(false);
        true
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn field_at(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// `name\ttype\tdefault\tgroup` for the field at `index`.
    #[must_use]
    pub fn field_info(&self, index: usize) -> Option<String> {
        self.fields.get(index).map(|f| {
            format!(
                "{}\t{}\t{}\t{}",
                f.name, f.type_name, f.default_value, f.group
            )
        })
    }

    /// Current text of a field or property.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.core.properties().get_text(name)
    }

    #[must_use]
    pub fn typed_value(&self, name: &str) -> Option<&FieldValue> {
        self.core.properties().get_value(name)
    }

    // ── Persistence ───────────────────────────────────────────────

    /// Apply `name = "value";` lines written by
    /// [`write_fields`](Component::write_fields). Malformed lines are
    /// reported and skipped. Returns the number of assignments applied.
    pub fn apply_persisted(&mut self, text: &str) -> usize {
        let mut applied = 0;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((name, value)) = parse_assignment(line) else {
                warn!(behavior = self.core.type_name(), line, "malformed persisted field");
                continue;
            };
            self.set_data_field(name, &value);
            applied += 1;
        }
        applied
    }

    // ── Callbacks ─────────────────────────────────────────────────

    /// Run the handler `name` if one is registered. Writes it queued are
    /// applied afterwards when `apply_writes` is set, and dropped otherwise.
    fn invoke(&mut self, name: &str, args: &[&str], apply_writes: bool) -> Result<(), ScriptError> {
        let Some(handler) = self.callbacks.handlers.get_mut(name) else {
            return Ok(());
        };
        let mut context = ScriptContext {
            component: self.core.id(),
            entity: self.core.owner_id(),
            properties: self.core.properties(),
            writes: Vec::new(),
        };
        handler(&mut context, args)?;
        let writes = context.writes;

        if apply_writes {
            for (field, value) in writes {
                self.set_data_field(&field, &value);
            }
        } else if !writes.is_empty() {
            warn!(
                behavior = self.core.type_name(),
                callback = name,
                "field writes from this callback are ignored"
            );
        }
        Ok(())
    }

    fn invoke_logged(&mut self, name: &str, args: &[&str], apply_writes: bool) {
        if let Err(err) = self.invoke(name, args, apply_writes) {
            warn!(behavior = self.core.type_name(), callback = name, %err, "callback failed");
        }
    }
}

impl Component for Behavior {
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
        if self.core.is_server() {
            self.invoke_logged(ON_ADD, &[], true);
        }
    }

    fn on_component_remove(&mut self) {
        if self.core.is_server() {
            self.invoke_logged(ON_REMOVE, &[], true);
        }
    }

    fn process_tick(&mut self) -> Result<(), ScriptError> {
        if self.core.is_server() && self.core.is_active() {
            self.invoke(UPDATE, &[], true)?;
        }
        Ok(())
    }

    fn on_field_mutation(&mut self, name: &str, value: &str) {
        if !self.core.notify_field_set(name, value) {
            return;
        }
        if self.core.is_server() && self.field_index(name).is_some() {
            self.invoke_logged(ON_INSPECTOR_UPDATE, &[name, value], false);
        }
    }

    fn track_field_change(&mut self, name: &str) {
        if let Some(index) = self.field_index(name) {
            self.pending[index] = true;
            self.core.mark_dirty(FIELDS);
        }
    }

    fn pack_update(
        &mut self,
        channel: &dyn NetChannel,
        mask: u32,
        writer: &mut BitWriter,
    ) -> Result<u32, StreamError> {
        let mut unresolved = self.core.pack_base(mask, writer);

        if writer.write_flag(mask & FIELDS != 0) {
            let all = mask & INITIAL_UPDATE != 0;
            let count = u16::try_from(self.fields.len()).map_err(|_| {
                StreamError::Framing(format!("{} fields exceed the wire limit", self.fields.len()))
            })?;
            writer.write_u16(count);

            for (index, field) in self.fields.iter().enumerate() {
                let wanted = all || self.pending[index];
                let value = self
                    .core
                    .properties()
                    .get_value(&field.name)
                    .cloned()
                    .unwrap_or_else(|| field.field_type.zero_value());

                if wanted && !value.is_resolved(channel) {
                    // Target not replicated yet: keep the field pending.
                    unresolved |= FIELDS;
                    writer.write_flag(false);
                    continue;
                }
                if writer.write_flag(wanted) {
                    value.encode(channel, writer);
                    self.pending[index] = false;
                }
            }
        }
        Ok(unresolved)
    }

    fn unpack_update(
        &mut self,
        channel: &dyn NetChannel,
        reader: &mut BitReader<'_>,
    ) -> Result<(), StreamError> {
        self.core.unpack_base(reader)?;

        if reader.read_flag()? {
            let count = usize::from(reader.read_u16()?);
            if count != self.fields.len() {
                return Err(StreamError::Framing(format!(
                    "{count} fields sent, {} registered on '{}'",
                    self.fields.len(),
                    self.core.type_name()
                )));
            }
            for index in 0..count {
                if !reader.read_flag()? {
                    continue;
                }
                let field = &self.fields[index];
                let value = field.field_type.decode(channel, reader)?;
                let name = field.name.clone();
                self.set_data_field(&name, &value.to_string());
            }
        }
        Ok(())
    }

    fn write_fields(&self, out: &mut String) {
        for field in &self.fields {
            let text = self.core.properties().get_text(&field.name).unwrap_or("");
            if text == canonical_text(field.field_type, &field.default_value) {
                continue;
            }
            let text = if text.is_empty() { "0" } else { text };
            let _ = writeln!(out, "\t{} = \"{}\";", field.name, escape(text));
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse `name = "value";`.
fn parse_assignment(line: &str) -> Option<(&str, String)> {
    let (name, rest) = line.split_once('=')?;
    let name = name.trim();
    let quoted = rest.trim().strip_suffix(';')?.trim_end();
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, unescape(inner)))
}
