//! Name to value store backing a component's fields.
//!
//! Every property keeps its typed value alongside a canonical text form:
//! the value's `Display` output, so `"1.0"` is stored as `"1"`. A replica
//! that formats a decoded value therefore ends up with the sender's text.
//! Names are interned as `Arc<str>` so descriptors and the store share one
//! allocation per name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::field::{FieldType, FieldValue};

/// One stored property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    text: String,
    value: FieldValue,
}

impl Property {
    fn parse(name: &str, field_type: FieldType, text: &str) -> Self {
        let value = field_type.parse(text).unwrap_or_else(|err| {
            if !text.is_empty() {
                warn!(property = name, %err, "unparsable property value, using zero value");
            }
            field_type.zero_value()
        });
        // Empty stays empty: it marks a value that was never given.
        let text = if text.is_empty() {
            String::new()
        } else {
            value.to_string()
        };
        Self { text, value }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// The text `text` is stored as once parsed as `field_type`.
#[must_use]
pub fn canonical_text(field_type: FieldType, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    field_type
        .parse(text)
        .unwrap_or_else(|_| field_type.zero_value())
        .to_string()
}

/// The property bag of one component.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    entries: HashMap<Arc<str>, Property>,
    types: HashMap<Arc<str>, FieldType>,
}

impl PropertyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&self, name: &str) -> Arc<str> {
        self.types
            .get_key_value(name)
            .map(|(k, _)| Arc::clone(k))
            .or_else(|| self.entries.get_key_value(name).map(|(k, _)| Arc::clone(k)))
            .unwrap_or_else(|| Arc::from(name))
    }

    /// Declare the type of `name`. An existing value is re-parsed as that
    /// type.
    pub fn declare(&mut self, name: &str, field_type: FieldType) {
        let key = self.intern(name);
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = Property::parse(name, field_type, &existing.text);
        }
        self.types.insert(key, field_type);
    }

    /// The declared type of `name`, if any.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.types.get(name).copied()
    }

    /// Set `name` from text. Undeclared names are stored as text.
    pub fn set(&mut self, name: &str, text: &str) {
        let key = self.intern(name);
        let field_type = self.types.get(&key).copied().unwrap_or(FieldType::Text);
        let property = Property::parse(name, field_type, text);
        self.entries.insert(key, property);
    }

    /// Remove the value of `name`, keeping any declared type.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.entries.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.get(name)
    }

    /// The text `name` was last set to.
    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(Property::text)
    }

    /// The typed value of `name`.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name).map(Property::value)
    }

    /// Returns `true` if `name` is unset or set to the empty string.
    #[must_use]
    pub fn is_empty_value(&self, name: &str) -> bool {
        self.get_text(name).is_none_or(str::is_empty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }
}
