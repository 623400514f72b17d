//! Error types for component composition.

/// Errors returned by [`Entity`](crate::Entity) component management.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// The entity already holds a component of this type and enforces one
    /// per type.
    #[error("entity {entity} already has a component of type '{type_name}'")]
    DuplicateType { entity: u64, type_name: String },

    /// No component with the given id is attached.
    #[error("component {0} is not attached to this entity")]
    NotFound(uuid::Uuid),
}

/// Errors raised by script callbacks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The callback ran and reported a failure.
    #[error("callback '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

impl ScriptError {
    /// Shorthand for [`ScriptError::Failed`].
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}
