//! Error types for the sandbox engine.

use thiserror::Error;

use crate::utils::allocator::EntityId;

/// Errors surfaced at the edges of the engine: construction, editing and binding.
///
/// Nothing inside [`crate::world::World::step`] returns one of these; per-object
/// failures during a step are logged and the simulation carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SandboxError {
    /// No live entity carries this handle.
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),

    /// The entity exists but is not of the kind the operation needs.
    #[error("entity {id:?} is not a {expected}")]
    WrongKind {
        /// Handle of the offending entity.
        id: EntityId,
        /// Kind the caller asked for.
        expected: &'static str,
    },

    /// No accessor is registered under this property name.
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    /// The value handed to a setter does not match the property type.
    #[error("property `{property}` expects a {expected} value")]
    PropertyType {
        /// Property name.
        property: String,
        /// Expected value kind.
        expected: &'static str,
    },

    /// A constructor or setter argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An external binding failed to produce a value.
    #[error("binding for `{property}` failed: {message}")]
    Binding {
        /// Property the binding drives.
        property: String,
        /// Message reported by the binding.
        message: String,
    },

    /// The dedicated physics thread could not be started.
    #[error("failed to spawn physics thread: {0}")]
    ThreadSpawn(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, SandboxError>;
