//! Error types for the scene model

/// Rejected changes to the object graph. The graph is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// Attaching without a parent object
    #[error("Symbol {child} cannot attach to parent {parent_id}: parent is missing")]
    NullParent { child: u16, parent_id: u16 },

    /// The parent object does not carry the requested id
    #[error("Parent id mismatch: requested {expected}, object has id {actual}")]
    ParentIdMismatch { expected: u16, actual: u16 },

    /// The parent chain would contain the child
    #[error("Attaching {child} to {parent_id} would create a parent cycle")]
    ParentCycle { child: u16, parent_id: u16 },

    /// A symbol refers to a surface that does not exist
    #[error("Symbol {symbol} refers to unknown surface {surface_id}")]
    UnknownSurface { symbol: u16, surface_id: u16 },

    /// The parent is already destroyed
    #[error("Parent {parent_id} of {child} is destroyed")]
    ParentDestroyed { child: u16, parent_id: u16 },
}

pub type Result<T> = std::result::Result<T, SceneError>;
