use facet_types::{ObjectId, RootId};
use thiserror::Error;

/// Errors surfaced by backing-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The requested root id is not registered with the store.
    #[error("unknown root id: {0}")]
    UnknownRoot(RootId),

    /// A root id's length prefix could not be decoded, or its declared
    /// length overruns the buffer.
    #[error("malformed root id: {0}")]
    MalformedRootId(String),

    /// An object id record is truncated or otherwise undecodable.
    #[error("malformed object id: {0}")]
    MalformedObjectId(String),

    /// An object id carries a type tag this layer does not recognize.
    #[error("unrecognized object type tag {tag:#04x}")]
    UnknownObjectType { tag: u8 },

    /// A tree-only accessor was invoked on an id of a different variant.
    #[error("object id has no {field} component")]
    WrongVariant { field: &'static str },

    /// Two ids of different variants were handed to the comparator.
    #[error("cannot compare objects of different kinds: {left} vs {right}")]
    InvalidCompare { left: String, right: String },

    /// A filter lookup failed where visibility had to be decided.
    #[error("filter evaluation failed: {0}")]
    FilterEvaluationFailed(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
