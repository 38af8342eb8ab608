//! Error types for the composition model.

use cutline_time::TimeError;
use thiserror::Error;

/// Errors produced by composition, transform, edit, and serialization
/// operations.
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("time arithmetic failed: {0}")]
    Time(#[from] TimeError),

    #[error("composable '{name}' already has a parent")]
    AlreadyHasParent { name: String },

    #[error("child index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("attaching '{name}' would create a cycle")]
    CycleDetected { name: String },

    #[error("composables do not share a common ancestor")]
    NotRelated,

    #[error("composable '{name}' has no parent")]
    NoParent { name: String },

    #[error("clip '{name}' has no active media reference")]
    NoMediaReference { name: String },

    #[error("media reference of clip '{name}' has no available range")]
    NoAvailableRange { name: String },

    #[error("source range out of available media range: {reason}")]
    OutOfAvailableRange { reason: String },

    #[error("clip '{name}' has no previous sibling")]
    NoPreviousSibling { name: String },

    #[error("neighbor '{name}' cannot absorb the requested adjustment: {reason}")]
    InsufficientNeighborDuration { name: String, reason: String },

    #[error("edit would disturb transition '{name}'")]
    TransitionConflict { name: String },

    #[error("unknown schema '{schema}'")]
    UnknownSchema { schema: String },

    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TimelineResult<T> = Result<T, TimelineError>;
