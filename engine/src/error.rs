use std::fmt;

use thiserror::Error;

/// Which family of named slot a lookup targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Field,
    Value,
    Statement,
    Mutation,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Field => write!(f, "field"),
            SlotKind::Value => write!(f, "value input"),
            SlotKind::Statement => write!(f, "statement input"),
            SlotKind::Mutation => write!(f, "mutation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown block kind `{0}`")]
    UnknownBlockKind(String),

    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    #[error("block `{block_type}` ({block_id}) has no {slot} named `{name}`")]
    MissingNamedSlot {
        slot: SlotKind,
        name: String,
        block_type: String,
        block_id: String,
    },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
}

impl EngineError {
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        EngineError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        EngineError::UnsupportedOperation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
