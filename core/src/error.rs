use std::fmt;
use thiserror::Error;

/// What kind of name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Document,
    Term,
    /// Term resolved to an id but has no row in the offsets catalog.
    TermInfo,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Document => f.write_str("document"),
            Missing::Term => f.write_str("term"),
            Missing::TermInfo => f.write_str("term info"),
        }
    }
}

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: Missing, name: String },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("invalid forward index: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub(crate) fn not_found(kind: Missing, name: impl Into<String>) -> Self {
        IndexError::NotFound { kind, name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound { .. })
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, IndexError::CorruptIndex(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, IndexError::Validation(_))
    }
}
