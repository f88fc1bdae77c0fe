//! Error types for gridspan-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridspan-core
///
/// Range invalidation caused by a structural edit is not an error: the range
/// simply reports `is_valid() == false` and renders as `#REF!`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed address or range text
    #[error("Invalid reference '{text}': {reason}")]
    Parse { text: String, reason: String },

    /// Row argument outside `1..=MAX_ROWS`
    #[error("Row {0} out of bounds (1..={1})")]
    RowOutOfRange(i64, i32),

    /// Column argument outside `1..=MAX_COLS`
    #[error("Column {0} out of bounds (1..={1})")]
    ColumnOutOfRange(i64, i32),

    /// Two structures would overlap or collide (table vs autofilter, duplicate name, ...)
    #[error("Conflicting structure: {0}")]
    ConflictingStructure(String),

    /// The operation requires a feature that is not enabled
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Range is not usable for this operation
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Sheet not found by id or name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Invalid defined name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Annotation entry handle does not exist (anymore)
    #[error("Entry {0} not found")]
    EntryNotFound(u32),
}

impl Error {
    /// Create a parse error for `text`
    pub fn parse<T: Into<String>, R: Into<String>>(text: T, reason: R) -> Self {
        Error::Parse {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Create a conflicting-structure error
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Error::ConflictingStructure(msg.into())
    }

    /// Create an invalid-state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }
}
