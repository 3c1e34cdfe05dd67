//! Error types for ritz-operator.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    #[error("{what}: expected dimension {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{what} must be square, got {rows}x{cols}")]
    NotSquare {
        what: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid sparse entry ({row}, {col}) for a {size}x{size} matrix")]
    EntryOutOfBounds { row: usize, col: usize, size: usize },
}

pub type Result<T> = std::result::Result<T, OperatorError>;
