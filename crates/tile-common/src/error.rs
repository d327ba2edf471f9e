//! Parse errors for the shared types.

use thiserror::Error;

/// Errors raised while parsing shared types from user-facing strings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected 4 bounds values, got {0}")]
    InvalidBoundsCount(usize),

    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    #[error("Unknown pyramid type: {0}. Expected 'geodetic' or 'mercator'")]
    UnknownPyramidType(String),
}
