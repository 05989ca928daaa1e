//! Error types for data parsing in emon-types.

use thiserror::Error;

/// Errors that can occur when parsing values that arrive as free text,
/// such as command-line filters or enum values typed by a user.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The value is not one of the variants the server understands.
    #[error("Unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        /// What was being parsed (e.g. "alert severity").
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Comma separated list of accepted values.
        expected: &'static str,
    },

    /// A numeric value was outside its allowed range.
    #[error("Invalid {field}: {message}")]
    OutOfRange {
        /// Field that was rejected.
        field: &'static str,
        /// Human readable reason.
        message: String,
    },
}

/// Result type alias using emon-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
