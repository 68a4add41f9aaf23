//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Covers deterministic failures raised while constructing values (format
/// checks, empty inputs). Transport and infrastructure failures have their own
/// error types in the crates that own them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. an empty string).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A value was non-empty but not in the expected shape.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// True for shape errors, as opposed to missing/empty input.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::InvalidFormat(_))
    }
}
