//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// All variants are deterministic logic/data faults; none of them is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or invalid input (rejected before any write).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced product, movement, record or sale does not exist in scope.
    #[error("not found: {0}")]
    NotFound(String),

    /// No account scope, or an actor not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A transition was attempted on a record that is no longer pending.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The ledger and the product snapshot have diverged (e.g. a decrement
    /// would drive stock negative). Indicates a prior bug, not bad input.
    #[error("integrity fault: {0}")]
    IntegrityFault(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityFault(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Stable, machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::Unauthorized(_) => "unauthorized",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::IntegrityFault(_) => "integrity_fault",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation(m)
            | DomainError::NotFound(m)
            | DomainError::Unauthorized(m)
            | DomainError::InvalidState(m)
            | DomainError::IntegrityFault(m)
            | DomainError::InvalidId(m) => m,
        }
    }
}
