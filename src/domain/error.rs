//! Domain errors

use thiserror::Error;

/// Domain-level error types
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Profile failed an admission rule and was not installed.
    #[error("Validation: {0}")]
    Validation(String),

    /// Caller referenced a connector the charge point does not have.
    #[error("Connector {0} does not exist")]
    ConnectorOutOfRange(u32),

    /// Persistence collaborator failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
