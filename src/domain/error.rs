//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the service graph's shape.
/// They are detected before any constructor runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("circular reference detected: {}", path.join(" -> "))]
    CircularReference { path: Vec<String> },

    #[error("{class}::{member} carries more than one injection marker")]
    DuplicateInjectionMarker { class: String, member: String },

    #[error("injection marker on {class}::{method}() cannot declare arguments; parameters are autowired")]
    InjectionArgumentsNotSupported { class: String, method: String },

    #[error("invalid type hint: {0:?}")]
    InvalidTypeHint(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
