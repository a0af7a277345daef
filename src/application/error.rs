//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, HookError};

/// Application errors wrap domain errors and add resolution-level failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("service not found: {id}{}", did_you_mean(alternatives))]
    ServiceNotFound { id: String, alternatives: Vec<String> },

    #[error("ambiguous reference to {requested}: candidates are {}", candidates.join(", "))]
    AmbiguousReference {
        requested: String,
        candidates: Vec<String>,
    },

    #[error("cannot resolve argument ${parameter} of {service}{}", type_suffix(type_hint.as_deref()))]
    UnresolvableArgument {
        service: String,
        parameter: String,
        type_hint: Option<String>,
    },

    #[error("cannot instantiate {service}: {context}")]
    Instantiation {
        service: String,
        context: String,
        #[source]
        source: HookError,
    },

    #[error("{operation} is not available in {mode} mode")]
    ModeMismatch { mode: String, operation: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("compiled container fingerprint mismatch: expected {expected}, found {actual}")]
    FingerprintMismatch { expected: String, actual: String },
}

impl ApplicationError {
    pub(crate) fn not_found(id: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self::ServiceNotFound {
            id: id.into(),
            alternatives,
        }
    }

    /// Cycle path if this is a circular reference.
    pub fn circular_path(&self) -> Option<&[String]> {
        match self {
            Self::Domain(DomainError::CircularReference { path }) => Some(path),
            _ => None,
        }
    }
}

fn did_you_mean(alternatives: &[String]) -> String {
    match alternatives {
        [] => String::new(),
        [one] => format!(" (did you mean \"{one}\"?)"),
        many => format!(" (did you mean one of \"{}\"?)", many.join("\", \"")),
    }
}

fn type_suffix(type_hint: Option<&str>) -> String {
    type_hint
        .map(|hint| format!(" (type {hint})"))
        .unwrap_or_default()
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_alternatives_when_displaying_not_found_then_suggests_them() {
        let err = ApplicationError::not_found("loger", vec!["logger".into()]);
        assert_eq!(
            err.to_string(),
            "service not found: loger (did you mean \"logger\"?)"
        );
    }

    #[test]
    fn given_circular_domain_error_when_wrapped_then_path_is_reachable() {
        let err = ApplicationError::from(DomainError::CircularReference {
            path: vec!["a".into(), "b".into(), "a".into()],
        });
        assert_eq!(err.circular_path(), Some(&["a".to_string(), "b".into(), "a".into()][..]));
        assert_eq!(err.to_string(), "circular reference detected: a -> b -> a");
    }
}
