//! Error conversion helpers for user-supplied hooks
//!
//! Constructors, setters and factory methods report failures as boxed errors;
//! these helpers attach the service being built.

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::HookResult;

/// Extension trait for converting `HookResult` to `ApplicationResult` with context.
pub trait HookResultExt<T> {
    /// Add service context to a hook failure.
    ///
    /// # Example
    /// ```ignore
    /// object.set_property("logger", value)
    ///     .with_service_context("set property logger", "mailer")?;
    /// ```
    fn with_service_context(self, action: &str, service: &str) -> ApplicationResult<T>;
}

impl<T> HookResultExt<T> for HookResult<T> {
    fn with_service_context(self, action: &str, service: &str) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Instantiation {
            service: service.to_string(),
            context: action.to_string(),
            source,
        })
    }
}
