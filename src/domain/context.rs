//! Dependency graph tracking for a single resolution request
//!
//! A [`ResolutionContext`] holds the identifiers whose resolution is in progress
//! on the current call stack. Entering an identifier that is already loading
//! is a circular reference.

use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::domain::error::{DomainError, DomainResult};

/// Ordered loading set of one top-level resolution request.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    loading: Vec<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as loading.
    ///
    /// Fails with the cycle path, from the first occurrence of `id` up to and
    /// including the repeated `id`.
    pub fn enter(&mut self, id: &str) -> DomainResult<()> {
        if let Some(start) = self.loading.iter().position(|loading| loading == id) {
            let mut path = self.loading[start..].to_vec();
            path.push(id.to_string());
            return Err(DomainError::CircularReference { path });
        }
        trace!(id, depth = self.loading.len(), "enter");
        self.loading.push(id.to_string());
        Ok(())
    }

    /// Remove `id` from the loading set.
    pub fn exit(&mut self, id: &str) {
        if let Some(pos) = self.loading.iter().rposition(|loading| loading == id) {
            self.loading.remove(pos);
            trace!(id, depth = self.loading.len(), "exit");
        }
    }

    /// Enter `id` and return a guard that exits it when dropped.
    pub fn guard(&mut self, id: &str) -> DomainResult<LoadingGuard<'_>> {
        self.enter(id)?;
        Ok(LoadingGuard {
            context: self,
            id: id.to_string(),
        })
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loading.iter().any(|loading| loading == id)
    }

    /// Identifiers currently loading, outermost first.
    pub fn path(&self) -> &[String] {
        &self.loading
    }

    pub fn is_empty(&self) -> bool {
        self.loading.is_empty()
    }
}

/// Keeps an identifier in the loading set for its lifetime.
///
/// Dereferences to the context so nested resolutions can enter further
/// identifiers through it.
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    context: &'a mut ResolutionContext,
    id: String,
}

impl Deref for LoadingGuard<'_> {
    type Target = ResolutionContext;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for LoadingGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.context.exit(&self.id);
    }
}
