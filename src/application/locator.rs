//! Service locator: a read-only view over a fixed set of services
//!
//! Factories run lazily on `get` and may call back into the locator. The
//! locator keeps a loading set per calling thread, so a factory re-entering
//! an identifier that is still being produced on the same call stack fails
//! instead of recursing forever. Other threads may produce the same
//! identifier concurrently.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, instrument};

use crate::application::registry::alternatives;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ResolutionContext, TypeDescriptor, TypeHint, Value};

/// Lazily invoked service producer.
pub type LocatorFactory = Arc<dyn Fn(&ServiceLocator) -> ApplicationResult<Value> + Send + Sync>;

enum Entry {
    Factory {
        factory: LocatorFactory,
        returns: Option<TypeHint>,
    },
    Stored(Value),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Factory { returns, .. } => f.debug_struct("Factory").field("returns", returns).finish(),
            Entry::Stored(value) => f.debug_tuple("Stored").field(value).finish(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ServiceLocator {
    entries: BTreeMap<String, Entry>,
    loading: Mutex<HashMap<ThreadId, ResolutionContext>>,
    provided: OnceLock<BTreeMap<String, TypeDescriptor>>,
}

impl ServiceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory; `returns` is its declared return type, if known.
    pub fn with_factory<F>(mut self, id: impl Into<String>, factory: F, returns: Option<TypeHint>) -> Self
    where
        F: Fn(&ServiceLocator) -> ApplicationResult<Value> + Send + Sync + 'static,
    {
        self.entries.insert(
            id.into(),
            Entry::Factory {
                factory: Arc::new(factory),
                returns,
            },
        );
        self
    }

    /// Add a value returned as is.
    pub fn with_value(mut self, id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(id.into(), Entry::Stored(value.into()));
        self
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get(&self, id: &str) -> ApplicationResult<Value> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| ApplicationError::not_found(id, alternatives(id, self.ids())))?;

        match entry {
            Entry::Stored(value) => Ok(value.clone()),
            Entry::Factory { factory, .. } => {
                let _loading = self.enter(id)?;
                factory(self)
            }
        }
    }

    /// Type of every entry, computed on first call.
    ///
    /// Declared factory return type, else the class of a stored object, else
    /// unknown.
    pub fn provided_services(&self) -> &BTreeMap<String, TypeDescriptor> {
        self.provided.get_or_init(|| {
            let provided: BTreeMap<_, _> = self
                .entries
                .iter()
                .map(|(id, entry)| {
                    let descriptor = match entry {
                        Entry::Factory {
                            returns: Some(hint),
                            ..
                        } => TypeDescriptor::Known(hint.clone()),
                        Entry::Stored(Value::Service(instance)) => {
                            TypeDescriptor::Known(TypeHint::new(instance.class_name()))
                        }
                        _ => TypeDescriptor::Unknown,
                    };
                    (id.clone(), descriptor)
                })
                .collect();
            debug!(entries = provided.len(), "locator types computed");
            provided
        })
    }

    fn enter(&self, id: &str) -> ApplicationResult<Loading<'_>> {
        let thread = thread::current().id();
        self.loading_lock().entry(thread).or_default().enter(id)?;
        Ok(Loading {
            locator: self,
            thread,
            id: id.to_string(),
        })
    }

    fn loading_lock(&self) -> MutexGuard<'_, HashMap<ThreadId, ResolutionContext>> {
        self.loading.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps an identifier loading on one thread while its factory runs; the lock
/// is only held while entering and exiting.
struct Loading<'a> {
    locator: &'a ServiceLocator,
    thread: ThreadId,
    id: String,
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        let mut loading = self.locator.loading_lock();
        if let Some(ctx) = loading.get_mut(&self.thread) {
            ctx.exit(&self.id);
            if ctx.is_empty() {
                loading.remove(&self.thread);
            }
        }
    }
}
