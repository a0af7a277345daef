//! Compiled container: statements recorded ahead of time
//!
//! Serving a service from here involves no planning or autowiring, only
//! statement execution. Shared instances are cached like in the interpreter.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::application::executor::StatementExecutor;
use crate::application::registry::alternatives;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    ClassRegistry, CompiledStatement, Instance, Lifecycle, ResolutionContext, TypeDescriptor,
    TypeHint,
};

/// Statements of one service plus what is needed to serve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledService {
    pub lifecycle: Lifecycle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub statements: Vec<CompiledStatement>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompiledContainer {
    fingerprint: String,
    generated_at: DateTime<Utc>,
    services: BTreeMap<String, CompiledService>,
    #[serde(skip)]
    shared: Mutex<HashMap<String, Instance>>,
}

impl CompiledContainer {
    pub fn new(services: BTreeMap<String, CompiledService>) -> Self {
        let fingerprint = fingerprint(&services);
        debug!(services = services.len(), %fingerprint, "compiled container created");
        Self {
            fingerprint,
            generated_at: Utc::now(),
            services,
            shared: Mutex::new(HashMap::new()),
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn services(&self) -> &BTreeMap<String, CompiledService> {
        &self.services
    }

    pub fn service(&self, id: &str) -> Option<&CompiledService> {
        self.services.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// Recorded type of every service.
    pub fn provided_services(&self) -> BTreeMap<String, TypeDescriptor> {
        self.services
            .iter()
            .map(|(id, service)| {
                let descriptor = service
                    .type_name
                    .as_deref()
                    .map(|name| TypeDescriptor::Known(TypeHint::from(name)))
                    .unwrap_or(TypeDescriptor::Unknown);
                (id.clone(), descriptor)
            })
            .collect()
    }

    /// Check the stored fingerprint against the statements.
    pub fn verify_fingerprint(&self) -> ApplicationResult<()> {
        let actual = fingerprint(&self.services);
        if actual != self.fingerprint {
            return Err(ApplicationError::FingerprintMismatch {
                expected: self.fingerprint.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Execute the recorded statements of `id`.
    #[instrument(level = "debug", skip(self, classes))]
    pub fn get(&self, id: &str, classes: &ClassRegistry) -> ApplicationResult<Instance> {
        self.realise(id, classes, &mut ResolutionContext::new())
    }

    fn realise(
        &self,
        id: &str,
        classes: &ClassRegistry,
        ctx: &mut ResolutionContext,
    ) -> ApplicationResult<Instance> {
        if let Some(instance) = self.shared_lock().get(id) {
            return Ok(instance.clone());
        }
        let service = self.services.get(id).ok_or_else(|| {
            ApplicationError::not_found(id, alternatives(id, self.services.keys().map(String::as_str)))
        })?;

        let mut loading = ctx.guard(id)?;
        let instance = StatementExecutor::new(classes).execute(
            id,
            &service.statements,
            &mut |dependency| self.realise(dependency, classes, &mut loading),
        )?;

        if service.lifecycle == Lifecycle::Shared {
            return Ok(self
                .shared_lock()
                .entry(id.to_string())
                .or_insert(instance)
                .clone());
        }
        Ok(instance)
    }

    fn shared_lock(&self) -> MutexGuard<'_, HashMap<String, Instance>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// First 16 hex digits of SHA-256 over the rendered statements.
fn fingerprint(services: &BTreeMap<String, CompiledService>) -> String {
    let mut hasher = Sha256::new();
    for (id, service) in services {
        hasher.update(format!("{id}:{:?}:{:?}\n", service.lifecycle, service.type_name));
        for statement in &service.statements {
            hasher.update(format!("  {statement}\n"));
        }
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
