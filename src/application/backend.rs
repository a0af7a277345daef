//! Execution backends: what happens to a service's statements
//!
//! The interpreter executes them immediately and returns the live object; the
//! compiler records them for a [`CompiledContainer`](crate::application::CompiledContainer).
//! The container drives both through the same recursion, so cycle detection
//! and dependency ordering are identical in both modes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::compiled::CompiledService;
use crate::application::container::Container;
use crate::application::executor::StatementExecutor;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{CompiledStatement, Instance, ResolutionContext, ServiceDefinition};

/// Chosen once when the container is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Interpreted,
    Compiled,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Interpreted => write!(f, "interpreted"),
            ExecutionMode::Compiled => write!(f, "compiled"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interpreted" => Ok(ExecutionMode::Interpreted),
            "compiled" => Ok(ExecutionMode::Compiled),
            other => Err(ApplicationError::Config {
                message: format!("unknown execution mode {other:?} (expected interpreted or compiled)"),
            }),
        }
    }
}

/// Consumes the statements emitted for one service.
pub trait Backend {
    type Output;

    /// Result for an already realised service, skipping resolution.
    fn cached(&self, container: &Container, id: &str) -> Option<Self::Output>;

    /// Realise `definition` from its statements. `ctx` already contains the
    /// definition's identifier; dependencies are realised through
    /// [`Container::realise`] with the same context.
    fn realise(
        &mut self,
        container: &Container,
        definition: &ServiceDefinition,
        statements: Vec<CompiledStatement>,
        ctx: &mut ResolutionContext,
    ) -> ApplicationResult<Self::Output>;
}

/// Executes statements as they are emitted.
#[derive(Debug, Default)]
pub struct Interpreter;

impl Backend for Interpreter {
    type Output = Instance;

    fn cached(&self, container: &Container, id: &str) -> Option<Instance> {
        container.shared_instance(id)
    }

    fn realise(
        &mut self,
        container: &Container,
        definition: &ServiceDefinition,
        statements: Vec<CompiledStatement>,
        ctx: &mut ResolutionContext,
    ) -> ApplicationResult<Instance> {
        let executor = StatementExecutor::new(container.classes());
        let instance = executor.execute(&definition.id, &statements, &mut |dependency| {
            container.realise(dependency, ctx, &mut *self)
        })?;

        if definition.is_shared() {
            return Ok(container.share(&definition.id, instance));
        }
        Ok(instance)
    }
}

/// Records statements instead of executing them.
#[derive(Debug, Default)]
pub struct Compiler {
    services: BTreeMap<String, CompiledService>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_services(self) -> BTreeMap<String, CompiledService> {
        self.services
    }
}

impl Backend for Compiler {
    type Output = ();

    fn cached(&self, _container: &Container, id: &str) -> Option<()> {
        self.services.contains_key(id).then_some(())
    }

    fn realise(
        &mut self,
        container: &Container,
        definition: &ServiceDefinition,
        statements: Vec<CompiledStatement>,
        ctx: &mut ResolutionContext,
    ) -> ApplicationResult<()> {
        for statement in &statements {
            for dependency in statement.references() {
                container.realise(dependency, ctx, &mut *self)?;
            }
        }

        debug!(id = %definition.id, statements = statements.len(), "compiled");
        let type_name = container
            .provided_services()
            .get(&definition.id)
            .and_then(|descriptor| descriptor.hint())
            .map(ToString::to_string);
        self.services.insert(
            definition.id.clone(),
            CompiledService {
                lifecycle: definition.lifecycle,
                type_name,
                statements,
            },
        );
        Ok(())
    }
}
