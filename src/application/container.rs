//! The container: registration, resolution and the execution-mode switch
//!
//! Registration takes `&mut self`, resolution `&self`, so definitions cannot
//! change while a resolution is in flight.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, info, instrument};

use crate::application::backend::{Backend, Compiler, ExecutionMode, Interpreter};
use crate::application::compiled::CompiledContainer;
use crate::application::emitter::CompilerEmitter;
use crate::application::index::TypeIndex;
use crate::application::locator::ServiceLocator;
use crate::application::planner::InjectionPlanner;
use crate::application::registry::ServiceRegistry;
use crate::application::resolver::Resolver;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    ClassMetadata, ClassRegistry, CompiledStatement, DomainError, Instance, Parameter, Recipe,
    ResolutionContext, ServiceDefinition, TypeDescriptor, Value,
};

/// Collects classes and definitions, then builds a [`Container`].
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    registry: ServiceRegistry,
    classes: ClassRegistry,
    mode: ExecutionMode,
    autowire: bool,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            autowire: true,
            ..Self::default()
        }
    }

    /// Builder configured from loaded settings.
    pub fn with_settings(settings: &Settings) -> Self {
        Self::new()
            .mode(settings.mode)
            .autowire(settings.autowire)
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Default autowiring switch for definitions that do not set their own.
    pub fn autowire(mut self, enabled: bool) -> Self {
        self.autowire = enabled;
        self
    }

    pub fn class(mut self, class: ClassMetadata) -> Self {
        self.classes.register(class);
        self
    }

    pub fn service(mut self, definition: ServiceDefinition) -> Self {
        self.registry.insert(definition);
        self
    }

    /// Build the container. In compiled mode every definition is compiled
    /// here, so configuration errors surface before the first `get`.
    pub fn build(self) -> ApplicationResult<Container> {
        let mut container = Container {
            registry: self.registry,
            classes: self.classes,
            mode: self.mode,
            autowire: self.autowire,
            index: OnceLock::new(),
            shared: Mutex::new(HashMap::new()),
            compiled: None,
        };
        if container.mode == ExecutionMode::Compiled {
            container.compiled = Some(container.compile()?);
        }
        info!(
            mode = %container.mode,
            services = container.registry.len(),
            "container built"
        );
        Ok(container)
    }
}

/// Dependency-injection container.
#[derive(Debug)]
pub struct Container {
    registry: ServiceRegistry,
    classes: ClassRegistry,
    mode: ExecutionMode,
    autowire: bool,
    index: OnceLock<TypeIndex>,
    shared: Mutex<HashMap<String, Instance>>,
    compiled: Option<CompiledContainer>,
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn definition(&self, id: &str) -> Option<&ServiceDefinition> {
        self.registry.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.registry.ids()
    }

    /// Add or replace a definition. Only interpreted containers accept new
    /// services after build; the type index is rebuilt on next use.
    ///
    /// A replaced service loses its cached instance. Services that already
    /// hold the old instance keep it.
    pub fn register(&mut self, definition: ServiceDefinition) -> ApplicationResult<Option<ServiceDefinition>> {
        if self.mode == ExecutionMode::Compiled {
            return Err(ApplicationError::ModeMismatch {
                mode: self.mode.to_string(),
                operation: format!("registering {}", definition.id),
            });
        }
        debug!(id = %definition.id, "register");
        self.index.take();
        let id = definition.id.clone();
        let replaced = self.registry.insert(definition);
        if replaced.is_some() {
            let shared = self.shared.get_mut().unwrap_or_else(PoisonError::into_inner);
            if shared.remove(&id).is_some() {
                debug!(id = %id, "dropped cached instance of replaced service");
            }
        }
        Ok(replaced)
    }

    /// Service by identifier, or by type when no identifier matches.
    #[instrument(level = "debug", skip(self))]
    pub fn get(&self, id: &str) -> ApplicationResult<Instance> {
        let found = self.resolver().require(id)?;
        self.instance(&found)
    }

    /// Resolve an identifier or type constraint; a leading `?` makes the
    /// request nullable, in which case a missing service yields `None`.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&self, request: &str) -> ApplicationResult<Option<Instance>> {
        let (nullable, name) = match request.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, request),
        };
        if name.is_empty() || name.starts_with('?') {
            return Err(DomainError::InvalidTypeHint(request.to_string()).into());
        }
        match self.resolver().lookup(name)? {
            Some(id) => self.instance(&id).map(Some),
            None if nullable => Ok(None),
            None => Err(ApplicationError::not_found(name, self.registry.alternatives(name))),
        }
    }

    /// Declared or inferred type of every service.
    pub fn provided_services(&self) -> &BTreeMap<String, TypeDescriptor> {
        self.index().provided()
    }

    /// Statements a service compiles to.
    pub fn statements(&self, id: &str) -> ApplicationResult<Vec<CompiledStatement>> {
        let definition = self
            .registry
            .get(id)
            .ok_or_else(|| ApplicationError::not_found(id, self.registry.alternatives(id)))?;
        self.emit(definition)
    }

    /// Compile every definition, in registration order.
    #[instrument(level = "debug", skip(self))]
    pub fn compile(&self) -> ApplicationResult<CompiledContainer> {
        let mut compiler = Compiler::new();
        for id in self.registry.ids() {
            self.realise(id, &mut ResolutionContext::new(), &mut compiler)?;
        }
        Ok(CompiledContainer::new(compiler.into_services()))
    }

    /// Compiled form built at construction, for compiled-mode containers.
    pub fn compiled(&self) -> Option<&CompiledContainer> {
        self.compiled.as_ref()
    }

    /// Locator restricted to `ids`, resolving lazily through this container.
    pub fn locator(self: &Arc<Self>, ids: &[&str]) -> ApplicationResult<ServiceLocator> {
        let mut locator = ServiceLocator::new();
        for &id in ids {
            let found = self.resolver().require(id)?;
            let returns = self
                .provided_services()
                .get(&found)
                .and_then(TypeDescriptor::hint)
                .cloned();
            let container = Arc::clone(self);
            locator = locator.with_factory(
                id,
                move |_| container.instance(&found).map(Value::Service),
                returns,
            );
        }
        Ok(locator)
    }

    /// Realise `id` through `backend`, tracking it in `ctx` while its
    /// dependencies are realised.
    pub fn realise<B: Backend>(
        &self,
        id: &str,
        ctx: &mut ResolutionContext,
        backend: &mut B,
    ) -> ApplicationResult<B::Output> {
        if let Some(output) = backend.cached(self, id) {
            return Ok(output);
        }
        let definition = self
            .registry
            .get(id)
            .ok_or_else(|| ApplicationError::not_found(id, self.registry.alternatives(id)))?;

        let mut loading = ctx.guard(id)?;
        let statements = self.emit(definition)?;
        backend.realise(self, definition, statements, &mut loading)
    }

    pub(crate) fn shared_instance(&self, id: &str) -> Option<Instance> {
        self.shared_lock().get(id).cloned()
    }

    /// Cache a shared instance; the first one stored wins.
    pub(crate) fn share(&self, id: &str, instance: Instance) -> Instance {
        self.shared_lock()
            .entry(id.to_string())
            .or_insert(instance)
            .clone()
    }

    fn instance(&self, id: &str) -> ApplicationResult<Instance> {
        match &self.compiled {
            Some(compiled) => compiled.get(id, &self.classes),
            None => self.realise(id, &mut ResolutionContext::new(), &mut Interpreter),
        }
    }

    fn shared_lock(&self) -> MutexGuard<'_, HashMap<String, Instance>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn index(&self) -> &TypeIndex {
        self.index
            .get_or_init(|| TypeIndex::build(&self.registry, &self.classes))
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.registry, self.index())
    }

    /// Plan, autowire and emit one definition. Injection markers are validated
    /// before constructor arguments are resolved.
    fn emit(&self, definition: &ServiceDefinition) -> ApplicationResult<Vec<CompiledStatement>> {
        let resolver = self.resolver();
        let autowire = definition.autowire.unwrap_or(self.autowire);

        let operations = InjectionPlanner::new(resolver).plan_definition(
            definition,
            self.target_class(definition),
            autowire,
        )?;

        let parameters = self.construction_parameters(definition)?;
        let arguments = resolver.autowire_parameters(
            &definition.id,
            parameters,
            &definition.arguments,
            &definition.named_arguments,
            autowire,
        )?;

        Ok(CompilerEmitter::emit(definition, arguments, operations))
    }

    /// Class whose injection markers apply to the built instance.
    fn target_class(&self, definition: &ServiceDefinition) -> Option<&ClassMetadata> {
        match &definition.recipe {
            Recipe::Class { class } => self.classes.get(class),
            Recipe::Factory { .. } => self
                .provided_services()
                .get(&definition.id)
                .and_then(TypeDescriptor::hint)
                .and_then(|hint| self.classes.get(hint.name())),
        }
    }

    /// Constructor parameters, or the factory method's parameters.
    fn construction_parameters(&self, definition: &ServiceDefinition) -> ApplicationResult<&[Parameter]> {
        match &definition.recipe {
            Recipe::Class { class } => Ok(self
                .classes
                .get(class)
                .map(ClassMetadata::parameters)
                .unwrap_or_default()),
            Recipe::Factory { service, method } => {
                let factory = self.registry.get(service).ok_or_else(|| {
                    ApplicationError::not_found(service.as_str(), self.registry.alternatives(service))
                })?;
                Ok(factory
                    .class_name()
                    .and_then(|class| self.classes.get(class))
                    .and_then(|class| class.find_method(method))
                    .map(|method| method.parameters.as_slice())
                    .unwrap_or_default())
            }
        }
    }
}
