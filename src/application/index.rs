//! Type index: which services satisfy which type names
//!
//! Computed once from the definitions and class metadata, then cached by the
//! container until another service is registered.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::application::registry::ServiceRegistry;
use crate::domain::{ClassRegistry, Recipe, ServiceDefinition, TypeDescriptor, TypeHint};

/// Type name → candidate identifiers, plus the declared type of every service.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    by_type: HashMap<String, Vec<String>>,
    provided: BTreeMap<String, TypeDescriptor>,
}

impl TypeIndex {
    pub fn build(registry: &ServiceRegistry, classes: &ClassRegistry) -> Self {
        let mut index = Self::default();

        for definition in registry.iter() {
            let declared = declared_type(definition, registry, classes);

            let mut types = Vec::new();
            if let TypeDescriptor::Known(hint) = &declared {
                types.push(hint.name().to_string());
                types.extend(ancestors(hint.name(), classes));
            }
            types.extend(definition.provides.iter().cloned());

            let mut seen = HashSet::new();
            for type_name in types {
                if seen.insert(type_name.clone()) {
                    index
                        .by_type
                        .entry(type_name)
                        .or_default()
                        .push(definition.id.clone());
                }
            }
            index.provided.insert(definition.id.clone(), declared);
        }

        debug!(
            services = index.provided.len(),
            types = index.by_type.len(),
            "type index built"
        );
        index
    }

    /// Identifiers of services satisfying `type_name`, in registration order.
    pub fn candidates(&self, type_name: &str) -> &[String] {
        self.by_type
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Declared or inferred type of every service.
    pub fn provided(&self) -> &BTreeMap<String, TypeDescriptor> {
        &self.provided
    }
}

/// Declared type of a service: its class, or the factory's declared or
/// inferred return type.
fn declared_type(
    definition: &ServiceDefinition,
    registry: &ServiceRegistry,
    classes: &ClassRegistry,
) -> TypeDescriptor {
    match &definition.recipe {
        Recipe::Class { class } => TypeDescriptor::Known(TypeHint::new(class.clone())),
        Recipe::Factory { service, method } => {
            if let Some(returns) = &definition.returns {
                return TypeDescriptor::Known(TypeHint::from(returns.as_str()));
            }
            registry
                .get(service)
                .and_then(ServiceDefinition::class_name)
                .and_then(|class| classes.get(class))
                .and_then(|meta| meta.find_method(method))
                .and_then(|m| m.returns.clone())
                .map(TypeDescriptor::Known)
                .unwrap_or(TypeDescriptor::Unknown)
        }
    }
}

/// Interfaces and parent classes reachable from `class`, breadth first.
fn ancestors(class: &str, classes: &ClassRegistry) -> Vec<String> {
    let mut found = Vec::new();
    let mut seen = HashSet::from([class.to_string()]);
    let mut queue = VecDeque::from([class.to_string()]);

    while let Some(current) = queue.pop_front() {
        let Some(meta) = classes.get(&current) else {
            continue;
        };
        for parent in meta.interfaces() {
            if seen.insert(parent.clone()) {
                found.push(parent.clone());
                queue.push_back(parent.clone());
            }
        }
    }
    found
}
