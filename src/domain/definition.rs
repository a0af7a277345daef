//! Service definitions: what the container knows how to build

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value::Literal;

/// Argument as declared in a definition or an injection marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A literal value.
    Value(Literal),
    /// Reference to another service; optional references become `null`
    /// when the identifier is not defined.
    Service { id: String, optional: bool },
    /// Every service providing the given type, in registration order.
    Tagged(String),
}

impl Argument {
    pub fn value(literal: impl Into<Literal>) -> Self {
        Argument::Value(literal.into())
    }

    pub fn service(id: impl Into<String>) -> Self {
        Argument::Service {
            id: id.into(),
            optional: false,
        }
    }

    pub fn optional(id: impl Into<String>) -> Self {
        Argument::Service {
            id: id.into(),
            optional: true,
        }
    }

    pub fn tagged(type_name: impl Into<String>) -> Self {
        Argument::Tagged(type_name.into())
    }
}

/// Explicit injection declared on the definition itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Injection {
    Property { name: String, value: Argument },
    Call { method: String, arguments: Vec<Argument> },
}

/// How an instance comes into existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipe {
    /// `new Class(arguments)`
    Class { class: String },
    /// `service.method(arguments)`
    Factory { service: String, method: String },
}

/// Whether the first instance is cached and shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Shared,
    Transient,
}

/// A service the container can build.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    /// Unique identifier within the container
    pub id: String,
    pub recipe: Recipe,
    /// Positional constructor (or factory method) arguments
    pub arguments: Vec<Argument>,
    /// Arguments bound by parameter name
    pub named_arguments: BTreeMap<String, Argument>,
    /// Explicit property sets and method calls
    pub injections: Vec<Injection>,
    pub lifecycle: Lifecycle,
    /// Additional type names this service satisfies
    pub provides: Vec<String>,
    /// Per-service autowiring switch; `None` falls back to the container default
    pub autowire: Option<bool>,
    /// Declared return type of a factory
    pub returns: Option<String>,
}

impl ServiceDefinition {
    fn with_recipe(id: impl Into<String>, recipe: Recipe) -> Self {
        Self {
            id: id.into(),
            recipe,
            arguments: Vec::new(),
            named_arguments: BTreeMap::new(),
            injections: Vec::new(),
            lifecycle: Lifecycle::Shared,
            provides: Vec::new(),
            autowire: None,
            returns: None,
        }
    }

    /// Service built by calling the constructor of `class`.
    pub fn class(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self::with_recipe(id, Recipe::Class { class: class.into() })
    }

    /// Service whose identifier is its class name.
    pub fn autowired(class: impl Into<String>) -> Self {
        let class = class.into();
        Self::class(class.clone(), class)
    }

    /// Service built by calling `method` on the service `factory`.
    pub fn factory(
        id: impl Into<String>,
        factory: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self::with_recipe(
            id,
            Recipe::Factory {
                service: factory.into(),
                method: method.into(),
            },
        )
    }

    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn named_argument(mut self, name: impl Into<String>, argument: Argument) -> Self {
        self.named_arguments.insert(name.into(), argument);
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: Argument) -> Self {
        self.injections.push(Injection::Property {
            name: name.into(),
            value,
        });
        self
    }

    pub fn call(mut self, method: impl Into<String>, arguments: Vec<Argument>) -> Self {
        self.injections.push(Injection::Call {
            method: method.into(),
            arguments,
        });
        self
    }

    pub fn transient(mut self) -> Self {
        self.lifecycle = Lifecycle::Transient;
        self
    }

    pub fn provides(mut self, type_name: impl Into<String>) -> Self {
        self.provides.push(type_name.into());
        self
    }

    pub fn autowire(mut self, enabled: bool) -> Self {
        self.autowire = Some(enabled);
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns = Some(type_name.into());
        self
    }

    /// Class name for class recipes.
    pub fn class_name(&self) -> Option<&str> {
        match &self.recipe {
            Recipe::Class { class } => Some(class),
            Recipe::Factory { .. } => None,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.lifecycle == Lifecycle::Shared
    }
}
