//! Class metadata: constructor signatures and injection markers
//!
//! This table replaces runtime reflection. It is produced by an introspection
//! step outside the engine (a derive, a build script, hand-written tables) and
//! only read during resolution.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::definition::Argument;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::{HookResult, Injectable, Literal, Object, Value};

/// Type names that never take part in type-based autowiring.
const BUILTIN_TYPES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "object", "self", "static", "string", "true", "void",
];

/// A declared type, optionally nullable (`?Logger`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHint {
    name: String,
    nullable: bool,
}

impl TypeHint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: true,
        }
    }

    /// Parse a type constraint; a leading `?` marks it nullable.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        let (nullable, name) = match trimmed.strip_prefix('?') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        if name.is_empty() || name.starts_with('?') || name.contains(char::is_whitespace) {
            return Err(DomainError::InvalidTypeHint(raw.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            nullable,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Built-in types (`int`, `string`, ...) are never autowired.
    pub fn is_builtin(&self) -> bool {
        let lower = self.name.to_ascii_lowercase();
        BUILTIN_TYPES.contains(&lower.as_str())
    }
}

impl FromStr for TypeHint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for TypeHint {
    /// Lenient conversion for metadata builders; a leading `?` still marks nullability.
    fn from(raw: &str) -> Self {
        match raw.strip_prefix('?') {
            Some(name) => Self::nullable(name),
            None => Self::new(raw),
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "?{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Type a service is known to provide, as reported by provided-services listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Known(TypeHint),
    /// Neither declared nor inferable.
    Unknown,
}

impl TypeDescriptor {
    pub fn hint(&self) -> Option<&TypeHint> {
        match self {
            TypeDescriptor::Known(hint) => Some(hint),
            TypeDescriptor::Unknown => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Known(hint) => write!(f, "{hint}"),
            TypeDescriptor::Unknown => write!(f, "?"),
        }
    }
}

/// A constructor or method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_hint: Option<TypeHint>,
    pub default: Option<Literal>,
    /// Explicit service identifier to inject (autowiring hint).
    pub autowire: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
            autowire: None,
        }
    }

    pub fn typed(mut self, hint: impl Into<TypeHint>) -> Self {
        self.type_hint = Some(hint.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Literal>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn hint(mut self, service_id: impl Into<String>) -> Self {
        self.autowire = Some(service_id.into());
        self
    }

    /// Nullable type, or `null` as default value.
    pub fn is_nullable(&self) -> bool {
        self.type_hint.as_ref().is_some_and(TypeHint::is_nullable)
            || matches!(self.default, Some(Literal::Null))
    }
}

/// Injection marker attached to a property or method.
///
/// `value` is only meaningful on properties. `arguments` is never allowed:
/// method parameters are always autowired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjectMarker {
    pub value: Option<Argument>,
    pub arguments: Vec<Argument>,
}

/// A public property of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMeta {
    pub name: String,
    pub type_hint: Option<TypeHint>,
    pub markers: Vec<InjectMarker>,
}

impl PropertyMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            markers: Vec::new(),
        }
    }

    pub fn typed(mut self, hint: impl Into<TypeHint>) -> Self {
        self.type_hint = Some(hint.into());
        self
    }

    /// Mark for injection by declared type.
    pub fn inject(mut self) -> Self {
        self.markers.push(InjectMarker::default());
        self
    }

    /// Mark for injection of an explicit value or reference.
    pub fn inject_value(mut self, value: Argument) -> Self {
        self.markers.push(InjectMarker {
            value: Some(value),
            arguments: Vec::new(),
        });
        self
    }
}

/// A public method of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMeta {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub returns: Option<TypeHint>,
    pub markers: Vec<InjectMarker>,
}

impl MethodMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns: None,
            markers: Vec::new(),
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, hint: impl Into<TypeHint>) -> Self {
        self.returns = Some(hint.into());
        self
    }

    pub fn inject(mut self) -> Self {
        self.markers.push(InjectMarker::default());
        self
    }

    /// Marker that declares arguments directly; rejected during planning.
    pub fn inject_with(mut self, arguments: Vec<Argument>) -> Self {
        self.markers.push(InjectMarker {
            value: None,
            arguments,
        });
        self
    }
}

/// Hook building an instance from resolved constructor arguments.
pub type Constructor = Arc<dyn Fn(Vec<Value>) -> HookResult<Box<dyn Injectable>> + Send + Sync>;

/// Everything the engine knows about a class.
#[derive(Clone)]
pub struct ClassMetadata {
    name: String,
    implements: Vec<String>,
    parameters: Vec<Parameter>,
    properties: Vec<PropertyMeta>,
    methods: Vec<MethodMeta>,
    constructor: Option<Constructor>,
}

impl fmt::Debug for ClassMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMetadata")
            .field("name", &self.name)
            .field("implements", &self.implements)
            .field("parameters", &self.parameters)
            .field("properties", &self.properties)
            .field("methods", &self.methods)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            implements: Vec::new(),
            parameters: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructor: None,
        }
    }

    /// Add an interface or parent class this class satisfies.
    pub fn implements(mut self, type_name: impl Into<String>) -> Self {
        self.implements.push(type_name.into());
        self
    }

    /// Append a constructor parameter.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn property(mut self, property: PropertyMeta) -> Self {
        self.properties.push(property);
        self
    }

    pub fn method(mut self, method: MethodMeta) -> Self {
        self.methods.push(method);
        self
    }

    /// Install a constructor hook; without one a generic [`Object`] is built.
    pub fn constructor<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<Value>) -> HookResult<Box<dyn Injectable>> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interfaces(&self) -> &[String] {
        &self.implements
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn properties(&self) -> &[PropertyMeta] {
        &self.properties
    }

    pub fn methods(&self) -> &[MethodMeta] {
        &self.methods
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodMeta> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Build an instance from already-resolved arguments.
    pub fn instantiate(&self, arguments: Vec<Value>) -> HookResult<Box<dyn Injectable>> {
        match &self.constructor {
            Some(hook) => hook(arguments),
            None => Ok(Box::new(Object::new(self.name.clone(), arguments))),
        }
    }
}

/// Lookup table of class metadata by class name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassMetadata>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a class.
    pub fn register(&mut self, class: ClassMetadata) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&ClassMetadata> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Instantiate `class`, falling back to a generic object for unknown classes.
    pub fn instantiate(&self, class: &str, arguments: Vec<Value>) -> HookResult<Box<dyn Injectable>> {
        match self.get(class) {
            Some(meta) => meta.instantiate(arguments),
            None => Ok(Box::new(Object::new(class, arguments))),
        }
    }
}
