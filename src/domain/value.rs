//! Runtime values and the object model the container instantiates
//!
//! The container never introspects Rust types. Classes are described by
//! metadata (see [`crate::domain::metadata`]) and instances only need to
//! implement [`Injectable`] so that properties can be set and methods called
//! after construction.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Error raised by user-supplied constructors, setters and factory methods.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for user-supplied hooks.
pub type HookResult<T> = Result<T, HookError>;

/// A constructed service, shared by reference.
pub type Instance = Arc<dyn Injectable>;

/// Literal value carried by definitions, parameter defaults and compiled statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
}

impl Literal {
    /// Name of the literal's built-in type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
            Literal::List(_) => "array",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Int(i)
    }
}

impl From<f64> for Literal {
    fn from(x: f64) -> Self {
        Literal::Float(x)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Str(s)
    }
}

/// Value handed to constructors, setters and injection methods.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Service(Instance),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The referenced service, if this value holds one.
    pub fn as_service(&self) -> Option<&Instance> {
        match self {
            Value::Service(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Service(a), Value::Service(b)) => same_instance(a, b),
            _ => false,
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(i) => Value::Int(i),
            Literal::Float(x) => Value::Float(x),
            Literal::Str(s) => Value::Str(s),
            Literal::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
        }
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Service(instance)
    }
}

/// Identity comparison of two instances (same allocation).
pub fn same_instance(a: &Instance, b: &Instance) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Object the container can construct and inject into.
///
/// Setter and method injection happen while the container still owns the
/// object exclusively; once shared it is only reachable through `&self`.
pub trait Injectable: Any + Send + Sync + fmt::Debug {
    /// Class name the object was constructed as.
    fn class_name(&self) -> &str;

    /// Assign an injected property.
    fn set_property(&mut self, name: &str, value: Value) -> HookResult<()>;

    /// Call an injection method (setter-style, result discarded).
    fn call_method(&mut self, name: &str, arguments: Vec<Value>) -> HookResult<()>;

    /// Call a factory method on a shared instance.
    fn invoke(&self, method: &str, _arguments: Vec<Value>) -> HookResult<Value> {
        Err(format!("{}::{}() is not a factory method", self.class_name(), method).into())
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn Injectable {
    /// Downcast to the concrete object type.
    pub fn downcast_ref<T: Injectable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A method call recorded on an [`Object`].
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Vec<Value>,
}

/// Generic object used for classes registered without a constructor hook.
///
/// Records constructor arguments, properties and method calls, plus a journal
/// of every side effect in the order it happened.
#[derive(Debug, Clone, Default)]
pub struct Object {
    class: String,
    arguments: Vec<Value>,
    properties: Vec<(String, Value)>,
    calls: Vec<MethodCall>,
    journal: Vec<String>,
}

impl Object {
    pub fn new(class: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            class: class.into(),
            arguments,
            properties: Vec::new(),
            calls: Vec::new(),
            journal: vec!["construct".to_string()],
        }
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn argument(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index)
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn calls(&self) -> &[MethodCall] {
        &self.calls
    }

    /// Side effects in execution order: `construct`, `property:<name>`, `call:<method>`.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }
}

impl Injectable for Object {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn set_property(&mut self, name: &str, value: Value) -> HookResult<()> {
        self.journal.push(format!("property:{name}"));
        match self.properties.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name.to_string(), value)),
        }
        Ok(())
    }

    fn call_method(&mut self, name: &str, arguments: Vec<Value>) -> HookResult<()> {
        self.journal.push(format!("call:{name}"));
        self.calls.push(MethodCall {
            method: name.to_string(),
            arguments,
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_object_when_injecting_then_journal_keeps_order() {
        let mut object = Object::new("Mailer", vec![Value::Int(1)]);
        object.set_property("logger", Value::Null).unwrap();
        object.call_method("setCache", vec![]).unwrap();

        assert_eq!(object.journal(), ["construct", "property:logger", "call:setCache"]);
        assert_eq!(object.argument(0), Some(&Value::Int(1)));
    }

    #[test]
    fn given_two_arcs_of_same_object_when_comparing_then_values_are_equal() {
        let a: Instance = Arc::new(Object::new("Logger", vec![]));
        let b = a.clone();
        let c: Instance = Arc::new(Object::new("Logger", vec![]));

        assert_eq!(Value::Service(a.clone()), Value::Service(b));
        assert_ne!(Value::Service(a), Value::Service(c));
    }

    #[test]
    fn given_nested_literal_when_converting_then_value_mirrors_structure() {
        let literal = Literal::List(vec![Literal::from("a"), Literal::Int(2)]);
        let value = Value::from(literal.clone());

        assert_eq!(
            value,
            Value::List(vec![Value::Str("a".into()), Value::Int(2)])
        );
        assert_eq!(literal.to_string(), "[\"a\", 2]");
    }
}
