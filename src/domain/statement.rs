//! Compiled statements: the imperative form of a resolved service
//!
//! A service compiles to one assignment (`Construct` or `Invoke`) followed by
//! property sets and method calls on the assigned instance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::value::Literal;

/// Expression evaluated when a statement runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expr {
    Literal(Literal),
    /// Fetch another service by identifier.
    Service(String),
    List(Vec<Expr>),
}

impl Expr {
    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    /// Collect service identifiers referenced by this expression.
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Service(id) => out.push(id.as_str()),
            Expr::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
        }
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Literal(literal)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Service(id) => write!(f, "@{id}"),
            Expr::List(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// One imperative step of building a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CompiledStatement {
    /// `instance = new class(arguments)`
    Construct { class: String, arguments: Vec<Expr> },
    /// `instance = factory.method(arguments)`
    Invoke {
        factory: String,
        method: String,
        arguments: Vec<Expr>,
    },
    /// `instance.property = value`
    SetProperty { property: String, value: Expr },
    /// `instance.method(arguments)`
    CallMethod { method: String, arguments: Vec<Expr> },
}

impl CompiledStatement {
    /// Service identifiers this statement reads.
    pub fn references(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        match self {
            CompiledStatement::Construct { arguments, .. }
            | CompiledStatement::CallMethod { arguments, .. } => {
                for arg in arguments {
                    arg.collect_references(&mut out);
                }
            }
            CompiledStatement::Invoke {
                factory, arguments, ..
            } => {
                out.push(factory.as_str());
                for arg in arguments {
                    arg.collect_references(&mut out);
                }
            }
            CompiledStatement::SetProperty { value, .. } => value.collect_references(&mut out),
        }
        out
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledStatement::Construct { class, arguments } => {
                write!(f, "instance = new {class}(")?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            CompiledStatement::Invoke {
                factory,
                method,
                arguments,
            } => {
                write!(f, "instance = @{factory}.{method}(")?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            CompiledStatement::SetProperty { property, value } => {
                write!(f, "instance.{property} = {value}")
            }
            CompiledStatement::CallMethod { method, arguments } => {
                write!(f, "instance.{method}(")?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_statements_when_displayed_then_reads_as_pseudo_code() {
        let construct = CompiledStatement::Construct {
            class: "Mailer".into(),
            arguments: vec![Expr::Service("logger".into()), Expr::from(Literal::Int(3))],
        };
        let call = CompiledStatement::CallMethod {
            method: "setCache".into(),
            arguments: vec![Expr::List(vec![Expr::Service("a".into()), Expr::null()])],
        };

        assert_eq!(construct.to_string(), "instance = new Mailer(@logger, 3)");
        assert_eq!(call.to_string(), "instance.setCache([@a, null])");
    }

    #[test]
    fn given_invoke_when_listing_references_then_includes_factory_first() {
        let invoke = CompiledStatement::Invoke {
            factory: "factory".into(),
            method: "create".into(),
            arguments: vec![Expr::List(vec![Expr::Service("x".into())])],
        };

        assert_eq!(invoke.references(), ["factory", "x"]);
    }
}
