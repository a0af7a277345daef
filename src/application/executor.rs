//! Statement execution: runs compiled statements against live objects
//!
//! Used by the interpreter (statements straight from the emitter) and by the
//! compiled container (statements loaded from a dump). Service references are
//! fetched through a callback so each caller controls caching and cycle
//! tracking.

use std::sync::Arc;

use tracing::trace;

use crate::application::error_ext::HookResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ClassRegistry, CompiledStatement, Expr, HookError, Injectable, Instance, Value};

/// Callback fetching a dependency by identifier.
pub type Fetch<'f> = dyn FnMut(&str) -> ApplicationResult<Instance> + 'f;

#[derive(Debug, Clone, Copy)]
pub struct StatementExecutor<'a> {
    classes: &'a ClassRegistry,
}

impl<'a> StatementExecutor<'a> {
    pub fn new(classes: &'a ClassRegistry) -> Self {
        Self { classes }
    }

    /// Execute the statements of `service` and return the finished instance.
    pub fn execute(
        &self,
        service: &str,
        statements: &[CompiledStatement],
        fetch: &mut Fetch<'_>,
    ) -> ApplicationResult<Instance> {
        let Some((first, rest)) = statements.split_first() else {
            return Err(instantiation(service, "build", "no statements"));
        };

        let mut instance = match first {
            CompiledStatement::Construct { class, arguments } => {
                let arguments = evaluate_all(arguments, fetch)?;
                let object = self
                    .classes
                    .instantiate(class, arguments)
                    .with_service_context(&format!("construct {class}"), service)?;
                Instance::from(object)
            }
            CompiledStatement::Invoke {
                factory,
                method,
                arguments,
            } => {
                let factory_instance = fetch(factory)?;
                let arguments = evaluate_all(arguments, fetch)?;
                let action = format!("invoke {factory}.{method}()");
                match factory_instance
                    .invoke(method, arguments)
                    .with_service_context(&action, service)?
                {
                    Value::Service(instance) => instance,
                    _ => return Err(instantiation(service, &action, "factory did not return a service")),
                }
            }
            other => {
                return Err(instantiation(
                    service,
                    &other.to_string(),
                    "first statement must create the instance",
                ))
            }
        };

        for statement in rest {
            trace!(service, %statement, "execute");
            match statement {
                CompiledStatement::SetProperty { property, value } => {
                    let value = evaluate(value, fetch)?;
                    let action = format!("set property {property}");
                    exclusive(&mut instance, service, &action)?
                        .set_property(property, value)
                        .with_service_context(&action, service)?;
                }
                CompiledStatement::CallMethod { method, arguments } => {
                    let arguments = evaluate_all(arguments, fetch)?;
                    let action = format!("call {method}()");
                    exclusive(&mut instance, service, &action)?
                        .call_method(method, arguments)
                        .with_service_context(&action, service)?;
                }
                assignment => {
                    return Err(instantiation(
                        service,
                        &assignment.to_string(),
                        "instance is already assigned",
                    ))
                }
            }
        }
        Ok(instance)
    }
}

/// Mutable access to an instance nobody else holds yet.
fn exclusive<'i>(
    instance: &'i mut Instance,
    service: &str,
    action: &str,
) -> ApplicationResult<&'i mut (dyn Injectable + 'static)> {
    Arc::get_mut(instance).ok_or_else(|| instantiation(service, action, "instance is already shared"))
}

fn evaluate(expr: &Expr, fetch: &mut Fetch<'_>) -> ApplicationResult<Value> {
    Ok(match expr {
        Expr::Literal(literal) => Value::from(literal.clone()),
        Expr::Service(id) => Value::Service(fetch(id)?),
        Expr::List(items) => Value::List(evaluate_all(items, fetch)?),
    })
}

fn evaluate_all(exprs: &[Expr], fetch: &mut Fetch<'_>) -> ApplicationResult<Vec<Value>> {
    exprs.iter().map(|expr| evaluate(expr, fetch)).collect()
}

fn instantiation(service: &str, context: &str, reason: &str) -> ApplicationError {
    ApplicationError::Instantiation {
        service: service.to_string(),
        context: context.to_string(),
        source: HookError::from(reason),
    }
}
