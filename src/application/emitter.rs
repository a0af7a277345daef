//! Compiler emitter: resolved plan → compiled statements

use crate::application::planner::InjectionOperation;
use crate::domain::{CompiledStatement, Expr, Recipe, ServiceDefinition};

/// Translates a resolved definition into statements without executing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompilerEmitter;

impl CompilerEmitter {
    /// Assignment first, then the injection operations in plan order.
    pub fn emit(
        definition: &ServiceDefinition,
        arguments: Vec<Expr>,
        operations: Vec<InjectionOperation>,
    ) -> Vec<CompiledStatement> {
        let mut statements = Vec::with_capacity(operations.len() + 1);

        statements.push(match &definition.recipe {
            Recipe::Class { class } => CompiledStatement::Construct {
                class: class.clone(),
                arguments,
            },
            Recipe::Factory { service, method } => CompiledStatement::Invoke {
                factory: service.clone(),
                method: method.clone(),
                arguments,
            },
        });

        statements.extend(operations.into_iter().map(|operation| match operation {
            InjectionOperation::SetProperty { name, value } => CompiledStatement::SetProperty {
                property: name,
                value,
            },
            InjectionOperation::CallMethod { name, arguments } => CompiledStatement::CallMethod {
                method: name,
                arguments,
            },
        }));
        statements
    }
}
