//! Injection planning: property and method injection points of a class
//!
//! Markers are validated for the whole class before anything is resolved, so a
//! misconfigured class fails before any instance exists.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::application::resolver::Resolver;
use crate::application::ApplicationResult;
use crate::domain::{
    ClassMetadata, DomainError, Expr, InjectMarker, Injection, ServiceDefinition,
};

/// One post-construction step.
#[derive(Debug, Clone, PartialEq)]
pub enum InjectionOperation {
    SetProperty { name: String, value: Expr },
    CallMethod { name: String, arguments: Vec<Expr> },
}

impl InjectionOperation {
    fn is_property(&self) -> bool {
        matches!(self, InjectionOperation::SetProperty { .. })
    }
}

/// Builds ordered injection plans from class metadata and definitions.
#[derive(Debug, Clone, Copy)]
pub struct InjectionPlanner<'a> {
    resolver: Resolver<'a>,
}

impl<'a> InjectionPlanner<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self { resolver }
    }

    /// Operations derived from the injection markers of `class`.
    ///
    /// Properties come before methods, each group in declaration order. A
    /// class without markers yields an empty plan.
    #[instrument(level = "debug", skip(self, class), fields(class = class.name()))]
    pub fn plan(&self, service: &str, class: &ClassMetadata) -> ApplicationResult<Vec<InjectionOperation>> {
        validate(class)?;

        let mut operations = Vec::new();
        for property in class.properties() {
            let Some(marker) = property.markers.first() else {
                continue;
            };
            let value = match &marker.value {
                Some(argument) => Some(self.resolver.argument(argument)?),
                None => match &property.type_hint {
                    Some(hint) if !hint.is_builtin() => {
                        self.resolver.lookup(hint.name())?.map(Expr::Service)
                    }
                    _ => None,
                },
            };
            match value {
                Some(value) => operations.push(InjectionOperation::SetProperty {
                    name: property.name.clone(),
                    value,
                }),
                None => debug!(service, property = %property.name, "no match, left untouched"),
            }
        }

        for method in class.methods() {
            if method.markers.is_empty() {
                continue;
            }
            let arguments = self.resolver.autowire_parameters(
                service,
                &method.parameters,
                &[],
                &BTreeMap::new(),
                true,
            )?;
            operations.push(InjectionOperation::CallMethod {
                name: method.name.clone(),
                arguments,
            });
        }
        Ok(operations)
    }

    /// Full plan for a definition: explicit injections merged with the
    /// markers of its target class.
    ///
    /// Property sets precede method calls; within each group explicit
    /// operations come first.
    pub fn plan_definition(
        &self,
        definition: &ServiceDefinition,
        class: Option<&ClassMetadata>,
        autowire: bool,
    ) -> ApplicationResult<Vec<InjectionOperation>> {
        let markers = match class {
            Some(class) => self.plan(&definition.id, class)?,
            None => Vec::new(),
        };

        let mut explicit = Vec::with_capacity(definition.injections.len());
        for injection in &definition.injections {
            explicit.push(match injection {
                Injection::Property { name, value } => InjectionOperation::SetProperty {
                    name: name.clone(),
                    value: self.resolver.argument(value)?,
                },
                Injection::Call { method, arguments } => {
                    let parameters = class
                        .and_then(|class| class.find_method(method))
                        .map(|meta| meta.parameters.as_slice())
                        .unwrap_or_default();
                    InjectionOperation::CallMethod {
                        name: method.clone(),
                        arguments: self.resolver.autowire_parameters(
                            &definition.id,
                            parameters,
                            arguments,
                            &BTreeMap::new(),
                            autowire,
                        )?,
                    }
                }
            });
        }

        let (explicit_properties, explicit_calls): (Vec<_>, Vec<_>) =
            explicit.into_iter().partition(InjectionOperation::is_property);
        let (marker_properties, marker_calls): (Vec<_>, Vec<_>) =
            markers.into_iter().partition(InjectionOperation::is_property);

        Ok(explicit_properties
            .into_iter()
            .chain(marker_properties)
            .chain(explicit_calls)
            .chain(marker_calls)
            .collect())
    }
}

/// Reject duplicate markers and method markers carrying arguments.
fn validate(class: &ClassMetadata) -> ApplicationResult<()> {
    for property in class.properties() {
        check_duplicates(class, &property.name, &property.markers)?;
    }
    for method in class.methods() {
        check_duplicates(class, &method.name, &method.markers)?;
        if method.markers.iter().any(|m| !m.arguments.is_empty()) {
            return Err(DomainError::InjectionArgumentsNotSupported {
                class: class.name().to_string(),
                method: method.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn check_duplicates(class: &ClassMetadata, member: &str, markers: &[InjectMarker]) -> ApplicationResult<()> {
    if markers.len() > 1 {
        return Err(DomainError::DuplicateInjectionMarker {
            class: class.name().to_string(),
            member: member.to_string(),
        }
        .into());
    }
    Ok(())
}
