//! Reference resolution and parameter autowiring
//!
//! The resolver turns declared arguments and parameter signatures into
//! expressions. It never instantiates anything: service references stay
//! symbolic until a backend realises them.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::application::index::TypeIndex;
use crate::application::registry::ServiceRegistry;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Argument, Expr, Parameter, TypeHint};

/// Maps identifiers and type names to registered services.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a ServiceRegistry,
    index: &'a TypeIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ServiceRegistry, index: &'a TypeIndex) -> Self {
        Self { registry, index }
    }

    /// Identifier serving `name`: an exact identifier first, then a type match.
    pub fn lookup(&self, name: &str) -> ApplicationResult<Option<String>> {
        if self.registry.contains(name) {
            return Ok(Some(name.to_string()));
        }
        self.find_by_type(name)
    }

    /// The single service satisfying `type_name`.
    ///
    /// No candidate is not an error here; the caller decides whether an empty
    /// result is fatal.
    pub fn find_by_type(&self, type_name: &str) -> ApplicationResult<Option<String>> {
        match self.index.candidates(type_name) {
            [] => Ok(None),
            [single] => Ok(Some(single.clone())),
            many => {
                let mut candidates = many.to_vec();
                candidates.sort();
                Err(ApplicationError::AmbiguousReference {
                    requested: type_name.to_string(),
                    candidates,
                })
            }
        }
    }

    /// Like [`lookup`](Self::lookup) but a missing service is an error.
    pub fn require(&self, name: &str) -> ApplicationResult<String> {
        self.lookup(name)?
            .ok_or_else(|| ApplicationError::not_found(name, self.registry.alternatives(name)))
    }

    /// Expression for a declared argument.
    pub fn argument(&self, argument: &Argument) -> ApplicationResult<Expr> {
        match argument {
            Argument::Value(literal) => Ok(Expr::Literal(literal.clone())),
            Argument::Service { id, optional: false } => self.require(id).map(Expr::Service),
            Argument::Service { id, optional: true } => Ok(self
                .lookup(id)?
                .map(Expr::Service)
                .unwrap_or_else(Expr::null)),
            Argument::Tagged(type_name) => Ok(Expr::List(
                self.index
                    .candidates(type_name)
                    .iter()
                    .cloned()
                    .map(Expr::Service)
                    .collect(),
            )),
        }
    }

    /// Resolve every parameter of a constructor or method.
    ///
    /// Per parameter, the first that applies wins: positional argument, named
    /// argument, autowire hint, named alias `"Type $name"`, a service whose
    /// identifier is the parameter name, type match, default value, `null`
    /// for nullable parameters. Positional arguments beyond the declared
    /// parameters are passed through.
    #[instrument(level = "trace", skip(self, parameters, positional, named))]
    pub fn autowire_parameters(
        &self,
        service: &str,
        parameters: &[Parameter],
        positional: &[Argument],
        named: &BTreeMap<String, Argument>,
        autowire: bool,
    ) -> ApplicationResult<Vec<Expr>> {
        let mut resolved = Vec::with_capacity(parameters.len().max(positional.len()));

        for (position, parameter) in parameters.iter().enumerate() {
            if let Some(argument) = positional
                .get(position)
                .or_else(|| named.get(&parameter.name))
            {
                resolved.push(self.argument(argument)?);
                continue;
            }

            if autowire {
                if let Some(id) = self.autowire_parameter(parameter)? {
                    debug!(service, parameter = %parameter.name, id = %id, "autowired");
                    resolved.push(Expr::Service(id));
                    continue;
                }
            }

            if let Some(default) = &parameter.default {
                resolved.push(Expr::Literal(default.clone()));
            } else if parameter.is_nullable() {
                resolved.push(Expr::null());
            } else {
                return Err(ApplicationError::UnresolvableArgument {
                    service: service.to_string(),
                    parameter: parameter.name.clone(),
                    type_hint: parameter.type_hint.as_ref().map(TypeHint::to_string),
                });
            }
        }

        for argument in positional.iter().skip(parameters.len()) {
            resolved.push(self.argument(argument)?);
        }
        Ok(resolved)
    }

    fn autowire_parameter(&self, parameter: &Parameter) -> ApplicationResult<Option<String>> {
        if let Some(hint) = &parameter.autowire {
            return self.require(hint).map(Some);
        }
        let type_hint = match &parameter.type_hint {
            Some(hint) if hint.is_builtin() => return Ok(None),
            other => other.as_ref(),
        };

        if let Some(hint) = type_hint {
            let alias = format!("{} ${}", hint.name(), parameter.name);
            if self.registry.contains(&alias) {
                return Ok(Some(alias));
            }
        }
        if self.registry.contains(&parameter.name) {
            return Ok(Some(parameter.name.clone()));
        }
        match type_hint {
            Some(hint) => self.lookup(hint.name()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassMetadata, ClassRegistry, Literal, ServiceDefinition};

    fn fixture(definitions: Vec<ServiceDefinition>) -> (ServiceRegistry, TypeIndex) {
        let mut classes = ClassRegistry::new();
        classes.register(ClassMetadata::new("RedisCache").implements("Cache"));
        classes.register(ClassMetadata::new("FileCache").implements("Cache"));
        let mut registry = ServiceRegistry::new();
        for definition in definitions {
            registry.insert(definition);
        }
        let index = TypeIndex::build(&registry, &classes);
        (registry, index)
    }

    #[test]
    fn given_exact_id_and_type_match_when_looking_up_then_id_wins() {
        let (registry, index) = fixture(vec![
            ServiceDefinition::class("Cache", "FileCache"),
            ServiceDefinition::class("redis", "RedisCache"),
        ]);
        let resolver = Resolver::new(&registry, &index);

        assert_eq!(resolver.lookup("Cache").unwrap(), Some("Cache".into()));
    }

    #[test]
    fn given_two_candidates_when_finding_by_type_then_ambiguous_names_both() {
        let (registry, index) = fixture(vec![
            ServiceDefinition::class("redis", "RedisCache"),
            ServiceDefinition::class("file", "FileCache"),
        ]);
        let resolver = Resolver::new(&registry, &index);

        let err = resolver.find_by_type("Cache").unwrap_err();

        match err {
            ApplicationError::AmbiguousReference { candidates, .. } => {
                assert_eq!(candidates, ["file", "redis"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn given_missing_optional_reference_when_resolving_argument_then_null() {
        let (registry, index) = fixture(vec![]);
        let resolver = Resolver::new(&registry, &index);

        let expr = resolver.argument(&Argument::optional("mailer")).unwrap();

        assert_eq!(expr, Expr::null());
        assert!(matches!(
            resolver.argument(&Argument::service("mailer")),
            Err(ApplicationError::ServiceNotFound { .. })
        ));
    }

    #[test]
    fn given_named_alias_when_autowiring_then_alias_beats_type_match() {
        let (registry, index) = fixture(vec![
            ServiceDefinition::class("redis", "RedisCache"),
            ServiceDefinition::class("Cache $sessions", "FileCache"),
        ]);
        let resolver = Resolver::new(&registry, &index);
        let parameters = [
            Parameter::new("sessions").typed("Cache"),
            Parameter::new("ttl").typed("int").with_default(60i64),
        ];

        let exprs = resolver
            .autowire_parameters("svc", &parameters, &[], &BTreeMap::new(), true)
            .unwrap();

        assert_eq!(
            exprs,
            [
                Expr::Service("Cache $sessions".into()),
                Expr::Literal(Literal::Int(60))
            ]
        );
    }

    #[test]
    fn given_autowiring_disabled_when_required_parameter_unmatched_then_unresolvable() {
        let (registry, index) = fixture(vec![ServiceDefinition::class("redis", "RedisCache")]);
        let resolver = Resolver::new(&registry, &index);
        let parameters = [Parameter::new("cache").typed("Cache")];

        let err = resolver
            .autowire_parameters("svc", &parameters, &[], &BTreeMap::new(), false)
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot resolve argument $cache of svc (type Cache)"
        );
    }

    #[test]
    fn given_named_and_extra_positional_arguments_when_autowiring_then_both_used() {
        let (registry, index) = fixture(vec![]);
        let resolver = Resolver::new(&registry, &index);
        let parameters = [Parameter::new("dsn").typed("string")];
        let named = BTreeMap::from([("dsn".to_string(), Argument::value("sqlite::memory:"))]);

        let exprs = resolver
            .autowire_parameters("db", &parameters, &[], &named, true)
            .unwrap();
        assert_eq!(exprs, [Expr::Literal(Literal::from("sqlite::memory:"))]);

        let exprs = resolver
            .autowire_parameters(
                "db",
                &parameters,
                &[Argument::value("a"), Argument::value(true)],
                &named,
                true,
            )
            .unwrap();
        assert_eq!(
            exprs,
            [
                Expr::Literal(Literal::from("a")),
                Expr::Literal(Literal::Bool(true))
            ]
        );
    }

    #[test]
    fn given_service_named_like_parameter_when_autowiring_then_identifier_beats_type() {
        let (registry, index) = fixture(vec![
            ServiceDefinition::class("redis", "RedisCache"),
            ServiceDefinition::class("cache", "FileCache"),
        ]);
        let resolver = Resolver::new(&registry, &index);
        let parameters = [
            Parameter::new("cache").typed("Cache"),
            Parameter::new("redis"),
            Parameter::new("ttl"),
        ];

        let err = resolver
            .autowire_parameters("svc", &parameters, &[], &BTreeMap::new(), true)
            .unwrap_err();

        assert_eq!(err.to_string(), "cannot resolve argument $ttl of svc");
        let exprs = resolver
            .autowire_parameters("svc", &parameters[..2], &[], &BTreeMap::new(), true)
            .unwrap();
        assert_eq!(
            exprs,
            [Expr::Service("cache".into()), Expr::Service("redis".into())]
        );
    }

    #[test]
    fn given_builtin_parameter_named_like_service_when_autowiring_then_not_injected() {
        let (registry, index) = fixture(vec![ServiceDefinition::class("host", "FileCache")]);
        let resolver = Resolver::new(&registry, &index);
        let parameters = [Parameter::new("host").typed("string").with_default("localhost")];

        let exprs = resolver
            .autowire_parameters("svc", &parameters, &[], &BTreeMap::new(), true)
            .unwrap();

        assert_eq!(exprs, [Expr::Literal(Literal::from("localhost"))]);
    }
}
