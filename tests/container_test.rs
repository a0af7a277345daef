//! Resolution scenarios run against both execution modes.

use std::any::Any;
use std::sync::Arc;

use rstest::rstest;

use autowire::application::{ApplicationError, Container, ContainerBuilder, ExecutionMode};
use autowire::domain::{
    same_instance, Argument, ClassMetadata, DomainError, HookResult, Injectable, Instance,
    MethodMeta, Object, Parameter, PropertyMeta, ServiceDefinition, Value,
};
use autowire::util::testing;

fn get(builder: ContainerBuilder, mode: ExecutionMode, id: &str) -> Result<Instance, ApplicationError> {
    builder.mode(mode).build()?.get(id)
}

fn object(instance: &Instance) -> &Object {
    instance
        .downcast_ref::<Object>()
        .expect("generic object")
}

fn argument(instance: &Instance, index: usize) -> Value {
    object(instance)
        .argument(index)
        .cloned()
        .expect("argument present")
}

#[derive(Debug)]
struct ConnectionFactory {
    dsn: String,
}

impl Injectable for ConnectionFactory {
    fn class_name(&self) -> &str {
        "ConnectionFactory"
    }

    fn set_property(&mut self, name: &str, _value: Value) -> HookResult<()> {
        Err(format!("unknown property {name}").into())
    }

    fn call_method(&mut self, name: &str, _arguments: Vec<Value>) -> HookResult<()> {
        Err(format!("unknown method {name}").into())
    }

    fn invoke(&self, method: &str, _arguments: Vec<Value>) -> HookResult<Value> {
        match method {
            "create" => {
                let connection: Instance = Arc::new(Object::new(
                    "Connection",
                    vec![Value::Str(self.dsn.clone())],
                ));
                Ok(Value::Service(connection))
            }
            other => Err(format!("unknown factory method {other}").into()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn build_connection_factory(arguments: Vec<Value>) -> HookResult<Box<dyn Injectable>> {
    let dsn = arguments
        .first()
        .and_then(Value::as_str)
        .ok_or("dsn must be a string")?;
    Ok(Box::new(ConnectionFactory {
        dsn: dsn.to_string(),
    }))
}

fn failing_constructor(_arguments: Vec<Value>) -> HookResult<Box<dyn Injectable>> {
    Err("disk full".into())
}

// ============================================================
// Cycle detection
// ============================================================

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_constructor_cycle_when_resolving_then_circular_reference_with_path(
    #[case] mode: ExecutionMode,
) {
    testing::init_test_setup();
    // Arrange
    let builder = Container::builder()
        .class(ClassMetadata::new("A").parameter(Parameter::new("b").typed("B")))
        .class(ClassMetadata::new("B").parameter(Parameter::new("a").typed("A")))
        .service(ServiceDefinition::autowired("A"))
        .service(ServiceDefinition::autowired("B"));

    // Act
    let err = get(builder, mode, "A").unwrap_err();

    // Assert
    assert_eq!(
        err.circular_path(),
        Some(&["A".to_string(), "B".into(), "A".into()][..])
    );
}

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_setter_cycle_when_resolving_then_circular_reference(#[case] mode: ExecutionMode) {
    let builder = Container::builder()
        .class(ClassMetadata::new("A").property(PropertyMeta::new("b").typed("B").inject()))
        .class(ClassMetadata::new("B").property(PropertyMeta::new("a").typed("A").inject()))
        .service(ServiceDefinition::autowired("A"))
        .service(ServiceDefinition::autowired("B"));

    let err = get(builder, mode, "A").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CircularReference { .. })
    ));
}

#[test]
fn given_failed_resolution_when_resolving_again_then_state_is_clean() {
    // Arrange
    let container = Container::builder()
        .class(ClassMetadata::new("A").parameter(Parameter::new("b").typed("B")))
        .class(ClassMetadata::new("B").parameter(Parameter::new("a").typed("A")))
        .service(ServiceDefinition::autowired("A"))
        .service(ServiceDefinition::autowired("B"))
        .service(ServiceDefinition::autowired("Logger"))
        .build()
        .unwrap();

    // Act
    let first = container.get("A").unwrap_err();
    let logger = container.get("Logger");
    let second = container.get("B").unwrap_err();

    // Assert
    assert_eq!(first.to_string(), "circular reference detected: A -> B -> A");
    assert!(logger.is_ok());
    assert_eq!(second.to_string(), "circular reference detected: B -> A -> B");
}

// ============================================================
// Sharing
// ============================================================

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_shared_dependency_when_resolving_then_injected_instance_is_the_singleton(
    #[case] mode: ExecutionMode,
) {
    // Arrange
    let container = Container::builder()
        .mode(mode)
        .class(ClassMetadata::new("Service").parameter(Parameter::new("logger").typed("Logger")))
        .service(ServiceDefinition::autowired("Logger"))
        .service(ServiceDefinition::autowired("Service"))
        .build()
        .unwrap();

    // Act
    let service = container.get("Service").unwrap();
    let logger = container.get("Logger").unwrap();

    // Assert
    assert_eq!(argument(&service, 0), Value::Service(logger));
    assert!(same_instance(&service, &container.get("Service").unwrap()));
}

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_transient_service_when_resolving_twice_then_distinct_instances(
    #[case] mode: ExecutionMode,
) {
    let container = Container::builder()
        .mode(mode)
        .service(ServiceDefinition::class("request", "Request").transient())
        .build()
        .unwrap();

    let first = container.get("request").unwrap();
    let second = container.get("request").unwrap();

    assert!(!same_instance(&first, &second));
}

// ============================================================
// Type-based lookup
// ============================================================

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_two_cache_aliases_when_resolving_by_type_then_ambiguous_names_both(
    #[case] mode: ExecutionMode,
) {
    let builder = Container::builder()
        .service(ServiceDefinition::class("cache.redis", "RedisCache").provides("Cache"))
        .service(ServiceDefinition::class("cache.file", "FileCache").provides("Cache"));

    let err = get(builder, mode, "Cache").unwrap_err();

    match err {
        ApplicationError::AmbiguousReference {
            requested,
            candidates,
        } => {
            assert_eq!(requested, "Cache");
            assert_eq!(candidates, ["cache.file", "cache.redis"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn given_interface_implemented_once_when_resolving_by_type_then_returns_service() {
    let container = Container::builder()
        .class(ClassMetadata::new("FileLogger").implements("LoggerInterface"))
        .service(ServiceDefinition::class("logger", "FileLogger"))
        .build()
        .unwrap();

    let by_type = container.get("LoggerInterface").unwrap();
    let by_id = container.get("logger").unwrap();

    assert!(same_instance(&by_type, &by_id));
}

#[test]
fn given_nullable_request_when_nothing_matches_then_none() {
    let container = Container::builder().build().unwrap();

    assert!(container.resolve("?Router").unwrap().is_none());
    assert!(matches!(
        container.resolve("Router"),
        Err(ApplicationError::ServiceNotFound { .. })
    ));
    assert!(matches!(
        container.resolve("??Router"),
        Err(ApplicationError::Domain(DomainError::InvalidTypeHint(_)))
    ));
}

#[test]
fn given_typo_when_getting_then_error_suggests_identifier() {
    let container = Container::builder()
        .service(ServiceDefinition::class("mailer", "Mailer"))
        .build()
        .unwrap();

    let err = container.get("mailr").unwrap_err();

    assert_eq!(
        err.to_string(),
        "service not found: mailr (did you mean \"mailer\"?)"
    );
}

#[test]
fn given_new_alias_registered_when_resolving_by_type_then_index_is_rebuilt() {
    // Arrange
    let mut container = Container::builder()
        .service(ServiceDefinition::class("cache.redis", "RedisCache").provides("Cache"))
        .build()
        .unwrap();
    assert!(container.get("Cache").is_ok());

    // Act
    container
        .register(ServiceDefinition::class("cache.file", "FileCache").provides("Cache"))
        .unwrap();

    // Assert
    assert!(matches!(
        container.get("Cache"),
        Err(ApplicationError::AmbiguousReference { .. })
    ));
}

#[test]
fn given_alias_identifier_when_resolving_then_same_service_as_get() {
    let container = Container::builder()
        .service(ServiceDefinition::class("cache.redis", "RedisCache").provides("Cache"))
        .service(ServiceDefinition::class("Cache $sessions", "FileCache"))
        .build()
        .unwrap();

    let resolved = container.resolve("Cache $sessions").unwrap().expect("service");
    let nullable = container.resolve("?Cache $sessions").unwrap().expect("service");

    assert_eq!(resolved.class_name(), "FileCache");
    assert!(same_instance(&resolved, &container.get("Cache $sessions").unwrap()));
    assert!(same_instance(&resolved, &nullable));
}

#[test]
fn given_resolved_service_when_redefined_then_next_get_builds_new_definition() {
    // Arrange
    let mut container = Container::builder()
        .service(ServiceDefinition::class("cache", "FileCache"))
        .build()
        .unwrap();
    let before = container.get("cache").unwrap();

    // Act
    let replaced = container
        .register(ServiceDefinition::class("cache", "RedisCache"))
        .unwrap();
    let after = container.get("cache").unwrap();

    // Assert
    assert_eq!(
        replaced.as_ref().and_then(ServiceDefinition::class_name),
        Some("FileCache")
    );
    assert_eq!(before.class_name(), "FileCache");
    assert_eq!(after.class_name(), "RedisCache");
    assert!(!same_instance(&before, &after));
    assert!(same_instance(&after, &container.get("cache").unwrap()));
}

#[test]
fn given_compiled_container_when_registering_then_mode_mismatch() {
    let mut container = Container::builder()
        .mode(ExecutionMode::Compiled)
        .build()
        .unwrap();

    let err = container
        .register(ServiceDefinition::autowired("Logger"))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::ModeMismatch { .. }));
}

// ============================================================
// Parameter autowiring
// ============================================================

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_nullable_parameter_without_match_when_resolving_then_null(#[case] mode: ExecutionMode) {
    let builder = Container::builder()
        .class(ClassMetadata::new("Mailer").parameter(Parameter::new("logger").typed("?Logger")))
        .service(ServiceDefinition::class("mailer", "Mailer"));

    let mailer = get(builder, mode, "mailer").unwrap();

    assert_eq!(argument(&mailer, 0), Value::Null);
}

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_required_parameter_without_match_when_resolving_then_unresolvable(
    #[case] mode: ExecutionMode,
) {
    let builder = Container::builder()
        .class(ClassMetadata::new("Mailer").parameter(Parameter::new("logger").typed("Logger")))
        .service(ServiceDefinition::class("mailer", "Mailer"));

    let err = get(builder, mode, "mailer").unwrap_err();

    match err {
        ApplicationError::UnresolvableArgument {
            service,
            parameter,
            type_hint,
        } => {
            assert_eq!(service, "mailer");
            assert_eq!(parameter, "logger");
            assert_eq!(type_hint.as_deref(), Some("Logger"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_service_named_like_parameter_when_resolving_then_identifier_match_wins(
    #[case] mode: ExecutionMode,
) {
    // Arrange
    let container = Container::builder()
        .mode(mode)
        .class(ClassMetadata::new("FileLogger").implements("LoggerInterface"))
        .class(ClassMetadata::new("NullLogger").implements("LoggerInterface"))
        .class(
            ClassMetadata::new("Mailer")
                .parameter(Parameter::new("logger").typed("LoggerInterface"))
                .parameter(Parameter::new("transport")),
        )
        .service(ServiceDefinition::class("logger", "FileLogger"))
        .service(ServiceDefinition::class("null", "NullLogger"))
        .service(ServiceDefinition::class("transport", "SmtpTransport"))
        .service(ServiceDefinition::class("mailer", "Mailer"))
        .build()
        .unwrap();

    // Act
    let mailer = container.get("mailer").unwrap();

    // Assert
    assert_eq!(
        argument(&mailer, 0),
        Value::Service(container.get("logger").unwrap())
    );
    assert_eq!(
        argument(&mailer, 1),
        Value::Service(container.get("transport").unwrap())
    );
}

#[test]
fn given_default_and_explicit_arguments_when_resolving_then_both_applied() {
    let container = Container::builder()
        .class(
            ClassMetadata::new("Mailer")
                .parameter(Parameter::new("host").typed("string"))
                .parameter(Parameter::new("port").typed("int").with_default(25i64))
                .parameter(Parameter::new("logger").typed("Logger")),
        )
        .service(ServiceDefinition::class("app.logger", "Logger"))
        .service(
            ServiceDefinition::class("mailer", "Mailer")
                .argument(Argument::value("smtp.example.com")),
        )
        .build()
        .unwrap();

    let mailer = container.get("mailer").unwrap();

    assert_eq!(argument(&mailer, 0), Value::Str("smtp.example.com".into()));
    assert_eq!(argument(&mailer, 1), Value::Int(25));
    assert_eq!(
        argument(&mailer, 2),
        Value::Service(container.get("app.logger").unwrap())
    );
}

#[test]
fn given_tagged_argument_when_resolving_then_list_in_registration_order() {
    let container = Container::builder()
        .class(ClassMetadata::new("Chain").parameter(Parameter::new("handlers").typed("array")))
        .service(ServiceDefinition::class("handler.b", "AuditHandler").provides("Handler"))
        .service(ServiceDefinition::class("handler.a", "MailHandler").provides("Handler"))
        .service(ServiceDefinition::class("chain", "Chain").argument(Argument::tagged("Handler")))
        .build()
        .unwrap();

    let chain = container.get("chain").unwrap();

    assert_eq!(
        argument(&chain, 0),
        Value::List(vec![
            Value::Service(container.get("handler.b").unwrap()),
            Value::Service(container.get("handler.a").unwrap()),
        ])
    );
}

// ============================================================
// Injection markers
// ============================================================

fn mailer_with_injection_points() -> ContainerBuilder {
    Container::builder()
        .class(
            ClassMetadata::new("Mailer")
                .method(
                    MethodMeta::new("setCache")
                        .parameter(Parameter::new("cache").typed("Cache"))
                        .inject(),
                )
                .property(PropertyMeta::new("logger").typed("Logger").inject()),
        )
        .service(ServiceDefinition::autowired("Logger"))
        .service(ServiceDefinition::autowired("Cache"))
        .service(ServiceDefinition::class("mailer", "Mailer"))
}

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_property_and_method_markers_when_resolving_then_side_effects_in_plan_order(
    #[case] mode: ExecutionMode,
) {
    let container = mailer_with_injection_points().mode(mode).build().unwrap();

    let mailer = container.get("mailer").unwrap();

    let object = object(&mailer);
    assert_eq!(
        object.journal(),
        ["construct", "property:logger", "call:setCache"]
    );
    assert_eq!(
        object.property("logger"),
        Some(&Value::Service(container.get("Logger").unwrap()))
    );
    assert_eq!(
        object.calls()[0].arguments,
        [Value::Service(container.get("Cache").unwrap())]
    );
}

#[test]
fn given_injection_points_when_compiling_then_statements_match_interpreted_order() {
    let container = mailer_with_injection_points().build().unwrap();

    let statements = container.statements("mailer").unwrap();
    let compiled = container.compile().unwrap();

    let rendered: Vec<String> = statements.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        [
            "instance = new Mailer()",
            "instance.logger = @Logger",
            "instance.setCache(@Cache)"
        ]
    );
    assert_eq!(
        compiled.service("mailer").map(|s| s.statements.clone()),
        Some(statements)
    );
}

#[rstest]
#[case(PropertyMeta::new("logger").typed("Logger").inject().inject())]
#[case(PropertyMeta::new("logger").typed("Logger").inject().inject_value(Argument::service("Logger")))]
#[case(
    PropertyMeta::new("logger")
        .inject_value(Argument::value("a"))
        .inject_value(Argument::value("b"))
)]
fn given_property_with_two_markers_when_resolving_then_duplicate_marker_error(
    #[case] property: PropertyMeta,
) {
    let container = Container::builder()
        .class(ClassMetadata::new("Mailer").property(property))
        .service(ServiceDefinition::autowired("Logger"))
        .service(ServiceDefinition::class("mailer", "Mailer"))
        .build()
        .unwrap();

    let err = container.get("mailer").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DuplicateInjectionMarker { .. })
    ));
}

#[test]
fn given_method_marker_with_arguments_when_building_compiled_then_fails_at_build() {
    let err = Container::builder()
        .mode(ExecutionMode::Compiled)
        .class(
            ClassMetadata::new("Mailer")
                .method(MethodMeta::new("setPort").inject_with(vec![Argument::value(25i64)])),
        )
        .service(ServiceDefinition::class("mailer", "Mailer"))
        .build()
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "injection marker on Mailer::setPort() cannot declare arguments; parameters are autowired"
    );
}

#[test]
fn given_property_marker_without_match_when_resolving_then_property_untouched() {
    let container = Container::builder()
        .class(ClassMetadata::new("Mailer").property(PropertyMeta::new("router").typed("Router").inject()))
        .service(ServiceDefinition::class("mailer", "Mailer"))
        .build()
        .unwrap();

    let mailer = container.get("mailer").unwrap();

    assert_eq!(object(&mailer).journal(), ["construct"]);
    assert_eq!(object(&mailer).property("router"), None);
}

// ============================================================
// Factories and hooks
// ============================================================

fn connection_factory() -> ContainerBuilder {
    Container::builder()
        .class(
            ClassMetadata::new("ConnectionFactory")
                .parameter(Parameter::new("dsn").typed("string"))
                .method(MethodMeta::new("create").returns("Connection"))
                .constructor(build_connection_factory),
        )
        .service(
            ServiceDefinition::class("db.factory", "ConnectionFactory")
                .argument(Argument::value("sqlite::memory:")),
        )
        .service(ServiceDefinition::factory("db", "db.factory", "create"))
}

#[rstest]
#[case(ExecutionMode::Interpreted)]
#[case(ExecutionMode::Compiled)]
fn given_factory_service_when_resolving_then_factory_method_builds_it(
    #[case] mode: ExecutionMode,
) {
    let container = connection_factory().mode(mode).build().unwrap();

    let db = container.get("db").unwrap();

    assert_eq!(db.class_name(), "Connection");
    assert_eq!(argument(&db, 0), Value::Str("sqlite::memory:".into()));
    assert!(same_instance(&db, &container.get("Connection").unwrap()));
    assert_eq!(
        container.provided_services().get("db").map(ToString::to_string),
        Some("Connection".to_string())
    );
}

#[test]
fn given_failing_constructor_when_resolving_then_instantiation_error_keeps_source() {
    let container = Container::builder()
        .class(ClassMetadata::new("Disk").constructor(failing_constructor))
        .service(ServiceDefinition::class("disk", "Disk"))
        .build()
        .unwrap();

    let err = container.get("disk").unwrap_err();

    assert_eq!(err.to_string(), "cannot instantiate disk: construct Disk");
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("disk full"));
}
