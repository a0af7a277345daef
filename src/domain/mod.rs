//! Domain layer: service graph model and cycle tracking
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod context;
pub mod definition;
pub mod error;
pub mod metadata;
pub mod statement;
pub mod value;

pub use context::{LoadingGuard, ResolutionContext};
pub use definition::{Argument, Injection, Lifecycle, Recipe, ServiceDefinition};
pub use error::{DomainError, DomainResult};
pub use metadata::{
    ClassMetadata, ClassRegistry, InjectMarker, MethodMeta, Parameter, PropertyMeta, TypeDescriptor,
    TypeHint,
};
pub use statement::{CompiledStatement, Expr};
pub use value::{
    same_instance, HookError, HookResult, Injectable, Instance, Literal, MethodCall, Object, Value,
};
