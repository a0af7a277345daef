//! Application layer: resolution engine and execution backends
//!
//! This layer builds on the domain model; it performs no I/O.

pub mod backend;
pub mod compiled;
pub mod container;
pub mod emitter;
pub mod error;
pub mod error_ext;
pub mod executor;
pub mod index;
pub mod locator;
pub mod planner;
pub mod registry;
pub mod resolver;

pub use backend::{Backend, Compiler, ExecutionMode, Interpreter};
pub use compiled::{CompiledContainer, CompiledService};
pub use container::{Container, ContainerBuilder};
pub use emitter::CompilerEmitter;
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::HookResultExt;
pub use executor::StatementExecutor;
pub use index::TypeIndex;
pub use locator::{LocatorFactory, ServiceLocator};
pub use planner::{InjectionOperation, InjectionPlanner};
pub use registry::ServiceRegistry;
pub use resolver::Resolver;
