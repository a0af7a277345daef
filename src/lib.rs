//! Autowiring dependency-injection container
//!
//! Services are declared as [`ServiceDefinition`](domain::ServiceDefinition)s
//! over a table of [`ClassMetadata`](domain::ClassMetadata). A
//! [`Container`](application::Container) resolves them either by executing
//! the emitted statements directly (interpreted mode) or by compiling every
//! service up front into a [`CompiledContainer`](application::CompiledContainer)
//! that can be dumped and loaded again.
//!
//! ```
//! use autowire::application::Container;
//! use autowire::domain::{ClassMetadata, Parameter, ServiceDefinition};
//!
//! let container = Container::builder()
//!     .class(ClassMetadata::new("Mailer").parameter(Parameter::new("logger").typed("Logger")))
//!     .service(ServiceDefinition::autowired("Logger"))
//!     .service(ServiceDefinition::class("mailer", "Mailer"))
//!     .build()
//!     .unwrap();
//!
//! let mailer = container.get("mailer").unwrap();
//! assert_eq!(mailer.class_name(), "Mailer");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
