//! Infrastructure layer: I/O implementations and application wiring
//!
//! This layer implements I/O boundary traits and persists compiled containers.

pub mod app;
pub mod dump;
pub mod error;
pub mod traits;

pub use app::AppContext;
pub use dump::DumpStore;
pub use error::{InfraError, InfraResult};
pub use traits::{FileSystem, RealFileSystem};
