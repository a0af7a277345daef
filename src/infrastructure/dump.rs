//! Compiled container dumps: TOML files holding recorded statements
//!
//! Loading verifies the fingerprint, so a hand-edited dump is rejected
//! instead of silently serving different services.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::CompiledContainer;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::FileSystem;

/// Reads and writes compiled container dumps.
pub struct DumpStore {
    fs: Arc<dyn FileSystem>,
}

impl DumpStore {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Write `container` to `path`, creating parent directories.
    #[instrument(level = "debug", skip(self, container))]
    pub fn write(&self, path: &Path, container: &CompiledContainer) -> InfraResult<()> {
        let content = render(container)?;
        self.fs
            .ensure_parent(path)
            .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
        self.fs
            .write(path, &content)
            .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
        info!(
            path = %path.display(),
            services = container.services().len(),
            fingerprint = container.fingerprint(),
            "dumped compiled container"
        );
        Ok(())
    }

    /// Read a dump and verify its fingerprint.
    #[instrument(level = "debug", skip(self))]
    pub fn read(&self, path: &Path) -> InfraResult<CompiledContainer> {
        let container = self.read_unverified(path)?;
        container.verify_fingerprint()?;
        Ok(container)
    }

    /// Read a dump without checking its fingerprint.
    pub fn read_unverified(&self, path: &Path) -> InfraResult<CompiledContainer> {
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
        let container = parse(&content)
            .map_err(|e| InfraError::serialize(format!("parse {}", path.display()), e))?;
        debug!(services = container.services().len(), "loaded compiled container");
        Ok(container)
    }
}

/// Render a compiled container as TOML.
pub fn render(container: &CompiledContainer) -> InfraResult<String> {
    toml::to_string_pretty(container)
        .map_err(|e| InfraError::serialize("serialize compiled container", e))
}

/// Parse a compiled container from TOML.
pub fn parse(content: &str) -> Result<CompiledContainer, toml::de::Error> {
    toml::from_str(content)
}
