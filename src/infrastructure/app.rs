//! Wiring of the command-line application
//!
//! Holds settings and I/O implementations so commands can be tested with
//! substitutes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::infrastructure::dump::DumpStore;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

pub struct AppContext {
    /// Effective settings
    pub settings: Arc<Settings>,

    /// Project directory used to resolve relative paths
    pub project_dir: PathBuf,

    /// Compiled container dumps
    pub dumps: DumpStore,
}

impl AppContext {
    /// Create a context with real implementations.
    pub fn new(settings: Settings, project_dir: PathBuf) -> Self {
        Self::with_deps(settings, project_dir, Arc::new(RealFileSystem))
    }

    /// Create a context with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, project_dir: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            project_dir,
            dumps: DumpStore::new(fs),
        }
    }

    /// `file`, or the configured dump path when none is given.
    pub fn dump_path(&self, file: Option<&Path>) -> PathBuf {
        match file {
            Some(file) => file.to_path_buf(),
            None => self.settings.dump_path_in(&self.project_dir),
        }
    }
}
