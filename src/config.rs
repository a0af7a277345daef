//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/autowire/autowire.toml`
//! 3. Project config: `<project_dir>/.autowire.toml`
//! 4. Environment variables: `AUTOWIRE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ExecutionMode};

/// Default location of the compiled container dump, relative to the project.
pub const DEFAULT_DUMP_PATH: &str = "var/cache/container.toml";

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub mode: Option<ExecutionMode>,
    pub autowire: Option<bool>,
    pub dump_path: Option<PathBuf>,
}

/// Unified configuration for autowire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Execution mode chosen when a container is built
    pub mode: ExecutionMode,
    /// Default autowiring switch for definitions without their own
    pub autowire: bool,
    /// Where compiled containers are dumped (relative paths are resolved
    /// against the project directory)
    pub dump_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Interpreted,
            autowire: true,
            dump_path: PathBuf::from(DEFAULT_DUMP_PATH),
        }
    }
}

/// Get the XDG config directory for autowire.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "autowire").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("autowire.toml"))
}

/// Get the path to the project config file.
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".autowire.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for the local config
    ///
    /// Each layer overrides only the keys it specifies.
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(project) = project_dir {
            let local_path = project_config_path(project);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Dump path resolved against `project_dir` when relative.
    pub fn dump_path_in(&self, project_dir: &Path) -> PathBuf {
        if self.dump_path.is_absolute() {
            self.dump_path.clone()
        } else {
            project_dir.join(&self.dump_path)
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            mode: overlay.mode.unwrap_or(self.mode),
            autowire: overlay.autowire.unwrap_or(self.autowire),
            dump_path: overlay
                .dump_path
                .clone()
                .unwrap_or_else(|| self.dump_path.clone()),
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in the dump path.
    fn expand_paths(&mut self) {
        let raw = self.dump_path.to_string_lossy().to_string();
        if let Ok(expanded) = shellexpand::full(&raw) {
            self.dump_path = PathBuf::from(expanded.as_ref());
        }
    }

    /// Apply AUTOWIRE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("AUTOWIRE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("mode") {
            settings.mode = val.parse()?;
        }
        if let Ok(val) = config.get_bool("autowire") {
            settings.autowire = val;
        }
        if let Ok(val) = config.get_string("dump_path") {
            settings.dump_path = PathBuf::from(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# autowire configuration
#
# Locations (by precedence, lowest to highest):
#   Global:  ~/.config/autowire/autowire.toml
#   Project: <project_dir>/.autowire.toml
#   Env:     AUTOWIRE_* environment variables

# Execution mode: "interpreted" executes services on request,
# "compiled" compiles every service when the container is built
# mode = "interpreted"

# Autowire constructor and method parameters by type
# autowire = true

# Where compiled containers are dumped (relative to the project directory)
# dump_path = "var/cache/container.toml"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
