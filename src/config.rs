//! Runtime configuration
//!
//! Configuration is read from TOML, by default from
//! `~/.config/kir/config.toml`. Every field is optional:
//!
//! ```toml
//! plugin_dirs = ["/opt/kir/plugins"]
//! use_default_plugin_dirs = true
//! module_cache_dir = ".kir_cache"
//!
//! [backend]
//! capabilities = ["transforms", "gradients"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin::{BackendCapabilities, PluginLoader, PluginRegistry};

/// Directory holding `$module:` documents when nothing else is configured
pub const DEFAULT_MODULE_CACHE_DIR: &str = ".kir_cache";

/// Environment variable overriding the module cache directory
pub const CACHE_DIR_ENV: &str = "KIR_CACHE_DIR";

/// Search roots relative to the working directory
const LOCAL_PLUGIN_DIRS: &[&str] = &["kir_plugins", ".kir/plugins"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Module cache directory from the environment, else [`DEFAULT_MODULE_CACHE_DIR`]
pub fn default_module_cache_dir() -> PathBuf {
    std::env::var_os(CACHE_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODULE_CACHE_DIR))
}

/// Rendering backend settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Capabilities the backend supports; `None` means not configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<BackendCapabilities>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Extra plugin search roots, searched first
    pub plugin_dirs: Vec<PathBuf>,

    /// Also search the platform data directory and the local plugin dirs
    pub use_default_plugin_dirs: bool,

    pub module_cache_dir: PathBuf,

    pub backend: BackendSection,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            plugin_dirs: Vec::new(),
            use_default_plugin_dirs: true,
            module_cache_dir: default_module_cache_dir(),
            backend: BackendSection::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Loads the global configuration, or defaults when there is none
    pub fn load_default() -> Result<Self> {
        let Some(dir) = Self::global_config_dir() else {
            return Ok(Self::default());
        };

        let path = dir.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "kir", "kir").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.module_cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("module_cache_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Plugin search roots in search order
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.plugin_dirs.clone();

        if self.use_default_plugin_dirs {
            if let Some(project) = ProjectDirs::from("dev", "kir", "kir") {
                dirs.push(project.data_dir().join("plugins"));
            }
            dirs.extend(LOCAL_PLUGIN_DIRS.iter().map(PathBuf::from));
        }

        dirs.dedup();
        dirs
    }

    /// A loader over [`search_dirs`](Self::search_dirs), not yet run
    pub fn plugin_loader(&self) -> PluginLoader {
        PluginLoader::with_dirs(self.search_dirs())
    }

    /// Applies the backend settings to `registry`
    pub fn configure(&self, registry: &mut PluginRegistry) {
        if let Some(capabilities) = &self.backend.capabilities {
            registry.set_backend_capabilities(capabilities.clone());
        }
    }
}
