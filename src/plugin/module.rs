//! Loadable plugin modules
//!
//! The registry only sees the [`PluginModule`] interface: initialize, shut
//! down, look up a symbol. [`DynamicLibrary`] implements it for shared
//! libraries; tests and statically linked plugins can provide their own.
//!
//! A shared library exposes two optional entry points named after the
//! plugin:
//!
//! | Symbol | Signature |
//! |--------|-----------|
//! | `<name>_init` | `extern "C" fn(*mut c_void) -> bool` |
//! | `<name>_shutdown` | `extern "C" fn()` |

use std::ffi::c_void;
use std::path::{Path, PathBuf};

use libloading::Library;
use thiserror::Error;

use super::registry::RegistryError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open plugin module {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Plugin '{0}' init entry point reported failure")]
    InitFailed(String),

    #[error("Plugin '{0}' is already loaded")]
    AlreadyLoaded(String),

    #[error("Plugin '{0}' is not loaded")]
    NotLoaded(String),

    #[error("Plugin '{name}' has no loadable module")]
    MissingModule { name: String },

    #[error(transparent)]
    Registration(#[from] RegistryError),
}

/// Init entry point; the argument is reserved and always null
pub type InitFn = unsafe extern "C" fn(*mut c_void) -> bool;

pub type ShutdownFn = unsafe extern "C" fn();

pub fn init_symbol(plugin: &str) -> String {
    format!("{}_init", plugin)
}

pub fn shutdown_symbol(plugin: &str) -> String {
    format!("{}_shutdown", plugin)
}

/// A loaded module as seen by the registry
pub trait PluginModule: Send + Sync {
    /// Runs the init entry point; `None` when the module has none
    fn init(&mut self) -> Option<bool>;

    /// Runs the shutdown entry point if present
    fn shutdown(&mut self);

    /// Address of an exported symbol
    fn symbol(&self, name: &str) -> Option<*const c_void>;
}

/// A plugin shared library
pub struct DynamicLibrary {
    name: String,
    path: PathBuf,
    init: Option<InitFn>,
    shutdown: Option<ShutdownFn>,
    // Dropped last: the entry points above point into it
    library: Library,
}

impl DynamicLibrary {
    /// Opens `path` and resolves the `<name>_init` / `<name>_shutdown` entry points.
    ///
    /// Missing entry points are logged, not errors.
    pub fn open(path: &Path, name: &str) -> Result<Self, LoadError> {
        // SAFETY: loading runs the library's constructors; plugin modules are
        // trusted code found in configured plugin directories.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let init_name = init_symbol(name);
        // SAFETY: the entry point signature is fixed by the plugin ABI above.
        let init = unsafe { library.get::<InitFn>(init_name.as_bytes()) }
            .ok()
            .map(|sym| *sym);
        if init.is_none() {
            tracing::warn!(plugin = name, symbol = %init_name, "Plugin has no init entry point");
        }

        let shutdown_name = shutdown_symbol(name);
        // SAFETY: as above.
        let shutdown = unsafe { library.get::<ShutdownFn>(shutdown_name.as_bytes()) }
            .ok()
            .map(|sym| *sym);
        if shutdown.is_none() {
            tracing::warn!(plugin = name, symbol = %shutdown_name, "Plugin has no shutdown entry point");
        }

        tracing::debug!(plugin = name, path = %path.display(), "Opened plugin module");
        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            init,
            shutdown,
            library,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PluginModule for DynamicLibrary {
    fn init(&mut self) -> Option<bool> {
        // SAFETY: resolved from this library, which is still loaded.
        self.init.map(|init| unsafe { init(std::ptr::null_mut()) })
    }

    fn shutdown(&mut self) {
        if let Some(shutdown) = self.shutdown {
            // SAFETY: resolved from this library, which is still loaded.
            unsafe { shutdown() }
        }
    }

    fn symbol(&self, name: &str) -> Option<*const c_void> {
        // SAFETY: the address is only handed out, never called here.
        unsafe { self.library.get::<*const c_void>(name.as_bytes()) }
            .ok()
            .map(|sym| *sym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entry_point_names() {
        assert_eq!(init_symbol("canvas"), "canvas_init");
        assert_eq!(shutdown_symbol("canvas"), "canvas_shutdown");
    }

    #[test]
    fn opening_a_non_library_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(libloading::library_filename("kir_bogus"));
        std::fs::write(&path, b"not a shared object").unwrap();

        let err = DynamicLibrary::open(&path, "bogus").err().unwrap();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn opening_a_missing_file_fails() {
        let err = DynamicLibrary::open(Path::new("/nonexistent/libkir_none.so"), "none")
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to open plugin module"));
    }
}
