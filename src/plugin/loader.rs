//! Plugin discovery
//!
//! Plugins are discovered from configured search directories. A directory
//! is a plugin when it contains `plugin.toml` and a loadable module named
//! after the plugin, found in one of:
//! 1. the plugin directory itself
//! 2. `build/`
//! 3. `lib/`
//!
//! A search root may itself be a plugin directory; otherwise its immediate
//! subdirectories are checked.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::manifest::PluginManifest;

/// Subdirectories searched for the module, after the plugin directory itself
const MODULE_SUBDIRS: &[&str] = &["build", "lib"];

/// Information about a discovered plugin
#[derive(Debug, Clone)]
pub struct DiscoveredPlugin {
    /// Plugin name from the descriptor
    pub name: String,

    /// Directory holding `plugin.toml`
    pub dir: PathBuf,

    /// Path to the loadable module
    pub module_path: PathBuf,

    /// Parsed descriptor
    pub manifest: PluginManifest,
}

/// Platform file name of plugin `name`'s module, e.g. `libkir_canvas.so`
pub fn module_file_name(name: &str) -> PathBuf {
    PathBuf::from(libloading::library_filename(format!("kir_{}", name)))
}

/// Plugin discovery over a list of search directories
pub struct PluginLoader {
    /// Discovered plugins, first found wins
    plugins: HashMap<String, DiscoveredPlugin>,

    /// Discovery order, for stable listing
    order: Vec<String>,

    /// Directories to search
    plugin_dirs: Vec<PathBuf>,
}

impl PluginLoader {
    /// Creates a new plugin loader
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
            order: Vec::new(),
            plugin_dirs: Vec::new(),
        }
    }

    /// Creates a loader searching `dirs` in order
    pub fn with_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut loader = Self::new();
        for dir in dirs {
            loader.add_plugin_dir(dir);
        }
        loader
    }

    /// Adds a plugin directory to search
    pub fn add_plugin_dir(&mut self, dir: impl Into<PathBuf>) {
        self.plugin_dirs.push(dir.into());
    }

    /// Discovers all available plugins
    pub fn discover(&mut self) -> Result<()> {
        self.plugins.clear();
        self.order.clear();

        for dir in &self.plugin_dirs.clone() {
            self.scan_directory(dir)?;
        }

        tracing::debug!(count = self.plugins.len(), "Plugin discovery finished");
        Ok(())
    }

    /// Scans one search root
    fn scan_directory(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }

        // The root itself is a plugin: don't look further down
        if self.try_plugin_dir(dir) {
            return Ok(());
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return Ok(()), // Ignore unreadable directories
        };

        let mut subdirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subdirs.sort();

        for sub in subdirs {
            self.try_plugin_dir(&sub);
        }

        Ok(())
    }

    /// Records `dir` if it holds a descriptor and a module; returns true if it did
    fn try_plugin_dir(&mut self, dir: &Path) -> bool {
        let descriptor = dir.join(PluginManifest::FILE_NAME);
        if !descriptor.is_file() {
            return false;
        }

        let manifest = match PluginManifest::load(&descriptor) {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(path = %descriptor.display(), error = %err, "Skipping invalid plugin descriptor");
                return false;
            }
        };

        let Some(module_path) = locate_module(dir, &manifest.plugin.name) else {
            tracing::debug!(plugin = %manifest.plugin.name, dir = %dir.display(), "Plugin module not found");
            return false;
        };

        let name = manifest.plugin.name.clone();
        if !self.plugins.contains_key(&name) {
            tracing::debug!(plugin = %name, module = %module_path.display(), "Discovered plugin");
            self.order.push(name.clone());
            self.plugins.insert(
                name.clone(),
                DiscoveredPlugin {
                    name,
                    dir: dir.to_path_buf(),
                    module_path,
                    manifest,
                },
            );
        }
        true
    }

    /// Lists all discovered plugins in discovery order
    pub fn list(&self) -> Vec<&DiscoveredPlugin> {
        self.order
            .iter()
            .filter_map(|name| self.plugins.get(name))
            .collect()
    }

    /// Discovered plugins, cloned for handing to the registry
    pub fn discovered(&self) -> Vec<DiscoveredPlugin> {
        self.list().into_iter().cloned().collect()
    }

    /// Gets a plugin by name
    pub fn get(&self, name: &str) -> Option<&DiscoveredPlugin> {
        self.plugins.get(name)
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn locate_module(dir: &Path, name: &str) -> Option<PathBuf> {
    let file_name = module_file_name(name);
    std::iter::once(dir.to_path_buf())
        .chain(MODULE_SUBDIRS.iter().map(|sub| dir.join(sub)))
        .map(|candidate| candidate.join(&file_name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_plugin(dir: &Path, name: &str, module_subdir: Option<&str>) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("plugin.toml"),
            format!(
                "[plugin]\nname = \"{}\"\nversion = \"1.0.0\"\n\n[capabilities]\ncommand_ids = [100, 102]\n",
                name
            ),
        )
        .unwrap();

        let module_dir = match module_subdir {
            Some(sub) => dir.join(sub),
            None => dir.to_path_buf(),
        };
        fs::create_dir_all(&module_dir).unwrap();
        fs::write(module_dir.join(module_file_name(name)), b"").unwrap();
    }

    #[test]
    fn new_loader_is_empty() {
        let loader = PluginLoader::new();
        assert!(loader.list().is_empty());
    }

    #[test]
    fn add_plugin_dir() {
        let mut loader = PluginLoader::new();
        loader.add_plugin_dir("/some/path");

        assert_eq!(loader.plugin_dirs.len(), 1);
    }

    #[test]
    fn discover_empty_dir() {
        let dir = TempDir::new().unwrap();
        let mut loader = PluginLoader::new();
        loader.add_plugin_dir(dir.path());
        loader.discover().unwrap();

        assert!(loader.list().is_empty());
    }

    #[test]
    fn discover_subdirectories() {
        let dir = TempDir::new().unwrap();
        write_plugin(&dir.path().join("canvas"), "canvas", None);
        write_plugin(&dir.path().join("markdown"), "markdown", Some("build"));
        write_plugin(&dir.path().join("charts"), "charts", Some("lib"));

        let mut loader = PluginLoader::with_dirs([dir.path().to_path_buf()]);
        loader.discover().unwrap();

        let names: Vec<_> = loader.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["canvas", "charts", "markdown"]);

        let markdown = loader.get("markdown").unwrap();
        assert!(markdown.module_path.ends_with(Path::new("build").join(module_file_name("markdown"))));
        assert_eq!(markdown.manifest.command_range().start, 100);
    }

    #[test]
    fn root_that_is_a_plugin_is_not_scanned_further() {
        let dir = TempDir::new().unwrap();
        write_plugin(dir.path(), "outer", None);
        write_plugin(&dir.path().join("inner"), "inner", None);

        let mut loader = PluginLoader::with_dirs([dir.path().to_path_buf()]);
        loader.discover().unwrap();

        assert!(loader.get("outer").is_some());
        assert!(loader.get("inner").is_none());
    }

    #[test]
    fn descriptor_without_module_is_skipped() {
        let dir = TempDir::new().unwrap();
        let plugin = dir.path().join("ghost");
        fs::create_dir_all(&plugin).unwrap();
        fs::write(plugin.join("plugin.toml"), "[plugin]\nname = \"ghost\"\n").unwrap();

        let mut loader = PluginLoader::with_dirs([dir.path().to_path_buf()]);
        loader.discover().unwrap();
        assert!(loader.list().is_empty());
    }

    #[test]
    fn first_found_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_plugin(&first.path().join("canvas"), "canvas", None);
        write_plugin(&second.path().join("canvas"), "canvas", None);

        let mut loader =
            PluginLoader::with_dirs([first.path().to_path_buf(), second.path().to_path_buf()]);
        loader.discover().unwrap();

        assert_eq!(loader.list().len(), 1);
        assert!(loader.get("canvas").unwrap().dir.starts_with(first.path()));
    }

    #[test]
    fn get_nonexistent_plugin() {
        let loader = PluginLoader::new();
        assert!(loader.get("nonexistent").is_none());
    }
}
