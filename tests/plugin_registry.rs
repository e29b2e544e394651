//! Plugin registry, discovery and requirement scanning

use std::ffi::c_void;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kir::codec::Decoder;
use kir::config::RuntimeConfig;
use kir::domain::{ComponentType, Node, Tree};
use kir::plugin::{
    module_file_name, scan_requirements, LoadError, PluginLoader, PluginManifest, PluginMetadata,
    PluginModule, PluginRegistry, RegistryError,
};
use serde_json::json;
use tempfile::TempDir;

fn write_plugin(dir: &Path, name: &str, commands: &str) {
    fs::create_dir_all(dir.join("build")).unwrap();
    fs::write(
        dir.join("plugin.toml"),
        format!(
            "[plugin]\nname = \"{}\"\nversion = \"1.0.0\"\n\n[capabilities]\ncommand_ids = {}\n",
            name, commands
        ),
    )
    .unwrap();
    // Not a real shared library, so opening it fails
    fs::write(dir.join("build").join(module_file_name(name)), b"not a library").unwrap();
}

struct FakeModule {
    init_ok: bool,
    shut_down: Arc<AtomicBool>,
}

impl PluginModule for FakeModule {
    fn init(&mut self) -> Option<bool> {
        Some(self.init_ok)
    }

    fn shutdown(&mut self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }

    fn symbol(&self, _name: &str) -> Option<*const c_void> {
        None
    }
}

#[test]
fn overlapping_ranges_name_the_first_conflict() {
    let mut registry = PluginRegistry::new();
    registry
        .register(PluginMetadata::new("alpha", "1.0.0").with_commands(100, 110))
        .unwrap();

    let err = registry
        .register(PluginMetadata::new("beta", "1.0.0").with_commands(105, 120))
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::RangeConflict {
            plugin: "beta".into(),
            conflicting: "alpha".into()
        }
    );
    assert!(!registry.is_active("beta"));

    registry
        .register(PluginMetadata::new("beta", "1.0.0").with_commands(111, 120))
        .unwrap();
    assert_eq!(registry.list().len(), 2);
}

#[test]
fn capabilities_from_config_gate_registration() {
    let config = RuntimeConfig::from_toml_str("[backend]\ncapabilities = [\"transforms\"]\n").unwrap();
    let mut registry = PluginRegistry::new();
    config.configure(&mut registry);

    let err = registry
        .register(PluginMetadata::new("gl", "1.0.0").requiring("3d_rendering"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingCapability { .. }));

    registry
        .register(PluginMetadata::new("spin", "1.0.0").requiring("transforms"))
        .unwrap();
}

#[test]
fn discovery_feeds_auto_load() {
    let dir = TempDir::new().unwrap();
    write_plugin(&dir.path().join("canvas"), "canvas", "[100, 101, 102]");
    write_plugin(&dir.path().join("markdown"), "markdown", "[200, 202]");

    let config = RuntimeConfig {
        plugin_dirs: vec![dir.path().to_path_buf()],
        use_default_plugin_dirs: false,
        ..RuntimeConfig::default()
    };
    let mut loader = config.plugin_loader();
    loader.discover().unwrap();

    let names: Vec<_> = loader.list().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["canvas", "markdown"]);

    // Both modules fail to open; the registry stays clean
    let mut registry = PluginRegistry::new();
    assert_eq!(registry.auto_load(&loader.discovered(), 0), 0);
    assert!(registry.list().is_empty());
}

#[test]
fn opening_a_bad_library_fails() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "broken", "[150]");

    let mut loader = PluginLoader::with_dirs([dir.path().to_path_buf()]);
    loader.discover().unwrap();
    let plugin = loader.get("broken").unwrap();

    let mut registry = PluginRegistry::new();
    let err = registry
        .load_library(&plugin.module_path, &plugin.name, Some(&plugin.manifest))
        .unwrap_err();
    assert!(matches!(err, LoadError::Open { .. }));
    assert!(!registry.is_active("broken"));
}

#[test]
fn failed_init_rolls_back_registration() {
    let manifest = PluginManifest::from_toml_str(
        "[plugin]\nname = \"flaky\"\nversion = \"1.0.0\"\n\n[capabilities]\ncommand_ids = [130]\n",
    )
    .unwrap();
    let shut_down = Arc::new(AtomicBool::new(false));

    let mut registry = PluginRegistry::new();
    let module = FakeModule {
        init_ok: false,
        shut_down: shut_down.clone(),
    };
    let err = registry
        .load_module("flaky", Box::new(module), Some(&manifest))
        .unwrap_err();
    assert!(matches!(err, LoadError::InitFailed(_)));
    assert!(!registry.is_active("flaky"));

    let module = FakeModule {
        init_ok: true,
        shut_down: shut_down.clone(),
    };
    registry
        .load_module("flaky", Box::new(module), Some(&manifest))
        .unwrap();
    assert!(registry.is_active("flaky"));
    assert!(registry.is_loaded("flaky"));

    registry.unload("flaky").unwrap();
    assert!(shut_down.load(Ordering::SeqCst));
    assert!(!registry.is_active("flaky"));
}

#[test]
fn scanner_reports_only_the_owning_plugin() {
    let mut tree = Tree::new();
    let root = tree.add_node(Node::new(ComponentType::Column).with_id(1));
    let mut canvas = Node::new(ComponentType::Canvas).with_id(2);
    canvas.commands = vec![100, 102];
    let canvas = tree.add_node(canvas);
    tree.append_child(root, canvas).unwrap();
    tree.set_root(root).unwrap();

    assert_eq!(scan_requirements(&tree, root, None), vec!["canvas"]);

    let mut registry = PluginRegistry::new();
    registry
        .register(PluginMetadata::new("paint", "1.0.0").with_commands(100, 105))
        .unwrap();
    assert_eq!(scan_requirements(&tree, root, Some(&registry)), vec!["paint"]);
}

#[test]
fn decoded_documents_declare_requirements() {
    let doc = Decoder::new()
        .decode_value(&json!({"root": {"id": 1, "type": "Markdown", "commands": [201]}}))
        .unwrap();
    assert_eq!(doc.required_plugins, vec!["markdown"]);
}
