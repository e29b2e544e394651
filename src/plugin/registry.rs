//! The plugin registry
//!
//! One [`PluginRegistry`] is built at startup and passed by reference to
//! every call site. Registration takes `&mut self` and dispatch takes
//! `&self`, so "register before concurrent use" is enforced by the borrow
//! checker. An embedder that must register from several threads wraps the
//! registry in a lock.
//!
//! Per plugin the state machine is simply unregistered → active →
//! unregistered. A rejected registration leaves the registry unchanged.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::ffi::c_void;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::capability::BackendCapabilities;
use super::handlers::{
    Bounds, CallbackBridge, CommandHandler, ComponentRenderer, PayloadCodec, StylesheetGenerator,
    WebRenderer,
};
use super::loader::DiscoveredPlugin;
use super::manifest::{
    CommandRange, PluginInfo, PluginManifest, PluginMetadata, PLUGIN_COMMAND_END,
    PLUGIN_COMMAND_START,
};
use super::module::{DynamicLibrary, LoadError, PluginModule};
use super::version::{self, Version};
use crate::domain::{ComponentType, Node};

/// First id available to plugin event types
pub const PLUGIN_EVENT_START: u8 = 100;

const DEFAULT_THEME: &str = "light";

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Plugin '{plugin}' requires runtime {required} (current: {current})")]
    IncompatibleVersion {
        plugin: String,
        required: String,
        current: String,
    },

    #[error("Plugin '{plugin}' has invalid command ID range ({range})")]
    InvalidRange { plugin: String, range: CommandRange },

    #[error("Plugin '{plugin}' command ID range conflicts with '{conflicting}'")]
    RangeConflict { plugin: String, conflicting: String },

    #[error("Plugin '{0}' is already registered")]
    DuplicateName(String),

    #[error("Plugin '{plugin}' requires capability '{capability}' which is not supported")]
    MissingCapability { plugin: String, capability: String },

    #[error("Command ID {0} out of range ({PLUGIN_COMMAND_START}-{PLUGIN_COMMAND_END})")]
    CommandOutOfRange(u16),

    #[error("Command ID {0} already registered")]
    HandlerTaken(u16),

    #[error("Component type {kind} already has a {slot}")]
    SlotTaken { kind: ComponentType, slot: &'static str },

    #[error("Invalid event type ID {0} (must be 100-255)")]
    InvalidEventId(u8),

    #[error("Duplicate event type '{0}'")]
    DuplicateEventName(String),

    #[error("Event type ID {0} already used")]
    DuplicateEventId(u8),
}

/// Event type contributed by a plugin
#[derive(Debug, Clone, PartialEq)]
pub struct PluginEventType {
    pub plugin: String,
    pub name: String,
    pub id: u8,
    pub description: Option<String>,
}

/// Dispatch counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PluginStats {
    pub commands_dispatched: u64,
    pub unknown_commands: u64,
    pub components_rendered: u64,
}

#[derive(Default)]
struct Counters {
    commands_dispatched: AtomicU64,
    unknown_commands: AtomicU64,
    components_rendered: AtomicU64,
}

struct WebEntry {
    renderer: Box<dyn WebRenderer>,
    stylesheet: Option<Box<dyn StylesheetGenerator>>,
}

struct LoadedModule {
    name: String,
    module: Box<dyn PluginModule>,
}

/// Registry of active plugins and their handlers
pub struct PluginRegistry {
    runtime_version: Version,
    plugins: Vec<PluginMetadata>,
    handlers: BTreeMap<u16, Box<dyn CommandHandler>>,
    renderers: HashMap<ComponentType, Box<dyn ComponentRenderer>>,
    web_renderers: HashMap<ComponentType, WebEntry>,
    callback_bridges: HashMap<ComponentType, Box<dyn CallbackBridge>>,
    payload_codecs: HashMap<ComponentType, Box<dyn PayloadCodec>>,
    event_types: Vec<PluginEventType>,
    capabilities: Option<BackendCapabilities>,
    requirements: Vec<String>,
    modules: Vec<LoadedModule>,
    counters: Counters,
}

impl PluginRegistry {
    /// Creates an empty registry for this runtime's version
    pub fn new() -> Self {
        Self::with_runtime_version(Version::runtime())
    }

    pub fn with_runtime_version(runtime_version: Version) -> Self {
        Self {
            runtime_version,
            plugins: Vec::new(),
            handlers: BTreeMap::new(),
            renderers: HashMap::new(),
            web_renderers: HashMap::new(),
            callback_bridges: HashMap::new(),
            payload_codecs: HashMap::new(),
            event_types: Vec::new(),
            capabilities: None,
            requirements: Vec::new(),
            modules: Vec::new(),
            counters: Counters::default(),
        }
    }

    pub fn runtime_version(&self) -> Version {
        self.runtime_version
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Activates a plugin.
    ///
    /// Checks, in order: minimum runtime version, command range validity,
    /// range overlap with active plugins, duplicate name, and required
    /// capabilities (only when backend capabilities are configured).
    pub fn register(&mut self, metadata: PluginMetadata) -> Result<(), RegistryError> {
        if let Some(required) = metadata.min_runtime_version.as_deref().filter(|v| !v.is_empty()) {
            if !self.check_version_compat(required) {
                return Err(RegistryError::IncompatibleVersion {
                    plugin: metadata.name.clone(),
                    required: required.to_string(),
                    current: self.runtime_version.to_string(),
                });
            }
        }

        if !metadata.commands.is_empty() {
            if !metadata.commands.is_valid() {
                return Err(RegistryError::InvalidRange {
                    plugin: metadata.name.clone(),
                    range: metadata.commands,
                });
            }

            if let Some(conflicting) = self.check_command_conflict(metadata.commands) {
                return Err(RegistryError::RangeConflict {
                    plugin: metadata.name.clone(),
                    conflicting: conflicting.to_string(),
                });
            }
        }

        if self.is_active(&metadata.name) {
            return Err(RegistryError::DuplicateName(metadata.name.clone()));
        }

        if let Some(caps) = &self.capabilities {
            if let Some(missing) = metadata
                .required_capabilities
                .iter()
                .find(|cap| !caps.supports_name(cap))
            {
                return Err(RegistryError::MissingCapability {
                    plugin: metadata.name.clone(),
                    capability: missing.clone(),
                });
            }
        }

        tracing::info!(
            plugin = %metadata.name,
            version = %metadata.version,
            commands = %metadata.commands,
            "Registered plugin"
        );
        self.plugins.push(metadata);
        Ok(())
    }

    /// Deactivates a plugin and drops the handlers and event types it owns
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(pos) = self.plugins.iter().position(|p| p.name == name) else {
            return false;
        };

        let metadata = self.plugins.remove(pos);
        if !metadata.commands.is_empty() {
            self.handlers
                .retain(|id, _| !metadata.commands.contains(*id));
        }
        self.event_types.retain(|e| e.plugin != name);

        tracing::info!(plugin = name, "Unregistered plugin");
        true
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name == name)
    }

    pub fn info(&self, name: &str) -> Option<PluginInfo> {
        self.plugins
            .iter()
            .find(|p| p.name == name)
            .map(|metadata| self.info_for(metadata))
    }

    /// All active plugins in registration order
    pub fn list(&self) -> Vec<PluginInfo> {
        self.plugins.iter().map(|m| self.info_for(m)).collect()
    }

    fn info_for(&self, metadata: &PluginMetadata) -> PluginInfo {
        let handler_count = if metadata.commands.is_empty() {
            0
        } else {
            self.handlers
                .range(metadata.commands.start..=metadata.commands.end)
                .count()
        };
        PluginInfo {
            metadata: metadata.clone(),
            handler_count,
            loaded: self.is_loaded(&metadata.name),
        }
    }

    /// Name of the first active plugin whose range overlaps `range`
    pub fn check_command_conflict(&self, range: CommandRange) -> Option<&str> {
        self.plugins
            .iter()
            .find(|p| p.commands.overlaps(&range))
            .map(|p| p.name.as_str())
    }

    pub fn check_version_compat(&self, required: &str) -> bool {
        version::is_compatible(required, &self.runtime_version.to_string())
    }

    /// Active plugin whose command range contains `id`
    pub fn owner_of_command(&self, id: u16) -> Option<&str> {
        self.plugins
            .iter()
            .find(|p| p.commands.contains(id))
            .map(|p| p.name.as_str())
    }

    pub(crate) fn active_ranges(&self) -> impl Iterator<Item = (&str, CommandRange)> {
        self.plugins.iter().map(|p| (p.name.as_str(), p.commands))
    }

    // ------------------------------------------------------------------
    // Command handlers
    // ------------------------------------------------------------------

    pub fn register_handler<H>(&mut self, command_id: u16, handler: H) -> Result<(), RegistryError>
    where
        H: CommandHandler + 'static,
    {
        if !(PLUGIN_COMMAND_START..=PLUGIN_COMMAND_END).contains(&command_id) {
            return Err(RegistryError::CommandOutOfRange(command_id));
        }
        if self.handlers.contains_key(&command_id) {
            return Err(RegistryError::HandlerTaken(command_id));
        }
        self.handlers.insert(command_id, Box::new(handler));
        Ok(())
    }

    pub fn unregister_handler(&mut self, command_id: u16) -> bool {
        self.handlers.remove(&command_id).is_some()
    }

    pub fn has_handler(&self, command_id: u16) -> bool {
        self.handlers.contains_key(&command_id)
    }

    /// Runs the handler for `command_id`; false when the id is outside the
    /// plugin range or has no handler
    pub fn dispatch_command(&self, backend: &mut dyn Any, command_id: u16, command: &[u8]) -> bool {
        if !(PLUGIN_COMMAND_START..=PLUGIN_COMMAND_END).contains(&command_id) {
            return false;
        }

        match self.handlers.get(&command_id) {
            Some(handler) => {
                handler.handle(backend, command);
                self.counters.commands_dispatched.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => {
                self.counters.unknown_commands.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Renderers and bridges
    // ------------------------------------------------------------------

    pub fn register_renderer<R>(&mut self, kind: ComponentType, renderer: R) -> Result<(), RegistryError>
    where
        R: ComponentRenderer + 'static,
    {
        if self.renderers.contains_key(&kind) {
            return Err(RegistryError::SlotTaken {
                kind,
                slot: "renderer",
            });
        }
        self.renderers.insert(kind, Box::new(renderer));
        tracing::debug!(%kind, "Registered component renderer");
        Ok(())
    }

    pub fn unregister_renderer(&mut self, kind: ComponentType) -> bool {
        self.renderers.remove(&kind).is_some()
    }

    pub fn has_renderer(&self, kind: ComponentType) -> bool {
        self.renderers.contains_key(&kind)
    }

    /// Draws `node` with the renderer registered for its kind
    pub fn render_component(&self, backend: &mut dyn Any, node: &Node, bounds: Bounds) -> bool {
        let Some(renderer) = self.renderers.get(&node.kind) else {
            tracing::debug!(kind = %node.kind, "No renderer for component type");
            return false;
        };
        renderer.render(backend, node, bounds);
        self.counters.components_rendered.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn register_web_renderer<R>(
        &mut self,
        kind: ComponentType,
        renderer: R,
        stylesheet: Option<Box<dyn StylesheetGenerator>>,
    ) -> Result<(), RegistryError>
    where
        R: WebRenderer + 'static,
    {
        if self.web_renderers.contains_key(&kind) {
            return Err(RegistryError::SlotTaken {
                kind,
                slot: "web renderer",
            });
        }
        self.web_renderers.insert(
            kind,
            WebEntry {
                renderer: Box::new(renderer),
                stylesheet,
            },
        );
        tracing::debug!(%kind, "Registered web renderer");
        Ok(())
    }

    pub fn unregister_web_renderer(&mut self, kind: ComponentType) -> bool {
        self.web_renderers.remove(&kind).is_some()
    }

    pub fn has_web_renderer(&self, kind: ComponentType) -> bool {
        self.web_renderers.contains_key(&kind)
    }

    /// Markup for `node`; the theme defaults to `light`
    pub fn render_web(&self, node: &Node, theme: Option<&str>) -> Option<String> {
        self.web_renderers
            .get(&node.kind)
            .and_then(|entry| entry.renderer.render_html(node, theme.unwrap_or(DEFAULT_THEME)))
    }

    /// Stylesheet for `kind`; the theme defaults to `light`
    pub fn web_stylesheet(&self, kind: ComponentType, theme: Option<&str>) -> Option<String> {
        self.web_renderers
            .get(&kind)
            .and_then(|entry| entry.stylesheet.as_ref())
            .and_then(|generator| generator.stylesheet(theme.unwrap_or(DEFAULT_THEME)))
    }

    pub fn register_callback_bridge<B>(&mut self, kind: ComponentType, bridge: B) -> Result<(), RegistryError>
    where
        B: CallbackBridge + 'static,
    {
        if self.callback_bridges.contains_key(&kind) {
            return Err(RegistryError::SlotTaken {
                kind,
                slot: "callback bridge",
            });
        }
        self.callback_bridges.insert(kind, Box::new(bridge));
        Ok(())
    }

    pub fn unregister_callback_bridge(&mut self, kind: ComponentType) -> bool {
        self.callback_bridges.remove(&kind).is_some()
    }

    pub fn has_callback_bridge(&self, kind: ComponentType) -> bool {
        self.callback_bridges.contains_key(&kind)
    }

    pub fn dispatch_callback(&self, kind: ComponentType, component_id: u32) -> bool {
        match self.callback_bridges.get(&kind) {
            Some(bridge) => {
                bridge.invoke(component_id);
                true
            }
            None => false,
        }
    }

    pub fn register_payload_codec<C>(&mut self, kind: ComponentType, codec: C) -> Result<(), RegistryError>
    where
        C: PayloadCodec + 'static,
    {
        if self.payload_codecs.contains_key(&kind) {
            return Err(RegistryError::SlotTaken {
                kind,
                slot: "payload codec",
            });
        }
        self.payload_codecs.insert(kind, Box::new(codec));
        Ok(())
    }

    pub fn payload_codec(&self, kind: ComponentType) -> Option<&dyn PayloadCodec> {
        self.payload_codecs.get(&kind).map(|codec| codec.as_ref())
    }

    // ------------------------------------------------------------------
    // Backend capabilities
    // ------------------------------------------------------------------

    pub fn set_backend_capabilities(&mut self, capabilities: BackendCapabilities) {
        self.capabilities = Some(capabilities);
    }

    /// `None` until a backend has declared its capabilities
    pub fn backend_capabilities(&self) -> Option<&BackendCapabilities> {
        self.capabilities.as_ref()
    }

    pub fn backend_supports(&self, capability: &str) -> bool {
        self.capabilities
            .as_ref()
            .is_some_and(|caps| caps.supports_name(capability))
    }

    // ------------------------------------------------------------------
    // Event types
    // ------------------------------------------------------------------

    pub fn register_event_type(
        &mut self,
        plugin: &str,
        name: &str,
        id: u8,
        description: Option<&str>,
    ) -> Result<(), RegistryError> {
        if id < PLUGIN_EVENT_START {
            return Err(RegistryError::InvalidEventId(id));
        }
        if self.event_types.iter().any(|e| e.name == name) {
            return Err(RegistryError::DuplicateEventName(name.to_string()));
        }
        if self.event_types.iter().any(|e| e.id == id) {
            return Err(RegistryError::DuplicateEventId(id));
        }

        self.event_types.push(PluginEventType {
            plugin: plugin.to_string(),
            name: name.to_string(),
            id,
            description: description.map(str::to_string),
        });
        tracing::debug!(plugin, event = name, id, "Registered event type");
        Ok(())
    }

    pub fn event_type_id(&self, name: &str) -> Option<u8> {
        self.event_types.iter().find(|e| e.name == name).map(|e| e.id)
    }

    pub fn event_type_name(&self, id: u8) -> Option<&str> {
        self.event_types
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.as_str())
    }

    pub fn has_event_type(&self, name: &str) -> bool {
        self.event_type_id(name).is_some()
    }

    pub fn event_types(&self) -> &[PluginEventType] {
        &self.event_types
    }

    // ------------------------------------------------------------------
    // Stats and requirements
    // ------------------------------------------------------------------

    pub fn stats(&self) -> PluginStats {
        PluginStats {
            commands_dispatched: self.counters.commands_dispatched.load(Ordering::Relaxed),
            unknown_commands: self.counters.unknown_commands.load(Ordering::Relaxed),
            components_rendered: self.counters.components_rendered.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.counters.commands_dispatched.store(0, Ordering::Relaxed);
        self.counters.unknown_commands.store(0, Ordering::Relaxed);
        self.counters.components_rendered.store(0, Ordering::Relaxed);
    }

    /// Stores the plugins a decoded document declared it needs
    pub fn set_requirements(&mut self, plugins: Vec<String>) {
        if !plugins.is_empty() {
            tracing::info!(plugins = %plugins.join(", "), "Document requires plugins");
        }
        self.requirements = plugins;
    }

    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn clear_requirements(&mut self) {
        self.requirements.clear();
    }

    // ------------------------------------------------------------------
    // Dynamic modules
    // ------------------------------------------------------------------

    /// Takes ownership of a module and runs its init entry point.
    ///
    /// With a descriptor the plugin is registered first; if init then
    /// reports failure the registration is rolled back and the module dropped.
    pub fn load_module(
        &mut self,
        name: &str,
        mut module: Box<dyn PluginModule>,
        manifest: Option<&PluginManifest>,
    ) -> Result<(), LoadError> {
        if self.is_loaded(name) {
            return Err(LoadError::AlreadyLoaded(name.to_string()));
        }

        let registered = match manifest {
            Some(manifest) => {
                self.register(manifest.to_metadata())?;
                true
            }
            None => false,
        };

        if module.init() == Some(false) {
            tracing::warn!(plugin = name, "Plugin init entry point failed");
            if registered {
                self.unregister(name);
            }
            return Err(LoadError::InitFailed(name.to_string()));
        }

        tracing::info!(plugin = name, "Loaded plugin module");
        self.modules.push(LoadedModule {
            name: name.to_string(),
            module,
        });
        Ok(())
    }

    /// Opens a shared library and loads it as plugin `name`
    pub fn load_library(
        &mut self,
        path: &Path,
        name: &str,
        manifest: Option<&PluginManifest>,
    ) -> Result<(), LoadError> {
        if self.is_loaded(name) {
            return Err(LoadError::AlreadyLoaded(name.to_string()));
        }
        let library = DynamicLibrary::open(path, name)?;
        self.load_module(name, Box::new(library), manifest)
    }

    /// Runs the shutdown entry point, releases the module and unregisters the plugin
    pub fn unload(&mut self, name: &str) -> Result<(), LoadError> {
        let pos = self
            .modules
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| LoadError::NotLoaded(name.to_string()))?;

        let mut loaded = self.modules.remove(pos);
        loaded.module.shutdown();
        drop(loaded);
        self.unregister(name);

        tracing::info!(plugin = name, "Unloaded plugin module");
        Ok(())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.name == name)
    }

    /// Address of `symbol` exported by loaded plugin `plugin`
    pub fn symbol(&self, plugin: &str, symbol: &str) -> Option<*const c_void> {
        let loaded = self.modules.iter().find(|m| m.name == plugin)?;
        let address = loaded.module.symbol(symbol);
        if address.is_none() {
            tracing::warn!(plugin, symbol, "Symbol not found in plugin");
        }
        address
    }

    /// First loaded plugin that exports `symbol`
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&str> {
        self.modules
            .iter()
            .find(|m| m.module.symbol(symbol).is_some())
            .map(|m| m.name.as_str())
    }

    /// Loads up to `max` discovered plugins (0 means all), skipping ones
    /// already loaded. Returns how many were loaded.
    pub fn auto_load(&mut self, discovered: &[DiscoveredPlugin], max: usize) -> usize {
        let limit = if max == 0 { discovered.len() } else { max.min(discovered.len()) };
        let mut loaded = 0;

        for plugin in &discovered[..limit] {
            if self.is_loaded(&plugin.name) {
                continue;
            }
            match self.load_library(&plugin.module_path, &plugin.name, Some(&plugin.manifest)) {
                Ok(()) => loaded += 1,
                Err(err) => {
                    tracing::warn!(plugin = %plugin.name, error = %err, "Failed to load discovered plugin")
                }
            }
        }

        loaded
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        for loaded in self.modules.iter_mut().rev() {
            loaded.module.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::capability::Capability;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    fn registry() -> PluginRegistry {
        PluginRegistry::with_runtime_version(Version::new(0, 3, 0))
    }

    #[test]
    fn register_and_query() {
        let mut reg = registry();
        reg.register(PluginMetadata::new("canvas", "1.0.0").with_commands(100, 102))
            .unwrap();

        assert!(reg.is_active("canvas"));
        let info = reg.info("canvas").unwrap();
        assert_eq!(info.metadata.commands, CommandRange::new(100, 102));
        assert_eq!(info.handler_count, 0);
        assert!(!info.loaded);
        assert_eq!(reg.list().len(), 1);
    }

    #[test]
    fn overlapping_range_names_the_conflict() {
        let mut reg = registry();
        reg.register(PluginMetadata::new("a", "1.0.0").with_commands(100, 110))
            .unwrap();

        let err = reg
            .register(PluginMetadata::new("b", "1.0.0").with_commands(105, 120))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::RangeConflict {
                plugin: "b".to_string(),
                conflicting: "a".to_string()
            }
        );
        assert!(!reg.is_active("b"));

        reg.register(PluginMetadata::new("b", "1.0.0").with_commands(111, 120))
            .unwrap();
        assert!(reg.is_active("b"));
    }

    #[test]
    fn version_gate() {
        let mut reg = registry();
        let err = reg
            .register(PluginMetadata::new("future", "1.0.0").with_min_runtime("0.4.0"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::IncompatibleVersion { .. }));

        let err = reg
            .register(PluginMetadata::new("odd", "1.0.0").with_min_runtime("someday"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::IncompatibleVersion { .. }));

        reg.register(PluginMetadata::new("old", "1.0.0").with_min_runtime("0.2"))
            .unwrap();
    }

    #[test]
    fn invalid_ranges() {
        let mut reg = registry();
        for (start, end) in [(50, 60), (120, 110), (250, 300)] {
            let err = reg
                .register(PluginMetadata::new("bad", "1.0.0").with_commands(start, end))
                .unwrap_err();
            assert!(matches!(err, RegistryError::InvalidRange { .. }));
        }
    }

    #[test]
    fn plugins_without_commands_never_conflict() {
        let mut reg = registry();
        reg.register(PluginMetadata::new("theme", "1.0.0")).unwrap();
        reg.register(PluginMetadata::new("fonts", "1.0.0")).unwrap();
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = registry();
        reg.register(PluginMetadata::new("canvas", "1.0.0")).unwrap();
        let err = reg.register(PluginMetadata::new("canvas", "2.0.0")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("canvas".to_string()));
    }

    #[test]
    fn capabilities_checked_only_when_configured() {
        let mut reg = registry();
        reg.register(PluginMetadata::new("gl", "1.0.0").requiring("3d_rendering"))
            .unwrap();

        reg.set_backend_capabilities(BackendCapabilities::new().with(Capability::Shapes2d));
        let err = reg
            .register(PluginMetadata::new("vk", "1.0.0").requiring("3d_rendering"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingCapability {
                plugin: "vk".to_string(),
                capability: "3d_rendering".to_string()
            }
        );
        reg.register(PluginMetadata::new("flat", "1.0.0").requiring("2d_shapes"))
            .unwrap();
    }

    #[test]
    fn dispatch_counts_commands() {
        let mut reg = registry();
        reg.register(PluginMetadata::new("canvas", "1.0.0").with_commands(100, 102))
            .unwrap();
        reg.register_handler(100, |backend: &mut dyn Any, command: &[u8]| {
            if let Some(total) = backend.downcast_mut::<usize>() {
                *total += command.len();
            }
        })
        .unwrap();

        let mut total = 0usize;
        assert!(reg.dispatch_command(&mut total, 100, &[1, 2, 3]));
        assert!(!reg.dispatch_command(&mut total, 101, &[]));
        assert!(!reg.dispatch_command(&mut total, 5, &[]));
        assert_eq!(total, 3);

        let stats = reg.stats();
        assert_eq!(stats.commands_dispatched, 1);
        assert_eq!(stats.unknown_commands, 1);
        assert_eq!(reg.info("canvas").unwrap().handler_count, 1);

        reg.reset_stats();
        assert_eq!(reg.stats(), PluginStats::default());
    }

    #[test]
    fn handler_slots() {
        let mut reg = registry();
        let noop = |_: &mut dyn Any, _: &[u8]| {};
        assert_eq!(
            reg.register_handler(42, noop).unwrap_err(),
            RegistryError::CommandOutOfRange(42)
        );
        reg.register_handler(150, noop).unwrap();
        assert_eq!(
            reg.register_handler(150, noop).unwrap_err(),
            RegistryError::HandlerTaken(150)
        );
        assert!(reg.unregister_handler(150));
        assert!(!reg.has_handler(150));
    }

    #[test]
    fn unregister_drops_owned_handlers() {
        let mut reg = registry();
        reg.register(PluginMetadata::new("canvas", "1.0.0").with_commands(100, 102))
            .unwrap();
        reg.register_handler(101, |_: &mut dyn Any, _: &[u8]| {}).unwrap();
        reg.register_handler(200, |_: &mut dyn Any, _: &[u8]| {}).unwrap();

        assert!(reg.unregister("canvas"));
        assert!(!reg.has_handler(101));
        assert!(reg.has_handler(200));
        assert!(!reg.unregister("canvas"));
    }

    #[test]
    fn renderers_and_bridges() {
        let mut reg = registry();
        let kind = ComponentType::Plugin(3);
        reg.register_renderer(kind, |_: &mut dyn Any, _: &Node, _: Bounds| {})
            .unwrap();
        assert!(reg.register_renderer(kind, |_: &mut dyn Any, _: &Node, _: Bounds| {}).is_err());

        let node = Node::new(kind);
        assert!(reg.render_component(&mut (), &node, Bounds::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!reg.render_component(&mut (), &Node::new(ComponentType::Text), Bounds::default()));
        assert_eq!(reg.stats().components_rendered, 1);

        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        reg.register_callback_bridge(kind, move |id: u32| {
            seen.store(id, Ordering::SeqCst);
        })
        .unwrap();
        assert!(reg.dispatch_callback(kind, 77));
        assert_eq!(calls.load(Ordering::SeqCst), 77);
        assert!(!reg.dispatch_callback(ComponentType::Text, 1));
    }

    #[test]
    fn web_rendering_defaults_theme() {
        let mut reg = registry();
        let kind = ComponentType::Markdown;
        reg.register_web_renderer(
            kind,
            |_: &Node, theme: &str| Some(format!("<div class=\"{}\"></div>", theme)),
            Some(Box::new(|theme: &str| Some(format!(".md-{} {{}}", theme)))),
        )
        .unwrap();

        let node = Node::new(kind);
        assert_eq!(reg.render_web(&node, None).unwrap(), "<div class=\"light\"></div>");
        assert_eq!(reg.render_web(&node, Some("dark")).unwrap(), "<div class=\"dark\"></div>");
        assert_eq!(reg.web_stylesheet(kind, None).unwrap(), ".md-light {}");
        assert!(reg.web_stylesheet(ComponentType::Text, None).is_none());
    }

    #[test]
    fn event_types() {
        let mut reg = registry();
        reg.register_event_type("canvas", "draw", 120, Some("Frame drawn"))
            .unwrap();

        assert_eq!(reg.event_type_id("draw"), Some(120));
        assert_eq!(reg.event_type_name(120), Some("draw"));
        assert!(reg.has_event_type("draw"));

        assert_eq!(
            reg.register_event_type("canvas", "tick", 5, None).unwrap_err(),
            RegistryError::InvalidEventId(5)
        );
        assert_eq!(
            reg.register_event_type("other", "draw", 121, None).unwrap_err(),
            RegistryError::DuplicateEventName("draw".to_string())
        );
        assert_eq!(
            reg.register_event_type("other", "paint", 120, None).unwrap_err(),
            RegistryError::DuplicateEventId(120)
        );
    }

    #[test]
    fn requirement_storage() {
        let mut reg = registry();
        reg.set_requirements(vec!["canvas".to_string()]);
        assert_eq!(reg.requirements(), &["canvas".to_string()]);
        reg.clear_requirements();
        assert!(reg.requirements().is_empty());
    }
}
