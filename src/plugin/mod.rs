//! # Plugin System
//!
//! Extensibility layer: plugins extend the command ids, component types and
//! event types the runtime understands.
//!
//! ## Overview
//!
//! A plugin registers [`PluginMetadata`] with the [`PluginRegistry`] and then
//! attaches handlers to the slots it owns. Plugins may be statically linked
//! or loaded from shared libraries found by [`PluginLoader`].
//!
//! ## Command ID Space
//!
//! | Range | Owner |
//! |-------|-------|
//! | `0..100` | Core commands |
//! | `100..=255` | Plugins, one contiguous sub-range each |
//!
//! A plugin with the range `0..=0` declares no commands.
//!
//! ## Registration Checks
//!
//! 1. Minimum runtime version
//! 2. Command range lies in `100..=255` and is ordered
//! 3. Range does not overlap an active plugin (the first conflict is named)
//! 4. Name is not already active
//! 5. Required capabilities are supported, when the backend declared any
//!
//! ## Plugin Discovery
//!
//! ```text
//! <search dir>/
//! └── canvas/
//!     ├── plugin.toml
//!     └── build/libkir_canvas.so
//! ```
//!
//! ## Key Types
//!
//! - [`PluginRegistry`] - Active plugins, handler tables, loaded modules
//! - [`PluginLoader`] - Discovers plugin directories
//! - [`PluginManifest`] - Parsed `plugin.toml`
//! - [`PluginModule`] - Init/shutdown/symbol interface of a loaded module

mod capability;
mod handlers;
mod loader;
mod manifest;
mod module;
mod registry;
mod scanner;
mod version;

pub use capability::{BackendCapabilities, Capability};
pub use handlers::{
    Bounds, CallbackBridge, CommandHandler, ComponentRenderer, PayloadCodec, StylesheetGenerator,
    WebRenderer,
};
pub use loader::{module_file_name, DiscoveredPlugin, PluginLoader};
pub use manifest::{
    CapabilitiesSection, CommandRange, PluginInfo, PluginManifest, PluginMetadata, PluginSection,
    PLUGIN_COMMAND_END, PLUGIN_COMMAND_START,
};
pub use module::{init_symbol, shutdown_symbol, DynamicLibrary, InitFn, LoadError, PluginModule, ShutdownFn};
pub use registry::{PluginEventType, PluginRegistry, PluginStats, RegistryError, PLUGIN_EVENT_START};
pub use scanner::{collect_commands, scan_requirements, WELL_KNOWN_RANGES};
pub use version::{is_compatible, Version, VersionError, RUNTIME_VERSION};
