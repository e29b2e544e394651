//! Plugin metadata and the `plugin.toml` descriptor
//!
//! A plugin directory carries a descriptor next to its loadable module:
//!
//! ```toml
//! [plugin]
//! name = "canvas"
//! version = "1.2.0"
//! description = "Immediate-mode drawing"
//! min_runtime_version = "0.3.0"
//!
//! [capabilities]
//! command_ids = [100, 101, 102]
//! backends = ["native", "web"]
//! required = ["2d_shapes"]
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// First command id available to plugins
pub const PLUGIN_COMMAND_START: u16 = 100;

/// Last command id available to plugins
pub const PLUGIN_COMMAND_END: u16 = 255;

/// Inclusive sub-range of command ids owned by one plugin.
///
/// `0..=0` means the plugin declares no commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CommandRange {
    pub start: u16,
    pub end: u16,
}

impl CommandRange {
    pub const EMPTY: CommandRange = CommandRange { start: 0, end: 0 };

    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Inside the plugin range and ordered
    pub fn is_valid(&self) -> bool {
        self.start >= PLUGIN_COMMAND_START && self.end <= PLUGIN_COMMAND_END && self.start <= self.end
    }

    pub fn contains(&self, id: u16) -> bool {
        !self.is_empty() && self.start <= id && id <= self.end
    }

    pub fn overlaps(&self, other: &CommandRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for CommandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// What a plugin declares when it registers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    /// Oldest runtime the plugin works with
    pub min_runtime_version: Option<String>,
    pub commands: CommandRange,
    /// Capability names the backend must provide
    pub required_capabilities: Vec<String>,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_commands(mut self, start: u16, end: u16) -> Self {
        self.commands = CommandRange::new(start, end);
        self
    }

    pub fn with_min_runtime(mut self, version: impl Into<String>) -> Self {
        self.min_runtime_version = Some(version.into());
        self
    }

    pub fn requiring(mut self, capability: impl Into<String>) -> Self {
        self.required_capabilities.push(capability.into());
        self
    }
}

/// Snapshot of an active plugin
#[derive(Debug, Clone, PartialEq)]
pub struct PluginInfo {
    pub metadata: PluginMetadata,
    /// Command handlers registered inside the plugin's range
    pub handler_count: usize,
    /// Backed by a loaded module
    pub loaded: bool,
}

/// `[plugin]` table of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSection {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_runtime_version: Option<String>,
}

/// `[capabilities]` table of a descriptor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesSection {
    pub command_ids: Vec<u16>,
    pub backends: Vec<String>,
    pub required: Vec<String>,
}

/// Parsed `plugin.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub plugin: PluginSection,
    #[serde(default)]
    pub capabilities: CapabilitiesSection,
}

impl PluginManifest {
    /// File name of the descriptor inside a plugin directory
    pub const FILE_NAME: &'static str = "plugin.toml";

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse plugin descriptor")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plugin descriptor: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid plugin descriptor: {}", path.display()))
    }

    /// Range spanning the declared command ids, empty when none are declared
    pub fn command_range(&self) -> CommandRange {
        let ids = &self.capabilities.command_ids;
        match (ids.iter().min(), ids.iter().max()) {
            (Some(start), Some(end)) => CommandRange::new(*start, *end),
            _ => CommandRange::EMPTY,
        }
    }

    pub fn to_metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: self.plugin.name.clone(),
            version: self.plugin.version.clone(),
            description: self.plugin.description.clone(),
            min_runtime_version: self.plugin.min_runtime_version.clone(),
            commands: self.command_range(),
            required_capabilities: self.capabilities.required.clone(),
        }
    }
}
