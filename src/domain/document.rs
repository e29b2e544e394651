//! The in-memory document: a tree plus its top-level sections

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::manifest::{ComponentDefinition, LogicBlock, ReactiveManifest};
use super::node::Tree;

/// Where a document came from
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl SourceMetadata {
    /// Metadata for `language` stamped with the current UTC time
    pub fn stamped(language: impl Into<String>) -> Self {
        Self {
            source_language: Some(language.into()),
            compiler_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            source_file: None,
        }
    }
}

/// Window properties of the application
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_height: Option<u32>,
}

/// Embedded source text in one language
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEntry {
    pub lang: String,
    pub code: String,
}

/// A decoded or to-be-encoded document
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub metadata: Option<SourceMetadata>,
    pub app: Option<AppProperties>,
    /// Only populated by producers; decoding consumes definitions
    pub definitions: Vec<ComponentDefinition>,
    pub manifest: Option<ReactiveManifest>,
    pub stylesheet: Option<Value>,
    pub source_structures: Option<Value>,
    pub c_metadata: Option<Value>,
    pub logic: Option<LogicBlock>,
    pub tree: Tree,
    pub required_plugins: Vec<String>,
    pub sources: Vec<SourceEntry>,
}

impl Document {
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamped_metadata_has_timestamp() {
        let meta = SourceMetadata::stamped("kry");
        assert_eq!(meta.source_language.as_deref(), Some("kry"));
        let stamp = meta.timestamp.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn app_properties_use_camel_case() {
        let app = AppProperties {
            window_title: Some("Demo".to_string()),
            window_width: Some(800),
            window_height: None,
        };
        let value = serde_json::to_value(&app).unwrap();
        assert_eq!(value, serde_json::json!({"windowTitle": "Demo", "windowWidth": 800}));
    }
}
