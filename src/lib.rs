//! kir - Portable component-tree documents for a UI runtime
//!
//! A front end describes its UI as a tree of components and writes it out
//! as a `kir` JSON document. This crate decodes such documents into an
//! arena-backed [`Tree`], expanding reusable component definitions along
//! the way, encodes trees back, and hosts the plugin registry that extends
//! the command ids, component types and event types the runtime knows.

pub mod codec;
pub mod config;
pub mod domain;
pub mod plugin;

pub use codec::{Decoder, Encoder};
pub use config::RuntimeConfig;
pub use domain::{ComponentType, Document, Node, NodeId, Tree};
pub use plugin::{PluginLoader, PluginRegistry};
