//! # Document Codec
//!
//! Reads and writes the `kir` JSON interchange format.
//!
//! ## Document Layout
//!
//! ```text
//! {
//!   "format": "kir",
//!   "metadata": {...},
//!   "app": {...},
//!   "component_definitions": [...],
//!   "reactive_manifest": {...},
//!   "logic_block": {...},
//!   "root": {"id": 1, "type": "Column", "children": [...]},
//!   "required_plugins": [...],
//!   "sources": [...]
//! }
//! ```
//!
//! Every section except `root` is optional. Style, layout and payload
//! fields sit directly on the node object and are written only when they
//! differ from their default or carry a property binding.
//!
//! ## Key Types
//!
//! - [`Encoder`] - Document to JSON, in reference or full-tree mode
//! - [`Decoder`] - JSON to document, expanding component definitions
//! - [`StateContext`] - Variable values used for `{{name}}` substitution

mod decode;
mod encode;
mod template;
mod values;

pub use decode::{DecodeError, Decoder};
pub use encode::{EncodeError, EncodeMode, Encoder};
pub use template::{
    max_literal_id, next_node_id, reserve_above, DefinitionSource, DefinitionTable, StateContext,
    FIRST_GENERATED_ID, RAW_EXPRESSION_KEY,
};

/// Value of the top-level `format` key
pub const FORMAT: &str = "kir";
