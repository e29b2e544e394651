//! Document model
//!
//! The component tree and its value types, without any I/O concerns.
//!
//! ## Key Types
//!
//! - [`Tree`] / [`Node`]: arena-backed component tree addressed by [`NodeId`]
//! - [`ComponentType`]: closed set of kinds plus plugin extension types
//! - [`Style`] / [`Layout`]: value objects with documented defaults
//! - [`Payload`]: per-kind data, one variant per component kind
//! - [`Document`]: tree plus metadata, manifest and logic sections

mod component_type;
mod document;
mod event;
mod layout;
mod manifest;
mod node;
mod payload;
mod style;

pub use component_type::{ComponentType, ComponentTypeError};
pub use document::{AppProperties, Document, SourceEntry, SourceMetadata};
pub use event::{BindingKind, EventBinding, EventKind, HandlerSource, PropertyBinding};
pub use layout::{
    Alignment, Direction, DisplayMode, FlexDirection, Grid, GridTrack, Layout, UnicodeBidi,
};
pub use manifest::{
    ComponentDefinition, FunctionSource, LogicBlock, LogicEventBinding, LogicFunction, PropDef,
    ReactiveBinding, ReactiveConditional, ReactiveForLoop, ReactiveManifest, ReactiveVar,
    StateVar, VarRef,
};
pub use node::{
    EachBinding, ModuleRef, Node, NodeId, Provenance, SelectorType, Tree, TreeError,
    VisibleCondition,
};
pub use payload::{
    CellAlign, CellData, CodeBlockData, DropdownState, HeadingData, ImageData, LinkData,
    ListData, ListItemData, ModalState, Payload, PlaceholderData, TabData, TableColumn,
    TableConfig, VerticalAlign,
};
pub use style::{
    BackgroundClip, Border, Color, Dimension, Font, PositionMode, Spacing, TextAlign,
    TextDecoration, Transform, Style,
};
