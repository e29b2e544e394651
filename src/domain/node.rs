//! Component nodes and the arena tree that owns them
//!
//! Nodes live in a [`Tree`] arena and refer to each other by [`NodeId`]
//! index. A node's parent is an index, never an owning pointer, so a subtree
//! can be detached or dropped without chasing back-references.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use super::component_type::ComponentType;
use super::event::{EventBinding, PropertyBinding};
use super::layout::Layout;
use super::payload::Payload;
use super::style::Style;

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("Cannot attach {child} under {parent}: it would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a stylesheet selector addresses the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorType {
    #[default]
    Element,
    Class,
    Id,
}

/// Who produced a node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Provenance {
    pub generated_by: Option<String>,
    pub iteration_index: u32,
    pub is_template: bool,
}

/// `$module:` reference recorded on an expanded instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub path: String,
    pub export: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleCondition {
    pub condition: String,
    pub when_true: bool,
}

/// Iteration binding produced by `for each` constructs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EachBinding {
    pub source: Option<String>,
    pub item_name: Option<String>,
    pub index_name: Option<String>,
}

/// One component instance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    /// Document id, unique within one decoded tree
    pub id: u32,
    pub kind: ComponentType,
    pub tag: Option<String>,
    pub text: Option<String>,
    /// Reactive source of `text`, never substituted
    pub text_expression: Option<String>,
    pub css_class: Option<String>,
    pub selector: SelectorType,
    pub scope: Option<String>,
    pub style: Option<Style>,
    pub layout: Option<Layout>,
    /// Registration order is preserved
    pub events: Vec<EventBinding>,
    pub bindings: Vec<PropertyBinding>,
    pub payload: Option<Payload>,
    pub provenance: Option<Provenance>,
    /// Name of the definition this node instantiates
    pub component_ref: Option<String>,
    pub instance_props: Option<Map<String, Value>>,
    pub module_ref: Option<ModuleRef>,
    /// Id of the expansion root this node belongs to, 0 if none
    pub owner_instance: u32,
    pub visibility: Option<VisibleCondition>,
    pub each: Option<EachBinding>,
    pub custom_data: Option<Value>,
    /// Plugin command ids this node issues
    pub commands: Vec<u16>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: ComponentType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Returns true when a property binding targets `property`
    pub fn has_binding(&self, property: &str) -> bool {
        self.bindings.iter().any(|b| b.property == property)
    }

    pub fn style_mut(&mut self) -> &mut Style {
        self.style.get_or_insert_with(Style::default)
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        self.layout.get_or_insert_with(Layout::default)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena of nodes with one optional root
#[derive(Debug, Clone, Default)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a detached node and returns its index
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is moved, so it stays owned by
    /// exactly one parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }

        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
        if self.root == Some(child) {
            self.root = None;
        }
        Ok(())
    }

    pub fn set_root(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.node(id)?;
        self.detach(id);
        self.root = Some(id);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Pre-order walk of `id` and everything below it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Frees `id` and its whole subtree; returns how many nodes were removed
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let doomed = self.descendants(id);
        if doomed.is_empty() {
            return 0;
        }

        self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }
        for node in &doomed {
            self.slots[node.0] = None;
        }
        doomed.len()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds a live node by document id
    pub fn find_by_id(&self, id: u32) -> Option<NodeId> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|n| n.id == id))
            .map(NodeId)
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == candidate {
                return true;
            }
            match self.parent(id) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }
}
