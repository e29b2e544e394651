//! Handler traits for the registry's dispatch tables
//!
//! Every trait has a blanket impl for matching closures, so simple handlers
//! can be registered inline. The backend context is passed as `dyn Any`;
//! handlers downcast it to the concrete backend they support.

use std::any::Any;

use serde_json::Value;

use crate::domain::Node;

/// Screen rectangle a component is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Executes one plugin command against a backend
pub trait CommandHandler: Send + Sync {
    fn handle(&self, backend: &mut dyn Any, command: &[u8]);
}

impl<F> CommandHandler for F
where
    F: Fn(&mut dyn Any, &[u8]) + Send + Sync,
{
    fn handle(&self, backend: &mut dyn Any, command: &[u8]) {
        self(backend, command)
    }
}

/// Draws a component natively
pub trait ComponentRenderer: Send + Sync {
    fn render(&self, backend: &mut dyn Any, node: &Node, bounds: Bounds);
}

impl<F> ComponentRenderer for F
where
    F: Fn(&mut dyn Any, &Node, Bounds) + Send + Sync,
{
    fn render(&self, backend: &mut dyn Any, node: &Node, bounds: Bounds) {
        self(backend, node, bounds)
    }
}

/// Emits markup for a component
pub trait WebRenderer: Send + Sync {
    fn render_html(&self, node: &Node, theme: &str) -> Option<String>;
}

impl<F> WebRenderer for F
where
    F: Fn(&Node, &str) -> Option<String> + Send + Sync,
{
    fn render_html(&self, node: &Node, theme: &str) -> Option<String> {
        self(node, theme)
    }
}

/// Produces the stylesheet that accompanies a web renderer
pub trait StylesheetGenerator: Send + Sync {
    fn stylesheet(&self, theme: &str) -> Option<String>;
}

impl<F> StylesheetGenerator for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn stylesheet(&self, theme: &str) -> Option<String> {
        self(theme)
    }
}

/// Forwards a component's user callback to the embedding language
pub trait CallbackBridge: Send + Sync {
    fn invoke(&self, component_id: u32);
}

impl<F> CallbackBridge for F
where
    F: Fn(u32) + Send + Sync,
{
    fn invoke(&self, component_id: u32) {
        self(component_id)
    }
}

/// Converts a plugin payload to and from its document form
pub trait PayloadCodec: Send + Sync {
    fn encode(&self, data: &Value) -> anyhow::Result<Value>;

    /// Returns `None` when the document value is not a valid payload
    fn decode(&self, value: &Value) -> Option<Value>;
}
