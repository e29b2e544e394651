//! Template expansion
//!
//! A component definition is expanded at the JSON level: the instance's
//! props and the definition's state initials form a [`StateContext`], the
//! template is cloned with every `{{name}}` token replaced from it, and the
//! result is decoded like any other node. The decoder then gives the new
//! subtree fresh ids from [`next_node_id`] and tags it with its owner.
//!
//! Values under `text_expression` are copied unsubstituted so reactive
//! re-evaluation still sees the original expression.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{PropDef, StateVar};

/// First id handed out for generated nodes
pub const FIRST_GENERATED_ID: u32 = 1000;

/// Key whose value is never substituted
pub const RAW_EXPRESSION_KEY: &str = "text_expression";

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(FIRST_GENERATED_ID);

/// Next id for a generated node. Ids are process-wide and never reused.
pub fn next_node_id() -> u32 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Ensures generated ids stay above `id`
pub fn reserve_above(id: u32) {
    NEXT_NODE_ID.fetch_max(id.saturating_add(1), Ordering::Relaxed);
}

/// A definition as it appears in `component_definitions`
#[derive(Debug, Clone, Deserialize)]
pub struct DefinitionSource {
    pub name: String,
    #[serde(default)]
    pub props: Vec<PropDef>,
    #[serde(default)]
    pub state: Vec<StateVar>,
    #[serde(default)]
    pub template: Value,
}

/// Definitions available to one decode call, by name
#[derive(Debug, Default)]
pub struct DefinitionTable {
    defs: HashMap<String, DefinitionSource>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from a `component_definitions` array; malformed entries are skipped.
    pub fn from_json(defs: &Value) -> Self {
        let mut table = Self::new();
        table.extend_scoped(None, defs);
        table
    }

    /// Adds every definition in `defs`, keyed `<scope>/<name>` when a scope is given
    pub fn extend_scoped(&mut self, scope: Option<&str>, defs: &Value) -> usize {
        let mut added = 0;
        for def in defs.as_array().into_iter().flatten() {
            match DefinitionSource::deserialize(def) {
                Ok(def) => {
                    let key = match scope {
                        Some(scope) => format!("{}/{}", scope, def.name),
                        None => def.name.clone(),
                    };
                    self.insert(key, def);
                    added += 1;
                }
                Err(err) => tracing::debug!(error = %err, "Skipping malformed component definition"),
            }
        }
        added
    }

    /// Adds or replaces a definition; the last one registered under a name wins
    pub fn insert(&mut self, name: String, def: DefinitionSource) {
        self.defs.insert(name, def);
    }

    pub fn get(&self, name: &str) -> Option<&DefinitionSource> {
        self.defs.get(name)
    }

    /// First definition registered under `<module>/`
    pub fn first_in_module(&self, module: &str) -> Option<&DefinitionSource> {
        let prefix = format!("{}/", module);
        let mut names: Vec<&String> = self.defs.keys().filter(|k| k.starts_with(&prefix)).collect();
        names.sort();
        names.first().and_then(|name| self.defs.get(*name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Variable values visible to one expansion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateContext {
    values: Map<String, Value>,
}

impl StateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prop defaults, overridden by the instance, then state initials
    pub fn build(def: &DefinitionSource, instance: &Map<String, Value>) -> Self {
        let mut ctx = Self::new();

        for prop in &def.props {
            let value = instance
                .get(&prop.name)
                .filter(|v| is_scalar(v))
                .or(prop.default.as_ref().filter(|v| is_scalar(v)))
                .cloned()
                .unwrap_or_else(|| Value::from(0));
            ctx.insert(prop.name.clone(), value);
        }

        for var in &def.state {
            let value = ctx.initial_value(var.initial.as_ref());
            ctx.insert(var.name.clone(), value);
        }

        ctx
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Resolves a state initial against the values built so far; anything unresolved is 0.
    fn initial_value(&self, initial: Option<&Value>) -> Value {
        let zero = Value::from(0);
        let lookup = |name: &str| self.get(name).cloned().unwrap_or_else(|| zero.clone());

        match initial {
            None | Some(Value::Null) => zero.clone(),
            Some(Value::Object(obj)) => match obj.get("var").and_then(Value::as_str) {
                Some(name) => lookup(name),
                None => zero.clone(),
            },
            Some(Value::String(s)) => {
                if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(s) {
                    if let Some(name) = obj.get("var").and_then(Value::as_str) {
                        return lookup(name);
                    }
                }
                if s.starts_with('{') {
                    return zero.clone();
                }
                lookup(s.trim())
            }
            Some(literal) => literal.clone(),
        }
    }

    /// Replaces every `{{name}}` in `text`; unknown names are left as written.
    pub fn substitute_str(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let token = &rest[start..start + 2 + len + 2];
            let name = rest[start + 2..start + 2 + len].trim();

            out.push_str(&rest[..start]);
            match self.get(name) {
                Some(value) => out.push_str(&display_value(value)),
                None => out.push_str(token),
            }
            rest = &rest[start + token.len()..];
        }

        out.push_str(rest);
        out
    }

    /// Deep copy of `value` with every string leaf substituted, except under `text_expression`
    pub fn substitute(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.substitute_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.substitute(v)).collect()),
            Value::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(key, v)| {
                        let v = if key == RAW_EXPRESSION_KEY {
                            v.clone()
                        } else {
                            self.substitute(v)
                        };
                        (key.clone(), v)
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Number(_) | Value::String(_) | Value::Bool(_))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Largest `id` found anywhere in a document
pub fn max_literal_id(value: &Value) -> Option<u32> {
    match value {
        Value::Object(obj) => {
            let own = obj.get("id").and_then(super::values::as_u32);
            obj.values().filter_map(max_literal_id).chain(own).max()
        }
        Value::Array(items) => items.iter().filter_map(max_literal_id).max(),
        _ => None,
    }
}
