//! Definitions, reactive manifest and logic block
//!
//! These sections are layered over the static tree. The core preserves the
//! manifest and logic block as-is; it never evaluates them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::Tree;

/// A typed prop of a component definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDef {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// A state variable of a component definition.
///
/// `initial` is a literal, a `{"var": name}` reference (also accepted as a
/// JSON-encoded string) or a bare name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVar {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<Value>,
}

/// A named reusable template
#[derive(Debug, Clone, Default)]
pub struct ComponentDefinition {
    pub name: String,
    pub props: Vec<PropDef>,
    pub state: Vec<StateVar>,
    /// Always encoded as a full tree
    pub template: Tree,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>, template: Tree) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
            state: Vec::new(),
            template,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveVar {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// JSON text of the initial value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveBinding {
    pub component_id: u32,
    pub var_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// Condition on a named variable, written `{"var": name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarRef {
    pub var: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveConditional {
    pub component_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<VarRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependent_vars: Vec<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub then_children_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub else_children_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveForLoop {
    pub parent_component_id: u32,
    pub collection_var_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_expr: Option<String>,
}

/// Dynamic behavior described over the static tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveManifest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<ReactiveVar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<ReactiveBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditionals: Vec<ReactiveConditional>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub for_loops: Vec<ReactiveForLoop>,
}

impl ReactiveManifest {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.bindings.is_empty()
            && self.conditionals.is_empty()
            && self.for_loops.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionSource {
    pub language: String,
    pub source: String,
}

/// A named handler with one body per source language
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicFunction {
    pub name: String,
    pub sources: Vec<FunctionSource>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicEventBinding {
    pub component_id: u32,
    pub event_type: String,
    pub handler_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicBlock {
    pub functions: Vec<LogicFunction>,
    pub event_bindings: Vec<LogicEventBinding>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manifest_omits_empty_sections() {
        let manifest = ReactiveManifest {
            variables: vec![ReactiveVar {
                id: 1,
                name: Some("count".to_string()),
                ty: Some("int".to_string()),
                initial_value: Some("0".to_string()),
                scope: None,
            }],
            ..ReactiveManifest::default()
        };

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            value,
            json!({"variables": [{"id": 1, "name": "count", "type": "int", "initial_value": "0"}]})
        );
    }

    #[test]
    fn conditional_uses_var_object() {
        let value = json!({
            "component_id": 4,
            "condition": {"var": "open"},
            "then_children_ids": [5, 6]
        });
        let cond: ReactiveConditional = serde_json::from_value(value).unwrap();
        assert_eq!(cond.condition, Some(VarRef { var: "open".to_string() }));
        assert_eq!(cond.then_children_ids, vec![5, 6]);
        assert!(cond.else_children_ids.is_empty());
    }

    #[test]
    fn prop_definitions_tolerate_missing_fields() {
        let prop: PropDef = serde_json::from_value(json!({"name": "label"})).unwrap();
        assert_eq!(prop.ty, None);
        assert_eq!(prop.default, None);
    }
}
