//! Component definition expansion through the decoder

use kir::codec::{Decoder, Encoder, StateContext};
use kir::domain::{ComponentType, Document, Node};
use serde_json::{json, Value};

fn counter_document() -> Value {
    json!({
        "format": "kir",
        "component_definitions": [{
            "name": "Counter",
            "props": [{"name": "start", "type": "int", "default": 0}],
            "state": [{"name": "count", "initial": {"var": "start"}}],
            "template": {
                "type": "Row",
                "children": [
                    {"type": "Text", "text": "Count: {{count}}", "text_expression": "{{count}}"},
                    {"type": "Button", "text": "+", "events": [{"type": "click", "logic_id": "inc"}]}
                ]
            }
        }],
        "root": {
            "id": 1,
            "type": "Column",
            "children": [
                {"id": 10, "type": "Counter", "start": 5},
                {"id": 20, "type": "Counter"}
            ]
        }
    })
}

fn decode(value: &Value) -> Document {
    Decoder::new().decode_value(value).unwrap()
}

fn node(doc: &Document, id: u32) -> &Node {
    doc.tree.get(doc.tree.find_by_id(id).unwrap()).unwrap()
}

fn subtree_ids(doc: &Document, id: u32) -> Vec<u32> {
    let root = doc.tree.find_by_id(id).unwrap();
    doc.tree
        .descendants(root)
        .into_iter()
        .map(|n| doc.tree.get(n).unwrap().id)
        .collect()
}

#[test]
fn instances_expand_with_their_own_props() {
    let doc = decode(&counter_document());

    let first = doc.tree.find_by_id(10).unwrap();
    let text = doc.tree.children(first)[0];
    assert_eq!(doc.tree.get(text).unwrap().text.as_deref(), Some("Count: 5"));

    let second = doc.tree.find_by_id(20).unwrap();
    let text = doc.tree.children(second)[0];
    assert_eq!(doc.tree.get(text).unwrap().text.as_deref(), Some("Count: 0"));
}

#[test]
fn expansion_root_keeps_instance_id() {
    let doc = decode(&counter_document());

    let instance = node(&doc, 10);
    assert_eq!(instance.kind, ComponentType::Row);
    assert_eq!(instance.component_ref.as_deref(), Some("Counter"));
    assert_eq!(
        instance.instance_props.as_ref().unwrap().get("start"),
        Some(&json!(5))
    );
}

#[test]
fn two_instances_have_disjoint_ids() {
    let doc = decode(&counter_document());

    let first = subtree_ids(&doc, 10);
    let second = subtree_ids(&doc, 20);
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert!(first.iter().all(|id| !second.contains(id)));
    assert!(first.iter().chain(&second).all(|id| *id != 1));
}

#[test]
fn each_subtree_is_owned_by_its_instance() {
    let doc = decode(&counter_document());

    for instance in [10, 20] {
        for id in subtree_ids(&doc, instance) {
            assert_eq!(node(&doc, id).owner_instance, instance);
        }
    }
    assert_eq!(node(&doc, 1).owner_instance, 0);
}

#[test]
fn raw_expressions_are_kept() {
    let doc = decode(&counter_document());

    let first = doc.tree.find_by_id(10).unwrap();
    let text = doc.tree.get(doc.tree.children(first)[0]).unwrap();
    assert_eq!(text.text_expression.as_deref(), Some("{{count}}"));
}

#[test]
fn instances_encode_as_references() {
    let doc = decode(&counter_document());
    let out = Encoder::new().to_value(&doc).unwrap();

    let children = out["root"]["children"].as_array().unwrap();
    assert_eq!(children[0], json!({"type": "Counter", "id": 10, "start": 5}));
    assert_eq!(children[1], json!({"type": "Counter", "id": 20}));
}

#[test]
fn missing_definition_leaves_node_unexpanded() {
    let doc = decode(&json!({
        "root": {"id": 1, "type": "Counter", "text": "literal"}
    }));

    let root = node(&doc, 1);
    assert_eq!(root.kind, ComponentType::Container);
    assert_eq!(root.text.as_deref(), Some("literal"));
    assert!(root.component_ref.is_none());
}

#[test]
fn recursive_definition_stops() {
    let doc = decode(&json!({
        "component_definitions": [{
            "name": "Loop",
            "template": {"type": "Column", "children": [{"type": "Loop"}]}
        }],
        "root": {"id": 1, "type": "Loop"}
    }));

    assert_eq!(doc.tree.len(), 2);
    assert_eq!(node(&doc, 1).kind, ComponentType::Column);
}

#[test]
fn substitution_of_plain_strings() {
    let mut ctx = StateContext::new();
    assert_eq!(ctx.substitute_str("Count: {{n}}"), "Count: {{n}}");
    ctx.insert("n", json!(5));
    assert_eq!(ctx.substitute_str("Count: {{n}}"), "Count: 5");
}
