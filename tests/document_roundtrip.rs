//! Round-trip tests for the document codec
//!
//! Trees built in memory are encoded, decoded again and compared field by
//! field. Fields left at their default are expected to come back as defaults.

use kir::codec::{Decoder, EncodeMode, Encoder};
use kir::domain::{
    BindingKind, Color, ComponentType, Dimension, Document, EventBinding, EventKind,
    FlexDirection, Node, Payload, PropertyBinding, Spacing, TableConfig, Tree,
};
use serde_json::{json, Value};

fn sample_document() -> Document {
    let mut tree = Tree::new();

    let mut root = Node::new(ComponentType::Column).with_id(1);
    root.style_mut().padding = Spacing::new(4.0, 8.0, 4.0, 8.0);
    root.style_mut().background = Color::rgb(255, 0, 0);
    root.layout_mut().gap = 12.0;
    let root = tree.add_node(root);

    let mut title = Node::new(ComponentType::Text).with_id(2).with_text("Hello");
    title.style_mut().font.size = 18.0;
    title.style_mut().font.color = Color::rgba(255, 0, 0, 128);
    let title = tree.add_node(title);

    let mut button = Node::new(ComponentType::Button).with_id(3).with_text("Go");
    let mut click = EventBinding::new(EventKind::Click);
    click.logic_id = Some("on_go".into());
    button.events.push(click);
    let button = tree.add_node(button);

    let mut table = Node::new(ComponentType::Table).with_id(4);
    table.payload = Some(Payload::Table(TableConfig {
        striped: true,
        ..TableConfig::default()
    }));
    let table = tree.add_node(table);

    tree.append_child(root, title).unwrap();
    tree.append_child(root, button).unwrap();
    tree.append_child(root, table).unwrap();
    tree.set_root(root).unwrap();

    Document::new(tree)
}

fn roundtrip(doc: &Document) -> Document {
    let text = Encoder::new().to_string(doc).unwrap();
    Decoder::new().decode_str(&text).unwrap()
}

fn node(doc: &Document, id: u32) -> &Node {
    doc.tree.get(doc.tree.find_by_id(id).unwrap()).unwrap()
}

#[test]
fn structure_survives() {
    let doc = roundtrip(&sample_document());

    assert_eq!(doc.tree.len(), 4);
    let root = doc.tree.root().unwrap();
    let ids: Vec<u32> = doc
        .tree
        .children(root)
        .iter()
        .map(|id| doc.tree.get(*id).unwrap().id)
        .collect();
    assert_eq!(ids, vec![2, 3, 4]);
}

#[test]
fn style_and_layout_survive() {
    let doc = roundtrip(&sample_document());

    let root = node(&doc, 1);
    let style = root.style.as_ref().unwrap();
    assert_eq!(style.padding, Spacing::new(4.0, 8.0, 4.0, 8.0));
    assert_eq!(style.background, Color::rgb(255, 0, 0));
    assert_eq!(root.layout.as_ref().unwrap().gap, 12.0);

    let title = node(&doc, 2);
    assert_eq!(title.text.as_deref(), Some("Hello"));
    let font = &title.style.as_ref().unwrap().font;
    assert_eq!(font.size, 18.0);
    assert_eq!(font.color, Color::rgba(255, 0, 0, 128));
}

#[test]
fn events_and_payloads_survive() {
    let doc = roundtrip(&sample_document());

    let button = node(&doc, 3);
    assert_eq!(button.events.len(), 1);
    assert_eq!(button.events[0].kind, EventKind::Click);
    assert_eq!(button.events[0].logic_id.as_deref(), Some("on_go"));

    match &node(&doc, 4).payload {
        Some(Payload::Table(config)) => {
            assert!(config.striped);
            assert_eq!(config.cell_padding, TableConfig::default().cell_padding);
        }
        other => panic!("expected table config, got {:?}", other),
    }
}

#[test]
fn encoding_is_stable() {
    let first = Encoder::new().to_value(&sample_document()).unwrap();
    let again = Encoder::new().to_value(&roundtrip(&sample_document())).unwrap();
    assert_eq!(first["root"], again["root"]);
}

#[test]
fn bound_default_survives() {
    let mut tree = Tree::new();
    let mut text = Node::new(ComponentType::Text).with_id(1);
    text.style_mut();
    text.bindings.push(PropertyBinding {
        property: "width".into(),
        source_expr: "layout.width".into(),
        resolved_value: "auto".into(),
        kind: BindingKind::Reactive,
    });
    let id = tree.add_node(text);
    tree.set_root(id).unwrap();

    let out = Encoder::new().to_value(&Document::new(tree)).unwrap();
    assert_eq!(out["root"]["width"], json!("auto"));
    assert_eq!(
        out["root"]["property_bindings"]["width"]["binding_type"],
        json!("reactive")
    );

    let doc = Decoder::new().decode_value(&out).unwrap();
    let root = doc.tree.get(doc.tree.root().unwrap()).unwrap();
    assert!(root.has_binding("width"));
    assert_eq!(root.style.as_ref().unwrap().width, Dimension::Auto);
}

#[test]
fn opaque_sections_pass_through() {
    let input = json!({
        "format": "kir",
        "metadata": {"source_language": "kry", "compiler_version": "0.3.0"},
        "app": {"windowTitle": "Demo", "windowWidth": 640},
        "stylesheet": {"rules": [{"selector": ".card", "padding": 4}]},
        "source_structures": {"const_defs": ["A"]},
        "c_metadata": {"includes": ["stdio.h"]},
        "root": {"id": 1, "type": "Container"},
        "sources": [{"lang": "kry", "code": "Container {}"}]
    });

    let doc = Decoder::new().decode_value(&input).unwrap();
    let out = Encoder::new().to_value(&doc).unwrap();

    for key in ["metadata", "app", "stylesheet", "source_structures", "c_metadata", "sources"] {
        assert_eq!(out[key], input[key], "section {}", key);
    }

    let keys: Vec<&str> = out.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "format",
            "metadata",
            "app",
            "stylesheet",
            "source_structures",
            "c_metadata",
            "root",
            "sources"
        ]
    );
}

#[test]
fn tab_bar_defaults_are_written_back() {
    let input = json!({"root": {"id": 1, "type": "TabBar"}});
    let doc = Decoder::new().decode_value(&input).unwrap();

    let bar = doc.tree.get(doc.tree.root().unwrap()).unwrap();
    assert_eq!(bar.layout.as_ref().unwrap().direction, FlexDirection::Row);

    let out: Value = Encoder::new().to_value(&doc).unwrap();
    assert_eq!(out["root"]["flexDirection"], json!("row"));
    assert_eq!(out["root"]["width"], json!("100.0%"));
}

#[test]
fn full_tree_mode_matches_reference_mode_without_instances() {
    let doc = sample_document();
    let root = doc.tree.root().unwrap();
    let encoder = Encoder::new();
    assert_eq!(
        encoder.encode_node(&doc.tree, root, EncodeMode::Reference).unwrap(),
        encoder.encode_node(&doc.tree, root, EncodeMode::FullTree).unwrap()
    );
}
