//! Document encoding
//!
//! [`Encoder`] turns a [`Document`] into its JSON form. The primary tree is
//! written in [`EncodeMode::Reference`]: a node that came from a component
//! definition instance is written as the instance (`type` = definition name,
//! `id`, flattened props), not as its expanded subtree. Definition
//! templates are written in [`EncodeMode::FullTree`].
//!
//! Style and layout fields are written flat on the node object and omitted
//! while at their default, unless a property binding names the field.

use serde_json::{Map, Value};
use thiserror::Error;

use super::values::{
    decoration_to_string, name_of, number, put_opt_str, spacing_to_json, ALIGNMENTS,
    BACKGROUND_CLIPS, BIDI_MODES, CELL_ALIGNS, DIRECTIONS, DISPLAY_MODES, FLEX_DIRECTIONS,
    POSITIONS, SELECTORS, TEXT_ALIGNS, VERTICAL_ALIGNS,
};
use super::FORMAT;
use crate::domain::{
    ComponentDefinition, ComponentType, Dimension, Document, EventKind, FlexDirection,
    GridTrack, Layout, Node, NodeId, Payload, Style, Tree,
};
use crate::plugin::{scan_requirements, PluginRegistry};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Document has no root node")]
    NoRoot,

    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("Failed to encode plugin payload of {kind}: {source}")]
    Payload {
        kind: ComponentType,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to render document text: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// Definition instances are written as references
    #[default]
    Reference,
    /// Every node is expanded; used for definition templates
    FullTree,
}

/// Writes documents, optionally consulting a plugin registry for plugin
/// payloads, plugin event names and required plugins
#[derive(Default, Clone, Copy)]
pub struct Encoder<'a> {
    registry: Option<&'a PluginRegistry>,
}

impl<'a> Encoder<'a> {
    pub fn new() -> Self {
        Self { registry: None }
    }

    pub fn with_registry(registry: &'a PluginRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// Pretty-printed document text
    pub fn to_string(&self, doc: &Document) -> Result<String, EncodeError> {
        let value = self.to_value(doc)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// The whole document; fails without producing partial output.
    pub fn to_value(&self, doc: &Document) -> Result<Value, EncodeError> {
        let root = doc.tree.root().ok_or(EncodeError::NoRoot)?;
        let mut out = Map::new();

        out.insert("format".into(), Value::from(FORMAT));
        if let Some(metadata) = &doc.metadata {
            out.insert("metadata".into(), serde_json::to_value(metadata)?);
        }
        if let Some(app) = &doc.app {
            let app = serde_json::to_value(app)?;
            if app.as_object().is_some_and(|o| !o.is_empty()) {
                out.insert("app".into(), app);
            }
        }
        if !doc.definitions.is_empty() {
            let defs = doc
                .definitions
                .iter()
                .map(|def| self.encode_definition(def))
                .collect::<Result<Vec<_>, _>>()?;
            out.insert("component_definitions".into(), Value::Array(defs));
        }
        if let Some(manifest) = doc.manifest.as_ref().filter(|m| !m.is_empty()) {
            out.insert("reactive_manifest".into(), serde_json::to_value(manifest)?);
        }
        for (key, block) in [
            ("stylesheet", &doc.stylesheet),
            ("source_structures", &doc.source_structures),
            ("c_metadata", &doc.c_metadata),
        ] {
            if let Some(block) = block {
                out.insert(key.into(), block.clone());
            }
        }
        if let Some(logic) = &doc.logic {
            out.insert("logic_block".into(), serde_json::to_value(logic)?);
        }

        out.insert(
            "root".into(),
            self.encode_node(&doc.tree, root, EncodeMode::Reference)?,
        );

        let mut required = scan_requirements(&doc.tree, root, self.registry);
        required.extend(doc.required_plugins.iter().cloned());
        required.sort();
        required.dedup();
        if !required.is_empty() {
            out.insert("required_plugins".into(), Value::from(required));
        }

        if !doc.sources.is_empty() {
            out.insert("sources".into(), serde_json::to_value(&doc.sources)?);
        }

        Ok(Value::Object(out))
    }

    /// A definition with its template in full-tree mode
    pub fn encode_definition(&self, def: &ComponentDefinition) -> Result<Value, EncodeError> {
        let mut out = Map::new();
        out.insert("name".into(), Value::from(def.name.as_str()));
        out.insert("props".into(), serde_json::to_value(&def.props)?);
        out.insert("state".into(), serde_json::to_value(&def.state)?);
        if let Some(root) = def.template.root() {
            out.insert(
                "template".into(),
                self.encode_node(&def.template, root, EncodeMode::FullTree)?,
            );
        }
        Ok(Value::Object(out))
    }

    /// One node and, unless it is written as a reference, its subtree
    pub fn encode_node(&self, tree: &Tree, id: NodeId, mode: EncodeMode) -> Result<Value, EncodeError> {
        let node = tree.get(id).ok_or(EncodeError::UnknownNode(id))?;

        if mode == EncodeMode::Reference {
            if let Some(reference) = encode_reference(node) {
                return Ok(reference);
            }
        }

        let mut obj = Map::new();
        obj.insert("id".into(), Value::from(node.id));
        obj.insert("type".into(), Value::from(node.kind.to_string()));
        put_opt_str(&mut obj, "tag", node.tag.as_deref());

        match (mode, node.text_expression.as_deref()) {
            // Templates keep placeholders in both fields
            (EncodeMode::FullTree, Some(expr)) if !expr.is_empty() => {
                obj.insert("text".into(), Value::from(expr));
                obj.insert("text_expression".into(), Value::from(expr));
            }
            _ => {
                put_opt_str(&mut obj, "text", node.text.as_deref().filter(|t| !t.is_empty()));
                put_opt_str(
                    &mut obj,
                    "text_expression",
                    node.text_expression.as_deref().filter(|t| !t.is_empty()),
                );
            }
        }

        if mode == EncodeMode::FullTree {
            put_opt_str(&mut obj, "component_ref", node.component_ref.as_deref());
            if let Some(module) = &node.module_ref {
                obj.insert("module_ref".into(), Value::from(module.path.as_str()));
                put_opt_str(&mut obj, "export_name", module.export.as_deref());
            }
        }

        put_opt_str(&mut obj, "css_class", node.css_class.as_deref());
        if node.css_class.is_some() || node.selector != Default::default() {
            obj.insert(
                "selector_type".into(),
                Value::from(name_of(SELECTORS, node.selector)),
            );
        }
        put_opt_str(&mut obj, "scope", node.scope.as_deref());

        if let Some(style) = &node.style {
            encode_style(&mut obj, style, node);
        }
        if let Some(layout) = &node.layout {
            encode_layout(&mut obj, layout, node);
        }
        if let Some(payload) = node.payload.as_ref().filter(|p| p.matches(node.kind)) {
            self.encode_payload(&mut obj, payload, node)?;
        }

        if !node.events.is_empty() {
            let events = node.events.iter().map(|e| self.encode_event(e)).collect();
            obj.insert("events".into(), Value::Array(events));
        }

        if !node.bindings.is_empty() {
            let bindings: Map<String, Value> = node
                .bindings
                .iter()
                .map(|b| {
                    let mut entry = Map::new();
                    entry.insert("source_expr".into(), Value::from(b.source_expr.as_str()));
                    entry.insert("resolved_value".into(), Value::from(b.resolved_value.as_str()));
                    entry.insert("binding_type".into(), Value::from(b.kind.as_str()));
                    (b.property.clone(), Value::Object(entry))
                })
                .collect();
            obj.insert("property_bindings".into(), Value::Object(bindings));
        }

        if let Some(provenance) = &node.provenance {
            if let Some(by) = &provenance.generated_by {
                let mut meta = Map::new();
                meta.insert("generated_by".into(), Value::from(by.as_str()));
                if provenance.iteration_index > 0 {
                    meta.insert("iteration_index".into(), Value::from(provenance.iteration_index));
                }
                if provenance.is_template {
                    meta.insert("is_template".into(), Value::from(true));
                }
                obj.insert("source_metadata".into(), Value::Object(meta));
            }
        }

        if let Some(visibility) = &node.visibility {
            obj.insert("visible_condition".into(), Value::from(visibility.condition.as_str()));
            obj.insert("visible_when_true".into(), Value::from(visibility.when_true));
        }
        if let Some(each) = &node.each {
            put_opt_str(&mut obj, "each_source", each.source.as_deref());
            put_opt_str(&mut obj, "each_item_name", each.item_name.as_deref());
            put_opt_str(&mut obj, "each_index_name", each.index_name.as_deref());
        }
        if let Some(custom) = &node.custom_data {
            obj.insert("custom_data".into(), custom.clone());
        }
        if !node.commands.is_empty() {
            obj.insert("commands".into(), Value::from(node.commands.clone()));
        }

        let children = tree.children(id);
        if !children.is_empty() {
            let children = children
                .iter()
                .map(|child| self.encode_node(tree, *child, mode))
                .collect::<Result<Vec<_>, _>>()?;
            obj.insert("children".into(), Value::Array(children));
        }

        Ok(Value::Object(obj))
    }

    fn encode_event(&self, event: &crate::domain::EventBinding) -> Value {
        let mut obj = Map::new();

        let name = match event.kind {
            EventKind::Plugin(id) => event
                .name
                .clone()
                .or_else(|| {
                    self.registry
                        .and_then(|r| r.event_type_name(id))
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "unknown_plugin_event".to_string()),
            EventKind::Custom => event.name.clone().unwrap_or_else(|| "custom".to_string()),
            kind => kind.to_string(),
        };
        obj.insert("type".into(), Value::from(name));

        put_opt_str(&mut obj, "logic_id", event.logic_id.as_deref().filter(|s| !s.is_empty()));
        put_opt_str(
            &mut obj,
            "handler_data",
            event.handler_data.as_deref().filter(|s| !s.is_empty()),
        );
        if event.bytecode_function_id != 0 {
            obj.insert(
                "bytecode_function_id".into(),
                Value::from(event.bytecode_function_id),
            );
        }

        if let Some(source) = &event.handler_source {
            let mut src = Map::new();
            src.insert("language".into(), Value::from(source.language.as_str()));
            src.insert("code".into(), Value::from(source.code.as_str()));
            put_opt_str(&mut src, "file", source.file.as_deref());
            src.insert("line".into(), Value::from(source.line));
            src.insert("uses_closures".into(), Value::from(source.uses_closures));
            if source.uses_closures && !source.closure_vars.is_empty() {
                src.insert("closure_vars".into(), Value::from(source.closure_vars.clone()));
            }
            obj.insert("handler_source".into(), Value::Object(src));
        }

        Value::Object(obj)
    }

    fn encode_payload(
        &self,
        obj: &mut Map<String, Value>,
        payload: &Payload,
        node: &Node,
    ) -> Result<(), EncodeError> {
        match payload {
            Payload::Checkbox { checked } => {
                obj.insert("checked".into(), Value::from(*checked));
            }
            Payload::Image(image) => {
                obj.insert("src".into(), Value::from(image.src.as_str()));
                put_opt_str(obj, "alt", image.alt.as_deref());
            }
            Payload::Dropdown(state) => {
                let mut out = Map::new();
                out.insert("placeholder".into(), Value::from(state.placeholder.as_str()));
                if !state.options.is_empty() {
                    out.insert("options".into(), Value::from(state.options.clone()));
                }
                out.insert("selectedIndex".into(), Value::from(state.selected_index));
                out.insert("isOpen".into(), Value::from(state.is_open));
                obj.insert("dropdown_state".into(), Value::Object(out));
            }
            Payload::Modal(state) => {
                let mut out = Map::new();
                out.insert("isOpen".into(), Value::from(state.is_open));
                put_opt_str(&mut out, "title", state.title.as_deref());
                obj.insert("modal_state".into(), Value::Object(out));
            }
            Payload::Table(config) => {
                let columns: Vec<Value> = config
                    .columns
                    .iter()
                    .map(|col| {
                        let mut out = Map::new();
                        out.insert("width".into(), Value::from(col.width.to_string()));
                        if !col.min_width.is_auto() {
                            out.insert("minWidth".into(), Value::from(col.min_width.to_string()));
                        }
                        if !col.max_width.is_auto() {
                            out.insert("maxWidth".into(), Value::from(col.max_width.to_string()));
                        }
                        if col.alignment != Default::default() {
                            out.insert(
                                "alignment".into(),
                                Value::from(name_of(CELL_ALIGNS, col.alignment)),
                            );
                        }
                        out.insert("autoSize".into(), Value::from(col.auto_size));
                        Value::Object(out)
                    })
                    .collect();

                let mut out = Map::new();
                if !columns.is_empty() {
                    out.insert("columns".into(), Value::Array(columns));
                }
                out.insert("borderColor".into(), Value::from(config.border_color.to_string()));
                out.insert(
                    "headerBackground".into(),
                    Value::from(config.header_background.to_string()),
                );
                out.insert(
                    "evenRowBackground".into(),
                    Value::from(config.even_row_background.to_string()),
                );
                out.insert(
                    "oddRowBackground".into(),
                    Value::from(config.odd_row_background.to_string()),
                );
                out.insert("borderWidth".into(), number(config.border_width));
                out.insert("cellPadding".into(), number(config.cell_padding));
                out.insert("showBorders".into(), Value::from(config.show_borders));
                out.insert("striped".into(), Value::from(config.striped));
                out.insert("headerSticky".into(), Value::from(config.header_sticky));
                out.insert("collapseBorders".into(), Value::from(config.collapse_borders));
                obj.insert("table_config".into(), Value::Object(out));
            }
            Payload::Cell(cell) => {
                let mut out = Map::new();
                out.insert("colspan".into(), Value::from(cell.colspan));
                out.insert("rowspan".into(), Value::from(cell.rowspan));
                out.insert("alignment".into(), Value::from(name_of(CELL_ALIGNS, cell.alignment)));
                out.insert(
                    "verticalAlignment".into(),
                    Value::from(name_of(VERTICAL_ALIGNS, cell.vertical_alignment)),
                );
                obj.insert("cell_data".into(), Value::Object(out));
            }
            Payload::Tab(tab) => {
                emit(obj, node, "title", tab.title.is_some(), || opt_str(tab.title.as_deref()));
                emit(obj, node, "reorderable", tab.reorderable, || Value::from(tab.reorderable));
                emit(obj, node, "selectedIndex", tab.selected_index != 0, || {
                    Value::from(tab.selected_index)
                });
                for (key, color) in [
                    ("activeBackground", &tab.active_background),
                    ("textColor", &tab.text_color),
                    ("activeTextColor", &tab.active_text_color),
                ] {
                    emit(obj, node, key, !color.is_transparent(), || Value::from(color.to_string()));
                }
            }
            Payload::Heading(heading) => {
                obj.insert("level".into(), Value::from(heading.level));
                if node.text.is_none() {
                    put_opt_str(obj, "text", heading.text.as_deref());
                }
                put_opt_str(obj, "id_attr", heading.anchor.as_deref());
            }
            Payload::CodeBlock(code) => {
                put_opt_str(obj, "language", code.language.as_deref());
                obj.insert("code".into(), Value::from(code.code.as_str()));
                obj.insert("showLineNumbers".into(), Value::from(code.show_line_numbers));
                emit(obj, node, "startLine", code.start_line != 1, || Value::from(code.start_line));
            }
            Payload::List(list) => {
                let kind = if list.ordered { "ordered" } else { "unordered" };
                obj.insert("listType".into(), Value::from(kind));
                emit(obj, node, "start", list.ordered && list.start > 1, || {
                    Value::from(list.start)
                });
                obj.insert("tight".into(), Value::from(list.tight));
            }
            Payload::ListItem(item) => {
                emit(obj, node, "marker", item.marker.is_some(), || opt_str(item.marker.as_deref()));
                emit(obj, node, "number", item.number > 0, || Value::from(item.number));
                emit(obj, node, "isTask", item.is_task, || Value::from(item.is_task));
                emit(obj, node, "checked", item.is_task, || Value::from(item.checked));
            }
            Payload::Link(link) => {
                obj.insert("url".into(), Value::from(link.url.as_str()));
                put_opt_str(obj, "title", link.title.as_deref());
                put_opt_str(obj, "target", link.target.as_deref());
                put_opt_str(obj, "rel", link.rel.as_deref());
            }
            Payload::Placeholder(placeholder) => {
                obj.insert("placeholder_name".into(), Value::from(placeholder.name.as_str()));
                emit(obj, node, "preserve", placeholder.preserve, || Value::from(placeholder.preserve));
            }
            Payload::Plugin(data) => {
                let encoded = match self.registry.and_then(|r| r.payload_codec(node.kind)) {
                    Some(codec) => codec.encode(data).map_err(|err| EncodeError::Payload {
                        kind: node.kind,
                        source: err.into(),
                    })?,
                    None => data.clone(),
                };
                obj.insert("plugin_data".into(), encoded);
            }
        }
        Ok(())
    }
}

/// Reference form of a definition or module instance, if `node` is one
fn encode_reference(node: &Node) -> Option<Value> {
    let mut obj = Map::new();

    if let Some(name) = node.component_ref.as_deref().filter(|n| !n.is_empty()) {
        obj.insert("type".into(), Value::from(name));
        obj.insert("id".into(), Value::from(node.id));
        flatten_props(&mut obj, node);
        return Some(Value::Object(obj));
    }

    let module = node.module_ref.as_ref().filter(|m| !m.path.is_empty())?;
    let type_name = match &module.export {
        Some(export) => format!("$module:{}#{}", module.path, export),
        None => format!("$module:{}", module.path),
    };
    obj.insert("type".into(), Value::from(type_name));
    obj.insert("actual_type".into(), Value::from(node.kind.to_string()));
    obj.insert("id".into(), Value::from(node.id));
    flatten_props(&mut obj, node);
    put_opt_str(&mut obj, "text", node.text.as_deref().filter(|t| !t.is_empty()));
    if let Some(style) = &node.style {
        if style.background.is_solid() {
            obj.insert("background".into(), Value::from(style.background.to_string()));
        }
        if !style.font.color.is_transparent() {
            obj.insert("color".into(), Value::from(style.font.color.to_string()));
        }
    }
    Some(Value::Object(obj))
}

fn flatten_props(obj: &mut Map<String, Value>, node: &Node) {
    for (key, value) in node.instance_props.iter().flatten() {
        if key != "id" && key != "type" {
            obj.insert(key.clone(), value.clone());
        }
    }
}

/// Emits `key` when the value differs from its default or a binding names it
fn emit(obj: &mut Map<String, Value>, node: &Node, key: &str, non_default: bool, value: impl FnOnce() -> Value) {
    if non_default || node.has_binding(key) {
        obj.insert(key.to_string(), value());
    }
}

/// An optional string field; unset but bound fields are written as `null`
fn opt_str(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn dimension(d: Dimension) -> Value {
    Value::from(d.to_string())
}

fn encode_style(obj: &mut Map<String, Value>, style: &Style, node: &Node) {
    let font = &style.font;

    emit(obj, node, "width", !style.width.is_auto(), || dimension(style.width));
    emit(obj, node, "height", !style.height.is_auto(), || dimension(style.height));
    emit(obj, node, "visible", !style.visible, || Value::from(style.visible));
    emit(obj, node, "opacity", style.opacity != 1.0, || number(style.opacity));
    emit(obj, node, "zIndex", style.z_index != 0, || Value::from(style.z_index));
    emit(obj, node, "background", !style.background.is_transparent(), || {
        Value::from(style.background.to_string())
    });

    let border = &style.border;
    emit(obj, node, "border", border.has_width() || border.radius > 0, || {
        let mut out = Map::new();
        // A bound border at its default still carries width and color
        if border.has_width() || border.radius == 0 {
            out.insert("width".into(), number(border.width));
            for (key, width) in [
                ("top", border.width_top),
                ("right", border.width_right),
                ("bottom", border.width_bottom),
                ("left", border.width_left),
            ] {
                if width > 0.0 {
                    out.insert(key.into(), number(width));
                }
            }
            out.insert("color".into(), Value::from(border.color.to_string()));
        }
        if border.radius > 0 {
            out.insert("radius".into(), Value::from(border.radius));
        }
        Value::Object(out)
    });

    let positioned = style.position != Default::default();
    emit(obj, node, "position", positioned, || {
        Value::from(name_of(POSITIONS, style.position))
    });
    emit(obj, node, "left", positioned || style.left != 0.0, || number(style.left));
    emit(obj, node, "top", positioned || style.top != 0.0, || number(style.top));

    emit(obj, node, "fontSize", font.size > 0.0, || number(font.size));
    emit(obj, node, "fontFamily", font.family.is_some(), || opt_str(font.family.as_deref()));
    emit(obj, node, "fontWeight", font.weight != 400, || Value::from(font.weight));
    emit(obj, node, "fontBold", font.bold, || Value::from(font.bold));
    emit(obj, node, "fontItalic", font.italic, || Value::from(font.italic));
    emit(obj, node, "lineHeight", font.line_height > 0.0, || number(font.line_height));
    emit(obj, node, "color", !font.color.is_transparent(), || {
        Value::from(font.color.to_string())
    });
    emit(obj, node, "textAlign", font.align != Default::default(), || {
        Value::from(name_of(TEXT_ALIGNS, font.align))
    });
    emit(obj, node, "letterSpacing", font.letter_spacing != 0.0, || {
        number(font.letter_spacing)
    });
    emit(obj, node, "wordSpacing", font.word_spacing != 0.0, || number(font.word_spacing));
    emit(obj, node, "textDecoration", !font.decoration.is_none(), || {
        Value::from(decoration_to_string(font.decoration))
    });

    emit(obj, node, "padding", !style.padding.is_zero(), || spacing_to_json(style.padding));
    emit(obj, node, "margin", !style.margin.is_zero(), || spacing_to_json(style.margin));

    let transform = &style.transform;
    emit(obj, node, "transform", !transform.is_identity(), || {
        let identity = transform.is_identity();
        let mut out = Map::new();
        if transform.has_translate() || identity {
            out.insert(
                "translate".into(),
                Value::Array(vec![number(transform.translate_x), number(transform.translate_y)]),
            );
        }
        if transform.has_scale() || identity {
            out.insert(
                "scale".into(),
                Value::Array(vec![number(transform.scale_x), number(transform.scale_y)]),
            );
        }
        if transform.has_rotate() || identity {
            out.insert("rotate".into(), number(transform.rotate));
        }
        Value::Object(out)
    });

    emit(obj, node, "backgroundImage", style.background_image.is_some(), || {
        opt_str(style.background_image.as_deref())
    });
    emit(obj, node, "backgroundClip", style.background_clip != Default::default(), || {
        Value::from(name_of(BACKGROUND_CLIPS, style.background_clip))
    });
    emit(obj, node, "textFillColor", !style.text_fill_color.is_transparent(), || {
        Value::from(style.text_fill_color.to_string())
    });
}

fn grid_tracks(tracks: &[GridTrack]) -> Value {
    tracks
        .iter()
        .map(|track| {
            let mut out = Map::new();
            out.insert("type".into(), Value::from(track.kind_name()));
            out.insert("value".into(), number(track.value()));
            Value::Object(out)
        })
        .collect()
}

fn encode_layout(obj: &mut Map<String, Value>, layout: &Layout, node: &Node) {
    emit(obj, node, "display", layout.display.is_some(), || {
        opt_str(layout.display.map(|display| name_of(DISPLAY_MODES, display)))
    });

    emit(obj, node, "minWidth", !layout.min_width.is_auto(), || dimension(layout.min_width));
    emit(obj, node, "minHeight", !layout.min_height.is_auto(), || dimension(layout.min_height));
    emit(obj, node, "maxWidth", !layout.max_width.is_auto(), || dimension(layout.max_width));
    emit(obj, node, "maxHeight", !layout.max_height.is_auto(), || dimension(layout.max_height));
    emit(obj, node, "flexDirection", layout.direction != FlexDirection::Column, || {
        Value::from(name_of(FLEX_DIRECTIONS, layout.direction))
    });
    emit(obj, node, "direction", layout.text_direction != Default::default(), || {
        Value::from(name_of(DIRECTIONS, layout.text_direction))
    });
    emit(obj, node, "unicodeBidi", layout.unicode_bidi != Default::default(), || {
        Value::from(name_of(BIDI_MODES, layout.unicode_bidi))
    });
    emit(obj, node, "justifyContent", layout.justify_content != Default::default(), || {
        Value::from(name_of(ALIGNMENTS, layout.justify_content))
    });
    emit(obj, node, "alignItems", layout.align_items != Default::default(), || {
        Value::from(name_of(ALIGNMENTS, layout.align_items))
    });
    emit(obj, node, "gap", layout.gap != 0.0, || number(layout.gap));
    emit(obj, node, "flexGrow", layout.grow != 0.0, || number(layout.grow));
    emit(obj, node, "flexShrink", layout.shrink != 1.0, || number(layout.shrink));
    emit(obj, node, "flexWrap", layout.wrap, || Value::from(layout.wrap));
    emit(obj, node, "aspectRatio", layout.aspect_ratio > 0.0, || number(layout.aspect_ratio));

    // Grid values are kept even while the display mode is unset
    let grid = &layout.grid;
    emit(obj, node, "rowGap", grid.row_gap != 0.0, || number(grid.row_gap));
    emit(obj, node, "columnGap", grid.column_gap != 0.0, || number(grid.column_gap));
    emit(obj, node, "gridColumns", !grid.columns.is_empty(), || grid_tracks(&grid.columns));
    emit(obj, node, "gridRows", !grid.rows.is_empty(), || grid_tracks(&grid.rows));
    emit(obj, node, "justifyItems", grid.justify_items != Default::default(), || {
        Value::from(name_of(ALIGNMENTS, grid.justify_items))
    });
    emit(obj, node, "gridAlignItems", grid.align_items != Default::default(), || {
        Value::from(name_of(ALIGNMENTS, grid.align_items))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BindingKind, Color, EventBinding, PropertyBinding, Spacing, TableConfig,
    };
    use crate::plugin::{PayloadCodec, PluginMetadata};
    use serde_json::json;

    fn single(node: Node) -> Document {
        let mut tree = Tree::new();
        let root = tree.add_node(node);
        tree.set_root(root).unwrap();
        Document::new(tree)
    }

    fn encode_root(node: Node) -> Value {
        Encoder::new().to_value(&single(node)).unwrap()["root"].clone()
    }

    #[test]
    fn top_level_sections() {
        let doc = single(Node::new(ComponentType::Column).with_id(1));
        let out = Encoder::new().to_value(&doc).unwrap();

        assert_eq!(out["format"], json!("kir"));
        assert_eq!(out["root"]["type"], json!("Column"));
        assert!(out.get("required_plugins").is_none());
        assert!(out.get("component_definitions").is_none());
    }

    #[test]
    fn empty_document_is_an_error() {
        let err = Encoder::new().to_value(&Document::default()).unwrap_err();
        assert!(matches!(err, EncodeError::NoRoot));
    }

    #[test]
    fn defaults_are_omitted() {
        let mut node = Node::new(ComponentType::Text).with_id(2);
        node.style = Some(Style::default());
        node.layout = Some(Layout::default());

        let out = encode_root(node);
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "type"]);
    }

    #[test]
    fn bound_fields_are_emitted_at_default() {
        let mut node = Node::new(ComponentType::Text).with_id(2);
        node.style = Some(Style::default());
        node.layout = Some(Layout::default());
        for property in ["background", "gap"] {
            node.bindings.push(PropertyBinding {
                property: property.into(),
                source_expr: "theme.x".into(),
                resolved_value: "0".into(),
                kind: BindingKind::Reactive,
            });
        }

        let out = encode_root(node);
        assert_eq!(out["background"], json!("transparent"));
        assert_eq!(out["gap"], json!(0));
        assert_eq!(out["property_bindings"]["gap"]["binding_type"], json!("reactive"));
    }

    fn bind(node: &mut Node, properties: &[&str]) {
        for property in properties {
            node.bindings.push(PropertyBinding {
                property: property.to_string(),
                source_expr: "theme.x".into(),
                resolved_value: String::new(),
                kind: BindingKind::Reactive,
            });
        }
    }

    #[test]
    fn every_bound_style_and_layout_key_is_emitted() {
        let keys = [
            "border",
            "position",
            "left",
            "top",
            "fontFamily",
            "transform",
            "backgroundImage",
            "display",
            "rowGap",
            "columnGap",
            "gridColumns",
            "gridRows",
            "justifyItems",
            "gridAlignItems",
        ];
        let mut node = Node::new(ComponentType::Container).with_id(1);
        node.style = Some(Style::default());
        node.layout = Some(Layout::default());
        bind(&mut node, &keys);

        let out = encode_root(node);
        for key in keys {
            assert!(out.get(key).is_some(), "{} missing", key);
        }
        assert_eq!(out["border"]["width"], json!(0));
        assert_eq!(out["transform"]["scale"], json!([1, 1]));
        assert_eq!(out["fontFamily"], Value::Null);
        assert_eq!(out["display"], Value::Null);
        assert_eq!(out["gridColumns"], json!([]));
    }

    #[test]
    fn every_bound_payload_key_is_emitted() {
        let mut tab = Node::new(ComponentType::TabBar).with_id(1);
        tab.payload = Some(Payload::Tab(Default::default()));
        bind(&mut tab, &["title", "reorderable", "selectedIndex", "activeBackground"]);
        let out = encode_root(tab);
        assert_eq!(out["reorderable"], json!(false));
        assert_eq!(out["selectedIndex"], json!(0));
        assert_eq!(out["activeBackground"], json!("transparent"));
        assert!(out.get("textColor").is_none());

        let mut item = Node::new(ComponentType::ListItem).with_id(1);
        item.payload = Some(Payload::ListItem(Default::default()));
        bind(&mut item, &["number", "isTask", "checked", "marker"]);
        let out = encode_root(item);
        assert_eq!(out["number"], json!(0));
        assert_eq!(out["isTask"], json!(false));
        assert_eq!(out["checked"], json!(false));

        let mut code = Node::new(ComponentType::CodeBlock).with_id(1);
        code.payload = Some(Payload::CodeBlock(Default::default()));
        bind(&mut code, &["startLine"]);
        assert_eq!(encode_root(code)["startLine"], json!(1));

        let mut list = Node::new(ComponentType::List).with_id(1);
        list.payload = Some(Payload::List(Default::default()));
        bind(&mut list, &["start"]);
        assert!(encode_root(list).get("start").is_some());

        let mut placeholder = Node::new(ComponentType::Placeholder).with_id(1);
        placeholder.payload = Some(Payload::Placeholder(Default::default()));
        bind(&mut placeholder, &["preserve"]);
        assert_eq!(encode_root(placeholder)["preserve"], json!(false));
    }

    #[test]
    fn grid_values_without_display_mode() {
        let mut node = Node::new(ComponentType::Container).with_id(1);
        let layout = node.layout_mut();
        layout.grid.row_gap = 8.0;
        layout.grid.columns = vec![GridTrack::Fr(1.0), GridTrack::Fr(2.0)];
        assert!(layout.display.is_none());

        let out = encode_root(node);
        assert_eq!(out["rowGap"], json!(8));
        assert!(out.get("display").is_none());
        assert!(out.get("columnGap").is_none());

        let doc = crate::codec::Decoder::new()
            .decode_value(&json!({"root": out}))
            .unwrap();
        let root = doc.tree.get(doc.tree.root().unwrap()).unwrap();
        let layout = root.layout.as_ref().unwrap();
        assert_eq!(layout.grid.row_gap, 8.0);
        assert_eq!(layout.grid.columns, vec![GridTrack::Fr(1.0), GridTrack::Fr(2.0)]);
        assert_eq!(layout.display, None);
    }

    #[test]
    fn style_values() {
        let mut node = Node::new(ComponentType::Container).with_id(3);
        let style = node.style_mut();
        style.background = Color::rgb(255, 0, 0);
        style.font.color = Color::rgba(255, 0, 0, 128);
        style.width = Dimension::Percent(100.0);
        style.padding = Spacing::symmetric(4.0, 8.0);
        style.margin = Spacing::uniform(4.0);

        let out = encode_root(node);
        assert_eq!(out["background"], json!("#ff0000"));
        assert_eq!(out["color"], json!("#ff000080"));
        assert_eq!(out["width"], json!("100.0%"));
        assert_eq!(out["padding"], json!([4, 8]));
        assert_eq!(out["margin"], json!(4));
    }

    #[test]
    fn payload_only_for_matching_kind() {
        let mut table = Node::new(ComponentType::Table).with_id(1);
        table.payload = Some(Payload::Table(TableConfig::default()));
        assert_eq!(encode_root(table)["table_config"]["cellPadding"], json!(8));

        let mut text = Node::new(ComponentType::Text).with_id(1);
        text.payload = Some(Payload::Table(TableConfig::default()));
        assert!(encode_root(text).get("table_config").is_none());
    }

    #[test]
    fn instances_are_written_as_references() {
        let mut tree = Tree::new();
        let mut node = Node::new(ComponentType::Column).with_id(42);
        node.component_ref = Some("Counter".into());
        node.instance_props = Some(
            json!({"id": 42, "type": "Counter", "start": 5})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let root = tree.add_node(node);
        let child = tree.add_node(Node::new(ComponentType::Text).with_id(1000));
        tree.append_child(root, child).unwrap();
        tree.set_root(root).unwrap();

        let encoder = Encoder::new();
        let reference = encoder.encode_node(&tree, root, EncodeMode::Reference).unwrap();
        assert_eq!(reference, json!({"type": "Counter", "id": 42, "start": 5}));

        let full = encoder.encode_node(&tree, root, EncodeMode::FullTree).unwrap();
        assert_eq!(full["type"], json!("Column"));
        assert_eq!(full["component_ref"], json!("Counter"));
        assert_eq!(full["children"][0]["id"], json!(1000));
    }

    #[test]
    fn templates_keep_expressions_in_text() {
        let mut tree = Tree::new();
        let mut node = Node::new(ComponentType::Text).with_id(1).with_text("5");
        node.text_expression = Some("{{count}}".into());
        let root = tree.add_node(node);
        tree.set_root(root).unwrap();

        let encoder = Encoder::new();
        let full = encoder.encode_node(&tree, root, EncodeMode::FullTree).unwrap();
        assert_eq!(full["text"], json!("{{count}}"));
        let reference = encoder.encode_node(&tree, root, EncodeMode::Reference).unwrap();
        assert_eq!(reference["text"], json!("5"));
        assert_eq!(reference["text_expression"], json!("{{count}}"));
    }

    #[test]
    fn plugin_events_use_registry_names() {
        let mut registry = PluginRegistry::new();
        registry
            .register(PluginMetadata::new("gestures", "1.0.0"))
            .unwrap();
        registry
            .register_event_type("gestures", "swipe", 120, None)
            .unwrap();

        let mut node = Node::new(ComponentType::Container).with_id(1);
        node.events.push(EventBinding::new(EventKind::Plugin(120)));
        node.events.push(EventBinding::new(EventKind::Plugin(130)));
        node.events.push(EventBinding::new(EventKind::Click));

        let out = Encoder::with_registry(&registry).to_value(&single(node)).unwrap();
        let types: Vec<_> = out["root"]["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["type"].clone())
            .collect();
        assert_eq!(types, vec![json!("swipe"), json!("unknown_plugin_event"), json!("click")]);
    }

    struct FailingCodec;

    impl PayloadCodec for FailingCodec {
        fn encode(&self, _data: &Value) -> anyhow::Result<Value> {
            anyhow::bail!("no space left")
        }

        fn decode(&self, data: &Value) -> Option<Value> {
            Some(data.clone())
        }
    }

    #[test]
    fn plugin_payload_failure_aborts_encoding() {
        let mut registry = PluginRegistry::new();
        registry
            .register_payload_codec(ComponentType::Plugin(3), FailingCodec)
            .unwrap();

        let mut node = Node::new(ComponentType::Plugin(3)).with_id(1);
        node.payload = Some(Payload::Plugin(json!({"points": [1, 2]})));

        let err = Encoder::with_registry(&registry)
            .to_value(&single(node))
            .unwrap_err();
        assert!(matches!(err, EncodeError::Payload { .. }));
    }

    #[test]
    fn required_plugins_from_commands() {
        let mut node = Node::new(ComponentType::Canvas).with_id(1);
        node.commands = vec![100, 101];
        let out = Encoder::new().to_value(&single(node)).unwrap();
        assert_eq!(out["required_plugins"], json!(["canvas"]));
    }
}
