//! Document decoding
//!
//! Decoding is permissive: an unknown component type becomes a container,
//! a field of unexpected shape is skipped, and a node naming a missing
//! definition is decoded as an ordinary node. Only text that is not JSON,
//! or a top level that is not an object, fails.
//!
//! ## Expansion
//!
//! A node whose `type` names an entry of `component_definitions` is
//! replaced by the expanded template (see [`super::template`]). A `type`
//! of the form `$module:<path>[#export]` loads `<module dir>/<path>.kir`
//! first and registers its definitions as `<path>/<name>`; if that fails
//! the node is decoded as its `actual_type`.
//!
//! Ids absent from the document are generated above the largest literal
//! id, so generated and literal ids never collide.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::template::{
    max_literal_id, next_node_id, reserve_above, DefinitionSource, DefinitionTable, StateContext,
};
use super::values::{
    as_f32, as_i32, as_u32, decoration_from_str, get_bool, get_f32, get_str, get_string,
    parse_alignment, parse_name, signed_number, spacing_from_json, BACKGROUND_CLIPS, BIDI_MODES,
    CELL_ALIGNS, DIRECTIONS, DISPLAY_MODES, FLEX_DIRECTIONS, POSITIONS, SELECTORS, TEXT_ALIGNS,
    VERTICAL_ALIGNS,
};
use crate::config::{self, RuntimeConfig};
use crate::domain::{
    BindingKind, CellData, CodeBlockData, Color, ComponentType, Dimension, Document,
    DropdownState, EachBinding, EventBinding, EventKind, FlexDirection, GridTrack, HandlerSource,
    HeadingData, ImageData, Layout, LinkData, ListData, ListItemData, ModalState, ModuleRef,
    Node, NodeId, Payload, PlaceholderData, PropertyBinding, Provenance, Style, TabData,
    TableColumn, TableConfig, Tree, TreeError, VisibleCondition,
};
use crate::plugin::{scan_requirements, PluginRegistry, PLUGIN_EVENT_START};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document must be a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Keys consumed by the instance itself rather than passed as props
const INSTANCE_KEYS: &[&str] = &["id", "type", "actual_type"];

const STYLE_KEYS: &[&str] = &[
    "width",
    "height",
    "visible",
    "opacity",
    "zIndex",
    "background",
    "border",
    "position",
    "left",
    "top",
    "fontSize",
    "fontFamily",
    "fontWeight",
    "fontBold",
    "fontItalic",
    "lineHeight",
    "color",
    "textAlign",
    "letterSpacing",
    "wordSpacing",
    "textDecoration",
    "padding",
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "margin",
    "marginTop",
    "marginRight",
    "marginBottom",
    "marginLeft",
    "transform",
    "backgroundImage",
    "backgroundClip",
    "textFillColor",
];

const LAYOUT_KEYS: &[&str] = &[
    "display",
    "minWidth",
    "minHeight",
    "maxWidth",
    "maxHeight",
    "flexDirection",
    "direction",
    "unicodeBidi",
    "justifyContent",
    "alignItems",
    "gap",
    "flexGrow",
    "flexShrink",
    "flexWrap",
    "aspectRatio",
    "rowGap",
    "columnGap",
    "gridColumns",
    "gridRows",
    "justifyItems",
    "gridAlignItems",
];

/// Reads documents into a [`Document`]
pub struct Decoder<'a> {
    registry: Option<&'a PluginRegistry>,
    module_dir: PathBuf,
}

impl<'a> Decoder<'a> {
    /// A decoder resolving `$module:` references under the default module cache
    pub fn new() -> Self {
        Self {
            registry: None,
            module_dir: config::default_module_cache_dir(),
        }
    }

    /// A decoder resolving `$module:` references under the configured cache dir
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new().with_module_dir(&config.module_cache_dir)
    }

    pub fn with_registry(mut self, registry: &'a PluginRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_dir = dir.into();
        self
    }

    pub fn module_dir(&self) -> &Path {
        &self.module_dir
    }

    pub fn decode_str(&self, text: &str) -> Result<Document, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        self.decode_value(&value)
    }

    pub fn decode_value(&self, value: &Value) -> Result<Document, DecodeError> {
        let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

        if let Some(max) = max_literal_id(value) {
            reserve_above(max);
        }

        let mut session = Session {
            registry: self.registry,
            module_dir: &self.module_dir,
            tree: Tree::new(),
            definitions: obj
                .get("component_definitions")
                .map(DefinitionTable::from_json)
                .unwrap_or_default(),
            loaded_modules: HashSet::new(),
            expanding: Vec::new(),
        };

        // `component` is the legacy name of `root`; a bare node is a document too
        let root_json = obj
            .get("root")
            .or_else(|| obj.get("component"))
            .or_else(|| obj.contains_key("type").then_some(value));

        if let Some(root_json) = root_json {
            if let Some(root) = session.decode_node(root_json)? {
                session.tree.set_root(root)?;
            }
        } else {
            tracing::debug!("Document has no root node");
        }

        let mut doc = Document::new(session.tree);
        doc.metadata = section(obj, "metadata");
        doc.app = section(obj, "app");
        doc.manifest = section(obj, "reactive_manifest");
        doc.logic = section(obj, "logic_block");
        doc.stylesheet = obj.get("stylesheet").cloned();
        doc.source_structures = obj.get("source_structures").cloned();
        doc.c_metadata = obj.get("c_metadata").cloned();
        doc.sources = section(obj, "sources").unwrap_or_default();

        let mut required: Vec<String> = section(obj, "required_plugins").unwrap_or_default();
        if let Some(root) = doc.tree.root() {
            required.extend(scan_requirements(&doc.tree, root, self.registry));
        }
        required.sort();
        required.dedup();
        doc.required_plugins = required;

        Ok(doc)
    }
}

impl Default for Decoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A top-level section, skipped when it does not have the expected shape
fn section<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    let value = obj.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(section) => Some(section),
        Err(err) => {
            tracing::debug!(section = key, error = %err, "Skipping malformed section");
            None
        }
    }
}

/// State of one decode call. Definitions live only as long as the call.
struct Session<'s> {
    registry: Option<&'s PluginRegistry>,
    module_dir: &'s Path,
    tree: Tree,
    definitions: DefinitionTable,
    loaded_modules: HashSet<String>,
    /// Definitions currently being expanded, innermost last
    expanding: Vec<String>,
}

impl Session<'_> {
    fn decode_node(&mut self, json: &Value) -> Result<Option<NodeId>, TreeError> {
        let Some(obj) = json.as_object() else {
            return Ok(None);
        };
        let type_name = get_str(obj, "type").unwrap_or("Container");

        if let Some(reference) = type_name.strip_prefix("$module:") {
            if let Some(id) = self.expand_module(reference, obj)? {
                return Ok(Some(id));
            }
            let actual = get_str(obj, "actual_type").unwrap_or("Container");
            return self.build_node(obj, actual).map(Some);
        }

        if let Some(def) = self.definitions.get(type_name).cloned() {
            if self.expanding.iter().any(|name| name == type_name) {
                tracing::debug!(definition = type_name, "Recursive definition left unexpanded");
            } else if let Some(id) = self.expand(type_name, &def, obj)? {
                return Ok(Some(id));
            }
        }

        self.build_node(obj, type_name).map(Some)
    }

    /// Expands `def` for the instance `instance`; `None` if the template decodes to nothing
    fn expand(
        &mut self,
        name: &str,
        def: &DefinitionSource,
        instance: &Map<String, Value>,
    ) -> Result<Option<NodeId>, TreeError> {
        let context = StateContext::build(def, instance);
        let template = context.substitute(&def.template);

        self.expanding.push(name.to_string());
        let root = self.decode_node(&template);
        self.expanding.pop();

        let Some(root) = root? else {
            tracing::debug!(definition = name, "Definition has no template");
            return Ok(None);
        };

        let instance_id = instance
            .get("id")
            .and_then(as_u32)
            .unwrap_or_else(next_node_id);

        // Outer expansions run last, so they own everything beneath them
        for id in self.tree.descendants(root) {
            if let Some(node) = self.tree.get_mut(id) {
                node.id = if id == root { instance_id } else { next_node_id() };
                node.owner_instance = instance_id;
            }
        }

        if let Some(node) = self.tree.get_mut(root) {
            node.component_ref = Some(name.to_string());
            node.instance_props = Some(
                instance
                    .iter()
                    .filter(|(key, _)| !INSTANCE_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            );
        }

        tracing::debug!(definition = name, instance = instance_id, "Expanded component definition");
        Ok(Some(root))
    }

    fn expand_module(
        &mut self,
        reference: &str,
        instance: &Map<String, Value>,
    ) -> Result<Option<NodeId>, TreeError> {
        let (module, export) = match reference.split_once('#') {
            Some((module, export)) => (module, Some(export)),
            None => (reference, None),
        };
        self.load_module(module);

        let lookup = match export {
            Some(export) => format!("{}/{}", module, export),
            None => reference.to_string(),
        };
        let def = self
            .definitions
            .get(&lookup)
            .or_else(|| match export {
                None => self.definitions.first_in_module(module),
                Some(_) => None,
            })
            .cloned();

        let Some(def) = def else {
            tracing::debug!(module, "Module definition not found, using actual_type");
            return Ok(None);
        };
        if self.expanding.contains(&lookup) {
            tracing::debug!(module, "Recursive module reference left unexpanded");
            return Ok(None);
        }
        let Some(root) = self.expand(&lookup, &def, instance)? else {
            return Ok(None);
        };

        if let Some(node) = self.tree.get_mut(root) {
            node.component_ref = None;
            node.module_ref = Some(ModuleRef {
                path: module.to_string(),
                export: export.map(str::to_string),
            });
            // Instance values override the template's
            if let Some(text) = get_string(instance, "text") {
                node.text = Some(text);
            }
            if let Some(background) = get_str(instance, "background") {
                node.style_mut().background = Color::parse(background);
            }
            if let Some(color) = get_str(instance, "color") {
                node.style_mut().font.color = Color::parse(color);
            }
        }
        Ok(Some(root))
    }

    /// Registers the definitions of module `module`, once per decode call
    fn load_module(&mut self, module: &str) {
        if !self.loaded_modules.insert(module.to_string()) {
            return;
        }

        let path = self.module_dir.join(format!("{}.kir", module));
        match read_module(&path) {
            Ok(doc) => {
                let empty = Value::Null;
                let defs = doc.get("component_definitions").unwrap_or(&empty);
                let count = self.definitions.extend_scoped(Some(module), defs);
                tracing::debug!(module, count, "Loaded module definitions");
            }
            Err(err) => tracing::debug!(module, error = %err, "Module not available"),
        }
    }

    fn build_node(&mut self, obj: &Map<String, Value>, type_name: &str) -> Result<NodeId, TreeError> {
        let kind = type_name.parse::<ComponentType>().unwrap_or_else(|_| {
            tracing::debug!(type_name, "Unknown component type, decoding as Container");
            ComponentType::Container
        });

        let mut node = Node::new(kind);
        node.id = obj.get("id").and_then(as_u32).unwrap_or_else(next_node_id);
        node.tag = get_string(obj, "tag");
        if node.tag.is_none() && type_name.eq_ignore_ascii_case("body") {
            node.tag = Some("Body".to_string());
        }

        match obj.get("text").or_else(|| obj.get("label")) {
            Some(Value::String(text)) => node.text = Some(text.clone()),
            // Structured text is an expression for the runtime to evaluate
            Some(expr @ Value::Object(_)) => node.text_expression = Some(expr.to_string()),
            _ => {}
        }
        if let Some(expr) = get_string(obj, "text_expression") {
            node.text_expression = Some(expr);
        }
        if kind == ComponentType::Input {
            if let Some(binding) = get_string(obj, "value") {
                node.text_expression = Some(binding);
            }
        }

        node.css_class = get_string(obj, "css_class");
        if let Some(selector) = get_str(obj, "selector_type").and_then(|s| parse_name(SELECTORS, s)) {
            node.selector = selector;
        }
        node.scope = get_string(obj, "scope");
        node.component_ref = get_string(obj, "component_ref");
        node.module_ref = get_string(obj, "module_ref").map(|path| ModuleRef {
            path,
            export: get_string(obj, "export_name"),
        });

        node.style = decode_style(obj);
        node.layout = decode_layout(obj);
        node.payload = self.decode_payload(obj, &node);
        node.events = self.decode_events(obj);
        node.bindings = decode_bindings(obj);
        node.provenance = decode_provenance(obj);

        node.visibility = get_string(obj, "visible_condition").map(|condition| VisibleCondition {
            condition,
            when_true: get_bool(obj, "visible_when_true").unwrap_or(true),
        });
        let each = EachBinding {
            source: get_string(obj, "each_source"),
            item_name: get_string(obj, "each_item_name"),
            index_name: get_string(obj, "each_index_name"),
        };
        if each != EachBinding::default() {
            node.each = Some(each);
        }
        node.custom_data = obj.get("custom_data").cloned();
        node.commands = obj
            .get("commands")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_u64().and_then(|v| u16::try_from(v).ok()))
            .collect();

        apply_kind_defaults(&mut node, obj);

        let id = self.tree.add_node(node);
        for child in obj.get("children").and_then(Value::as_array).into_iter().flatten() {
            if let Some(child) = self.decode_node(child)? {
                self.tree.append_child(id, child)?;
            }
        }
        Ok(id)
    }

    fn decode_payload(&self, obj: &Map<String, Value>, node: &Node) -> Option<Payload> {
        use ComponentType as C;

        match node.kind {
            C::Checkbox => get_bool(obj, "checked").map(|checked| Payload::Checkbox { checked }),
            C::Image => {
                let src = get_string(obj, "src").or_else(|| get_string(obj, "source"));
                let alt = get_string(obj, "alt");
                if src.is_none() && alt.is_none() {
                    return None;
                }
                Some(Payload::Image(ImageData {
                    src: src.unwrap_or_default(),
                    alt,
                }))
            }
            C::Dropdown => {
                // Older documents keep the fields on the node itself
                let source = obj
                    .get("dropdown_state")
                    .and_then(Value::as_object)
                    .unwrap_or(obj);
                let mut state = DropdownState::default();
                if let Some(placeholder) = get_string(source, "placeholder") {
                    state.placeholder = placeholder;
                }
                state.options = source
                    .get("options")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                if let Some(index) = source.get("selectedIndex").and_then(as_i32) {
                    state.selected_index = index;
                }
                state.is_open = get_bool(source, "isOpen").unwrap_or(false);
                Some(Payload::Dropdown(state))
            }
            C::Modal => {
                let source = obj.get("modal_state").and_then(Value::as_object)?;
                Some(Payload::Modal(ModalState {
                    is_open: get_bool(source, "isOpen").unwrap_or(false),
                    title: get_string(source, "title"),
                }))
            }
            C::Table => Some(Payload::Table(
                obj.get("table_config")
                    .and_then(Value::as_object)
                    .map(decode_table_config)
                    .unwrap_or_default(),
            )),
            C::TableCell | C::TableHeaderCell => {
                let source = obj.get("cell_data").and_then(Value::as_object)?;
                let mut cell = CellData::default();
                if let Some(span) = source.get("colspan").and_then(as_u32) {
                    cell.colspan = span.clamp(1, u16::MAX as u32) as u16;
                }
                if let Some(span) = source.get("rowspan").and_then(as_u32) {
                    cell.rowspan = span.clamp(1, u16::MAX as u32) as u16;
                }
                if let Some(align) = get_str(source, "alignment").and_then(|s| parse_name(CELL_ALIGNS, s)) {
                    cell.alignment = align;
                }
                if let Some(align) =
                    get_str(source, "verticalAlignment").and_then(|s| parse_name(VERTICAL_ALIGNS, s))
                {
                    cell.vertical_alignment = align;
                }
                Some(Payload::Cell(cell))
            }
            C::TabGroup | C::TabBar | C::Tab | C::TabContent | C::TabPanel => {
                let color = |key| get_str(obj, key).map(Color::parse).unwrap_or_default();
                Some(Payload::Tab(TabData {
                    title: get_string(obj, "title"),
                    reorderable: get_bool(obj, "reorderable").unwrap_or(false),
                    selected_index: obj.get("selectedIndex").and_then(as_i32).unwrap_or(0),
                    active_background: color("activeBackground"),
                    text_color: color("textColor"),
                    active_text_color: color("activeTextColor"),
                }))
            }
            C::Heading => Some(Payload::Heading(HeadingData {
                level: obj
                    .get("level")
                    .and_then(as_u32)
                    .map(|l| l.clamp(1, 6) as u8)
                    .unwrap_or(1),
                text: node.text.clone(),
                anchor: get_string(obj, "id_attr"),
            })),
            C::CodeBlock => Some(Payload::CodeBlock(CodeBlockData {
                language: get_string(obj, "language"),
                code: get_string(obj, "code").unwrap_or_default(),
                show_line_numbers: get_bool(obj, "showLineNumbers").unwrap_or(false),
                start_line: obj.get("startLine").and_then(as_u32).unwrap_or(1),
            })),
            C::List => {
                let defaults = ListData::default();
                Some(Payload::List(ListData {
                    ordered: get_str(obj, "listType") == Some("ordered"),
                    start: obj.get("start").and_then(as_u32).unwrap_or(defaults.start),
                    tight: get_bool(obj, "tight").unwrap_or(defaults.tight),
                }))
            }
            C::ListItem => Some(Payload::ListItem(ListItemData {
                number: obj.get("number").and_then(as_u32).unwrap_or(0),
                marker: get_string(obj, "marker"),
                is_task: get_bool(obj, "isTask").unwrap_or(false),
                checked: get_bool(obj, "checked").unwrap_or(false),
            })),
            C::Link => Some(Payload::Link(LinkData {
                url: get_string(obj, "url").unwrap_or_default(),
                title: get_string(obj, "title"),
                target: get_string(obj, "target"),
                rel: get_string(obj, "rel"),
            })),
            C::Placeholder => Some(Payload::Placeholder(PlaceholderData {
                name: get_string(obj, "placeholder_name").unwrap_or_default(),
                preserve: get_bool(obj, "preserve").unwrap_or(false),
            })),
            C::Plugin(_) => {
                let data = obj.get("plugin_data")?;
                match self.registry.and_then(|r| r.payload_codec(node.kind)) {
                    Some(codec) => match codec.decode(data) {
                        Some(decoded) => Some(Payload::Plugin(decoded)),
                        None => {
                            tracing::debug!(kind = %node.kind, "Plugin payload rejected by its codec");
                            None
                        }
                    },
                    None => Some(Payload::Plugin(data.clone())),
                }
            }
            _ => None,
        }
    }

    fn decode_events(&self, obj: &Map<String, Value>) -> Vec<EventBinding> {
        let Some(events) = obj.get("events").and_then(Value::as_array) else {
            return Vec::new();
        };

        events
            .iter()
            .filter_map(Value::as_object)
            .map(|event| {
                let name = get_str(event, "type").unwrap_or("custom");
                let mut binding = EventBinding::new(self.event_kind(name));
                // Names the runtime cannot derive are cached for the encoder
                binding.name = match binding.kind {
                    EventKind::Plugin(_) => Some(name.to_string()),
                    EventKind::Custom if name != "custom" => Some(name.to_string()),
                    _ => None,
                };

                binding.logic_id = get_string(event, "logic_id");
                binding.handler_data = get_string(event, "handler_data");
                binding.bytecode_function_id =
                    event.get("bytecode_function_id").and_then(as_u32).unwrap_or(0);
                binding.handler_source = event
                    .get("handler_source")
                    .and_then(Value::as_object)
                    .map(|src| HandlerSource {
                        language: get_string(src, "language").unwrap_or_default(),
                        code: get_string(src, "code").unwrap_or_default(),
                        file: get_string(src, "file"),
                        line: src.get("line").and_then(as_u32).unwrap_or(0),
                        uses_closures: get_bool(src, "uses_closures").unwrap_or(false),
                        closure_vars: src
                            .get("closure_vars")
                            .and_then(Value::as_array)
                            .into_iter()
                            .flatten()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect(),
                    });
                binding
            })
            .collect()
    }

    fn event_kind(&self, name: &str) -> EventKind {
        if let Some(kind) = EventKind::from_builtin_name(name) {
            return kind;
        }
        if let Some(id) = self.registry.and_then(|r| r.event_type_id(name)) {
            return EventKind::Plugin(id);
        }
        match name
            .strip_prefix("plugin_event_")
            .and_then(|n| n.parse::<u8>().ok())
        {
            Some(id) if id >= PLUGIN_EVENT_START => EventKind::Plugin(id),
            _ => EventKind::Custom,
        }
    }
}

fn read_module(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read module {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse module {}", path.display()))
}

fn dimension(value: &Value) -> Option<Dimension> {
    match value {
        Value::String(s) => Some(Dimension::parse(s)),
        Value::Number(_) => as_f32(value).map(Dimension::Px),
        _ => None,
    }
}

fn color(value: &Value) -> Option<Color> {
    value.as_str().map(Color::parse)
}

fn decode_style(obj: &Map<String, Value>) -> Option<Style> {
    if !STYLE_KEYS.iter().any(|key| obj.contains_key(*key)) {
        return None;
    }

    let mut style = Style::default();
    let get = |key: &str| obj.get(key);

    if let Some(d) = get("width").and_then(dimension) {
        style.width = d;
    }
    if let Some(d) = get("height").and_then(dimension) {
        style.height = d;
    }
    if let Some(visible) = get_bool(obj, "visible") {
        style.visible = visible;
    }
    if let Some(opacity) = get_f32(obj, "opacity") {
        style.opacity = opacity.clamp(0.0, 1.0);
    }
    if let Some(z) = get("zIndex").and_then(as_i32) {
        style.z_index = z;
    }
    if let Some(c) = get("background").and_then(color) {
        style.background = c;
    }

    if let Some(border) = get("border").and_then(Value::as_object) {
        let b = &mut style.border;
        b.width = get_f32(border, "width").unwrap_or(0.0);
        b.width_top = get_f32(border, "top").unwrap_or(0.0);
        b.width_right = get_f32(border, "right").unwrap_or(0.0);
        b.width_bottom = get_f32(border, "bottom").unwrap_or(0.0);
        b.width_left = get_f32(border, "left").unwrap_or(0.0);
        if let Some(c) = border.get("color").and_then(color) {
            b.color = c;
        }
        b.radius = border
            .get("radius")
            .and_then(as_f32)
            .map(|r| r.clamp(0.0, u8::MAX as f32) as u8)
            .unwrap_or(0);
    }

    if let Some(position) = get_str(obj, "position").and_then(|s| parse_name(POSITIONS, s)) {
        style.position = position;
    }
    if let Some(left) = get_f32(obj, "left") {
        style.left = left;
    }
    if let Some(top) = get_f32(obj, "top") {
        style.top = top;
    }

    let font = &mut style.font;
    if let Some(size) = get_f32(obj, "fontSize") {
        font.size = size;
    }
    font.family = get_string(obj, "fontFamily");
    if let Some(weight) = get("fontWeight").and_then(as_u32) {
        font.weight = weight.clamp(100, 900) as u16;
    }
    font.bold = get_bool(obj, "fontBold").unwrap_or(false);
    font.italic = get_bool(obj, "fontItalic").unwrap_or(false);
    if let Some(line_height) = get_f32(obj, "lineHeight") {
        font.line_height = line_height;
    }
    if let Some(c) = get("color").and_then(color) {
        font.color = c;
    }
    if let Some(align) = get_str(obj, "textAlign").and_then(|s| parse_name(TEXT_ALIGNS, s)) {
        font.align = align;
    }
    if let Some(spacing) = get("letterSpacing").and_then(signed_number) {
        font.letter_spacing = spacing;
    }
    if let Some(spacing) = get("wordSpacing").and_then(signed_number) {
        font.word_spacing = spacing;
    }
    if let Some(decoration) = get_str(obj, "textDecoration") {
        font.decoration = decoration_from_str(decoration);
    }

    if let Some(padding) = get("padding").and_then(spacing_from_json) {
        style.padding = padding;
    }
    if let Some(margin) = get("margin").and_then(spacing_from_json) {
        style.margin = margin;
    }
    // Per-side keys override the shorthand
    for (prefix, spacing) in [("padding", &mut style.padding), ("margin", &mut style.margin)] {
        for (side, edge) in [
            ("Top", &mut spacing.top),
            ("Right", &mut spacing.right),
            ("Bottom", &mut spacing.bottom),
            ("Left", &mut spacing.left),
        ] {
            if let Some(v) = get_f32(obj, &format!("{}{}", prefix, side)) {
                *edge = v;
            }
        }
    }

    if let Some(transform) = get("transform").and_then(Value::as_object) {
        let t = &mut style.transform;
        if let Some([x, y]) = pair(transform.get("translate")) {
            t.translate_x = x;
            t.translate_y = y;
        }
        match transform.get("scale") {
            Some(v @ Value::Number(_)) => {
                let s = as_f32(v).unwrap_or(1.0);
                t.scale_x = s;
                t.scale_y = s;
            }
            other => {
                if let Some([x, y]) = pair(other) {
                    t.scale_x = x;
                    t.scale_y = y;
                }
            }
        }
        if let Some(rotate) = get_f32(transform, "rotate") {
            t.rotate = rotate;
        }
    }

    style.background_image = get_string(obj, "backgroundImage");
    if let Some(clip) = get_str(obj, "backgroundClip").and_then(|s| parse_name(BACKGROUND_CLIPS, s)) {
        style.background_clip = clip;
    }
    if let Some(c) = get("textFillColor").and_then(color) {
        style.text_fill_color = c;
    }

    Some(style)
}

fn pair(value: Option<&Value>) -> Option<[f32; 2]> {
    match value?.as_array()?.as_slice() {
        [a, b] => Some([as_f32(a)?, as_f32(b)?]),
        _ => None,
    }
}

fn grid_tracks(value: Option<&Value>) -> Vec<GridTrack> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|track| {
            GridTrack::from_parts(
                get_str(track, "type").unwrap_or("auto"),
                get_f32(track, "value").unwrap_or(0.0),
            )
        })
        .collect()
}

fn decode_layout(obj: &Map<String, Value>) -> Option<Layout> {
    if !LAYOUT_KEYS.iter().any(|key| obj.contains_key(*key)) {
        return None;
    }

    let mut layout = Layout::default();
    let get = |key: &str| obj.get(key);
    let alignment = |key: &str| get_str(obj, key).and_then(parse_alignment);

    layout.display = get_str(obj, "display").and_then(|s| parse_name(DISPLAY_MODES, s));
    if let Some(d) = get("minWidth").and_then(dimension) {
        layout.min_width = d;
    }
    if let Some(d) = get("minHeight").and_then(dimension) {
        layout.min_height = d;
    }
    if let Some(d) = get("maxWidth").and_then(dimension) {
        layout.max_width = d;
    }
    if let Some(d) = get("maxHeight").and_then(dimension) {
        layout.max_height = d;
    }
    if let Some(direction) = get_str(obj, "flexDirection").and_then(|s| parse_name(FLEX_DIRECTIONS, s)) {
        layout.direction = direction;
    }
    if let Some(direction) = get_str(obj, "direction").and_then(|s| parse_name(DIRECTIONS, s)) {
        layout.text_direction = direction;
    }
    if let Some(bidi) = get_str(obj, "unicodeBidi").and_then(|s| parse_name(BIDI_MODES, s)) {
        layout.unicode_bidi = bidi;
    }
    if let Some(align) = alignment("justifyContent") {
        layout.justify_content = align;
    }
    if let Some(align) = alignment("alignItems") {
        layout.align_items = align;
    }
    if let Some(gap) = get_f32(obj, "gap") {
        layout.gap = gap;
    }
    if let Some(grow) = get_f32(obj, "flexGrow") {
        layout.grow = grow;
    }
    if let Some(shrink) = get_f32(obj, "flexShrink") {
        layout.shrink = shrink;
    }
    layout.wrap = match get("flexWrap") {
        Some(Value::Bool(wrap)) => *wrap,
        Some(Value::String(s)) => s == "wrap",
        _ => false,
    };
    if let Some(ratio) = get_f32(obj, "aspectRatio") {
        layout.aspect_ratio = ratio;
    }

    let grid = &mut layout.grid;
    grid.row_gap = get_f32(obj, "rowGap").unwrap_or(0.0);
    grid.column_gap = get_f32(obj, "columnGap").unwrap_or(0.0);
    grid.columns = grid_tracks(get("gridColumns"));
    grid.rows = grid_tracks(get("gridRows"));
    if let Some(align) = alignment("justifyItems") {
        grid.justify_items = align;
    }
    if let Some(align) = alignment("gridAlignItems") {
        grid.align_items = align;
    }

    Some(layout)
}

fn decode_table_config(obj: &Map<String, Value>) -> TableConfig {
    let mut config = TableConfig::default();

    config.columns = obj
        .get("columns")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|col| {
            let mut column = TableColumn::default();
            if let Some(d) = col.get("width").and_then(dimension) {
                column.width = d;
            }
            if let Some(d) = col.get("minWidth").and_then(dimension) {
                column.min_width = d;
            }
            if let Some(d) = col.get("maxWidth").and_then(dimension) {
                column.max_width = d;
            }
            if let Some(align) = get_str(col, "alignment").and_then(|s| parse_name(CELL_ALIGNS, s)) {
                column.alignment = align;
            }
            column.auto_size = get_bool(col, "autoSize").unwrap_or(true);
            column
        })
        .collect();

    for (key, target) in [
        ("borderColor", &mut config.border_color),
        ("headerBackground", &mut config.header_background),
        ("evenRowBackground", &mut config.even_row_background),
        ("oddRowBackground", &mut config.odd_row_background),
    ] {
        if let Some(c) = obj.get(key).and_then(color) {
            *target = c;
        }
    }
    if let Some(width) = get_f32(obj, "borderWidth") {
        config.border_width = width;
    }
    if let Some(padding) = get_f32(obj, "cellPadding") {
        config.cell_padding = padding;
    }
    for (key, target) in [
        ("showBorders", &mut config.show_borders),
        ("striped", &mut config.striped),
        ("headerSticky", &mut config.header_sticky),
        ("collapseBorders", &mut config.collapse_borders),
    ] {
        if let Some(flag) = get_bool(obj, key) {
            *target = flag;
        }
    }

    config
}

fn decode_bindings(obj: &Map<String, Value>) -> Vec<PropertyBinding> {
    let Some(bindings) = obj.get("property_bindings").and_then(Value::as_object) else {
        return Vec::new();
    };

    bindings
        .iter()
        .filter_map(|(property, binding)| {
            let binding = binding.as_object()?;
            Some(PropertyBinding {
                property: property.clone(),
                source_expr: get_string(binding, "source_expr").unwrap_or_default(),
                resolved_value: get_string(binding, "resolved_value").unwrap_or_default(),
                kind: get_str(binding, "binding_type")
                    .map(BindingKind::parse)
                    .unwrap_or_default(),
            })
        })
        .collect()
}

fn decode_provenance(obj: &Map<String, Value>) -> Option<Provenance> {
    let meta = obj.get("source_metadata").and_then(Value::as_object)?;
    Some(Provenance {
        generated_by: get_string(meta, "generated_by"),
        iteration_index: meta.get("iteration_index").and_then(as_u32).unwrap_or(0),
        is_template: get_bool(meta, "is_template").unwrap_or(false),
    })
}

/// Fixed defaults for tab containers, applied only where the document is silent
fn apply_kind_defaults(node: &mut Node, obj: &Map<String, Value>) {
    match node.kind {
        ComponentType::TabBar => {
            if !obj.contains_key("flexDirection") {
                node.layout_mut().direction = FlexDirection::Row;
            }
            if !obj.contains_key("width") {
                node.style_mut().width = Dimension::Percent(100.0);
            }
        }
        ComponentType::Tab => {
            if !obj.contains_key("flexGrow") {
                node.layout_mut().grow = 1.0;
            }
            if !obj.contains_key("flexShrink") {
                node.layout_mut().shrink = 1.0;
            }
        }
        _ => {}
    }
}
