//! Component type tags
//!
//! Internally a node's kind is the closed [`ComponentType`] enum. Names only
//! exist at the document boundary: [`fmt::Display`] produces the canonical
//! CamelCase name and [`FromStr`] accepts the CamelCase, `UPPER_SNAKE` and
//! `UPPERCASE` spellings emitted by the various producers.
//!
//! Extension types registered by plugins use `Plugin(n)`, written as
//! `Plugin:<n>` in documents.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ComponentTypeError {
    #[error("Unknown component type: '{0}'")]
    Unknown(String),
}

/// Kind of a component node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ComponentType {
    #[default]
    Container,
    Row,
    Column,
    Center,
    Text,
    Button,
    Input,
    Checkbox,
    Image,
    Canvas,
    Dropdown,
    Modal,
    Markdown,
    TabGroup,
    TabBar,
    Tab,
    TabContent,
    TabPanel,
    Table,
    TableHead,
    TableBody,
    TableFoot,
    TableRow,
    TableCell,
    TableHeaderCell,
    Heading,
    Paragraph,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    List,
    ListItem,
    Link,
    Custom,
    Span,
    Strong,
    Em,
    CodeInline,
    Small,
    Mark,
    StaticBlock,
    ForLoop,
    ForEach,
    VarDecl,
    Placeholder,
    /// Extension type owned by a plugin
    Plugin(u8),
}

const PLUGIN_PREFIX: &str = "Plugin:";

/// Canonical names for every built-in kind
const BUILTIN_NAMES: &[(ComponentType, &str)] = &[
    (ComponentType::Container, "Container"),
    (ComponentType::Row, "Row"),
    (ComponentType::Column, "Column"),
    (ComponentType::Center, "Center"),
    (ComponentType::Text, "Text"),
    (ComponentType::Button, "Button"),
    (ComponentType::Input, "Input"),
    (ComponentType::Checkbox, "Checkbox"),
    (ComponentType::Image, "Image"),
    (ComponentType::Canvas, "Canvas"),
    (ComponentType::Dropdown, "Dropdown"),
    (ComponentType::Modal, "Modal"),
    (ComponentType::Markdown, "Markdown"),
    (ComponentType::TabGroup, "TabGroup"),
    (ComponentType::TabBar, "TabBar"),
    (ComponentType::Tab, "Tab"),
    (ComponentType::TabContent, "TabContent"),
    (ComponentType::TabPanel, "TabPanel"),
    (ComponentType::Table, "Table"),
    (ComponentType::TableHead, "TableHead"),
    (ComponentType::TableBody, "TableBody"),
    (ComponentType::TableFoot, "TableFoot"),
    (ComponentType::TableRow, "TableRow"),
    (ComponentType::TableCell, "TableCell"),
    (ComponentType::TableHeaderCell, "TableHeaderCell"),
    (ComponentType::Heading, "Heading"),
    (ComponentType::Paragraph, "Paragraph"),
    (ComponentType::Blockquote, "Blockquote"),
    (ComponentType::CodeBlock, "CodeBlock"),
    (ComponentType::HorizontalRule, "HorizontalRule"),
    (ComponentType::List, "List"),
    (ComponentType::ListItem, "ListItem"),
    (ComponentType::Link, "Link"),
    (ComponentType::Custom, "Custom"),
    (ComponentType::Span, "Span"),
    (ComponentType::Strong, "Strong"),
    (ComponentType::Em, "Em"),
    (ComponentType::CodeInline, "CodeInline"),
    (ComponentType::Small, "Small"),
    (ComponentType::Mark, "Mark"),
    (ComponentType::StaticBlock, "StaticBlock"),
    (ComponentType::ForLoop, "ForLoop"),
    (ComponentType::ForEach, "ForEach"),
    (ComponentType::VarDecl, "VarDecl"),
    (ComponentType::Placeholder, "Placeholder"),
];

/// Short HTML-style aliases
const ALIASES: &[(&str, ComponentType)] = &[
    ("Body", ComponentType::Container),
    ("Tr", ComponentType::TableRow),
    ("Td", ComponentType::TableCell),
    ("Th", ComponentType::TableHeaderCell),
];

impl ComponentType {
    /// Returns true for the tab family (group, bar, tab, content, panel)
    pub fn is_tab_kind(&self) -> bool {
        matches!(
            self,
            ComponentType::TabGroup
                | ComponentType::TabBar
                | ComponentType::Tab
                | ComponentType::TabContent
                | ComponentType::TabPanel
        )
    }

    /// Returns true for table data and header cells
    pub fn is_table_cell(&self) -> bool {
        matches!(self, ComponentType::TableCell | ComponentType::TableHeaderCell)
    }

    /// Parses a type name, falling back to [`ComponentType::Container`]
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    fn builtin_name(&self) -> Option<&'static str> {
        BUILTIN_NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, name)| *name)
    }
}

/// Uppercases and drops underscores so `TAB_BAR`, `TABBAR` and `TabBar` compare equal
fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Plugin(n) => write!(f, "{}{}", PLUGIN_PREFIX, n),
            other => f.write_str(other.builtin_name().unwrap_or("Container")),
        }
    }
}

impl FromStr for ComponentType {
    type Err = ComponentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(PLUGIN_PREFIX) {
            return rest
                .parse::<u8>()
                .map(ComponentType::Plugin)
                .map_err(|_| ComponentTypeError::Unknown(s.to_string()));
        }

        if let Some((kind, _)) = BUILTIN_NAMES.iter().find(|(_, name)| *name == s) {
            return Ok(*kind);
        }

        let folded = fold(s);
        ALIASES
            .iter()
            .map(|(alias, kind)| (*alias, *kind))
            .chain(BUILTIN_NAMES.iter().map(|(kind, name)| (*name, *kind)))
            .find(|(name, _)| fold(name) == folded)
            .map(|(_, kind)| kind)
            .ok_or_else(|| ComponentTypeError::Unknown(s.to_string()))
    }
}
