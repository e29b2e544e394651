//! Type-specific node payloads
//!
//! One variant per component kind that carries extra data. The encoder only
//! writes a payload when it [`matches`](Payload::matches) the node's type.

use super::component_type::ComponentType;
use super::style::{Color, Dimension};

/// Horizontal or vertical placement inside a table cell or column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellAlign {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageData {
    pub src: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropdownState {
    pub placeholder: String,
    pub options: Vec<String>,
    /// -1 when nothing is selected
    pub selected_index: i32,
    pub is_open: bool,
}

impl Default for DropdownState {
    fn default() -> Self {
        Self {
            placeholder: "Select...".to_string(),
            options: Vec::new(),
            selected_index: -1,
            is_open: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModalState {
    pub is_open: bool,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub width: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,
    pub alignment: CellAlign,
    pub auto_size: bool,
}

impl Default for TableColumn {
    fn default() -> Self {
        Self {
            width: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            alignment: CellAlign::Start,
            auto_size: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub columns: Vec<TableColumn>,
    pub border_color: Color,
    pub header_background: Color,
    pub even_row_background: Color,
    pub odd_row_background: Color,
    pub border_width: f32,
    pub cell_padding: f32,
    pub show_borders: bool,
    pub striped: bool,
    pub header_sticky: bool,
    pub collapse_borders: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            border_color: Color::Transparent,
            header_background: Color::Transparent,
            even_row_background: Color::Transparent,
            odd_row_background: Color::Transparent,
            border_width: 1.0,
            cell_padding: 8.0,
            show_borders: true,
            striped: false,
            header_sticky: false,
            collapse_borders: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    pub colspan: u16,
    pub rowspan: u16,
    pub alignment: CellAlign,
    pub vertical_alignment: VerticalAlign,
}

impl Default for CellData {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            alignment: CellAlign::Start,
            vertical_alignment: VerticalAlign::Top,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabData {
    pub title: Option<String>,
    pub reorderable: bool,
    pub selected_index: i32,
    pub active_background: Color,
    pub text_color: Color,
    pub active_text_color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingData {
    /// 1 through 6
    pub level: u8,
    pub text: Option<String>,
    /// Anchor id for in-document links
    pub anchor: Option<String>,
}

impl Default for HeadingData {
    fn default() -> Self {
        Self {
            level: 1,
            text: None,
            anchor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlockData {
    pub language: Option<String>,
    pub code: String,
    pub show_line_numbers: bool,
    pub start_line: u32,
}

impl Default for CodeBlockData {
    fn default() -> Self {
        Self {
            language: None,
            code: String::new(),
            show_line_numbers: false,
            start_line: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListData {
    pub ordered: bool,
    pub start: u32,
    pub tight: bool,
}

impl Default for ListData {
    fn default() -> Self {
        Self {
            ordered: false,
            start: 1,
            tight: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItemData {
    /// 0 for unordered items
    pub number: u32,
    pub marker: Option<String>,
    pub is_task: bool,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkData {
    pub url: String,
    pub title: Option<String>,
    pub target: Option<String>,
    pub rel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceholderData {
    pub name: String,
    pub preserve: bool,
}

/// Per-kind node data
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Checkbox { checked: bool },
    Image(ImageData),
    Dropdown(DropdownState),
    Modal(ModalState),
    Table(TableConfig),
    Cell(CellData),
    Tab(TabData),
    Heading(HeadingData),
    CodeBlock(CodeBlockData),
    List(ListData),
    ListItem(ListItemData),
    Link(LinkData),
    Placeholder(PlaceholderData),
    /// Extension data, encoded by the owning plugin's payload codec
    Plugin(serde_json::Value),
}

impl Payload {
    /// Returns true when this payload belongs on a node of `kind`
    pub fn matches(&self, kind: ComponentType) -> bool {
        use ComponentType as C;
        match self {
            Payload::Checkbox { .. } => kind == C::Checkbox,
            Payload::Image(_) => kind == C::Image,
            Payload::Dropdown(_) => kind == C::Dropdown,
            Payload::Modal(_) => kind == C::Modal,
            Payload::Table(_) => kind == C::Table,
            Payload::Cell(_) => kind.is_table_cell(),
            Payload::Tab(_) => kind.is_tab_kind(),
            Payload::Heading(_) => kind == C::Heading,
            Payload::CodeBlock(_) => kind == C::CodeBlock,
            Payload::List(_) => kind == C::List,
            Payload::ListItem(_) => kind == C::ListItem,
            Payload::Link(_) => kind == C::Link,
            Payload::Placeholder(_) => kind == C::Placeholder,
            Payload::Plugin(_) => matches!(kind, C::Plugin(_)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_its_kind_only() {
        let table = Payload::Table(TableConfig::default());
        assert!(table.matches(ComponentType::Table));
        assert!(!table.matches(ComponentType::Container));

        let cell = Payload::Cell(CellData::default());
        assert!(cell.matches(ComponentType::TableCell));
        assert!(cell.matches(ComponentType::TableHeaderCell));

        let tab = Payload::Tab(TabData::default());
        assert!(tab.matches(ComponentType::TabBar));
        assert!(tab.matches(ComponentType::Tab));

        let ext = Payload::Plugin(serde_json::json!({"points": 3}));
        assert!(ext.matches(ComponentType::Plugin(4)));
        assert!(!ext.matches(ComponentType::Canvas));
    }

    #[test]
    fn dropdown_defaults_to_no_selection() {
        let state = DropdownState::default();
        assert_eq!(state.selected_index, -1);
        assert_eq!(state.placeholder, "Select...");
    }
}
