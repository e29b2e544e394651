//! Event and property bindings attached to nodes

use std::fmt;

/// Built-in event kinds plus plugin-registered ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Hover,
    Focus,
    Blur,
    TextChange,
    Key,
    Scroll,
    Timer,
    Custom,
    /// Plugin event id in 100..=255
    Plugin(u8),
}

const EVENT_NAMES: &[(EventKind, &str)] = &[
    (EventKind::Click, "click"),
    (EventKind::Hover, "hover"),
    (EventKind::Focus, "focus"),
    (EventKind::Blur, "blur"),
    (EventKind::TextChange, "text_change"),
    (EventKind::Key, "key"),
    (EventKind::Scroll, "scroll"),
    (EventKind::Timer, "timer"),
    (EventKind::Custom, "custom"),
];

impl EventKind {
    /// Looks up a built-in event name
    pub fn from_builtin_name(name: &str) -> Option<Self> {
        EVENT_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(kind, _)| *kind)
    }

    pub fn builtin_name(&self) -> Option<&'static str> {
        EVENT_NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, n)| *n)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Plugin(id) => write!(f, "plugin_event_{}", id),
            other => f.write_str(other.builtin_name().unwrap_or("custom")),
        }
    }
}

/// Source code of an event handler, kept for round trips
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandlerSource {
    pub language: String,
    pub code: String,
    pub file: Option<String>,
    pub line: u32,
    pub uses_closures: bool,
    pub closure_vars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventBinding {
    pub kind: EventKind,
    /// Original name for custom and plugin events
    pub name: Option<String>,
    pub logic_id: Option<String>,
    pub handler_data: Option<String>,
    /// 0 when no compiled handler exists
    pub bytecode_function_id: u32,
    pub handler_source: Option<HandlerSource>,
}

impl EventBinding {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            name: None,
            logic_id: None,
            handler_data: None,
            bytecode_function_id: 0,
            handler_source: None,
        }
    }
}

/// How a property binding's expression is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingKind {
    #[default]
    StaticTemplate,
    ConstRef,
    Reactive,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::StaticTemplate => "static_template",
            BindingKind::ConstRef => "const_ref",
            BindingKind::Reactive => "reactive",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "const_ref" => BindingKind::ConstRef,
            "reactive" => BindingKind::Reactive,
            _ => BindingKind::StaticTemplate,
        }
    }
}

/// Dynamic expression bound to a style/layout property
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyBinding {
    /// Wire name of the bound property, e.g. `background`
    pub property: String,
    pub source_expr: String,
    pub resolved_value: String,
    pub kind: BindingKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_event_names() {
        assert_eq!(EventKind::from_builtin_name("text_change"), Some(EventKind::TextChange));
        assert_eq!(EventKind::from_builtin_name("swipe"), None);
        assert_eq!(EventKind::Click.to_string(), "click");
        assert_eq!(EventKind::Plugin(120).to_string(), "plugin_event_120");
    }

    #[test]
    fn binding_kind_names() {
        assert_eq!(BindingKind::parse("reactive"), BindingKind::Reactive);
        assert_eq!(BindingKind::parse("whatever"), BindingKind::StaticTemplate);
        assert_eq!(BindingKind::ConstRef.as_str(), "const_ref");
    }
}
