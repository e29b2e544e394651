//! JSON forms of the style and layout value types
//!
//! Enum-valued fields are written as lowercase names through small lookup
//! tables; parsing is lenient and yields `None` for anything unrecognized.

use serde_json::{Map, Value};

use crate::domain::{
    Alignment, BackgroundClip, CellAlign, Direction, DisplayMode, FlexDirection, PositionMode,
    SelectorType, Spacing, TextAlign, TextDecoration, UnicodeBidi, VerticalAlign,
};

pub(crate) const ALIGNMENTS: &[(Alignment, &str)] = &[
    (Alignment::Start, "start"),
    (Alignment::Center, "center"),
    (Alignment::End, "end"),
    (Alignment::Stretch, "stretch"),
    (Alignment::SpaceBetween, "space-between"),
    (Alignment::SpaceAround, "space-around"),
    (Alignment::SpaceEvenly, "space-evenly"),
];

pub(crate) const FLEX_DIRECTIONS: &[(FlexDirection, &str)] =
    &[(FlexDirection::Column, "column"), (FlexDirection::Row, "row")];

pub(crate) const DIRECTIONS: &[(Direction, &str)] = &[
    (Direction::Ltr, "ltr"),
    (Direction::Rtl, "rtl"),
    (Direction::Auto, "auto"),
    (Direction::Inherit, "inherit"),
];

pub(crate) const BIDI_MODES: &[(UnicodeBidi, &str)] = &[
    (UnicodeBidi::Normal, "normal"),
    (UnicodeBidi::Embed, "embed"),
    (UnicodeBidi::Isolate, "isolate"),
    (UnicodeBidi::Plaintext, "plaintext"),
];

pub(crate) const DISPLAY_MODES: &[(DisplayMode, &str)] = &[
    (DisplayMode::Flex, "flex"),
    (DisplayMode::Grid, "grid"),
    (DisplayMode::Block, "block"),
];

pub(crate) const POSITIONS: &[(PositionMode, &str)] = &[
    (PositionMode::Relative, "relative"),
    (PositionMode::Absolute, "absolute"),
    (PositionMode::Fixed, "fixed"),
];

pub(crate) const TEXT_ALIGNS: &[(TextAlign, &str)] = &[
    (TextAlign::Left, "left"),
    (TextAlign::Center, "center"),
    (TextAlign::Right, "right"),
    (TextAlign::Justify, "justify"),
];

pub(crate) const BACKGROUND_CLIPS: &[(BackgroundClip, &str)] = &[
    (BackgroundClip::BorderBox, "border-box"),
    (BackgroundClip::PaddingBox, "padding-box"),
    (BackgroundClip::ContentBox, "content-box"),
    (BackgroundClip::Text, "text"),
];

pub(crate) const CELL_ALIGNS: &[(CellAlign, &str)] = &[
    (CellAlign::Start, "start"),
    (CellAlign::Center, "center"),
    (CellAlign::End, "end"),
];

pub(crate) const VERTICAL_ALIGNS: &[(VerticalAlign, &str)] = &[
    (VerticalAlign::Top, "top"),
    (VerticalAlign::Middle, "middle"),
    (VerticalAlign::Bottom, "bottom"),
];

pub(crate) const SELECTORS: &[(SelectorType, &str)] = &[
    (SelectorType::Element, "element"),
    (SelectorType::Class, "class"),
    (SelectorType::Id, "id"),
];

pub(crate) fn name_of<T: PartialEq + Copy>(table: &[(T, &'static str)], value: T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, name)| *name)
        .unwrap_or(table[0].1)
}

pub(crate) fn parse_name<T: Copy>(table: &[(T, &'static str)], name: &str) -> Option<T> {
    table.iter().find(|(_, n)| *n == name).map(|(v, _)| *v)
}

/// Alignment names, also accepting the `flex-start` / `flex-end` spellings
pub(crate) fn parse_alignment(name: &str) -> Option<Alignment> {
    match name {
        "flex-start" => Some(Alignment::Start),
        "flex-end" => Some(Alignment::End),
        other => parse_name(ALIGNMENTS, other),
    }
}

/// A JSON number for `v`; integral values are written without a fraction.
pub(crate) fn number(v: f32) -> Value {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        return Value::from(v as i64);
    }
    // Shortest decimal form of the f32, not its widened f64 expansion
    v.to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub(crate) fn as_f32(value: &Value) -> Option<f32> {
    value.as_f64().map(|v| v as f32)
}

pub(crate) fn as_u32(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
        .and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn as_i32(value: &Value) -> Option<i32> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v as i64))
        .and_then(|v| i32::try_from(v).ok())
}

/// A number, or a `{"op": "neg", "expr": n}` negation produced by some front ends
pub(crate) fn signed_number(value: &Value) -> Option<f32> {
    if let Some(v) = as_f32(value) {
        return Some(v);
    }
    let obj = value.as_object()?;
    match obj.get("op").and_then(Value::as_str) {
        Some("neg") => obj.get("expr").and_then(signed_number).map(|v| -v),
        _ => None,
    }
}

/// Collapses four edges to `n`, `[vertical, horizontal]` or `[t, r, b, l]`
pub(crate) fn spacing_to_json(spacing: Spacing) -> Value {
    let Spacing {
        top,
        right,
        bottom,
        left,
    } = spacing;

    if top == right && right == bottom && bottom == left {
        number(top)
    } else if top == bottom && left == right {
        Value::Array(vec![number(top), number(left)])
    } else {
        Value::Array(vec![number(top), number(right), number(bottom), number(left)])
    }
}

pub(crate) fn spacing_from_json(value: &Value) -> Option<Spacing> {
    if let Some(v) = as_f32(value) {
        return Some(Spacing::uniform(v));
    }

    let items: Vec<f32> = value
        .as_array()?
        .iter()
        .map(|v| as_f32(v).unwrap_or(0.0))
        .collect();
    match items.as_slice() {
        [all] => Some(Spacing::uniform(*all)),
        [vertical, horizontal] => Some(Spacing::symmetric(*vertical, *horizontal)),
        [top, right, bottom, left] => Some(Spacing::new(*top, *right, *bottom, *left)),
        _ => None,
    }
}

pub(crate) fn decoration_to_string(decoration: TextDecoration) -> String {
    let mut parts = Vec::new();
    if decoration.underline {
        parts.push("underline");
    }
    if decoration.overline {
        parts.push("overline");
    }
    if decoration.line_through {
        parts.push("line-through");
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(" ")
    }
}

pub(crate) fn decoration_from_str(s: &str) -> TextDecoration {
    TextDecoration {
        underline: s.contains("underline"),
        overline: s.contains("overline"),
        line_through: s.contains("line-through"),
    }
}

/// Inserts `value` under `key` only when it is a string
pub(crate) fn put_opt_str(obj: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        obj.insert(key.to_string(), Value::from(v));
    }
}

pub(crate) fn get_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

pub(crate) fn get_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    get_str(obj, key).map(str::to_string)
}

pub(crate) fn get_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

pub(crate) fn get_f32(obj: &Map<String, Value>, key: &str) -> Option<f32> {
    obj.get(key).and_then(as_f32)
}
