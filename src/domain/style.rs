//! Visual style values
//!
//! Every field has a documented default (see the `Default` impls); the
//! encoder omits fields that sit at their default unless a property binding
//! targets them.
//!
//! [`Dimension`] and [`Color`] carry their document text form through
//! `Display` and a lenient `parse`, matching what producers emit:
//!
//! | Value | Text |
//! |-------|------|
//! | `Dimension::Px(100.0)` | `100.0px` |
//! | `Dimension::Percent(50.0)` | `50.0%` |
//! | `Color::rgb(255, 0, 0)` | `#ff0000` |
//! | `Color::rgba(255, 0, 0, 128)` | `#ff000080` |

use std::fmt;

/// A length value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    #[default]
    Auto,
    Px(f32),
    Percent(f32),
    Em(f32),
    Rem(f32),
    Vw(f32),
    Vh(f32),
    /// Flex fraction (`fr`)
    Fr(f32),
}

impl Dimension {
    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    /// Parses `auto`, `12px`, `50%`, `1.5em`, `2rem`, `10vw`, `10vh`, `1fr`.
    ///
    /// Empty input is `auto`; a missing or unknown unit means pixels.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "auto" {
            return Dimension::Auto;
        }

        let (value, unit) = split_number(s);
        match unit {
            "%" => Dimension::Percent(value),
            "em" => Dimension::Em(value),
            "rem" => Dimension::Rem(value),
            "vw" => Dimension::Vw(value),
            "vh" => Dimension::Vh(value),
            "fr" => Dimension::Fr(value),
            _ => Dimension::Px(value),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Auto => f.write_str("auto"),
            Dimension::Px(v) => write!(f, "{:.1}px", v),
            Dimension::Percent(v) => write!(f, "{:.1}%", v),
            Dimension::Em(v) => write!(f, "{:.2}em", v),
            Dimension::Rem(v) => write!(f, "{:.2}rem", v),
            Dimension::Vw(v) => write!(f, "{:.1}vw", v),
            Dimension::Vh(v) => write!(f, "{:.1}vh", v),
            Dimension::Fr(v) => write!(f, "{:.1}fr", v),
        }
    }
}

/// Splits a leading decimal number from its suffix; no number reads as zero
fn split_number(s: &str) -> (f32, &str) {
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'-' || bytes[exp] == b'+') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            end = exp;
        }
    }

    match s[..end].parse::<f32>() {
        Ok(value) => (value, &s[end..]),
        Err(_) => (0.0, s),
    }
}

/// A color value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Transparent,
    Rgba { r: u8, g: u8, b: u8, a: u8 },
    /// Indirect reference to a named theme variable
    Var { id: u16, name: Option<String> },
}

/// Basic named colors accepted when decoding
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("maroon", [128, 0, 0]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("olive", [128, 128, 0]),
];

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgba { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color::Rgba { r, g, b, a }
    }

    /// Reference to theme variable `id`
    pub fn var(id: u16) -> Self {
        Color::Var { id, name: None }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Color::Transparent)
    }

    pub fn is_solid(&self) -> bool {
        matches!(self, Color::Rgba { .. })
    }

    /// Parses hex, `rgb()`, `rgba()`, `var(...)`, `transparent` and named colors.
    ///
    /// Anything unrecognized is transparent.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "transparent" {
            return Color::Transparent;
        }

        if let Some(inner) = s.strip_prefix("var(") {
            let digits: String = inner.chars().take_while(|c| c.is_ascii_digit()).collect();
            let id = digits.parse::<u16>().ok();
            // Plain numeric references are rebuilt from the id alone
            if let (Some(id), ")") = (id, &inner[digits.len()..]) {
                return Color::var(id);
            }
            return Color::Var {
                id: id.unwrap_or(0),
                name: Some(s.to_string()),
            };
        }

        if let Some(args) = s.strip_prefix("rgba(") {
            let v = parse_components(args);
            return Color::Rgba {
                r: channel(v[0]),
                g: channel(v[1]),
                b: channel(v[2]),
                a: channel(Some(v[3].unwrap_or(1.0) * 255.0)),
            };
        }

        if let Some(args) = s.strip_prefix("rgb(") {
            let v = parse_components(args);
            return Color::rgb(channel(v[0]), channel(v[1]), channel(v[2]));
        }

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = s.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, [r, g, b])| Color::rgb(*r, *g, *b))
            .unwrap_or(Color::Transparent)
    }
}

fn parse_components(args: &str) -> [Option<f32>; 4] {
    let mut out = [None; 4];
    let args = args.trim_end_matches(')');
    for (slot, part) in out.iter_mut().zip(args.split(',')) {
        *slot = part.trim().parse::<f32>().ok();
    }
    out
}

fn channel(value: Option<f32>) -> u8 {
    value.unwrap_or(0.0).clamp(0.0, 255.0) as u8
}

fn parse_hex(hex: &str) -> Color {
    let nibble = |i: usize| {
        hex.get(i..i + 1)
            .and_then(|d| u8::from_str_radix(d, 16).ok())
            .unwrap_or(0)
    };
    let byte = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|d| u8::from_str_radix(d, 16).ok())
            .unwrap_or(0)
    };

    match hex.len() {
        6 => Color::rgb(byte(0), byte(2), byte(4)),
        8 => Color::rgba(byte(0), byte(2), byte(4), byte(6)),
        3 => Color::rgb(nibble(0) * 17, nibble(1) * 17, nibble(2) * 17),
        4 => Color::rgba(nibble(0) * 17, nibble(1) * 17, nibble(2) * 17, nibble(3) * 17),
        _ => Color::rgb(0, 0, 0),
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Transparent => f.write_str("transparent"),
            Color::Rgba { r, g, b, a: 255 } => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            Color::Rgba { r, g, b, a } => write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a),
            Color::Var { name: Some(name), .. } => f.write_str(name),
            Color::Var { id, name: None } => write!(f, "var({})", id),
        }
    }
}

/// Four independent edges (padding, margin)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spacing {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Spacing {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Vertical edges share one value, horizontal edges the other
    pub fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

/// Border widths, color and corner radius
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Border {
    pub width: f32,
    pub width_top: f32,
    pub width_right: f32,
    pub width_bottom: f32,
    pub width_left: f32,
    pub color: Color,
    pub radius: u8,
}

impl Border {
    pub fn has_width(&self) -> bool {
        self.width > 0.0
            || self.width_top > 0.0
            || self.width_right > 0.0
            || self.width_bottom > 0.0
            || self.width_left > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionMode {
    #[default]
    Relative,
    Absolute,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Text decoration lines; any combination may be set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextDecoration {
    pub underline: bool,
    pub overline: bool,
    pub line_through: bool,
}

impl TextDecoration {
    pub fn is_none(&self) -> bool {
        !(self.underline || self.overline || self.line_through)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundClip {
    #[default]
    BorderBox,
    PaddingBox,
    ContentBox,
    Text,
}

/// Typography
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// 0 means inherit
    pub size: f32,
    pub family: Option<String>,
    pub weight: u16,
    pub bold: bool,
    pub italic: bool,
    pub line_height: f32,
    pub color: Color,
    pub align: TextAlign,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    pub decoration: TextDecoration,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: 0.0,
            family: None,
            weight: 400,
            bold: false,
            italic: false,
            line_height: 0.0,
            color: Color::Transparent,
            align: TextAlign::Left,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            decoration: TextDecoration::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Degrees
    pub rotate: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotate: 0.0,
        }
    }
}

const EPSILON: f32 = 0.001;

impl Transform {
    pub fn has_translate(&self) -> bool {
        self.translate_x.abs() > EPSILON || self.translate_y.abs() > EPSILON
    }

    pub fn has_scale(&self) -> bool {
        (self.scale_x - 1.0).abs() > EPSILON || (self.scale_y - 1.0).abs() > EPSILON
    }

    pub fn has_rotate(&self) -> bool {
        self.rotate.abs() > EPSILON
    }

    pub fn is_identity(&self) -> bool {
        !(self.has_translate() || self.has_scale() || self.has_rotate())
    }
}

/// Complete visual style of a node
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub width: Dimension,
    pub height: Dimension,
    pub visible: bool,
    pub opacity: f32,
    pub z_index: i32,
    pub background: Color,
    pub border: Border,
    pub position: PositionMode,
    pub left: f32,
    pub top: f32,
    pub font: Font,
    pub padding: Spacing,
    pub margin: Spacing,
    pub transform: Transform,
    pub background_image: Option<String>,
    pub background_clip: BackgroundClip,
    pub text_fill_color: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            width: Dimension::Auto,
            height: Dimension::Auto,
            visible: true,
            opacity: 1.0,
            z_index: 0,
            background: Color::Transparent,
            border: Border::default(),
            position: PositionMode::Relative,
            left: 0.0,
            top: 0.0,
            font: Font::default(),
            padding: Spacing::default(),
            margin: Spacing::default(),
            transform: Transform::default(),
            background_image: None,
            background_clip: BackgroundClip::BorderBox,
            text_fill_color: Color::Transparent,
        }
    }
}
