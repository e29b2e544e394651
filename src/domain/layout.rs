//! Layout values consumed by the external flex/grid solver
//!
//! Nothing here computes layout; these are the parameters a solver reads.

use super::style::Dimension;

/// Explicit display mode; `None` on [`Layout`] means "not set"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Flex,
    Grid,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
}

/// Bidi base direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
    Auto,
    Inherit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnicodeBidi {
    #[default]
    Normal,
    Embed,
    Isolate,
    Plaintext,
}

/// Main/cross axis alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
    Stretch,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Size of one explicit grid track
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridTrack {
    Px(f32),
    Percent(f32),
    Fr(f32),
    Auto,
    MinContent,
    MaxContent,
}

impl GridTrack {
    /// Wire name of the track kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            GridTrack::Px(_) => "px",
            GridTrack::Percent(_) => "percent",
            GridTrack::Fr(_) => "fr",
            GridTrack::Auto => "auto",
            GridTrack::MinContent => "min-content",
            GridTrack::MaxContent => "max-content",
        }
    }

    pub fn value(&self) -> f32 {
        match self {
            GridTrack::Px(v) | GridTrack::Percent(v) | GridTrack::Fr(v) => *v,
            _ => 0.0,
        }
    }

    pub fn from_parts(kind: &str, value: f32) -> Self {
        match kind {
            "px" => GridTrack::Px(value),
            "percent" => GridTrack::Percent(value),
            "fr" => GridTrack::Fr(value),
            "min-content" => GridTrack::MinContent,
            "max-content" => GridTrack::MaxContent,
            _ => GridTrack::Auto,
        }
    }
}

/// Grid container parameters, only meaningful in grid display mode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    pub row_gap: f32,
    pub column_gap: f32,
    pub columns: Vec<GridTrack>,
    pub rows: Vec<GridTrack>,
    pub justify_items: Alignment,
    pub align_items: Alignment,
}

/// Flex/grid parameters of a node
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub display: Option<DisplayMode>,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,
    pub direction: FlexDirection,
    pub text_direction: Direction,
    pub unicode_bidi: UnicodeBidi,
    pub justify_content: Alignment,
    pub align_items: Alignment,
    pub gap: f32,
    pub grow: f32,
    pub shrink: f32,
    pub wrap: bool,
    pub aspect_ratio: f32,
    pub grid: Grid,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            display: None,
            min_width: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            max_height: Dimension::Auto,
            direction: FlexDirection::Column,
            text_direction: Direction::Ltr,
            unicode_bidi: UnicodeBidi::Normal,
            justify_content: Alignment::Start,
            align_items: Alignment::Start,
            gap: 0.0,
            grow: 0.0,
            shrink: 1.0,
            wrap: false,
            aspect_ratio: 0.0,
            grid: Grid::default(),
        }
    }
}

impl Layout {
    pub fn is_grid(&self) -> bool {
        self.display == Some(DisplayMode::Grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_defaults() {
        let layout = Layout::default();
        assert_eq!(layout.direction, FlexDirection::Column);
        assert_eq!(layout.shrink, 1.0);
        assert_eq!(layout.display, None);
        assert!(!layout.is_grid());
    }

    #[test]
    fn grid_track_names() {
        let track = GridTrack::from_parts("fr", 2.0);
        assert_eq!(track, GridTrack::Fr(2.0));
        assert_eq!(track.kind_name(), "fr");
        assert_eq!(GridTrack::from_parts("bogus", 3.0), GridTrack::Auto);
        assert_eq!(GridTrack::MinContent.value(), 0.0);
    }
}
