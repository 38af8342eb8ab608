//! Markers annotate a range of an item with a color and a comment.

use cutline_time::{RationalTime, TimeRange};
use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// The fixed marker color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerColor {
    Pink,
    Red,
    Orange,
    Yellow,
    #[default]
    Green,
    Cyan,
    Blue,
    Purple,
    Magenta,
    Black,
    White,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Pink => "PINK",
            MarkerColor::Red => "RED",
            MarkerColor::Orange => "ORANGE",
            MarkerColor::Yellow => "YELLOW",
            MarkerColor::Green => "GREEN",
            MarkerColor::Cyan => "CYAN",
            MarkerColor::Blue => "BLUE",
            MarkerColor::Purple => "PURPLE",
            MarkerColor::Magenta => "MAGENTA",
            MarkerColor::Black => "BLACK",
            MarkerColor::White => "WHITE",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<MarkerColor> {
        match s.to_ascii_uppercase().as_str() {
            "PINK" => Some(MarkerColor::Pink),
            "RED" => Some(MarkerColor::Red),
            "ORANGE" => Some(MarkerColor::Orange),
            "YELLOW" => Some(MarkerColor::Yellow),
            "GREEN" => Some(MarkerColor::Green),
            "CYAN" => Some(MarkerColor::Cyan),
            "BLUE" => Some(MarkerColor::Blue),
            "PURPLE" => Some(MarkerColor::Purple),
            "MAGENTA" => Some(MarkerColor::Magenta),
            "BLACK" => Some(MarkerColor::Black),
            "WHITE" => Some(MarkerColor::White),
            _ => None,
        }
    }
}

/// An annotation over a range of its owning item, expressed in that item's
/// local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub color: MarkerColor,
    pub marked_range: TimeRange,
    pub comment: String,
    pub metadata: Metadata,
}

impl Marker {
    /// A green marker over `marked_range` with no comment.
    pub fn new(name: impl Into<String>, marked_range: TimeRange) -> Marker {
        Marker {
            name: name.into(),
            color: MarkerColor::default(),
            marked_range,
            comment: String::new(),
            metadata: Metadata::new(),
        }
    }

    /// A zero-duration marker at `at`.
    pub fn at_time(name: impl Into<String>, at: RationalTime) -> Marker {
        Marker::new(name, TimeRange::new(at, RationalTime::zero(at.rate)))
    }

    pub fn with_color(mut self, color: MarkerColor) -> Marker {
        self.color = color;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Marker {
        self.comment = comment.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_is_green() {
        let marker = Marker::at_time("note", RationalTime::new(12.0, 24.0));
        assert_eq!(marker.color, MarkerColor::Green);
        assert_eq!(marker.marked_range.duration.value, 0.0);
    }

    #[test]
    fn color_names_round_trip() {
        for color in [
            MarkerColor::Pink,
            MarkerColor::Red,
            MarkerColor::Orange,
            MarkerColor::Yellow,
            MarkerColor::Green,
            MarkerColor::Cyan,
            MarkerColor::Blue,
            MarkerColor::Purple,
            MarkerColor::Magenta,
            MarkerColor::Black,
            MarkerColor::White,
        ] {
            assert_eq!(MarkerColor::from_str_loose(color.as_str()), Some(color));
        }
        assert_eq!(MarkerColor::from_str_loose("chartreuse"), None);
    }
}
