//! Line styles, markers and the "scalar or list" parameter type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlotError;

// ---------------------------------------------------------------------------
// LineStyle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    DashDot,
    Dotted,
    /// Markers only, no connecting line.
    None,
}

impl LineStyle {
    /// On/off pattern as multiples of the line width.
    pub fn dash_pattern(self) -> Option<&'static [f64]> {
        match self {
            LineStyle::Solid | LineStyle::None => None,
            LineStyle::Dashed => Some(&[3.7, 1.6]),
            LineStyle::DashDot => Some(&[6.4, 1.6, 1.0, 1.6]),
            LineStyle::Dotted => Some(&[1.0, 1.65]),
        }
    }
}

impl FromStr for LineStyle {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" | "solid" => Ok(LineStyle::Solid),
            "--" | "dashed" => Ok(LineStyle::Dashed),
            "-." | "dashdot" => Ok(LineStyle::DashDot),
            ":" | "dotted" => Ok(LineStyle::Dotted),
            "" | " " | "None" | "none" => Ok(LineStyle::None),
            other => Err(PlotError::UnknownLinestyle(other.to_string())),
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::DashDot => "dashdot",
            LineStyle::Dotted => "dotted",
            LineStyle::None => "none",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    #[default]
    None,
    Circle,
    Point,
    Pentagon,
    Star,
    X,
    Plus,
    FilledX,
    Square,
    Diamond,
    TriangleUp,
    TriangleDown,
}

impl Marker {
    /// Markers accepted on map contours.
    pub const CONTOUR_MARKERS: [&'static str; 8] = ["", "o", ".", "p", "*", "x", "+", "X"];
}

impl FromStr for Marker {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "None" | "none" => Ok(Marker::None),
            "o" => Ok(Marker::Circle),
            "." => Ok(Marker::Point),
            "p" => Ok(Marker::Pentagon),
            "*" => Ok(Marker::Star),
            "x" => Ok(Marker::X),
            "+" => Ok(Marker::Plus),
            "X" => Ok(Marker::FilledX),
            "s" => Ok(Marker::Square),
            "D" | "d" => Ok(Marker::Diamond),
            "^" => Ok(Marker::TriangleUp),
            "v" => Ok(Marker::TriangleDown),
            other => Err(PlotError::UnknownMarker(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// OneOrMany
// ---------------------------------------------------------------------------

/// A parameter supplied either as a single value or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// The values in supplied order; a scalar becomes a one-element list.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }

    /// Resolve to exactly `n` values: a scalar is replicated, a list is
    /// distributed positionally (extra values are ignored). Returns the
    /// number of supplied values on failure.
    pub fn broadcast(&self, n: usize) -> Result<Vec<T>, usize> {
        match self {
            OneOrMany::One(v) => Ok(vec![v.clone(); n]),
            OneOrMany::Many(v) if v.len() >= n => Ok(v[..n].to_vec()),
            OneOrMany::Many(v) => Err(v.len()),
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(v: Vec<T>) -> Self {
        OneOrMany::Many(v)
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Endless round-robin over a fixed list. The position is shared across
/// every series of one render call.
#[derive(Debug, Clone)]
pub struct Cycle<T> {
    items: Vec<T>,
    pos: usize,
}

impl<T: Clone> Cycle<T> {
    /// `items` must not be empty.
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Cycle { items, pos: 0 })
        }
    }

    pub fn next_item(&mut self) -> T {
        let item = self.items[self.pos % self.items.len()].clone();
        self.pos += 1;
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linestyle_aliases() {
        assert_eq!("-".parse::<LineStyle>().unwrap(), LineStyle::Solid);
        assert_eq!("dashed".parse::<LineStyle>().unwrap(), LineStyle::Dashed);
        assert_eq!("-.".parse::<LineStyle>().unwrap(), LineStyle::DashDot);
        assert_eq!(":".parse::<LineStyle>().unwrap(), LineStyle::Dotted);
        assert!("~~".parse::<LineStyle>().is_err());
    }

    #[test]
    fn broadcast_scalar_and_list() {
        let one = OneOrMany::One(5u32);
        assert_eq!(one.broadcast(3).unwrap(), vec![5, 5, 5]);

        let many: OneOrMany<u32> = vec![1, 2, 3].into();
        assert_eq!(many.broadcast(2).unwrap(), vec![1, 2]);
        assert_eq!(many.broadcast(4), Err(3));
    }

    #[test]
    fn cycle_wraps() {
        let mut c = Cycle::new(vec!["a", "b"]).unwrap();
        let got: Vec<_> = (0..5).map(|_| c.next_item()).collect();
        assert_eq!(got, vec!["a", "b", "a", "b", "a"]);
        assert!(Cycle::<u8>::new(vec![]).is_none());
    }

    #[test]
    fn deserializes_scalar_or_list() {
        let one: OneOrMany<String> = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(one, OneOrMany::One("red".to_string()));
        let many: OneOrMany<String> = serde_json::from_str("[\"red\", \"blue\"]").unwrap();
        assert_eq!(many.to_vec().len(), 2);
    }
}
