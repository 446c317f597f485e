use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::error::PlotError;

/// An 8-bit sRGB colour, the colour type used throughout figures.
pub type Rgb = Srgb<u8>;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
///
/// Used as the colour cycle when the caller does not supply one.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color parsing
// ---------------------------------------------------------------------------

/// Whether `name` is one of the CSS4 / SVG colour keywords.
pub fn is_named_color(name: &str) -> bool {
    palette::named::from_str(name).is_some()
}

/// Parse a colour given as a CSS4 name (`"darkorange"`), a hex code
/// (`"#55AADD"`, `"#5AD"`) or a single-letter shorthand (`"r"`, `"k"`).
pub fn parse_color(s: &str) -> Result<Rgb, PlotError> {
    let trimmed = s.trim();
    let lower = trimmed.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        return Rgb::from_str(hex).map_err(|_| PlotError::UnknownColor(s.to_string()));
    }

    let shorthand = match lower.as_str() {
        "b" => Some("blue"),
        "g" => Some("green"),
        "r" => Some("red"),
        "c" => Some("cyan"),
        "m" => Some("magenta"),
        "y" => Some("yellow"),
        "k" => Some("black"),
        "w" => Some("white"),
        _ => None,
    };

    palette::named::from_str(shorthand.unwrap_or(&lower))
        .ok_or_else(|| PlotError::UnknownColor(s.to_string()))
}

// ---------------------------------------------------------------------------
// Conversions into the two rendering back ends
// ---------------------------------------------------------------------------

pub fn to_color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

pub fn to_plotters(c: Rgb) -> plotters::style::RGBColor {
    plotters::style::RGBColor(c.red, c.green, c.blue)
}
