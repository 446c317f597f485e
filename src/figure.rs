//! In-memory figures: what the composers build, what "return" mode hands
//! back, and what the display and save back ends draw.

use chrono::{DateTime, TimeZone, Utc};

use crate::color::Rgb;
use crate::style::{LineStyle, Marker};
use crate::theme::{active_theme, Theme};

/// Resolution used to turn a figure size in inches into pixels.
pub const DPI: f64 = 100.0;

// ---------------------------------------------------------------------------
// Time <-> axis coordinate
// ---------------------------------------------------------------------------

/// Time axes use seconds since the Unix epoch as their coordinate.
pub fn time_to_x(t: &DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

pub fn x_to_time(x: f64) -> Option<DateTime<Utc>> {
    if !x.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt((x * 1000.0).round() as i64).single()
}

/// Tick label for a time coordinate using a strftime format.
pub fn format_time_tick(x: f64, date_format: &str) -> String {
    match x_to_time(x) {
        Some(t) => t.format(date_format).to_string(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Drawables
// ---------------------------------------------------------------------------

/// A polyline and/or set of markers. Non-finite points break the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub color: Rgb,
    pub width: f64,
    pub style: LineStyle,
    pub marker: Marker,
    pub marker_size: f64,
    /// Higher draws later. Ties keep insertion order.
    pub z_order: i32,
}

impl Line {
    pub fn new(x: Vec<f64>, y: Vec<f64>, color: Rgb) -> Self {
        Line {
            label: None,
            x,
            y,
            color,
            width: 1.5,
            style: LineStyle::Solid,
            marker: Marker::None,
            marker_size: 6.0,
            z_order: 0,
        }
    }

    /// Runs of consecutive finite points.
    pub fn finite_runs(&self) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for (&x, &y) in self.x.iter().zip(self.y.iter()) {
            if x.is_finite() && y.is_finite() {
                current.push((x, y));
            } else if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

/// Text anchored (centred) on a data coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: Rgb,
}

/// A filled polygon ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub ring: Vec<(f64, f64)>,
    pub face: Rgb,
    pub edge: Option<Rgb>,
}

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AxesKind {
    /// x is time (see [`time_to_x`]), ticks formatted with a strftime string.
    Time { date_format: String },
    /// Projected map coordinates, equal aspect, no ticks.
    Map { projection: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub kind: AxesKind,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub legend: bool,
    /// Hide the topmost y tick label (stacked plots).
    pub drop_top_ytick: bool,
    /// Fill behind everything else (map ocean).
    pub background: Option<Rgb>,
    pub fills: Vec<Fill>,
    pub lines: Vec<Line>,
    pub labels: Vec<Label>,
}

impl Axes {
    pub fn new(kind: AxesKind) -> Self {
        Axes {
            kind,
            title: None,
            x_label: None,
            y_label: None,
            x_range: None,
            y_range: None,
            legend: false,
            drop_top_ytick: false,
            background: None,
            fills: Vec::new(),
            lines: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Lines in draw order.
    pub fn lines_by_z(&self) -> Vec<&Line> {
        let mut lines: Vec<&Line> = self.lines.iter().collect();
        lines.sort_by_key(|l| l.z_order);
        lines
    }

    /// Labelled lines, in insertion order.
    pub fn legend_entries(&self) -> Vec<&Line> {
        self.lines.iter().filter(|l| l.label.is_some()).collect()
    }

    fn data_extent(&self, pick: impl Fn(&(f64, f64)) -> f64) -> Option<(f64, f64)> {
        let line_points = self
            .lines
            .iter()
            .flat_map(|l| l.x.iter().zip(l.y.iter()).map(|(&x, &y)| (x, y)));
        let fill_points = self.fills.iter().flat_map(|f| f.ring.iter().copied());
        // each axis only skips its own gaps
        line_points
            .chain(fill_points)
            .map(|p| pick(&p))
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// First and last x coordinate covered by the drawn data.
    pub fn x_data_span(&self) -> Option<(f64, f64)> {
        self.data_extent(|p| p.0)
    }

    /// Explicit x range, otherwise exactly the data span.
    pub fn x_bounds(&self) -> (f64, f64) {
        let (lo, hi) = self
            .x_range
            .or_else(|| self.data_extent(|p| p.0))
            .unwrap_or((0.0, 1.0));
        widen_if_degenerate(lo, hi)
    }

    /// Explicit y range, otherwise the data span plus a 5% margin.
    pub fn y_bounds(&self) -> (f64, f64) {
        if let Some((lo, hi)) = self.y_range {
            return widen_if_degenerate(lo, hi);
        }
        let (lo, hi) = match self.data_extent(|p| p.1) {
            Some((lo, hi)) => {
                let pad = (hi - lo) * 0.05;
                (lo - pad, hi + pad)
            }
            None => (0.0, 1.0),
        };
        widen_if_degenerate(lo, hi)
    }
}

fn widen_if_degenerate(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        let pad = if lo.abs() > f64::EPSILON { lo.abs() * 0.05 } else { 1.0 };
        (lo - pad, hi + pad)
    } else {
        (lo, hi)
    }
}

// ---------------------------------------------------------------------------
// Figure
// ---------------------------------------------------------------------------

/// A complete figure. Ownership is the figure's lifetime: display and save
/// consume their figure before returning, "return" mode hands it over.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Width and height in inches.
    pub size: (f64, f64),
    pub title: Option<String>,
    /// Vertically stacked, top to bottom, sharing the x axis.
    pub axes: Vec<Axes>,
    /// Vertical gap between stacked axes as a fraction of an axes height.
    pub hspace: f64,
    pub theme: Theme,
}

impl Figure {
    /// An empty figure using the active theme.
    pub fn new(size: (f64, f64)) -> Self {
        Figure {
            size,
            title: None,
            axes: Vec::new(),
            hspace: 0.2,
            theme: active_theme(),
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.size.0 * DPI).round().max(1.0) as u32;
        let h = (self.size.1 * DPI).round().max(1.0) as u32;
        (w, h)
    }

    /// Number of drawn lines across all axes.
    pub fn line_count(&self) -> usize {
        self.axes.iter().map(|a| a.lines.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn time_coordinate_round_trip() {
        let t = Utc.with_ymd_and_hms(2023, 11, 5, 6, 30, 0).unwrap();
        let x = time_to_x(&t);
        assert_eq!(x_to_time(x), Some(t));
        assert_eq!(format_time_tick(x, "%H"), "06");
        assert_eq!(format_time_tick(f64::NAN, "%H"), "");
    }

    #[test]
    fn runs_split_on_nan() {
        let l = Line::new(
            vec![0.0, 1.0, f64::NAN, 3.0, 4.0, 5.0],
            vec![0.0, 1.0, 2.0, 3.0, f64::INFINITY, 5.0],
            Rgb::new(0, 0, 0),
        );
        let runs = l.finite_runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1], vec![(3.0, 3.0)]);
    }

    #[test]
    fn bounds() {
        let mut ax = Axes::new(AxesKind::Time {
            date_format: "%H".into(),
        });
        ax.lines.push(Line::new(
            vec![10.0, 20.0],
            vec![0.0, 100.0],
            Rgb::new(0, 0, 0),
        ));
        assert_eq!(ax.x_bounds(), (10.0, 20.0));
        let (lo, hi) = ax.y_bounds();
        assert_abs_diff_eq!(lo, -5.0);
        assert_abs_diff_eq!(hi, 105.0);

        ax.y_range = Some((0.0, 50.0));
        assert_eq!(ax.y_bounds(), (0.0, 50.0));
    }

    #[test]
    fn x_span_covers_gaps_at_the_ends() {
        let mut ax = Axes::new(AxesKind::Time {
            date_format: "%H".into(),
        });
        ax.lines.push(Line::new(
            vec![0.0, 5.0, 10.0, 15.0],
            vec![f64::NAN, 1.0, 2.0, f64::NAN],
            Rgb::new(0, 0, 0),
        ));
        assert_eq!(ax.x_data_span(), Some((0.0, 15.0)));
        let (lo, hi) = ax.y_bounds();
        assert_abs_diff_eq!(lo, 0.95);
        assert_abs_diff_eq!(hi, 2.05);
    }

    #[test]
    fn z_order_is_stable() {
        let mut ax = Axes::new(AxesKind::Map {
            projection: "PlateCarree".into(),
        });
        for (i, z) in [1, 0, 1, 0].iter().enumerate() {
            let mut l = Line::new(vec![i as f64], vec![0.0], Rgb::new(0, 0, 0));
            l.z_order = *z;
            ax.lines.push(l);
        }
        let order: Vec<f64> = ax.lines_by_z().iter().map(|l| l.x[0]).collect();
        assert_eq!(order, vec![1.0, 3.0, 0.0, 2.0]);
    }
}
