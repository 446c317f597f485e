use image::RgbImage;
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::path::{dash_polyline, ClipBox};
use super::time_ticks;
use crate::color::{to_plotters, Rgb};
use crate::error::PlotError;
use crate::figure::{format_time_tick, Axes, AxesKind, Figure, Line, DPI};
use crate::style::{LineStyle, Marker};
use crate::theme::Theme;

type Coord = Cartesian2d<RangedCoordf64, RangedCoordf64>;

const FONT: &str = "sans-serif";
const X_LABELS: usize = 8;
const Y_LABELS: usize = 6;

fn draw_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Draw(e.to_string())
}

/// Points to pixels at the figure resolution.
fn pt_to_px(pt: f64) -> f64 {
    pt * DPI / 72.0
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Draw `figure` into an in-memory RGB image.
pub fn rasterize(figure: &Figure) -> Result<RgbImage, PlotError> {
    let (w, h) = figure.pixel_size();
    let mut buf = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        draw_figure(&root, figure)?;
        root.present().map_err(draw_err)?;
    }
    log::debug!("Rasterised figure at {w}x{h} px");
    RgbImage::from_raw(w, h, buf)
        .ok_or_else(|| PlotError::Draw("raster buffer does not match the figure size".into()))
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
) -> Result<(), PlotError> {
    let theme = figure.theme;
    let fg = to_plotters(theme.foreground());
    root.fill(&to_plotters(theme.background())).map_err(draw_err)?;

    let area = match &figure.title {
        Some(title) => root
            .titled(title, (FONT, 20).into_font().color(&fg))
            .map_err(draw_err)?,
        None => root.clone(),
    };
    if figure.axes.is_empty() {
        return Ok(());
    }

    let n = figure.axes.len();
    let (_, area_h) = area.dim_in_pixel();
    let gap = (figure.hspace * f64::from(area_h) / n as f64 / 2.0).round() as u32;
    let cells = area.split_evenly((n, 1));

    for (i, (ax, cell)) in figure.axes.iter().zip(cells.iter()).enumerate() {
        let layout = CellLayout {
            top_gap: if i == 0 { 10 } else { gap },
            bottom_gap: if i + 1 == n { 5 } else { gap },
            is_bottom: i + 1 == n,
        };
        draw_axes(cell, ax, theme, layout)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// One axes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct CellLayout {
    top_gap: u32,
    bottom_gap: u32,
    is_bottom: bool,
}

fn draw_axes<DB: DrawingBackend>(
    cell: &DrawingArea<DB, Shift>,
    ax: &Axes,
    theme: Theme,
    layout: CellLayout,
) -> Result<(), PlotError> {
    let fg = to_plotters(theme.foreground());
    let (x0, x1) = ax.x_bounds();
    let (y0, y1) = ax.y_bounds();
    let clip = ClipBox {
        x: (x0, x1),
        y: (y0, y1),
    };

    let (x_ticks, y_ticks) = match &ax.kind {
        AxesKind::Time { .. } => (
            time_ticks(x0, x1, X_LABELS),
            RangedCoordf64::from(y0..y1).key_points(Y_LABELS),
        ),
        AxesKind::Map { .. } => (Vec::new(), Vec::new()),
    };
    let top_ytick = y_ticks.last().copied();
    let y_decimals = tick_decimals(&y_ticks);

    let mut builder = ChartBuilder::on(cell);
    if let Some(title) = &ax.title {
        builder.caption(title, (FONT, 16).into_font().color(&fg));
    }
    match &ax.kind {
        AxesKind::Time { .. } => {
            builder
                .margin_left(10)
                .margin_right(15)
                .margin_top(layout.top_gap)
                .margin_bottom(layout.bottom_gap)
                .y_label_area_size(if ax.y_label.is_some() { 60 } else { 45 })
                .x_label_area_size(match (layout.is_bottom, ax.x_label.is_some()) {
                    (true, true) => 40,
                    (true, false) => 25,
                    (false, _) => 0,
                });
        }
        AxesKind::Map { .. } => {
            let (cw, ch) = cell.dim_in_pixel();
            let title_h = if ax.title.is_some() { 25 } else { 0 };
            let (ml, mr, mt, mb) = equal_aspect_margins((cw, ch), title_h, (x1 - x0) / (y1 - y0));
            builder
                .margin_left(ml)
                .margin_right(mr)
                .margin_top(mt)
                .margin_bottom(mb);
        }
    }

    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(draw_err)?;

    let background = ax.background.unwrap_or_else(|| theme.background());
    chart
        .plotting_area()
        .fill(&to_plotters(background))
        .map_err(draw_err)?;

    // ---- Mesh, ticks and axis titles ----
    match &ax.kind {
        AxesKind::Time { date_format } => {
            let drop_top = ax.drop_top_ytick;
            let y_fmt = |y: &f64| {
                if drop_top && Some(*y) == top_ytick {
                    String::new()
                } else {
                    format!("{:.*}", y_decimals, y)
                }
            };

            // x ticks sit on whole time units, so they are drawn by hand
            let mut mesh = chart.configure_mesh();
            mesh.disable_x_mesh()
                .x_labels(0)
                .y_labels(Y_LABELS)
                .y_label_formatter(&y_fmt)
                .bold_line_style(to_plotters(theme.grid()))
                .light_line_style(TRANSPARENT)
                .axis_style(fg)
                .label_style((FONT, 12).into_font().color(&fg))
                .axis_desc_style((FONT, 13).into_font().color(&fg));
            if let (true, Some(label)) = (layout.is_bottom, &ax.x_label) {
                mesh.x_desc(label.as_str());
            }
            if let Some(label) = &ax.y_label {
                mesh.y_desc(label.as_str());
            }
            mesh.draw().map_err(draw_err)?;

            let grid = to_plotters(theme.grid());
            chart
                .draw_series(
                    x_ticks
                        .iter()
                        .map(|&t| PathElement::new(vec![(t, y0), (t, y1)], grid)),
                )
                .map_err(draw_err)?;
            if layout.is_bottom {
                draw_time_tick_labels(cell, &chart, &x_ticks, y0, date_format, fg)?;
            }
        }
        AxesKind::Map { .. } => {
            chart
                .plotting_area()
                .draw(&Rectangle::new([(x0, y0), (x1, y1)], fg.stroke_width(1)))
                .map_err(draw_err)?;
        }
    }

    // ---- Content: fills, lines by z-order, labels ----
    for fill in &ax.fills {
        let ring = clip.clip_polygon(&fill.ring);
        if ring.len() < 3 {
            continue;
        }
        chart
            .draw_series(std::iter::once(Polygon::new(
                ring.clone(),
                to_plotters(fill.face).filled(),
            )))
            .map_err(draw_err)?;
        if let Some(edge) = fill.edge {
            let mut closed = ring;
            closed.push(closed[0]);
            chart
                .draw_series(std::iter::once(PathElement::new(
                    closed,
                    to_plotters(edge).stroke_width(1),
                )))
                .map_err(draw_err)?;
        }
    }

    let (pw, ph) = chart.plotting_area().dim_in_pixel();
    let scale = (f64::from(pw) / (x1 - x0), f64::from(ph) / (y1 - y0));
    for line in ax.lines_by_z() {
        draw_line(&mut chart, line, &clip, scale)?;
    }

    let font = (FONT, 12).into_font();
    for label in &ax.labels {
        if !clip.contains((label.x, label.y)) {
            continue;
        }
        let color = to_plotters(label.color);
        chart
            .draw_series(std::iter::once(Text::new(
                label.text.clone(),
                (label.x, label.y),
                font.clone()
                    .color(&color)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            )))
            .map_err(draw_err)?;
    }

    // ---- Legend ----
    let entries = ax.legend_entries();
    if ax.legend && !entries.is_empty() {
        for entry in entries {
            let style = line_shape(entry);
            chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
                .map_err(draw_err)?
                .label(entry.label.clone().unwrap_or_default())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(to_plotters(theme.background()).mix(0.8))
            .border_style(fg)
            .label_font((FONT, 11).into_font().color(&fg))
            .draw()
            .map_err(draw_err)?;
    }
    Ok(())
}

/// Tick marks and labels under the bottom time axes, in cell pixels.
fn draw_time_tick_labels<DB: DrawingBackend>(
    cell: &DrawingArea<DB, Shift>,
    chart: &ChartContext<'_, DB, Coord>,
    ticks: &[f64],
    y0: f64,
    date_format: &str,
    color: RGBColor,
) -> Result<(), PlotError> {
    let (bx, by) = cell.get_base_pixel();
    let style = (FONT, 12)
        .into_font()
        .color(&color)
        .pos(Pos::new(HPos::Center, VPos::Top));
    for &t in ticks {
        let (px, py) = chart.backend_coord(&(t, y0));
        let (x, y) = (px - bx, py - by);
        cell.draw(&PathElement::new(vec![(x, y), (x, y + 5)], color.stroke_width(1)))
            .map_err(draw_err)?;
        cell.draw(&Text::new(format_time_tick(t, date_format), (x, y + 7), style.clone()))
            .map_err(draw_err)?;
    }
    Ok(())
}

fn line_shape(line: &Line) -> ShapeStyle {
    let width = pt_to_px(line.width).round().max(1.0) as u32;
    to_plotters(line.color).stroke_width(width)
}

fn draw_line<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Coord>,
    line: &Line,
    clip: &ClipBox,
    scale: (f64, f64),
) -> Result<(), PlotError> {
    let style = line_shape(line);
    let width_px = f64::from(style.stroke_width);
    let pattern: Option<Vec<f64>> = line
        .style
        .dash_pattern()
        .map(|p| p.iter().map(|l| l * width_px).collect());

    for run in line.finite_runs() {
        if line.style != LineStyle::None {
            for visible in clip.clip_polyline(&run) {
                let pieces = match &pattern {
                    Some(p) => dash_polyline(&visible, p, scale),
                    None => vec![visible],
                };
                chart
                    .draw_series(
                        pieces
                            .into_iter()
                            .filter(|piece| piece.len() > 1)
                            .map(|piece| PathElement::new(piece, style)),
                    )
                    .map_err(draw_err)?;
            }
        }
        let points: Vec<(f64, f64)> = run.into_iter().filter(|p| clip.contains(*p)).collect();
        draw_markers(chart, &points, line.marker, line.color, line.marker_size)?;
    }
    Ok(())
}

fn draw_markers<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Coord>,
    points: &[(f64, f64)],
    marker: Marker,
    color: Rgb,
    size_pt: f64,
) -> Result<(), PlotError> {
    if points.is_empty() || marker == Marker::None {
        return Ok(());
    }
    let s = (pt_to_px(size_pt) / 2.0).round().max(1.0) as i32;
    let stroke = to_plotters(color).stroke_width(1);
    let fill = to_plotters(color).filled();

    match marker {
        Marker::None => {}
        Marker::Circle => {
            chart
                .draw_series(points.iter().map(|p| Circle::new(*p, s, fill)))
                .map_err(draw_err)?;
        }
        Marker::Point => {
            chart
                .draw_series(points.iter().map(|p| Circle::new(*p, (s / 2).max(1), fill)))
                .map_err(draw_err)?;
        }
        Marker::X => {
            chart
                .draw_series(points.iter().map(|p| Cross::new(*p, s, stroke)))
                .map_err(draw_err)?;
        }
        Marker::FilledX => {
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|p| Cross::new(*p, s, to_plotters(color).stroke_width(3))),
                )
                .map_err(draw_err)?;
        }
        Marker::Plus => {
            chart
                .draw_series(points.iter().map(|p| {
                    EmptyElement::at(*p)
                        + PathElement::new(vec![(-s, 0), (s, 0)], stroke)
                        + PathElement::new(vec![(0, -s), (0, s)], stroke)
                }))
                .map_err(draw_err)?;
        }
        Marker::Square => {
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|p| EmptyElement::at(*p) + Rectangle::new([(-s, -s), (s, s)], fill)),
                )
                .map_err(draw_err)?;
        }
        Marker::Diamond
        | Marker::Pentagon
        | Marker::Star
        | Marker::TriangleUp
        | Marker::TriangleDown => {
            let outline = marker_outline(marker, s);
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|p| EmptyElement::at(*p) + Polygon::new(outline.clone(), fill)),
                )
                .map_err(draw_err)?;
        }
    }
    Ok(())
}

/// Pixel-space outline of a polygonal marker centred on the origin.
fn marker_outline(marker: Marker, s: i32) -> Vec<(i32, i32)> {
    let r = f64::from(s);
    let regular = |n: usize, radius: &dyn Fn(usize) -> f64, phase: f64| -> Vec<(i32, i32)> {
        (0..n)
            .map(|k| {
                let a = phase + std::f64::consts::TAU * k as f64 / n as f64;
                let rk = radius(k);
                ((rk * a.cos()).round() as i32, (-rk * a.sin()).round() as i32)
            })
            .collect()
    };
    let up = std::f64::consts::FRAC_PI_2;
    match marker {
        Marker::Diamond => regular(4, &|_| r, up),
        Marker::Pentagon => regular(5, &|_| r, up),
        Marker::Star => regular(10, &|k| if k % 2 == 0 { r } else { r * 0.4 }, up),
        Marker::TriangleUp => regular(3, &|_| r, up),
        Marker::TriangleDown => regular(3, &|_| r, -up),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Layout helpers
// ---------------------------------------------------------------------------

/// Decimal places needed to tell adjacent ticks apart.
fn tick_decimals(ticks: &[f64]) -> usize {
    match ticks {
        [a, b, ..] if (b - a).abs() > 0.0 => (-(b - a).abs().log10().floor()).max(0.0) as usize,
        _ => 1,
    }
}

/// Margins (left, right, top, bottom) that centre a plotting area of the
/// given width/height ratio inside a cell.
fn equal_aspect_margins(cell: (u32, u32), title_h: u32, aspect: f64) -> (u32, u32, u32, u32) {
    const PAD: u32 = 10;
    let avail_w = f64::from(cell.0.saturating_sub(2 * PAD));
    let avail_h = f64::from(cell.1.saturating_sub(2 * PAD + title_h));
    if !(aspect.is_finite() && aspect > 0.0) || avail_w <= 0.0 || avail_h <= 0.0 {
        return (PAD, PAD, PAD, PAD);
    }
    let (w, h) = if avail_w / avail_h > aspect {
        (avail_h * aspect, avail_h)
    } else {
        (avail_w, avail_w / aspect)
    };
    let extra_w = (avail_w - w).max(0.0) as u32;
    let extra_h = (avail_h - h).max(0.0) as u32;
    (
        PAD + extra_w / 2,
        PAD + extra_w - extra_w / 2,
        PAD + extra_h / 2,
        PAD + extra_h - extra_h / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_axes(x: Vec<f64>, y: Vec<f64>) -> Axes {
        let mut ax = Axes::new(AxesKind::Time {
            date_format: "%H:%M".into(),
        });
        ax.lines.push(Line::new(x, y, Rgb::new(31, 119, 180)));
        ax.x_label = Some("Time (UTC)".into());
        ax
    }

    #[test]
    fn stacked_time_figure_fills_the_canvas() {
        // one hour from 2023-11-05 06:00 UTC
        let t0 = 1_699_164_000.0;
        let x: Vec<f64> = (0..720).map(|i| t0 + 5.0 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|t| ((t - t0) / 600.0).sin()).collect();

        let mut fig = Figure::new((6.0, 4.0));
        fig.axes.push(time_axes(x.clone(), y.clone()));
        let mut lower = time_axes(x, y);
        lower.drop_top_ytick = true;
        lower.lines[0].style = LineStyle::Dashed;
        fig.axes.push(lower);

        let img = rasterize(&fig).unwrap();
        assert_eq!(img.dimensions(), fig.pixel_size());
        // something other than the background was drawn
        let bg = fig.theme.background();
        assert!(img.pixels().any(|p| p.0 != [bg.red, bg.green, bg.blue]));
    }

    #[test]
    fn map_figure_rasterises() {
        let mut ax = Axes::new(AxesKind::Map {
            projection: "PlateCarree".into(),
        });
        ax.x_range = Some((-145.0, -65.0));
        ax.y_range = Some((35.0, 80.0));
        ax.lines.push(Line::new(
            vec![-140.0, -70.0],
            vec![60.0, 60.0],
            Rgb::new(128, 128, 128),
        ));
        let mut fig = Figure::new((6.0, 6.0));
        fig.axes.push(ax);
        assert_eq!(rasterize(&fig).unwrap().dimensions(), fig.pixel_size());
    }

    #[test]
    fn decimals_follow_tick_step() {
        assert_eq!(tick_decimals(&[0.0, 10.0, 20.0]), 0);
        assert_eq!(tick_decimals(&[0.0, 0.5, 1.0]), 1);
        assert_eq!(tick_decimals(&[0.0, 0.02]), 2);
        assert_eq!(tick_decimals(&[]), 1);
    }

    #[test]
    fn aspect_margins_centre_the_map() {
        // 2:1 map in a square cell: horizontal fill, vertical letterbox
        let (l, r, t, b) = equal_aspect_margins((420, 420), 0, 2.0);
        assert_eq!((l, r), (10, 10));
        assert_eq!(t, b);
        assert_eq!(420 - t - b, 200);
    }

    #[test]
    fn star_outline_alternates_radius() {
        let star = marker_outline(Marker::Star, 10);
        assert_eq!(star.len(), 10);
        assert_eq!(star[0], (0, -10));
        assert!(marker_outline(Marker::Circle, 10).is_empty());
    }
}
