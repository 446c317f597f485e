use eframe::egui::{self, Stroke, Ui, Vec2b};
use egui_plot::{
    GridMark, Legend, Line as PlotLine, LineStyle as PlotLineStyle, MarkerShape, Plot, PlotPoint,
    PlotPoints, PlotUi, Points, Polygon, Text,
};

use crate::color::to_color32;
use crate::figure::{format_time_tick, Axes, AxesKind, Figure, Line};
use crate::style::{LineStyle, Marker};

// ---------------------------------------------------------------------------
// Figure (central panel)
// ---------------------------------------------------------------------------

/// Render a figure in the central panel: its axes stacked top to bottom,
/// time axes linked along x.
pub fn figure_plot(ui: &mut Ui, figure: Option<&Figure>) {
    let figure = match figure {
        Some(fig) => fig,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a records file to plot  (File → Open…)");
            });
            return;
        }
    };

    if let Some(title) = &figure.title {
        ui.vertical_centered(|ui: &mut Ui| ui.heading(title));
    }
    let n = figure.axes.len().max(1);
    let height = (ui.available_height() / n as f32).max(80.0);
    for (i, ax) in figure.axes.iter().enumerate() {
        axes_plot(ui, i, ax, height, i + 1 == n);
    }
}

fn axes_plot(ui: &mut Ui, index: usize, ax: &Axes, height: f32, is_bottom: bool) {
    let (x0, x1) = ax.x_bounds();
    let (y0, y1) = ax.y_bounds();

    let mut plot = Plot::new(("figure_axes", index))
        .height(height)
        .include_x(x0)
        .include_x(x1)
        .include_y(y0)
        .include_y(y1)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if ax.legend {
        plot = plot.legend(Legend::default());
    }

    match &ax.kind {
        AxesKind::Time { date_format } => {
            let fmt = date_format.clone();
            plot = plot
                .link_axis("time_axes", Vec2b::new(true, false))
                .link_cursor("time_axes", Vec2b::new(true, false))
                .x_axis_formatter(move |mark: GridMark, _range| format_time_tick(mark.value, &fmt));
            if is_bottom {
                if let Some(label) = &ax.x_label {
                    plot = plot.x_axis_label(label.clone());
                }
            }
            if let Some(label) = &ax.y_label {
                plot = plot.y_axis_label(label.clone());
            }
        }
        AxesKind::Map { .. } => {
            plot = plot
                .data_aspect(1.0)
                .show_axes(false)
                .show_grid(false)
                .show_x(false)
                .show_y(false);
        }
    }

    plot.show(ui, |plot_ui| {
        if let Some(bg) = ax.background {
            let frame = vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]];
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(frame))
                    .fill_color(to_color32(bg))
                    .stroke(Stroke::NONE),
            );
        }
        for fill in &ax.fills {
            let ring: Vec<[f64; 2]> = fill.ring.iter().map(|&(x, y)| [x, y]).collect();
            let stroke = match fill.edge {
                Some(edge) => Stroke::new(1.0, to_color32(edge)),
                None => Stroke::NONE,
            };
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(ring))
                    .fill_color(to_color32(fill.face))
                    .stroke(stroke),
            );
        }
        for line in ax.lines_by_z() {
            draw_line(plot_ui, line);
        }
        for label in &ax.labels {
            plot_ui.text(
                Text::new(
                    PlotPoint::new(label.x, label.y),
                    egui::RichText::new(&label.text).color(to_color32(label.color)),
                )
                .anchor(egui::Align2::CENTER_CENTER),
            );
        }
    });
}

fn draw_line(plot_ui: &mut PlotUi, line: &Line) {
    let color = to_color32(line.color);
    let name = line.label.clone().unwrap_or_default();

    for run in line.finite_runs() {
        let points: Vec<[f64; 2]> = run.iter().map(|&(x, y)| [x, y]).collect();
        if let Some(style) = plot_line_style(line.style) {
            plot_ui.line(
                PlotLine::new(PlotPoints::from(points.clone()))
                    .name(&name)
                    .color(color)
                    .width(line.width as f32)
                    .style(style),
            );
        }
        if let Some(shape) = marker_shape(line.marker) {
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .name(&name)
                    .shape(shape)
                    .radius((line.marker_size / 2.0).max(1.0) as f32)
                    .filled(!matches!(line.marker, Marker::X | Marker::Plus))
                    .color(color),
            );
        }
    }
}

fn plot_line_style(style: LineStyle) -> Option<PlotLineStyle> {
    match style {
        LineStyle::Solid => Some(PlotLineStyle::Solid),
        LineStyle::Dashed | LineStyle::DashDot => Some(PlotLineStyle::dashed_loose()),
        LineStyle::Dotted => Some(PlotLineStyle::dotted_dense()),
        LineStyle::None => None,
    }
}

fn marker_shape(marker: Marker) -> Option<MarkerShape> {
    match marker {
        Marker::None => None,
        Marker::Circle | Marker::Point => Some(MarkerShape::Circle),
        Marker::Pentagon | Marker::Star => Some(MarkerShape::Asterisk),
        Marker::X | Marker::FilledX => Some(MarkerShape::Cross),
        Marker::Plus => Some(MarkerShape::Plus),
        Marker::Square => Some(MarkerShape::Square),
        Marker::Diamond => Some(MarkerShape::Diamond),
        Marker::TriangleUp => Some(MarkerShape::Up),
        Marker::TriangleDown => Some(MarkerShape::Down),
    }
}
