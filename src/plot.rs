//! The time-series composer: riometer and HSR batches in, one figure out.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::color::{generate_palette, parse_color, Rgb};
use crate::data::extract::{extract_all, Selection};
use crate::data::model::InstrumentRecordBatch;
use crate::data::smooth::downsample;
use crate::error::PlotError;
use crate::figure::{time_to_x, Axes, AxesKind, Figure, Line};
use crate::output::{deliver, OutputOptions, PlotWarning, Rendered, Viewer};
use crate::style::{Cycle, LineStyle, OneOrMany};

/// Tick format used when no `date_format` is given.
pub const DEFAULT_DATE_FORMAT: &str = "%H";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Plot absorption instead of raw signal / raw power.
    pub absorption: bool,
    /// One subplot per series, sharing the time axis.
    pub stack_plot: bool,
    /// Smoothing window. Windows at or below the sample interval leave the
    /// data untouched.
    pub downsample_seconds: f64,
    /// HSR band indices to plot; all populated bands when unset.
    pub hsr_bands: Option<Vec<usize>>,
    /// Colour cycle; evenly spaced hues when unset.
    pub color: Option<OneOrMany<String>>,
    pub linestyle: OneOrMany<String>,
    /// Inches.
    pub figsize: (f64, f64),
    pub title: Option<String>,
    /// strftime format for time ticks, `%H` when unset.
    pub date_format: Option<String>,
    pub xtitle: Option<String>,
    pub ytitle: Option<String>,
    pub xrange: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub yrange: Option<(f64, f64)>,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            absorption: false,
            stack_plot: false,
            downsample_seconds: 1.0,
            hsr_bands: None,
            color: None,
            linestyle: OneOrMany::One("-".to_string()),
            figsize: (8.0, 4.0),
            title: None,
            date_format: None,
            xtitle: None,
            ytitle: None,
            xrange: None,
            yrange: None,
            output: OutputOptions::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Plot riometer and/or HSR data, then display, save or return the figure
/// according to `options.output`.
pub fn plot(
    batches: &[InstrumentRecordBatch],
    options: &PlotOptions,
    viewer: &mut dyn Viewer,
) -> Result<Rendered, PlotError> {
    let mut warnings = Vec::new();
    let mode = options.output.resolve(&mut warnings)?;
    let figure = compose(batches, options, &mut warnings)?;
    deliver(figure, mode, viewer, warnings)
}

/// Build the figure without delivering it.
pub fn compose(
    batches: &[InstrumentRecordBatch],
    options: &PlotOptions,
    warnings: &mut Vec<PlotWarning>,
) -> Result<Figure, PlotError> {
    let explicit_colors = match &options.color {
        Some(colors) => colors
            .to_vec()
            .iter()
            .map(|c| parse_color(c))
            .collect::<Result<Vec<Rgb>, _>>()?,
        None => Vec::new(),
    };
    let mut linestyles = options
        .linestyle
        .to_vec()
        .iter()
        .map(|s| s.parse::<LineStyle>())
        .collect::<Result<Vec<_>, _>>()?;
    if linestyles.is_empty() {
        linestyles.push(LineStyle::Solid);
    }

    let selection = Selection {
        absorption: options.absorption,
        hsr_bands: options.hsr_bands.as_deref(),
    };
    let extracted = extract_all(batches, selection, options.stack_plot, warnings)?;

    // Layout is sized from what was actually extracted, so the subplot
    // count always matches the number of drawn series.
    let n_series: usize = extracted.iter().map(|b| b.series.len()).sum();
    let n_axes = if options.stack_plot { n_series.max(1) } else { 1 };

    let colors = if explicit_colors.is_empty() {
        generate_palette(n_series.max(1))
    } else {
        explicit_colors
    };
    let mut color_cycle =
        Cycle::new(colors).ok_or_else(|| PlotError::UnknownColor(String::new()))?;
    let mut linestyle_cycle =
        Cycle::new(linestyles).ok_or_else(|| PlotError::UnknownLinestyle(String::new()))?;

    let date_format = options
        .date_format
        .clone()
        .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
    let kind = AxesKind::Time { date_format };

    let mut figure = Figure::new(options.figsize);
    figure.title = options.title.clone();
    figure.axes = (0..n_axes).map(|_| Axes::new(kind.clone())).collect();
    if options.stack_plot {
        figure.hspace = 0.0;
    }

    let mut next_axis = 0;
    for batch in &extracted {
        for series in &batch.series {
            let values = downsample(&series.values, &batch.timestamps, options.downsample_seconds);
            let x = series.timestamps.iter().map(time_to_x).collect();

            let mut line = Line::new(x, values, color_cycle.next_item());
            line.style = linestyle_cycle.next_item();
            line.label = Some(series.name.clone());

            let ax = if options.stack_plot {
                next_axis += 1;
                &mut figure.axes[next_axis - 1]
            } else {
                &mut figure.axes[0]
            };
            ax.y_label = Some(
                options
                    .ytitle
                    .clone()
                    .unwrap_or_else(|| batch.y_label.to_string()),
            );
            ax.lines.push(line);
        }
    }

    let x_label = options.xtitle.clone().unwrap_or_else(|| {
        match options.date_format {
            None => "Hour (UTC)",
            Some(_) => "Time (UTC)",
        }
        .to_string()
    });
    // stacked axes share one time axis spanning every series
    let xrange = options
        .xrange
        .map(|(start, end)| (time_to_x(&start), time_to_x(&end)))
        .or_else(|| {
            figure
                .axes
                .iter()
                .filter_map(|ax| ax.x_data_span())
                .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
        });

    for (i, ax) in figure.axes.iter_mut().enumerate() {
        ax.legend = true;
        if !options.stack_plot || i + 1 == n_axes {
            ax.x_label = Some(x_label.clone());
        }
        if ax.y_label.is_none() {
            ax.y_label = options.ytitle.clone();
        }
        ax.x_range = xrange;
        ax.y_range = options.yrange;
        ax.drop_top_ytick = options.stack_plot && i > 0;
    }

    log::debug!(
        "Composed {n_series} series from {} batches onto {n_axes} axes",
        extracted.len()
    );
    Ok(figure)
}
