use eframe::egui;

use crate::data::model::InstrumentRecordBatch;
use crate::error::PlotError;
use crate::figure::Figure;
use crate::output::Viewer;
use crate::plot::PlotOptions;
use crate::state::AppState;
use crate::ui::{panels, plot};

const SIDE_PANEL_WIDTH: f32 = 220.0;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RioPlotApp {
    pub state: AppState,
}

impl RioPlotApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for RioPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        if !self.state.batches.is_empty() {
            egui::SidePanel::left("filter_panel")
                .default_width(SIDE_PANEL_WIDTH)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: figure ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::figure_plot(ui, self.state.figure.as_ref());
        });
    }
}

/// Open the viewer window and block until it is closed.
pub fn run(state: AppState) -> eframe::Result {
    let (w, h) = state
        .figure
        .as_ref()
        .map(|f| f.pixel_size())
        .unwrap_or((1200, 800));
    let extra = if state.batches.is_empty() { 0.0 } else { SIDE_PANEL_WIDTH };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([w as f32 + extra, h as f32 + 40.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "rio-plot",
        options,
        Box::new(|_cc| Ok(Box::new(RioPlotApp::new(state)))),
    )
}

// ---------------------------------------------------------------------------
// NativeViewer – display mode in a desktop window
// ---------------------------------------------------------------------------

/// Shows figures in a native window. When built with the records a figure
/// came from, the window can filter and recompose them.
#[derive(Default)]
pub struct NativeViewer {
    records: Option<(Vec<InstrumentRecordBatch>, PlotOptions)>,
}

impl NativeViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(batches: Vec<InstrumentRecordBatch>, options: PlotOptions) -> Self {
        Self {
            records: Some((batches, options)),
        }
    }
}

impl Viewer for NativeViewer {
    fn show(&mut self, figure: &Figure) -> Result<(), PlotError> {
        let state = match self.records.take() {
            Some((batches, options)) => {
                let mut state = AppState {
                    options,
                    ..Default::default()
                };
                state.set_batches(batches);
                state.figure = Some(figure.clone());
                state
            }
            None => AppState::with_figure(figure.clone()),
        };
        run(state).map_err(|e| PlotError::Display(e.to_string()))
    }
}
