use std::collections::BTreeSet;

use crate::data::filter::{filtered_indices, init_filter_state, unique_values, FilterState};
use crate::data::model::InstrumentRecordBatch;
use crate::figure::Figure;
use crate::output::PlotWarning;
use crate::plot::{compose, PlotOptions};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full viewer state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded records (empty until records are loaded).
    pub batches: Vec<InstrumentRecordBatch>,

    /// Every dataset / site value present in `batches`.
    pub unique_values: FilterState,

    /// Per-attribute filter selections.
    pub filters: FilterState,

    /// Indices of batches passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Options the figure is composed with.
    pub options: PlotOptions,

    /// The figure on screen.
    pub figure: Option<Figure>,

    /// Warnings from the last composition.
    pub warnings: Vec<PlotWarning>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// A state showing a finished figure with nothing to recompose.
    pub fn with_figure(figure: Figure) -> Self {
        Self {
            figure: Some(figure),
            ..Default::default()
        }
    }

    /// Ingest newly loaded records, select everything and compose.
    pub fn set_batches(&mut self, batches: Vec<InstrumentRecordBatch>) {
        self.unique_values = unique_values(&batches);
        self.filters = init_filter_state(&batches);
        self.visible_indices = (0..batches.len()).collect();
        self.batches = batches;
        self.recompose();
    }

    pub fn set_options(&mut self, options: PlotOptions) {
        self.options = options;
        self.recompose();
    }

    /// Rebuild the figure from the visible batches.
    pub fn recompose(&mut self) {
        if self.batches.is_empty() {
            return;
        }
        let visible: Vec<InstrumentRecordBatch> = self
            .visible_indices
            .iter()
            .map(|&i| self.batches[i].clone())
            .collect();

        let mut warnings = Vec::new();
        match compose(&visible, &self.options, &mut warnings) {
            Ok(figure) => {
                self.figure = Some(figure);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to compose figure: {e}");
                self.figure = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        self.warnings = warnings;
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        let indices = filtered_indices(&self.batches, &self.filters);
        if indices != self.visible_indices {
            self.visible_indices = indices;
            self.recompose();
        }
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all_vals) = self.unique_values.get(column) {
            self.filters.insert(column.to_string(), all_vals.clone());
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::data::model::{Signal, SubRecord};

    fn riometer(site: &str) -> InstrumentRecordBatch {
        let t0 = Utc.with_ymd_and_hms(2023, 11, 5, 0, 0, 0).unwrap();
        InstrumentRecordBatch {
            dataset: "NORSTAR_RIOMETER_K0_TXT".into(),
            site_uid: site.into(),
            records: vec![SubRecord {
                timestamp: (0..4).map(|i| t0 + chrono::Duration::seconds(i)).collect(),
                signal: Signal::SingleFrequency {
                    raw_signal: vec![1.0, 2.0, 3.0, 4.0],
                    absorption: None,
                },
            }],
        }
    }

    #[test]
    fn filtering_recomposes() {
        let mut state = AppState::default();
        state.set_batches(vec![riometer("gill"), riometer("daws")]);
        assert_eq!(state.figure.as_ref().unwrap().line_count(), 2);

        state.toggle_filter_value("site_uid", "daws");
        assert_eq!(state.visible_indices, vec![0]);
        assert_eq!(state.figure.as_ref().unwrap().line_count(), 1);

        state.select_all("site_uid");
        assert_eq!(state.figure.as_ref().unwrap().line_count(), 2);
    }

    #[test]
    fn compose_errors_become_status() {
        let mut state = AppState::default();
        state.set_batches(vec![riometer("gill")]);
        state.set_options(PlotOptions {
            linestyle: crate::style::OneOrMany::One("~".into()),
            ..Default::default()
        });
        assert!(state.figure.is_none());
        assert!(state.status_message.unwrap().starts_with("Error"));
    }
}
