use std::collections::{BTreeMap, BTreeSet};

use super::model::InstrumentRecordBatch;

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per batch attribute
// ---------------------------------------------------------------------------

/// The batch attributes a viewer can filter on.
pub const FILTER_COLUMNS: [&str; 2] = ["dataset", "site_uid"];

/// Per-attribute selection state: maps attribute → set of selected values.
/// An attribute absent from the map is not filtered.
pub type FilterState = BTreeMap<String, BTreeSet<String>>;

fn attribute<'a>(batch: &'a InstrumentRecordBatch, column: &str) -> Option<&'a str> {
    match column {
        "dataset" => Some(&batch.dataset),
        "site_uid" => Some(&batch.site_uid),
        _ => None,
    }
}

/// Every value each attribute takes across `batches`.
pub fn unique_values(batches: &[InstrumentRecordBatch]) -> FilterState {
    FILTER_COLUMNS
        .iter()
        .map(|&col| {
            let values = batches
                .iter()
                .filter_map(|b| attribute(b, col))
                .map(str::to_string)
                .collect();
            (col.to_string(), values)
        })
        .collect()
}

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(batches: &[InstrumentRecordBatch]) -> FilterState {
    unique_values(batches)
}

/// Return indices of batches that pass all active filters.
///
/// A batch passes a column filter when the column is not present in
/// `filters`, or when its value for that column is selected. An empty
/// selection hides every batch.
pub fn filtered_indices(batches: &[InstrumentRecordBatch], filters: &FilterState) -> Vec<usize> {
    batches
        .iter()
        .enumerate()
        .filter(|(_, batch)| {
            filters.iter().all(|(col, selected)| match attribute(batch, col) {
                Some(value) => selected.contains(value),
                None => true,
            })
        })
        .map(|(i, _)| i)
        .collect()
}
