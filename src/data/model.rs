use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlotError;

// ---------------------------------------------------------------------------
// InstrumentKind – which family of instrument produced a batch
// ---------------------------------------------------------------------------

/// The closed set of instrument families this crate can plot. Resolved once
/// from the dataset name when a batch is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    SingleFrequencyRiometer,
    HyperSpectralRiometer,
}

const SINGLE_FREQUENCY_DATASETS: [&str; 2] = ["NORSTAR_RIOMETER_K0_TXT", "NORSTAR_RIOMETER_K2_TXT"];
const HSR_DATASETS: [&str; 1] = ["SWAN_HSR_K0_H5"];

impl InstrumentKind {
    pub fn from_dataset(name: &str) -> Result<Self, PlotError> {
        if SINGLE_FREQUENCY_DATASETS.contains(&name) {
            Ok(InstrumentKind::SingleFrequencyRiometer)
        } else if HSR_DATASETS.contains(&name) {
            Ok(InstrumentKind::HyperSpectralRiometer)
        } else {
            Err(PlotError::UnsupportedDataset(name.to_string()))
        }
    }

    /// Y-axis unit label for this kind of data.
    pub fn y_label(self, absorption: bool) -> &'static str {
        match (absorption, self) {
            (true, _) => "Absorption (dB)",
            (false, InstrumentKind::HyperSpectralRiometer) => "Raw Power (dB)",
            (false, InstrumentKind::SingleFrequencyRiometer) => "Raw Signal (V)",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentKind::SingleFrequencyRiometer => f.write_str("single-frequency riometer"),
            InstrumentKind::HyperSpectralRiometer => f.write_str("HSR"),
        }
    }
}

/// Dataset names with plotting support.
pub fn supported_datasets() -> Vec<&'static str> {
    SINGLE_FREQUENCY_DATASETS
        .iter()
        .chain(HSR_DATASETS.iter())
        .copied()
        .collect()
}

pub fn is_supported(dataset_name: &str) -> bool {
    InstrumentKind::from_dataset(dataset_name).is_ok()
}

// ---------------------------------------------------------------------------
// Records as produced by the external reader
// ---------------------------------------------------------------------------

/// Signal arrays of one file. HSR arrays are indexed `[band][time]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    SingleFrequency {
        raw_signal: Vec<f64>,
        #[serde(default)]
        absorption: Option<Vec<f64>>,
    },
    HyperSpectral {
        raw_power: Vec<Vec<f64>>,
        #[serde(default)]
        absorption: Option<Vec<Vec<f64>>>,
        /// e.g. `"30.00 MHz"`; empty entries mark unused band slots.
        band_central_frequency: Vec<String>,
    },
}

/// The contents of one data file: one timestamp per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRecord {
    pub timestamp: Vec<DateTime<Utc>>,
    pub signal: Signal,
}

/// All data read for one dataset at one site, in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecordBatch {
    pub dataset: String,
    pub site_uid: String,
    #[serde(default)]
    pub records: Vec<SubRecord>,
}

impl InstrumentRecordBatch {
    pub fn kind(&self) -> Result<InstrumentKind, PlotError> {
        InstrumentKind::from_dataset(&self.dataset)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// BandSeries – one named curve, ready to plot
// ---------------------------------------------------------------------------

/// A named time series, concatenated across the files of one batch.
/// `timestamps.len() == values.len()` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSeries {
    pub name: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl BandSeries {
    pub fn new(name: String) -> Self {
        BandSeries {
            name,
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First and last timestamps, if any.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_kinds() {
        assert_eq!(
            InstrumentKind::from_dataset("NORSTAR_RIOMETER_K2_TXT").unwrap(),
            InstrumentKind::SingleFrequencyRiometer
        );
        assert_eq!(
            InstrumentKind::from_dataset("SWAN_HSR_K0_H5").unwrap(),
            InstrumentKind::HyperSpectralRiometer
        );
        assert!(matches!(
            InstrumentKind::from_dataset("THEMIS_ASI_RAW"),
            Err(PlotError::UnsupportedDataset(_))
        ));
        assert_eq!(supported_datasets().len(), 3);
        assert!(is_supported("SWAN_HSR_K0_H5"));
    }

    #[test]
    fn y_labels() {
        let hsr = InstrumentKind::HyperSpectralRiometer;
        let rio = InstrumentKind::SingleFrequencyRiometer;
        assert_eq!(hsr.y_label(false), "Raw Power (dB)");
        assert_eq!(rio.y_label(false), "Raw Signal (V)");
        assert_eq!(rio.y_label(true), "Absorption (dB)");
    }

    #[test]
    fn signal_json_shape() {
        let json = r#"{"kind": "single_frequency", "raw_signal": [1.0, 2.0]}"#;
        let signal: Signal = serde_json::from_str(json).unwrap();
        assert_eq!(
            signal,
            Signal::SingleFrequency {
                raw_signal: vec![1.0, 2.0],
                absorption: None
            }
        );
    }
}
