use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::model::{BandSeries, InstrumentKind, InstrumentRecordBatch, Signal};
use crate::error::PlotError;
use crate::output::{warn, PlotWarning};

// ---------------------------------------------------------------------------
// Extraction parameters and result
// ---------------------------------------------------------------------------

/// What to pull out of each batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection<'a> {
    /// Absorption instead of raw signal/power.
    pub absorption: bool,
    /// HSR band indices; `None` means every populated band.
    pub hsr_bands: Option<&'a [usize]>,
}

/// The named series of one batch plus what the composer needs to label them.
#[derive(Debug, Clone)]
pub struct ExtractedBatch {
    pub dataset: String,
    pub site_uid: String,
    pub kind: InstrumentKind,
    pub y_label: &'static str,
    /// In extraction order; names are unique.
    pub series: Vec<BandSeries>,
    /// Every timestamp of the batch in file order, including files whose
    /// series were skipped. The sample interval is inferred from this.
    pub timestamps: Vec<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Extract every batch, in caller order. Empty batches are skipped with a
/// warning. Mixing instrument kinds is only allowed when `stacked` is set,
/// since the kinds do not share a unit.
pub fn extract_all(
    batches: &[InstrumentRecordBatch],
    selection: Selection,
    stacked: bool,
    warnings: &mut Vec<PlotWarning>,
) -> Result<Vec<ExtractedBatch>, PlotError> {
    let mut kinds = BTreeSet::new();
    for batch in batches.iter().filter(|b| !b.is_empty()) {
        kinds.insert(batch.kind()? as u8);
    }
    if kinds.len() > 1 && !stacked {
        return Err(PlotError::MixedInstrumentKinds);
    }

    let mut extracted = Vec::with_capacity(batches.len());
    for batch in batches {
        if let Some(e) = extract_batch(batch, selection, warnings)? {
            extracted.push(e);
        }
    }
    Ok(extracted)
}

/// Turn one batch into named, time-aligned series. Returns `None` (with a
/// warning) for a batch without any files.
pub fn extract_batch(
    batch: &InstrumentRecordBatch,
    selection: Selection,
    warnings: &mut Vec<PlotWarning>,
) -> Result<Option<ExtractedBatch>, PlotError> {
    if batch.is_empty() {
        warn(
            warnings,
            PlotWarning::EmptyBatch {
                dataset: batch.dataset.clone(),
            },
        );
        return Ok(None);
    }

    let kind = batch.kind()?;
    let site = batch.site_uid.to_uppercase();
    let mut out = ExtractedBatch {
        dataset: batch.dataset.clone(),
        site_uid: batch.site_uid.clone(),
        kind,
        y_label: kind.y_label(selection.absorption),
        series: Vec::new(),
        timestamps: Vec::new(),
    };

    for (index, record) in batch.records.iter().enumerate() {
        out.timestamps.extend_from_slice(&record.timestamp);

        // (series name, values) for every band this file contributes
        let bands: Vec<(String, &[f64])> = match (&record.signal, kind) {
            (
                Signal::SingleFrequency {
                    raw_signal,
                    absorption,
                },
                InstrumentKind::SingleFrequencyRiometer,
            ) => {
                let values = if selection.absorption {
                    match absorption {
                        Some(a) => a.as_slice(),
                        None => {
                            skip_missing_absorption(batch, warnings);
                            continue;
                        }
                    }
                } else {
                    raw_signal.as_slice()
                };
                let name = format!("{site} {} band_00 30.00 MHz", batch.dataset);
                vec![(name, values)]
            }

            (
                Signal::HyperSpectral {
                    raw_power,
                    absorption,
                    band_central_frequency,
                },
                InstrumentKind::HyperSpectralRiometer,
            ) => {
                let rows = if selection.absorption {
                    match absorption {
                        Some(a) => a,
                        None => {
                            skip_missing_absorption(batch, warnings);
                            continue;
                        }
                    }
                } else {
                    raw_power
                };

                let mut bands = Vec::new();
                for band in select_bands(band_central_frequency, selection.hsr_bands) {
                    let values = rows.get(band).ok_or_else(|| PlotError::MismatchedLength {
                        dataset: batch.dataset.clone(),
                        index,
                        timestamps: record.timestamp.len(),
                        values: 0,
                    })?;
                    let name = format!(
                        "{site} {} band_{band:02} {} MHz",
                        batch.dataset,
                        format_frequency(&band_central_frequency[band])
                    );
                    bands.push((name, values.as_slice()));
                }
                bands
            }

            _ => {
                return Err(PlotError::MismatchedRecord {
                    dataset: batch.dataset.clone(),
                    index,
                    expected: match kind {
                        InstrumentKind::SingleFrequencyRiometer => "single-frequency",
                        InstrumentKind::HyperSpectralRiometer => "hyper-spectral",
                    },
                })
            }
        };

        for (name, values) in bands {
            if values.len() != record.timestamp.len() {
                return Err(PlotError::MismatchedLength {
                    dataset: batch.dataset.clone(),
                    index,
                    timestamps: record.timestamp.len(),
                    values: values.len(),
                });
            }

            let pos = match out.series.iter().position(|s| s.name == name) {
                Some(pos) => pos,
                None => {
                    out.series.push(BandSeries::new(name));
                    out.series.len() - 1
                }
            };
            let series = &mut out.series[pos];
            series.timestamps.extend_from_slice(&record.timestamp);
            series.values.extend_from_slice(values);
        }
    }

    log::debug!(
        "Extracted {} series from {} at {}",
        out.series.len(),
        out.dataset,
        out.site_uid
    );
    Ok(Some(out))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn skip_missing_absorption(batch: &InstrumentRecordBatch, warnings: &mut Vec<PlotWarning>) {
    warn(
        warnings,
        PlotWarning::MissingAbsorption {
            dataset: batch.dataset.clone(),
            site_uid: batch.site_uid.clone(),
        },
    );
}

/// Indices of band slots whose centre-frequency descriptor is populated.
pub fn populated_bands(band_central_frequency: &[String]) -> Vec<usize> {
    band_central_frequency
        .iter()
        .enumerate()
        .filter(|(_, desc)| {
            let desc = desc.trim();
            !desc.is_empty() && parse_frequency(desc) != Some(0.0)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Requested bands that are populated, ascending and de-duplicated.
pub fn select_bands(band_central_frequency: &[String], requested: Option<&[usize]>) -> Vec<usize> {
    let populated = populated_bands(band_central_frequency);
    match requested {
        None => populated,
        Some(requested) => {
            let requested: BTreeSet<usize> = requested.iter().copied().collect();
            populated
                .into_iter()
                .filter(|b| requested.contains(b))
                .collect()
        }
    }
}

fn parse_frequency(desc: &str) -> Option<f64> {
    desc.split_whitespace().next()?.parse().ok()
}

/// `"30.12 MHz"` -> `"30.1"`.
fn format_frequency(desc: &str) -> String {
    match parse_frequency(desc) {
        Some(f) => format!("{f:.1}"),
        None => desc.split_whitespace().next().unwrap_or("").to_string(),
    }
}
