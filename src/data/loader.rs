use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::model::{InstrumentKind, InstrumentRecordBatch, Signal, SubRecord};
use crate::style::OneOrMany;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load record batches from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – one `InstrumentRecordBatch` object or a list of them
/// * `.csv`  – single-frequency samples, `timestamp,raw_signal[,absorption]`,
///   in a file named `DATASET__SITE.csv`
pub fn load_file(path: &Path) -> Result<Vec<InstrumentRecordBatch>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let batches = match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path).map(|b| vec![b]),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::info!(
        "Loaded {} batches ({} files) from {}",
        batches.len(),
        batches.iter().map(|b| b.records.len()).sum::<usize>(),
        path.display()
    );
    Ok(batches)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// [
///   {
///     "dataset": "NORSTAR_RIOMETER_K0_TXT",
///     "site_uid": "gill",
///     "records": [
///       {
///         "timestamp": ["2023-11-05T00:00:00Z", ...],
///         "signal": {"kind": "single_frequency", "raw_signal": [...]}
///       }
///     ]
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<InstrumentRecordBatch>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let parsed: OneOrMany<InstrumentRecordBatch> =
        serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(match parsed {
        OneOrMany::One(batch) => vec![batch],
        OneOrMany::Many(batches) => batches,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    raw_signal: f64,
    #[serde(default)]
    absorption: Option<f64>,
}

/// CSV layout: header row, then one sample per row. The dataset and site
/// come from the file stem, split on `__`. Blank absorption cells become
/// `NaN`; without an `absorption` column the record has no absorption.
fn load_csv(path: &Path) -> Result<InstrumentRecordBatch> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("CSV file name is not valid UTF-8")?;
    let (dataset, site_uid) = stem
        .split_once("__")
        .with_context(|| format!("CSV file name '{stem}' is not DATASET__SITE"))?;
    if InstrumentKind::from_dataset(dataset)? != InstrumentKind::SingleFrequencyRiometer {
        bail!("CSV files can only hold single-frequency riometer data, not {dataset}");
    }

    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let has_absorption = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .any(|h| h == "absorption");

    let mut timestamp = Vec::new();
    let mut raw_signal = Vec::new();
    let mut absorption = Vec::new();
    for (row_no, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        timestamp.push(row.timestamp);
        raw_signal.push(row.raw_signal);
        absorption.push(row.absorption.unwrap_or(f64::NAN));
    }

    Ok(InstrumentRecordBatch {
        dataset: dataset.to_string(),
        site_uid: site_uid.to_string(),
        records: vec![SubRecord {
            timestamp,
            signal: Signal::SingleFrequency {
                raw_signal,
                absorption: has_absorption.then_some(absorption),
            },
        }],
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn json_single_or_list() {
        let dir = tempfile::tempdir().unwrap();
        let batch = r#"{"dataset": "SWAN_HSR_K0_H5", "site_uid": "fsmi", "records": [{
            "timestamp": ["2023-11-05T00:00:00Z"],
            "signal": {"kind": "hyper_spectral", "raw_power": [[1.0], [2.0]],
                       "band_central_frequency": ["30.00 MHz", ""]}}]}"#;

        let one = dir.path().join("one.json");
        fs::write(&one, batch).unwrap();
        assert_eq!(load_file(&one).unwrap().len(), 1);

        let many = dir.path().join("many.json");
        fs::write(&many, format!("[{batch}, {batch}]")).unwrap();
        let batches = load_file(&many).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].site_uid, "fsmi");
    }

    #[test]
    fn csv_with_absorption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NORSTAR_RIOMETER_K0_TXT__gill.csv");
        fs::write(
            &path,
            "timestamp,raw_signal,absorption\n\
             2023-11-05T00:00:00Z,2.5,0.1\n\
             2023-11-05T00:00:05Z,2.6,\n",
        )
        .unwrap();

        let batches = load_file(&path).unwrap();
        let batch = &batches[0];
        assert_eq!(batch.dataset, "NORSTAR_RIOMETER_K0_TXT");
        assert_eq!(batch.site_uid, "gill");
        let Signal::SingleFrequency {
            raw_signal,
            absorption,
        } = &batch.records[0].signal
        else {
            panic!("expected single-frequency data");
        };
        assert_eq!(raw_signal, &vec![2.5, 2.6]);
        let absorption = absorption.as_ref().unwrap();
        assert_eq!(absorption[0], 0.1);
        assert!(absorption[1].is_nan());
    }

    #[test]
    fn csv_without_absorption_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NORSTAR_RIOMETER_K2_TXT__daws.csv");
        fs::write(&path, "timestamp,raw_signal\n2023-11-05T00:00:00Z,1.0\n").unwrap();
        let batch = &load_file(&path).unwrap()[0];
        assert!(matches!(
            batch.records[0].signal,
            Signal::SingleFrequency {
                absorption: None,
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let no_site = dir.path().join("gill.csv");
        fs::write(&no_site, "timestamp,raw_signal\n").unwrap();
        assert!(load_file(&no_site).is_err());

        let hsr = dir.path().join("SWAN_HSR_K0_H5__fsmi.csv");
        fs::write(&hsr, "timestamp,raw_signal\n").unwrap();
        assert!(load_file(&hsr).is_err());

        assert!(load_file(&dir.path().join("data.parquet")).is_err());
    }
}
