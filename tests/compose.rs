use chrono::{DateTime, Duration, TimeZone, Utc};
use rio_plot::figure::time_to_x;
use rio_plot::{
    compose, plot, Figure, InstrumentRecordBatch, Outcome, OutputOptions, PlotError, PlotOptions,
    PlotWarning, Signal, SubRecord, Viewer,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 11, 5, 6, 0, 0).unwrap()
}

fn times(start: DateTime<Utc>, n: i64) -> Vec<DateTime<Utc>> {
    (0..n).map(|i| start + Duration::seconds(5 * i)).collect()
}

fn riometer(site: &str, start: DateTime<Utc>, n: i64, absorption: bool) -> InstrumentRecordBatch {
    InstrumentRecordBatch {
        dataset: "NORSTAR_RIOMETER_K0_TXT".into(),
        site_uid: site.into(),
        records: vec![SubRecord {
            timestamp: times(start, n),
            signal: Signal::SingleFrequency {
                raw_signal: (0..n).map(|i| 2.0 + i as f64 * 0.01).collect(),
                absorption: absorption.then(|| vec![0.3; n as usize]),
            },
        }],
    }
}

/// Eight band slots, populated at 0, 3, 5 and 7.
fn hsr(n: i64) -> InstrumentRecordBatch {
    let freqs = ["30.00 MHz", "", "", "38.20 MHz", "", "45.00 MHz", "", "51.30 MHz"];
    InstrumentRecordBatch {
        dataset: "SWAN_HSR_K0_H5".into(),
        site_uid: "fsmi".into(),
        records: vec![SubRecord {
            timestamp: times(t0(), n),
            signal: Signal::HyperSpectral {
                raw_power: (0..8).map(|b| vec![-95.0 + b as f64; n as usize]).collect(),
                absorption: None,
                band_central_frequency: freqs.iter().map(|s| s.to_string()).collect(),
            },
        }],
    }
}

#[derive(Default)]
struct CountingViewer {
    shown: usize,
    last_line_count: usize,
}

impl Viewer for CountingViewer {
    fn show(&mut self, figure: &Figure) -> Result<(), PlotError> {
        self.shown += 1;
        self.last_line_count = figure.line_count();
        Ok(())
    }
}

fn returned() -> PlotOptions {
    PlotOptions {
        output: OutputOptions::returned(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Riometer
// ---------------------------------------------------------------------------

#[test]
fn two_sites_share_one_axes() {
    let chur = riometer("chur", t0(), 540, false);
    let daws = riometer("daws", t0() + Duration::minutes(10), 600, false);
    let batches = [chur, daws];

    let rendered = plot(&batches, &returned(), &mut CountingViewer::default()).unwrap();
    assert!(rendered.warnings.is_empty());
    let fig = rendered.into_figure().unwrap();

    assert_eq!(fig.axes.len(), 1);
    let ax = &fig.axes[0];
    assert!(ax.legend);
    let names: Vec<_> = ax.legend_entries().iter().map(|l| l.label.clone().unwrap()).collect();
    assert_eq!(
        names,
        vec![
            "CHUR NORSTAR_RIOMETER_K0_TXT band_00 30.00 MHz",
            "DAWS NORSTAR_RIOMETER_K0_TXT band_00 30.00 MHz",
        ]
    );

    let first = time_to_x(&t0());
    let last = time_to_x(&(t0() + Duration::minutes(10) + Duration::seconds(5 * 599)));
    assert_eq!(ax.x_range, Some((first, last)));
}

#[test]
fn explicit_xrange_wins() {
    let start = t0() + Duration::minutes(5);
    let end = t0() + Duration::minutes(15);
    let options = PlotOptions {
        xrange: Some((start, end)),
        ..returned()
    };
    let fig = compose(&[riometer("gill", t0(), 400, false)], &options, &mut vec![]).unwrap();
    assert_eq!(fig.axes[0].x_range, Some((time_to_x(&start), time_to_x(&end))));
}

#[test]
fn missing_absorption_warns_per_file() {
    let mut batch = riometer("gill", t0(), 20, false);
    batch.records.push(SubRecord {
        timestamp: times(t0() + Duration::minutes(5), 20),
        signal: Signal::SingleFrequency {
            raw_signal: vec![1.0; 20],
            absorption: None,
        },
    });
    let options = PlotOptions {
        absorption: true,
        ..returned()
    };

    let rendered = plot(&[batch], &options, &mut CountingViewer::default()).unwrap();
    let expected = PlotWarning::MissingAbsorption {
        dataset: "NORSTAR_RIOMETER_K0_TXT".into(),
        site_uid: "gill".into(),
    };
    assert_eq!(rendered.warnings, vec![expected.clone(), expected]);

    let fig = rendered.into_figure().unwrap();
    assert_eq!(fig.axes.len(), 1);
    assert_eq!(fig.line_count(), 0);
}

#[test]
fn empty_batch_is_skipped() {
    let empty = InstrumentRecordBatch {
        dataset: "NORSTAR_RIOMETER_K0_TXT".into(),
        site_uid: "rabb".into(),
        records: Vec::new(),
    };
    let mut warnings = Vec::new();
    let fig = compose(
        &[empty, riometer("gill", t0(), 10, false)],
        &PlotOptions::default(),
        &mut warnings,
    )
    .unwrap();
    assert_eq!(fig.line_count(), 1);
    assert_eq!(
        warnings,
        vec![PlotWarning::EmptyBatch {
            dataset: "NORSTAR_RIOMETER_K0_TXT".into()
        }]
    );
}

// ---------------------------------------------------------------------------
// HSR
// ---------------------------------------------------------------------------

#[test]
fn hsr_plots_populated_bands() {
    let fig = compose(&[hsr(30)], &returned(), &mut vec![]).unwrap();
    let names: Vec<_> = fig.axes[0]
        .lines
        .iter()
        .map(|l| l.label.clone().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "FSMI SWAN_HSR_K0_H5 band_00 30.0 MHz",
            "FSMI SWAN_HSR_K0_H5 band_03 38.2 MHz",
            "FSMI SWAN_HSR_K0_H5 band_05 45.0 MHz",
            "FSMI SWAN_HSR_K0_H5 band_07 51.3 MHz",
        ]
    );
    assert_eq!(fig.axes[0].y_label.as_deref(), Some("Raw Power (dB)"));
}

#[test]
fn hsr_band_selection() {
    let options = PlotOptions {
        hsr_bands: Some(vec![0, 3]),
        ..returned()
    };
    let fig = compose(&[hsr(30)], &options, &mut vec![]).unwrap();
    assert_eq!(fig.line_count(), 2);

    // unpopulated slots are never drawn, even on request
    let options = PlotOptions {
        hsr_bands: Some(vec![1, 2, 7]),
        ..returned()
    };
    let fig = compose(&[hsr(30)], &options, &mut vec![]).unwrap();
    assert_eq!(fig.line_count(), 1);
}

// ---------------------------------------------------------------------------
// Layout and output
// ---------------------------------------------------------------------------

#[test]
fn stacked_axes_match_drawn_series() {
    let batches = [riometer("gill", t0(), 30, false), hsr(30)];
    let options = PlotOptions {
        stack_plot: true,
        hsr_bands: Some(vec![5, 7]),
        ..returned()
    };
    let fig = compose(&batches, &options, &mut vec![]).unwrap();
    assert_eq!(fig.axes.len(), 3);
    assert!(fig.axes.iter().all(|ax| ax.lines.len() == 1));
    assert_eq!(fig.axes[0].y_label.as_deref(), Some("Raw Signal (V)"));
    assert_eq!(fig.axes[2].y_label.as_deref(), Some("Raw Power (dB)"));
    assert!(fig.axes[2].x_label.is_some());
    assert!(fig.axes[0].x_label.is_none());
}

#[test]
fn stacked_axes_share_time_span() {
    let chur = riometer("chur", t0() - Duration::hours(6), 100, false);
    let daws = riometer("daws", t0(), 100, false);
    let options = PlotOptions {
        stack_plot: true,
        ..returned()
    };
    let fig = compose(&[chur, daws], &options, &mut vec![]).unwrap();
    assert_eq!(fig.axes.len(), 2);

    let first = time_to_x(&(t0() - Duration::hours(6)));
    let last = time_to_x(&(t0() + Duration::seconds(5 * 99)));
    for ax in &fig.axes {
        assert_eq!(ax.x_range, Some((first, last)));
    }
}

#[test]
fn mixed_kinds_need_stacking() {
    let batches = [riometer("gill", t0(), 30, false), hsr(30)];
    assert!(matches!(
        compose(&batches, &PlotOptions::default(), &mut vec![]),
        Err(PlotError::MixedInstrumentKinds)
    ));
}

#[test]
fn display_goes_through_viewer() {
    let mut viewer = CountingViewer::default();
    let rendered = plot(
        &[riometer("gill", t0(), 30, false)],
        &PlotOptions::default(),
        &mut viewer,
    )
    .unwrap();
    assert!(matches!(rendered.outcome, Outcome::Displayed));
    assert_eq!(viewer.shown, 1);
    assert_eq!(viewer.last_line_count, 1);
}

#[test]
fn output_conflicts_fail_before_drawing() {
    let mut viewer = CountingViewer::default();
    let batches = [riometer("gill", t0(), 30, false)];

    let options = PlotOptions {
        output: OutputOptions {
            returnfig: true,
            savefig: true,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(
        plot(&batches, &options, &mut viewer),
        Err(PlotError::ReturnAndSave)
    ));

    let options = PlotOptions {
        output: OutputOptions {
            savefig: true,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(
        plot(&batches, &options, &mut viewer),
        Err(PlotError::MissingFilename)
    ));
    assert_eq!(viewer.shown, 0);
}

#[test]
fn unused_save_options_warn_but_display() {
    let mut viewer = CountingViewer::default();
    let options = PlotOptions {
        output: OutputOptions {
            savefig_quality: Some(80),
            ..Default::default()
        },
        ..Default::default()
    };
    let rendered = plot(&[riometer("gill", t0(), 30, false)], &options, &mut viewer).unwrap();
    assert_eq!(rendered.warnings, vec![PlotWarning::SaveOptionsWithoutSave]);
    assert_eq!(viewer.shown, 1);
}

#[test]
fn saving_png_ignores_quality() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.png");
    let options = PlotOptions {
        stack_plot: true,
        output: OutputOptions::save(&path, Some(80)),
        ..Default::default()
    };
    let batches = [riometer("gill", t0(), 720, false), riometer("daws", t0(), 720, false)];
    let mut viewer = CountingViewer::default();

    let rendered = plot(&batches, &options, &mut viewer).unwrap();
    assert_eq!(
        rendered.warnings,
        vec![PlotWarning::QualityIgnored {
            filename: path.clone()
        }]
    );
    assert!(matches!(rendered.outcome, Outcome::Saved(ref p) if *p == path));
    assert_eq!(viewer.shown, 0);

    let img = image::open(&path).unwrap();
    assert!(img.width() > 0 && img.height() > 0);
}

#[test]
fn saving_jpeg_uses_quality() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.jpg");
    let options = PlotOptions {
        output: OutputOptions::save(&path, Some(80)),
        ..Default::default()
    };
    let rendered = plot(
        &[riometer("gill", t0(), 720, true)],
        &options,
        &mut CountingViewer::default(),
    )
    .unwrap();
    assert!(rendered.warnings.is_empty());
    assert!(matches!(rendered.outcome, Outcome::Saved(_)));
    assert_eq!(
        image::ImageFormat::from_path(&path).unwrap(),
        image::ImageFormat::Jpeg
    );
    image::open(&path).unwrap();
}
