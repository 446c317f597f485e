use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rio_plot::{InstrumentRecordBatch, Signal, SubRecord};

/// Quiet-day curve: a diurnal sinusoid around `baseline`.
fn quiet_day(t: DateTime<Utc>, baseline: f64, amplitude: f64, lon: f64) -> f64 {
    let hours = t.timestamp() as f64 / 3600.0 + lon / 15.0;
    baseline + amplitude * (2.0 * std::f64::consts::PI * hours / 24.0).sin()
}

/// A substorm-like absorption spike peaking at `peak`.
fn absorption_event(t: DateTime<Utc>, peak: DateTime<Utc>, width_s: f64, height: f64) -> f64 {
    let dt = (t - peak).num_seconds() as f64;
    height * (-(dt * dt) / (2.0 * width_s * width_s)).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn timestamps(start: DateTime<Utc>, cadence_s: i64, n: usize) -> Vec<DateTime<Utc>> {
    (0..n as i64)
        .map(|i| start + Duration::seconds(i * cadence_s))
        .collect()
}

/// Two hourly files of 5 s single-frequency data.
fn riometer(
    site_uid: &str,
    lon: f64,
    start: DateTime<Utc>,
    peak: DateTime<Utc>,
    rng: &mut SimpleRng,
) -> InstrumentRecordBatch {
    let records = (0..2)
        .map(|hour| {
            let timestamp = timestamps(start + Duration::hours(hour), 5, 720);
            let absorption: Vec<f64> = timestamp
                .iter()
                .map(|&t| absorption_event(t, peak, 600.0, 2.5) + rng.gauss(0.0, 0.02))
                .collect();
            let raw_signal = timestamp
                .iter()
                .zip(&absorption)
                .map(|(&t, &a)| quiet_day(t, 2.6, 0.3, lon) * 10f64.powf(-a / 10.0))
                .collect();
            SubRecord {
                timestamp,
                signal: Signal::SingleFrequency {
                    raw_signal,
                    absorption: Some(absorption),
                },
            }
        })
        .collect();

    InstrumentRecordBatch {
        dataset: "NORSTAR_RIOMETER_K0_TXT".into(),
        site_uid: site_uid.into(),
        records,
    }
}

/// One file of 1 min HSR data, 4 populated bands out of 8 slots.
fn hsr(start: DateTime<Utc>, peak: DateTime<Utc>, rng: &mut SimpleRng) -> InstrumentRecordBatch {
    let timestamp = timestamps(start, 60, 120);
    let frequencies = [30.0_f64, 0.0, 38.2, 0.0, 45.0, 0.0, 51.3, 0.0];

    let mut raw_power = Vec::with_capacity(frequencies.len());
    let mut absorption = Vec::with_capacity(frequencies.len());
    for &f in &frequencies {
        // absorption falls off roughly with the square of frequency
        let scale = if f > 0.0 { (30.0 / f).powi(2) } else { 0.0 };
        let a: Vec<f64> = timestamp
            .iter()
            .map(|&t| scale * absorption_event(t, peak, 900.0, 3.0) + rng.gauss(0.0, 0.01))
            .collect();
        raw_power.push(
            timestamp
                .iter()
                .zip(&a)
                .map(|(&t, &a)| quiet_day(t, -95.0, 1.5, -111.9) - a)
                .collect(),
        );
        absorption.push(a);
    }

    InstrumentRecordBatch {
        dataset: "SWAN_HSR_K0_H5".into(),
        site_uid: "fsmi".into(),
        records: vec![SubRecord {
            timestamp,
            signal: Signal::HyperSpectral {
                raw_power,
                absorption: Some(absorption),
                band_central_frequency: frequencies
                    .iter()
                    .map(|&f| if f > 0.0 { format!("{f:.2} MHz") } else { String::new() })
                    .collect(),
            },
        }],
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let start = Utc
        .with_ymd_and_hms(2023, 11, 5, 6, 0, 0)
        .single()
        .context("invalid start time")?;
    let peak = start + Duration::minutes(70);

    let batches = vec![
        riometer("gill", -94.6, start, peak, &mut rng),
        riometer("daws", -139.1, start, peak + Duration::minutes(15), &mut rng),
        hsr(start, peak, &mut rng),
    ];

    let output_path = "sample_records.json";
    let file = File::create(output_path).context("creating output file")?;
    serde_json::to_writer(BufWriter::new(file), &batches).context("writing records")?;

    println!(
        "Wrote {} batches ({} files) to {output_path}",
        batches.len(),
        batches.iter().map(|b| b.records.len()).sum::<usize>()
    );
    Ok(())
}
