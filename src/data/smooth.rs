//! Moving-average smoothing used to down-sample series before plotting.

use chrono::{DateTime, Utc};

/// Median spacing between consecutive timestamps, in seconds.
pub fn median_interval(timestamps: &[DateTime<Utc>]) -> Option<f64> {
    if timestamps.len() < 2 {
        return None;
    }
    let mut deltas: Vec<f64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0)
        .collect();
    deltas.sort_by(f64::total_cmp);

    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 0 {
        Some((deltas[mid - 1] + deltas[mid]) / 2.0)
    } else {
        Some(deltas[mid])
    }
}

/// Number of samples covered by `window_seconds` at the given sample
/// interval. Zero means no smoothing.
pub fn window_len(window_seconds: f64, interval_seconds: f64) -> usize {
    if window_seconds <= 0.0 || !window_seconds.is_finite() || interval_seconds.is_nan() || interval_seconds <= 0.0 {
        return 0;
    }
    (window_seconds / interval_seconds).floor() as usize
}

/// Uniform moving average with "same"-length output: sample `i` averages the
/// window centred on it, with missing neighbours at the edges counted as
/// zero.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let window = window.min(n);
    if window <= 1 {
        return values.to_vec();
    }

    let offset = (window - 1) / 2;
    let scale = 1.0 / window as f64;
    (0..n)
        .map(|i| {
            // full-convolution index i + offset covers values[i + offset + 1 - window ..= i + offset]
            let hi = (i + offset).min(n - 1);
            let lo = (i + offset + 1).saturating_sub(window);
            values[lo..=hi].iter().sum::<f64>() * scale
        })
        .collect()
}

/// Smooth `values` over `window_seconds`, with the sample interval inferred
/// from `timestamps`. Returns the input unchanged when the window is not
/// positive or finer than the native resolution.
pub fn downsample(values: &[f64], timestamps: &[DateTime<Utc>], window_seconds: f64) -> Vec<f64> {
    let window = match median_interval(timestamps) {
        Some(interval) => window_len(window_seconds, interval),
        None => 0,
    };
    log::trace!("Smoothing {} samples with a {window}-sample window", values.len());
    moving_average(values, window)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;

    fn every(seconds: i64, n: usize) -> Vec<DateTime<Utc>> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| t0 + chrono::Duration::seconds(seconds * i as i64))
            .collect()
    }

    #[test]
    fn median_of_deltas() {
        let mut t = every(5, 4);
        t.push(t[3] + chrono::Duration::seconds(60));
        assert_abs_diff_eq!(median_interval(&t).unwrap(), 5.0);
        assert_abs_diff_eq!(median_interval(&every(2, 3)).unwrap(), 2.0);
        assert!(median_interval(&every(1, 1)).is_none());
    }

    #[test]
    fn window_lengths() {
        assert_eq!(window_len(10.0, 1.0), 10);
        assert_eq!(window_len(10.0, 3.0), 3);
        assert_eq!(window_len(1.0, 5.0), 0);
        assert_eq!(window_len(0.0, 1.0), 0);
        assert_eq!(window_len(-4.0, 1.0), 0);
    }

    #[test]
    fn identity_when_window_too_small() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(downsample(&values, &every(5, 5), 1.0), values.to_vec());
        assert_eq!(downsample(&values, &every(5, 5), 0.0), values.to_vec());
        assert_eq!(downsample(&values, &every(5, 5), -10.0), values.to_vec());
    }

    #[test]
    fn same_length_convolution() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        // odd window: centred
        let out = moving_average(&values, 3);
        assert_eq!(out.len(), 5);
        assert_abs_diff_eq!(out[0], 1.0);
        assert_abs_diff_eq!(out[2], 3.0);
        assert_abs_diff_eq!(out[4], 3.0);
        // even window: the extra sample comes from the left
        let out = moving_average(&values, 2);
        assert_abs_diff_eq!(out[0], 0.5);
        assert_abs_diff_eq!(out[1], 1.5);
        assert_abs_diff_eq!(out[4], 4.5);
    }

    #[test]
    fn window_longer_than_series_keeps_length() {
        let values = [2.0, 2.0, 2.0];
        let out = moving_average(&values, 10);
        assert_eq!(out.len(), 3);
    }
}
