/// Save mode: rasterise a [`Figure`] and encode it to disk.
///
/// ```text
///   Figure ──▶ raster::rasterize (plotters, RGB buffer) ──▶ write_image (PNG / JPEG)
/// ```
pub mod path;
pub mod raster;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::PlotError;
use crate::figure::Figure;
use crate::output::{warn, PlotWarning};

pub use raster::rasterize;

/// Quality used for JPEG output when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// `.jpg` / `.jpeg` (any case) is JPEG, everything else is PNG.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Rasterise `figure` and write it to `path`. A quality given for a
/// non-JPEG destination is ignored with a warning.
pub fn save_figure(
    figure: &Figure,
    path: &Path,
    quality: Option<u8>,
    warnings: &mut Vec<PlotWarning>,
) -> Result<(), PlotError> {
    let format = ImageFormat::from_path(path);
    if quality.is_some() && format != ImageFormat::Jpeg {
        warn(
            warnings,
            PlotWarning::QualityIgnored {
                filename: path.to_path_buf(),
            },
        );
    }
    let img = rasterize(figure)?;
    write_image(&img, path, format, quality)
}

/// Encode an RGB image. `quality` only applies to JPEG.
pub fn write_image(
    img: &RgbImage,
    path: &Path,
    format: ImageFormat,
    quality: Option<u8>,
) -> Result<(), PlotError> {
    let encode_err = |source| PlotError::Encode {
        path: path.to_path_buf(),
        source,
    };
    match format {
        ImageFormat::Png => img
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(encode_err),
        ImageFormat::Jpeg => {
            let quality = quality.unwrap_or(DEFAULT_JPEG_QUALITY);
            let mut writer = BufWriter::new(File::create(path)?);
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode_image(img).map_err(encode_err)
        }
    }
}

// ---------------------------------------------------------------------------
// Tick placement
// ---------------------------------------------------------------------------

const TIME_STEPS: [f64; 20] = [
    1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0, 1800.0, 3600.0,
    7200.0, 10800.0, 21600.0, 43200.0, 86400.0, 172800.0, 604800.0,
];

/// Tick positions on a time axis, aligned to whole seconds, minutes, hours
/// or days, with at most `max_ticks` ticks.
pub fn time_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo || max_ticks == 0 {
        return Vec::new();
    }
    let span = hi - lo;
    let step = TIME_STEPS
        .iter()
        .copied()
        .find(|s| span / s <= max_ticks as f64)
        .unwrap_or_else(|| (span / max_ticks as f64 / 86400.0).ceil() * 86400.0);

    let mut ticks = Vec::new();
    let mut t = (lo / step).ceil() * step;
    while t <= hi {
        ticks.push(t);
        t += step;
    }
    ticks
}
