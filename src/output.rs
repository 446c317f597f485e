//! The display / return / save contract shared by every plotting entry
//! point, and the non-fatal warnings a render can produce.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PlotError;
use crate::figure::Figure;
use crate::render;

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Something was skipped or ignored, but the figure was still produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotWarning {
    EmptyBatch { dataset: String },
    MissingAbsorption { dataset: String, site_uid: String },
    SaveOptionsWithoutSave,
    SaveOptionsWithReturn,
    QualityIgnored { filename: PathBuf },
}

impl fmt::Display for PlotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotWarning::EmptyBatch { dataset } => {
                write!(f, "Received one or more empty data batches ('{dataset}')")
            }
            PlotWarning::MissingAbsorption { dataset, site_uid } => write!(
                f,
                "Omitting plotting (no absorption data) for '{dataset}' at '{site_uid}'"
            ),
            PlotWarning::SaveOptionsWithoutSave => f.write_str(
                "A savefig option parameter was supplied, but the savefig parameter is False. \
                 The savefig option parameters will be ignored.",
            ),
            PlotWarning::SaveOptionsWithReturn => f.write_str(
                "The figure will be returned, but a savefig option parameter was supplied. \
                 Consider removing the savefig option parameter(s) as they will be ignored.",
            ),
            PlotWarning::QualityIgnored { filename } => write!(
                f,
                "The savefig_quality parameter was specified, but is only used for saving JPG \
                 files. '{}' was determined to not be a JPG file, so the quality will be ignored",
                filename.display()
            ),
        }
    }
}

pub(crate) fn warn(warnings: &mut Vec<PlotWarning>, w: PlotWarning) {
    log::warn!("{w}");
    warnings.push(w);
}

// ---------------------------------------------------------------------------
// Output options
// ---------------------------------------------------------------------------

/// How the caller wants the figure delivered. At most one of `returnfig`
/// and `savefig` may be set; neither means "display".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    pub returnfig: bool,
    pub savefig: bool,
    pub savefig_filename: Option<PathBuf>,
    /// JPEG quality, 1 to 100.
    pub savefig_quality: Option<u8>,
}

/// The validated delivery mode.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    Display,
    Return,
    Save {
        filename: PathBuf,
        quality: Option<u8>,
    },
}

impl OutputOptions {
    pub fn display() -> Self {
        OutputOptions::default()
    }

    pub fn returned() -> Self {
        OutputOptions {
            returnfig: true,
            ..Default::default()
        }
    }

    pub fn save(filename: impl AsRef<Path>, quality: Option<u8>) -> Self {
        OutputOptions {
            savefig: true,
            savefig_filename: Some(filename.as_ref().to_path_buf()),
            savefig_quality: quality,
            ..Default::default()
        }
    }

    /// Validate the flags. Conflicts and a missing filename are errors;
    /// save parameters that will not be used only produce a warning.
    pub fn resolve(&self, warnings: &mut Vec<PlotWarning>) -> Result<OutputMode, PlotError> {
        if self.returnfig && self.savefig {
            return Err(PlotError::ReturnAndSave);
        }
        let has_save_params = self.savefig_filename.is_some() || self.savefig_quality.is_some();

        if self.returnfig {
            if has_save_params {
                warn(warnings, PlotWarning::SaveOptionsWithReturn);
            }
            return Ok(OutputMode::Return);
        }
        if !self.savefig {
            if has_save_params {
                warn(warnings, PlotWarning::SaveOptionsWithoutSave);
            }
            return Ok(OutputMode::Display);
        }

        let filename = self
            .savefig_filename
            .clone()
            .ok_or(PlotError::MissingFilename)?;
        if let Some(q) = self.savefig_quality {
            if !(1..=100).contains(&q) {
                return Err(PlotError::InvalidQuality(q));
            }
        }
        Ok(OutputMode::Save {
            filename,
            quality: self.savefig_quality,
        })
    }
}

// ---------------------------------------------------------------------------
// Viewer – where "display" mode sends a figure
// ---------------------------------------------------------------------------

/// Shows a figure to the user, blocking until it is dismissed.
pub trait Viewer {
    fn show(&mut self, figure: &Figure) -> Result<(), PlotError>;
}

// ---------------------------------------------------------------------------
// Result of a render call
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Outcome {
    Displayed,
    Saved(PathBuf),
    /// The caller now owns the figure.
    Returned(Figure),
}

#[derive(Debug)]
pub struct Rendered {
    pub outcome: Outcome,
    pub warnings: Vec<PlotWarning>,
}

impl Rendered {
    /// The returned figure, if the call was made in "return" mode.
    pub fn into_figure(self) -> Option<Figure> {
        match self.outcome {
            Outcome::Returned(fig) => Some(fig),
            _ => None,
        }
    }
}

/// Deliver a finished figure. In display and save mode the figure is
/// consumed here and released before returning, whatever the result.
pub(crate) fn deliver(
    figure: Figure,
    mode: OutputMode,
    viewer: &mut dyn Viewer,
    mut warnings: Vec<PlotWarning>,
) -> Result<Rendered, PlotError> {
    let outcome = match mode {
        OutputMode::Display => {
            viewer.show(&figure)?;
            Outcome::Displayed
        }
        OutputMode::Save { filename, quality } => {
            render::save_figure(&figure, &filename, quality, &mut warnings)?;
            log::info!("Wrote {}", filename.display());
            Outcome::Saved(filename)
        }
        OutputMode::Return => Outcome::Returned(figure),
    };
    Ok(Rendered { outcome, warnings })
}
