use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while composing, rendering or saving a figure.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Only one of returnfig or savefig can be set to True")]
    ReturnAndSave,

    #[error("The savefig_filename parameter is missing, but required since savefig was set to True.")]
    MissingFilename,

    #[error("The savefig_quality parameter must be between 1 and 100 (got {0})")]
    InvalidQuality(u8),

    #[error("Unsupported dataset '{0}'")]
    UnsupportedDataset(String),

    #[error("Cannot plot single-frequency riometer and HSR data on the same axis; use stack_plot")]
    MixedInstrumentKinds,

    #[error("Record {index} of dataset '{dataset}' does not hold {expected} data")]
    MismatchedRecord {
        dataset: String,
        index: usize,
        expected: &'static str,
    },

    #[error("Record {index} of dataset '{dataset}' has {timestamps} timestamps but {values} values")]
    MismatchedLength {
        dataset: String,
        index: usize,
        timestamps: usize,
        values: usize,
    },

    #[error("Color '{0}' not recognized")]
    UnknownColor(String),

    #[error("Linestyle '{0}' not recognized")]
    UnknownLinestyle(String),

    #[error("Marker '{0}' is not currently supported")]
    UnknownMarker(String),

    #[error("Unknown theme '{0}'")]
    UnknownTheme(String),

    #[error("Error from the plotters library: {0}")]
    Draw(String),

    #[error("Could not encode image '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Could not display the figure: {0}")]
    Display(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Errors raised while building, mutating or rendering a [`crate::SiteMap`].
#[derive(Error, Debug)]
pub enum SiteMapError {
    #[error("Could not find requested site_uid \"{uid}\" for instrument_array \"{instrument_array}\".")]
    SiteNotFound {
        uid: String,
        instrument_array: String,
    },

    #[error("No instrument arrays supplied")]
    NoInstrumentArrays,

    #[error("Got {got} site UID lists for {expected} instrument arrays")]
    SiteListCount { expected: usize, got: usize },

    #[error("Parameter '{name}' has {got} values but {expected} instrument arrays were supplied")]
    StyleCount {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("No latitudes or longitudes provided.")]
    NoCoordinates,

    #[error("Manually supplying contour requires both lats and lons.")]
    UnpairedCoordinates,

    #[error("Lat/Lon data must be of the same size.")]
    CoordinateLength,

    #[error("Linewidth must be greater than zero.")]
    Linewidth,

    #[error("Requested dataset_name: {dataset} does not match the instrument_array: {instrument_array} contained in this SiteMap object.")]
    DatasetMismatch {
        dataset: String,
        instrument_array: String,
    },

    #[error("Got {got} dataset names but this SiteMap only holds {groups} instrument arrays")]
    TooManyDatasets { groups: usize, got: usize },

    #[error("Before plotting a SiteMap with enforce_data_availability=True, SiteMap::add_availability(...) must be called.")]
    AvailabilityMissing,

    #[error("Invalid map extent {0:?}; expected [min_lon, max_lon, min_lat, max_lat]")]
    Extent([f64; 4]),

    #[error("No part of the map extent is visible in the {0} projection")]
    ExtentNotVisible(&'static str),

    #[error("Error from a data service: {0:#}")]
    Collaborator(anyhow::Error),

    #[error(transparent)]
    Plot(#[from] PlotError),
}
