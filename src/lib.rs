//! Plotting for riometer and hyper-spectral riometer (HSR) data: stacked or
//! combined time-series figures, and site maps with contours.
//!
//! Every plotting entry point shares one output contract: display the
//! figure through a [`Viewer`], save it as PNG/JPEG, or return it to the
//! caller (see [`OutputOptions`]).

pub mod app;
pub mod color;
pub mod data;
pub mod error;
pub mod figure;
pub mod output;
pub mod plot;
pub mod render;
pub mod site_map;
pub mod state;
pub mod style;
pub mod theme;
pub mod ui;

pub use app::NativeViewer;
pub use data::model::{InstrumentKind, InstrumentRecordBatch, Signal, SubRecord};
pub use error::{PlotError, SiteMapError};
pub use figure::Figure;
pub use output::{Outcome, OutputOptions, PlotWarning, Rendered, Viewer};
pub use plot::{compose, plot, PlotOptions};
pub use site_map::{create_map, CreateMapOptions, MapPlotOptions, SiteMap};
pub use theme::{active_theme, set_theme, Theme};
