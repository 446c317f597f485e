//! Data layer: record types, loading, band extraction and smoothing.
//!
//! Architecture:
//! ```text
//!  reader output / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Vec<InstrumentRecordBatch>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  dataset / site selections → visible batches
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ extract   │  batch → named BandSeries
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  smooth   │  moving-average downsampling
//!   └──────────┘
//! ```

pub mod extract;
pub mod filter;
pub mod loader;
pub mod model;
pub mod smooth;
