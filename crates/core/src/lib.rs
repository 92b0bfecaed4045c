//! # Canopy Core
//!
//! Core types, configuration and I/O for the canopy tree-planting
//! analysis pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced raster grid
//! - `GeoTransform`: affine georeferencing for north-up imagery
//! - `Crs`: coordinate reference system handling
//! - Typed vector records for the cadastral input layers
//! - `PlannerConfig`: immutable per-run pipeline configuration
//! - GeoJSON / GeoTIFF / CSV artifact I/O
//!
//! All core math runs in one projected CRS (meters); geographic
//! conversion belongs to external tooling.

pub mod config;
pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use config::PlannerConfig;
pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{HeatSource, PlannerConfig, ScoreWeights};
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{Candidate, ScoreSet};
}
