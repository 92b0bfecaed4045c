//! Heat raster construction
//!
//! Two heat models share one convention: higher values mean higher
//! planting priority from an urban-heat perspective, on a 0-100 scale.
//! The banded NDVI model is the canonical default; the multi-factor
//! model is the continuous alternative.

pub mod classify;
pub mod focal;
pub mod mask;
pub mod mosaic;
pub mod multifactor;
pub mod ndvi;
pub mod resample;

pub use classify::{band_heat, classify_ndvi};
pub use focal::{focal_mean, radius_pixels};
pub use mask::{burn_indicator, burn_values, mask_to_area};
pub use mosaic::mosaic;
pub use multifactor::{build_multifactor_heat, HeatFactors};
pub use ndvi::ndvi;
pub use resample::resample_bilinear;
