//! NDVI banding into heat-demand classes
//!
//! Sparse vegetation means little evaporative cooling, so low NDVI
//! maps to high heat demand:
//!
//! | NDVI          | heat |
//! |---------------|------|
//! | < 0.2         | 100  |
//! | [0.2, 0.4)    | 70   |
//! | [0.4, 0.6)    | 40   |
//! | >= 0.6        | 10   |
//!
//! NaN input pixels stay NaN.

use canopy_core::config::NdviThresholds;
use canopy_core::{Error, Raster, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// Heat values assigned to the four vegetation bands, from barest to
/// greenest
pub const BAND_HEAT: [f64; 4] = [100.0, 70.0, 40.0, 10.0];

/// Reclassify an NDVI raster into banded heat demand
pub fn classify_ndvi(ndvi: &Raster<f64>, thresholds: &NdviThresholds) -> Result<Raster<f64>> {
    let (rows, cols) = ndvi.shape();
    let nodata = ndvi.nodata();
    let t = *thresholds;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let v = unsafe { ndvi.get_unchecked(row, col) };
                if v.is_nan() || matches!(nodata, Some(nd) if v == nd) {
                    continue;
                }
                *out = band_heat(v, &t);
            }
            row_data
        })
        .collect();

    let mut output = ndvi.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Heat value for a single NDVI reading
pub fn band_heat(ndvi: f64, thresholds: &NdviThresholds) -> f64 {
    if ndvi < thresholds.bare {
        BAND_HEAT[0]
    } else if ndvi < thresholds.sparse {
        BAND_HEAT[1]
    } else if ndvi < thresholds.moderate {
        BAND_HEAT[2]
    } else {
        BAND_HEAT[3]
    }
}
