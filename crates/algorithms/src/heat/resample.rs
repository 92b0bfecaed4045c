//! Bilinear resampling onto a reference grid
//!
//! Brings a raster onto another raster's exact grid (transform and
//! dimensions) so factor fusion can assume co-gridded inputs. Source
//! cells outside the target footprint come out NaN.

use canopy_core::{Error, Raster, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// Resample `source` onto the grid of `reference` with bilinear
/// interpolation between the four surrounding cell centers.
pub fn resample_bilinear(source: &Raster<f64>, reference: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = reference.shape();
    let (src_rows, src_cols) = source.shape();
    if src_rows == 0 || src_cols == 0 {
        return Err(Error::InvalidDimensions {
            width: src_cols,
            height: src_rows,
        });
    }

    let ref_transform = *reference.transform();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = ref_transform.pixel_to_geo(col, row);
                *out = sample_bilinear(source, x, y);
            }
            row_data
        })
        .collect();

    let mut output = reference.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Bilinear sample at a map position, in cell-center space.
///
/// Positions beyond the outermost cell centers clamp to the edge, so
/// only positions fully outside the raster produce NaN.
fn sample_bilinear(raster: &Raster<f64>, x: f64, y: f64) -> f64 {
    let (rows, cols) = raster.shape();
    let (col_f, row_f) = raster.geo_to_pixel(x, y);

    // Shift into cell-center coordinates
    let cf = col_f - 0.5;
    let rf = row_f - 0.5;

    if cf < -0.5 || rf < -0.5 || cf > cols as f64 - 0.5 || rf > rows as f64 - 0.5 {
        return f64::NAN;
    }

    let c0 = cf.floor().clamp(0.0, (cols - 1) as f64) as usize;
    let r0 = rf.floor().clamp(0.0, (rows - 1) as f64) as usize;
    let c1 = (c0 + 1).min(cols - 1);
    let r1 = (r0 + 1).min(rows - 1);

    let tx = (cf - c0 as f64).clamp(0.0, 1.0);
    let ty = (rf - r0 as f64).clamp(0.0, 1.0);

    let v00 = unsafe { raster.get_unchecked(r0, c0) };
    let v01 = unsafe { raster.get_unchecked(r0, c1) };
    let v10 = unsafe { raster.get_unchecked(r1, c0) };
    let v11 = unsafe { raster.get_unchecked(r1, c1) };

    let top = v00 * (1.0 - tx) + v01 * tx;
    let bottom = v10 * (1.0 - tx) + v11 * tx;
    top * (1.0 - ty) + bottom * ty
}
