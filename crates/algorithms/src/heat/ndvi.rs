//! Normalized Difference Vegetation Index
//!
//! `NDVI = (NIR - Red) / (NIR + Red)`, clamped to [-1, 1]. Pixels
//! where either band is nodata, or where the band sum is near zero,
//! come out as NaN.

use canopy_core::{Error, Raster, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// Compute NDVI from co-gridded near-infrared and red bands.
///
/// Both rasters must share exact dimensions; the output inherits the
/// NIR band's transform and CRS with NaN as nodata.
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;

    let (rows, cols) = nir.shape();
    let nodata_nir = nir.nodata();
    let nodata_red = red.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };

                if is_invalid(n, nodata_nir) || is_invalid(r, nodata_red) {
                    continue;
                }

                let sum = n + r;
                if sum.abs() < 1e-10 {
                    continue;
                }

                *out = ((n - r) / sum).clamp(-1.0, 1.0);
            }
            row_data
        })
        .collect();

    let mut output = nir.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

fn is_invalid(value: f64, nodata: Option<f64>) -> bool {
    value.is_nan() || matches!(nodata, Some(nd) if value == nd)
}

pub(crate) fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    let (er, ec) = a.shape();
    let (ar, ac) = b.shape();
    if (er, ec) != (ar, ac) {
        return Err(Error::ShapeMismatch { er, ec, ar, ac });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ndvi_values() {
        let nir = Raster::from_vec(vec![0.6, 0.5, 0.1, 0.0], 2, 2).unwrap();
        let red = Raster::from_vec(vec![0.2, 0.5, 0.3, 0.0], 2, 2).unwrap();

        let out = ndvi(&nir, &red).unwrap();

        assert_relative_eq!(out.get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 1).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.get(1, 0).unwrap(), -0.5, epsilon = 1e-12);
        // Zero-sum denominator stays NaN
        assert!(out.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_ndvi_propagates_nodata() {
        let mut nir = Raster::from_vec(vec![0.6, -9999.0], 1, 2).unwrap();
        nir.set_nodata(Some(-9999.0));
        let red = Raster::from_vec(vec![0.2, 0.3], 1, 2).unwrap();

        let out = ndvi(&nir, &red).unwrap();
        assert!(out.get(0, 0).unwrap().is_finite());
        assert!(out.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_ndvi_shape_mismatch() {
        let nir = Raster::<f64>::new(2, 2);
        let red = Raster::<f64>::new(3, 2);
        assert!(matches!(
            ndvi(&nir, &red),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_ndvi_range_clamped() {
        // Sensor noise can push raw values slightly out of range
        let nir = Raster::from_vec(vec![1.0], 1, 1).unwrap();
        let red = Raster::from_vec(vec![-0.0001], 1, 1).unwrap();

        let out = ndvi(&nir, &red).unwrap();
        let v = out.get(0, 0).unwrap();
        assert!((-1.0..=1.0).contains(&v));
    }
}
