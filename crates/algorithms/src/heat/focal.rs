//! Focal mean
//!
//! Square moving-window average used by the density factors of the
//! multi-factor heat model. Window edges clamp at the raster boundary,
//! so border cells average over a smaller neighborhood instead of
//! picking up phantom zeros.

use canopy_core::{Error, Raster, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// Mean over a (2*radius + 1)^2 window centered on each cell.
///
/// NaN cells are excluded from the average; a cell whose whole window
/// is NaN stays NaN.
pub fn focal_mean(raster: &Raster<f64>, radius: usize) -> Result<Raster<f64>> {
    if radius == 0 {
        return Err(Error::InvalidParameter {
            name: "radius",
            value: radius.to_string(),
            reason: "focal window radius must be at least 1 pixel".into(),
        });
    }

    let (rows, cols) = raster.shape();
    let r = radius as isize;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let mut sum = 0.0;
                let mut count = 0usize;

                for dr in -r..=r {
                    for dc in -r..=r {
                        let nr = row as isize + dr;
                        let nc = col as isize + dc;
                        if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                            continue;
                        }
                        let v = unsafe { raster.get_unchecked(nr as usize, nc as usize) };
                        if !v.is_nan() {
                            sum += v;
                            count += 1;
                        }
                    }
                }

                if count > 0 {
                    *out = sum / count as f64;
                }
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Window radius in pixels for a window diameter given in meters,
/// at the raster's cell size. Always at least 1.
pub fn radius_pixels(window_meters: f64, cell_size: f64) -> usize {
    if cell_size <= 0.0 {
        return 1;
    }
    ((window_meters / cell_size / 2.0).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_focal_mean_uniform_field() {
        let raster = Raster::from_vec(vec![5.0; 25], 5, 5).unwrap();
        let out = focal_mean(&raster, 1).unwrap();
        for v in out.data().iter() {
            assert_relative_eq!(*v, 5.0);
        }
    }

    #[test]
    fn test_focal_mean_spreads_single_spike() {
        let mut raster = Raster::new(5, 5);
        raster.set(2, 2, 9.0).unwrap();

        let out = focal_mean(&raster, 1).unwrap();
        assert_relative_eq!(out.get(2, 2).unwrap(), 1.0);
        assert_relative_eq!(out.get(1, 1).unwrap(), 1.0);
        // Outside the window
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_focal_mean_edge_clamps_window() {
        let raster = Raster::from_vec(vec![4.0; 9], 3, 3).unwrap();
        let out = focal_mean(&raster, 1).unwrap();
        // Corner averages over 4 cells, all valid, same value
        assert_relative_eq!(out.get(0, 0).unwrap(), 4.0);
    }

    #[test]
    fn test_focal_mean_skips_nan() {
        let raster = Raster::from_vec(
            vec![2.0, f64::NAN, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0],
            3,
            3,
        )
        .unwrap();
        let out = focal_mean(&raster, 1).unwrap();
        assert_relative_eq!(out.get(1, 1).unwrap(), 2.0);
    }

    #[test]
    fn test_radius_from_window_meters() {
        // 60m window at 20m cells: 1.5 rounds to 2 pixels
        assert_eq!(radius_pixels(60.0, 20.0), 2);
        assert_eq!(radius_pixels(60.0, 10.0), 3);
        assert_eq!(radius_pixels(5.0, 20.0), 1);
    }

    #[test]
    fn test_zero_radius_rejected() {
        let raster = Raster::<f64>::new(3, 3);
        assert!(focal_mean(&raster, 0).is_err());
    }
}
