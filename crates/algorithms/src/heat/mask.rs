//! Polygon rasterization and area masking
//!
//! Pixel-center sampling: a cell belongs to a polygon when its center
//! point does. Burns are used for the indicator and height factors of
//! the multi-factor heat model; masking clips a finished raster to the
//! analysis boundary.

use canopy_core::{Error, Raster, Result};
use geo::{Intersects, MultiPolygon, Point, Polygon};
use ndarray::Array2;
use rayon::prelude::*;

/// Burn 1.0 into every cell whose center falls inside any polygon,
/// 0.0 elsewhere. Output shares the reference raster's grid.
pub fn burn_indicator(
    polygons: &[Polygon<f64>],
    reference: &Raster<f64>,
) -> Result<Raster<f64>> {
    burn_values(
        &polygons.iter().map(|p| (p.clone(), 1.0)).collect::<Vec<_>>(),
        reference,
    )
}

/// Burn per-polygon values onto the reference grid. Later polygons
/// overwrite earlier ones where they overlap; untouched cells stay 0.
pub fn burn_values(
    shapes: &[(Polygon<f64>, f64)],
    reference: &Raster<f64>,
) -> Result<Raster<f64>> {
    let (rows, cols) = reference.shape();
    let transform = *reference.transform();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = transform.pixel_to_geo(col, row);
                let center = Point::new(x, y);
                for (polygon, value) in shapes {
                    if polygon.intersects(&center) {
                        *out = *value;
                    }
                }
            }
            row_data
        })
        .collect();

    let mut output = reference.with_same_meta::<f64>(rows, cols);
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Zero out every cell whose center falls outside the boundary and
/// mark 0 as the nodata value.
pub fn mask_to_area(raster: &Raster<f64>, boundary: &MultiPolygon<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();
    let transform = *raster.transform();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = transform.pixel_to_geo(col, row);
                if boundary.intersects(&Point::new(x, y)) {
                    *out = unsafe { raster.get_unchecked(row, col) };
                }
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(0.0));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
