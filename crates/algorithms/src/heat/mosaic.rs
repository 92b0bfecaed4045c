//! Raster tile mosaicking
//!
//! Merges aligned tiles of one imagery campaign into a single raster
//! covering their union extent. Tiles must share cell size and grid
//! alignment; where tiles overlap, the later tile wins.

use canopy_core::{Error, GeoTransform, Raster, Result};
use tracing::{info, warn};

const ALIGN_TOLERANCE: f64 = 1e-6;

/// Mosaic aligned tiles into one raster. NaN cells in a tile do not
/// overwrite data already placed by an earlier tile.
pub fn mosaic(tiles: &[Raster<f64>]) -> Result<Raster<f64>> {
    let mut iter = tiles.iter().filter(|t| !t.is_empty());
    let Some(first) = iter.next() else {
        return Err(Error::Stage("mosaic requires at least one non-empty tile".into()));
    };

    let cell_w = first.transform().pixel_width;
    let cell_h = first.transform().pixel_height;
    let crs = first.crs().copied();

    // Union extent and alignment check
    let (mut min_x, mut min_y, mut max_x, mut max_y) = first.bounds();
    for tile in tiles.iter().filter(|t| !t.is_empty()) {
        check_aligned(first.transform(), tile.transform())?;
        if let (Some(a), Some(b)) = (tile.crs(), crs.as_ref()) {
            if !a.is_equivalent(b) {
                return Err(Error::CrsMismatch(a.to_string(), b.to_string()));
            }
        }
        let (x0, y0, x1, y1) = tile.bounds();
        min_x = min_x.min(x0);
        min_y = min_y.min(y0);
        max_x = max_x.max(x1);
        max_y = max_y.max(y1);
    }

    let cols = ((max_x - min_x) / cell_w.abs()).round() as usize;
    let rows = ((max_y - min_y) / cell_h.abs()).round() as usize;

    let mut output = Raster::filled(rows, cols, f64::NAN);
    output.set_transform(GeoTransform::new(min_x, max_y, cell_w, cell_h));
    output.set_crs(crs);
    output.set_nodata(Some(f64::NAN));

    let mut placed = 0usize;
    for tile in tiles.iter() {
        if tile.is_empty() {
            warn!("skipping empty mosaic tile");
            continue;
        }
        let (tile_rows, tile_cols) = tile.shape();
        let (corner_x, corner_y) = tile.transform().pixel_to_geo_corner(0, 0);
        let (col_f, row_f) = output.transform().geo_to_pixel(corner_x, corner_y);
        let col_off = col_f.round() as usize;
        let row_off = row_f.round() as usize;

        for row in 0..tile_rows {
            for col in 0..tile_cols {
                let v = unsafe { tile.get_unchecked(row, col) };
                if v.is_nan() {
                    continue;
                }
                output.set(row_off + row, col_off + col, v)?;
            }
        }
        placed += 1;
    }

    info!(tiles = placed, rows, cols, "tiles mosaicked");
    Ok(output)
}

fn check_aligned(a: &GeoTransform, b: &GeoTransform) -> Result<()> {
    if (a.pixel_width - b.pixel_width).abs() > ALIGN_TOLERANCE
        || (a.pixel_height - b.pixel_height).abs() > ALIGN_TOLERANCE
    {
        return Err(Error::Stage(format!(
            "mosaic tiles disagree on cell size: ({}, {}) vs ({}, {})",
            a.pixel_width, a.pixel_height, b.pixel_width, b.pixel_height
        )));
    }

    let dx = (b.origin_x - a.origin_x) / a.pixel_width;
    let dy = (b.origin_y - a.origin_y) / a.pixel_height;
    if (dx - dx.round()).abs() > ALIGN_TOLERANCE || (dy - dy.round()).abs() > ALIGN_TOLERANCE {
        return Err(Error::Stage(
            "mosaic tiles are not grid-aligned, resample before mosaicking".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tile(origin_x: f64, origin_y: f64, fill: f64) -> Raster<f64> {
        let mut t = Raster::filled(2, 2, fill);
        t.set_transform(GeoTransform::new(origin_x, origin_y, 10.0, -10.0));
        t
    }

    #[test]
    fn test_mosaic_side_by_side() {
        let left = tile(0.0, 20.0, 1.0);
        let right = tile(20.0, 20.0, 2.0);

        let merged = mosaic(&[left, right]).unwrap();
        assert_eq!(merged.shape(), (2, 4));
        assert_relative_eq!(merged.get(0, 0).unwrap(), 1.0);
        assert_relative_eq!(merged.get(0, 3).unwrap(), 2.0);
    }

    #[test]
    fn test_overlap_later_tile_wins() {
        let a = tile(0.0, 20.0, 1.0);
        let b = tile(0.0, 20.0, 2.0);

        let merged = mosaic(&[a, b]).unwrap();
        assert_relative_eq!(merged.get(0, 0).unwrap(), 2.0);
    }

    #[test]
    fn test_nan_does_not_overwrite() {
        let a = tile(0.0, 20.0, 1.0);
        let mut b = tile(0.0, 20.0, 2.0);
        b.set(0, 0, f64::NAN).unwrap();

        let merged = mosaic(&[a, b]).unwrap();
        assert_relative_eq!(merged.get(0, 0).unwrap(), 1.0);
        assert_relative_eq!(merged.get(0, 1).unwrap(), 2.0);
    }

    #[test]
    fn test_gap_stays_nodata() {
        let a = tile(0.0, 20.0, 1.0);
        let b = tile(40.0, 20.0, 2.0);

        let merged = mosaic(&[a, b]).unwrap();
        assert!(merged.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_misaligned_tiles_rejected() {
        let a = tile(0.0, 20.0, 1.0);
        let b = tile(5.0, 20.0, 2.0);
        assert!(mosaic(&[a, b]).is_err());

        let mut c = tile(20.0, 20.0, 2.0);
        c.set_transform(GeoTransform::new(20.0, 20.0, 7.0, -7.0));
        assert!(mosaic(&[tile(0.0, 20.0, 1.0), c]).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(mosaic(&[]).is_err());
    }
}
