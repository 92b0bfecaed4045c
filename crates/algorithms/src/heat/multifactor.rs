//! Multi-factor heat model
//!
//! Continuous heat raster fusing four urban-climate factors on a
//! shared reference grid:
//!
//! - building density (focal mean of a footprint burn, max-normalized)
//! - surface sealing (sealed land-use indicator, scaled to 100)
//! - vegetation deficit (the banded NDVI raster, resampled)
//! - urban canyon effect (building-height burn, focal mean, normalized)
//!
//! Factors are weighted, summed and clipped to [0, 100]. All four
//! must live on the same grid as the reference; shape or transform
//! mismatches are fatal. Resampling happens before fusion, never
//! silently inside it.

use crate::heat::focal::{focal_mean, radius_pixels};
use crate::heat::mask::{burn_indicator, burn_values};
use crate::heat::ndvi::check_dimensions;
use crate::heat::resample::resample_bilinear;
use crate::union::is_valid_polygon;
use canopy_core::config::PlannerConfig;
use canopy_core::vector::{Building, LandUseZone};
use canopy_core::{Error, Raster, Result};
use tracing::{debug, info};

/// The four factor rasters, all co-gridded with the reference
#[derive(Debug, Clone)]
pub struct HeatFactors {
    pub building_density: Raster<f64>,
    pub sealed_surfaces: Raster<f64>,
    pub vegetation_deficit: Raster<f64>,
    pub canyon_effect: Raster<f64>,
}

impl HeatFactors {
    /// Weighted fusion into a single [0, 100] heat raster. All four
    /// factors must share the building-density grid exactly, shape and
    /// transform both.
    pub fn combine(&self, config: &PlannerConfig) -> Result<Raster<f64>> {
        for (name, factor) in [
            ("sealed surface", &self.sealed_surfaces),
            ("vegetation deficit", &self.vegetation_deficit),
            ("canyon effect", &self.canyon_effect),
        ] {
            check_dimensions(&self.building_density, factor)?;
            check_alignment(name, &self.building_density, factor)?;
        }

        let w = config.heat_factors;
        let (rows, cols) = self.building_density.shape();

        let mut output = self.building_density.with_same_meta::<f64>(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let combined = valid(unsafe { self.building_density.get_unchecked(row, col) })
                    * w.building_density
                    + valid(unsafe { self.sealed_surfaces.get_unchecked(row, col) })
                        * w.sealed_surfaces
                    + valid(unsafe { self.vegetation_deficit.get_unchecked(row, col) })
                        * w.vegetation_deficit
                    + valid(unsafe { self.canyon_effect.get_unchecked(row, col) })
                        * w.canyon_effect;
                output.set(row, col, combined.clamp(0.0, 100.0))?;
            }
        }

        info!(
            rows,
            cols,
            mean = output.statistics().map(|s| s.mean).unwrap_or(f64::NAN),
            "multi-factor heat raster combined"
        );
        Ok(output)
    }
}

// Equal shape is not enough for a cell-by-cell fusion; a factor on a
// shifted or rescaled grid must be resampled first.
fn check_alignment(name: &str, reference: &Raster<f64>, factor: &Raster<f64>) -> Result<()> {
    if factor.transform() != reference.transform() {
        return Err(Error::Stage(format!(
            "{name} factor is not on the reference grid ({:?} vs {:?})",
            factor.transform(),
            reference.transform()
        )));
    }
    if let (Some(a), Some(b)) = (reference.crs(), factor.crs()) {
        if !a.is_equivalent(b) {
            return Err(Error::CrsMismatch(a.to_string(), b.to_string()));
        }
    }
    Ok(())
}

// Missing factor data contributes no heat
fn valid(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// Building-density factor: footprint indicator, focal mean over the
/// configured window, normalized so the densest cell reads 100.
pub fn building_density_factor(
    buildings: &[Building],
    reference: &Raster<f64>,
    config: &PlannerConfig,
) -> Result<Raster<f64>> {
    let footprints: Vec<_> = buildings
        .iter()
        .filter(|b| is_valid_polygon(&b.footprint))
        .map(|b| b.footprint.clone())
        .collect();

    let burned = burn_indicator(&footprints, reference)?;
    let radius = radius_pixels(config.focal_window, reference.cell_size());
    let mut density = focal_mean(&burned, radius)?;
    normalize_to_100(&mut density);

    debug!(buildings = footprints.len(), radius_px = radius, "building density factor");
    Ok(density)
}

/// Surface-sealing factor: sealed land-use cells read 100, all others 0
pub fn sealed_surface_factor(
    land_use: &[LandUseZone],
    reference: &Raster<f64>,
) -> Result<Raster<f64>> {
    let sealed: Vec<_> = land_use
        .iter()
        .filter(|zone| zone.class.is_sealed() && is_valid_polygon(&zone.boundary))
        .map(|zone| zone.boundary.clone())
        .collect();

    let mut raster = burn_indicator(&sealed, reference)?;
    for v in raster.data_mut().iter_mut() {
        *v *= 100.0;
    }

    debug!(zones = sealed.len(), "sealed surface factor");
    Ok(raster)
}

/// Vegetation-deficit factor: the banded NDVI heat raster brought onto
/// the reference grid
pub fn vegetation_deficit_factor(
    banded_heat: &Raster<f64>,
    reference: &Raster<f64>,
) -> Result<Raster<f64>> {
    if banded_heat.shape() == reference.shape()
        && banded_heat.transform() == reference.transform()
    {
        return Ok(banded_heat.clone());
    }
    resample_bilinear(banded_heat, reference)
}

/// Canyon-effect factor: approximate building heights burned onto the
/// grid, focal-averaged and max-normalized.
pub fn canyon_effect_factor(
    buildings: &[Building],
    reference: &Raster<f64>,
    config: &PlannerConfig,
) -> Result<Raster<f64>> {
    let shapes: Vec<_> = buildings
        .iter()
        .filter(|b| is_valid_polygon(&b.footprint))
        .map(|b| {
            (
                b.footprint.clone(),
                b.approximate_height(config.floor_height, config.default_floors),
            )
        })
        .collect();

    let burned = burn_values(&shapes, reference)?;
    let radius = radius_pixels(config.focal_window, reference.cell_size());
    let mut canyon = focal_mean(&burned, radius)?;
    normalize_to_100(&mut canyon);

    debug!(buildings = shapes.len(), "canyon effect factor");
    Ok(canyon)
}

/// Build all four factors and fuse them in one call
pub fn build_multifactor_heat(
    buildings: &[Building],
    land_use: &[LandUseZone],
    banded_heat: &Raster<f64>,
    reference: &Raster<f64>,
    config: &PlannerConfig,
) -> Result<Raster<f64>> {
    let factors = HeatFactors {
        building_density: building_density_factor(buildings, reference, config)?,
        sealed_surfaces: sealed_surface_factor(land_use, reference)?,
        vegetation_deficit: vegetation_deficit_factor(banded_heat, reference)?,
        canyon_effect: canyon_effect_factor(buildings, reference, config)?,
    };
    factors.combine(config)
}

// Scale so the maximum valid cell reads 100; an all-zero raster stays
// all zero
fn normalize_to_100(raster: &mut Raster<f64>) {
    if let Some(max) = raster.valid_max() {
        if max > 0.0 {
            for v in raster.data_mut().iter_mut() {
                if v.is_finite() {
                    *v = *v / max * 100.0;
                }
            }
        }
    }
}
