//! Pipeline configuration
//!
//! One immutable `PlannerConfig` is built per run and passed explicitly
//! into every stage. Changing a weight means a new config and a full
//! rescoring pass; there is no hidden global state.

use crate::crs::Crs;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Buffer distances for the exclusion-zone builder, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferDistances {
    pub buildings: f64,
    pub roads: f64,
    pub fire_access: f64,
    /// Safety margin added to each tree's crown radius
    pub tree_safety_margin: f64,
    /// Minimum per-tree buffer, also the fallback for missing crown data
    pub tree_minimum: f64,
}

impl Default for BufferDistances {
    fn default() -> Self {
        Self {
            buildings: 3.0,
            roads: 2.5,
            fire_access: 5.0,
            tree_safety_margin: 2.0,
            tree_minimum: 6.0,
        }
    }
}

/// Weights combining the four candidate sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub heat: f64,
    pub spatial: f64,
    pub social: f64,
    pub maintenance: f64,
}

impl ScoreWeights {
    /// Weighted combination of the four sub-scores
    pub fn combine(&self, heat: f64, spatial: f64, social: f64, maintenance: f64) -> f64 {
        heat * self.heat + spatial * self.spatial + social * self.social
            + maintenance * self.maintenance
    }

    fn sum(&self) -> f64 {
        self.heat + self.spatial + self.social + self.maintenance
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            heat: 0.40,
            spatial: 0.30,
            social: 0.20,
            maintenance: 0.10,
        }
    }
}

/// NDVI band edges for the discrete heat classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NdviThresholds {
    /// Below this: bare/hot surface (heat 100)
    pub bare: f64,
    /// Below this: sparse vegetation (heat 70)
    pub sparse: f64,
    /// Below this: moderate vegetation (heat 40); above: dense (heat 10)
    pub moderate: f64,
}

impl Default for NdviThresholds {
    fn default() -> Self {
        Self {
            bare: 0.2,
            sparse: 0.4,
            moderate: 0.6,
        }
    }
}

/// Weights for the continuous multi-factor heat raster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatFactorWeights {
    pub building_density: f64,
    pub sealed_surfaces: f64,
    pub vegetation_deficit: f64,
    pub canyon_effect: f64,
}

impl HeatFactorWeights {
    fn sum(&self) -> f64 {
        self.building_density + self.sealed_surfaces + self.vegetation_deficit
            + self.canyon_effect
    }
}

impl Default for HeatFactorWeights {
    fn default() -> Self {
        Self {
            building_density: 0.40,
            sealed_surfaces: 0.30,
            vegetation_deficit: 0.20,
            canyon_effect: 0.10,
        }
    }
}

/// Which heat raster feeds the scorer in a canonical run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeatSource {
    /// Discrete NDVI-banded raster ({100, 70, 40, 10})
    #[default]
    NdviBanded,
    /// Continuous multi-factor raster ([0, 100])
    MultiFactor,
}

/// Immutable configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub crs: Crs,
    pub buffers: BufferDistances,
    pub weights: ScoreWeights,
    pub ndvi: NdviThresholds,
    pub heat_factors: HeatFactorWeights,
    pub heat_source: HeatSource,
    /// Candidate lattice spacing in meters
    pub grid_spacing: f64,
    /// Segments approximating circular buffers
    pub buffer_segments: usize,
    /// Moving-window diameter for density factors, in meters
    pub focal_window: f64,
    /// Meters per building floor
    pub floor_height: f64,
    /// Assumed floors when the register has none
    pub default_floors: u16,
    /// How many top-ranked candidates exports keep by default
    pub top_n: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            crs: Crs::working(),
            buffers: BufferDistances::default(),
            weights: ScoreWeights::default(),
            ndvi: NdviThresholds::default(),
            heat_factors: HeatFactorWeights::default(),
            heat_source: HeatSource::default(),
            grid_spacing: 10.0,
            buffer_segments: 16,
            focal_window: 60.0,
            floor_height: 3.0,
            default_floors: 2,
            top_n: 100,
        }
    }
}

impl PlannerConfig {
    /// Check internal consistency (weight sums, positive distances)
    pub fn validate(&self) -> Result<()> {
        if (self.weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::InvalidConfig(format!(
                "score weights must sum to 1.0, got {}",
                self.weights.sum()
            )));
        }
        if (self.heat_factors.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::InvalidConfig(format!(
                "heat factor weights must sum to 1.0, got {}",
                self.heat_factors.sum()
            )));
        }
        if self.grid_spacing <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "grid spacing must be positive, got {}",
                self.grid_spacing
            )));
        }
        if self.ndvi.bare >= self.ndvi.sparse || self.ndvi.sparse >= self.ndvi.moderate {
            return Err(Error::InvalidConfig(
                "NDVI thresholds must be strictly increasing".into(),
            ));
        }
        if self.crs.is_geographic() {
            return Err(Error::InvalidConfig(format!(
                "working CRS must be projected (meters), got {}",
                self.crs
            )));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON for run snapshots
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
