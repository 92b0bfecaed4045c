//! # Canopy Algorithms
//!
//! Pipeline stages for the canopy tree-planting analysis:
//!
//! - `exclusion`: buffered no-plant zones from buildings, roads, fire
//!   routes, existing trees and water
//! - `plantable`: green space minus the exclusion zone
//! - `grid`: regular candidate lattice over the plantable area
//! - `heat`: NDVI-banded and multi-factor heat rasters
//! - `scoring`: four-factor candidate scoring and ranking
//! - `rescore`: heat-map swaps and score recalibration
//!
//! Geometry primitives (`buffer`, `union`) underpin the vector stages.

pub mod buffer;
pub mod exclusion;
pub mod grid;
pub mod heat;
pub mod plantable;
pub mod rescore;
pub mod scoring;
pub mod union;

/// Prelude re-exporting the pipeline entry points
pub mod prelude {
    pub use crate::buffer::{buffer_geometry, buffer_point, buffer_polygon, BufferParams};
    pub use crate::exclusion::{build_exclusion_zone, ExclusionInputs};
    pub use crate::grid::generate_candidates;
    pub use crate::heat::{
        build_multifactor_heat, classify_ndvi, mask_to_area, mosaic, ndvi, resample_bilinear,
    };
    pub use crate::plantable::extract_plantable_area;
    pub use crate::rescore::{rescale_heat_scores, rescore, top_n};
    pub use crate::scoring::{Scorer, ScoringLayers};
    pub use crate::union::union_all;
}
