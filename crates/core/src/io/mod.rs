//! I/O for persisted pipeline artifacts
//!
//! Every artifact is a complete snapshot: vector layers and candidate
//! collections as GeoJSON, rasters as single-band GeoTIFF, the final
//! ranking additionally as a flat CSV table.

mod geotiff;
mod table;
mod vector;

pub use geotiff::{read_geotiff, write_geotiff};
pub use table::write_candidate_table;
pub use vector::{
    read_area, read_buildings, read_candidates, read_fire_routes, read_land_use, read_trees,
    write_area, write_candidates,
};
