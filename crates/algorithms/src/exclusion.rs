//! Exclusion-zone builder
//!
//! Buffers and unions every "no-plant" feature category into one
//! combined forbidden geometry:
//!
//! - buildings (actual-building subtype only), fixed buffer
//! - roads and fire-access routes, fixed buffers
//! - existing trees, per-tree dynamic buffer from crown diameter
//! - water bodies, hard exclusion with no buffer
//!
//! Missing categories are logged and skipped; invalid individual
//! geometries are skipped without aborting the batch.

use crate::buffer::{buffer_geometry, buffer_point, buffer_polygon, BufferParams};
use crate::union::{is_valid_polygon, union_all};
use canopy_core::config::{BufferDistances, PlannerConfig};
use canopy_core::vector::{Building, BuildingKind, FireRoute, LandUseZone, TreeRecord};
use canopy_core::Result;
use geo::MultiPolygon;
use tracing::{debug, info, warn};

/// Input layers for the exclusion builder. `None` means the layer is
/// unavailable for this run.
#[derive(Debug, Default)]
pub struct ExclusionInputs<'a> {
    pub buildings: Option<&'a [Building]>,
    /// Source of both road and water categories
    pub land_use: Option<&'a [LandUseZone]>,
    pub fire_routes: Option<&'a [FireRoute]>,
    pub trees: Option<&'a [TreeRecord]>,
}

/// Per-tree buffer radius: crown radius plus safety margin, floored at
/// the configured minimum. Missing or unusable crown data falls back to
/// the floor.
pub fn tree_buffer_distance(tree: &TreeRecord, buffers: &BufferDistances) -> f64 {
    match tree.crown_diameter {
        Some(d) if d.is_finite() && d > 0.0 => {
            (d / 2.0 + buffers.tree_safety_margin).max(buffers.tree_minimum)
        }
        _ => buffers.tree_minimum,
    }
}

/// Build the combined exclusion zone from all available categories.
///
/// The union is commutative, so category order is irrelevant. An empty
/// result (no layers present) is valid.
pub fn build_exclusion_zone(
    inputs: &ExclusionInputs<'_>,
    config: &PlannerConfig,
) -> Result<MultiPolygon<f64>> {
    let mut categories: Vec<MultiPolygon<f64>> = Vec::new();

    match inputs.buildings {
        Some(buildings) => categories.push(building_exclusion(buildings, config)),
        None => warn!("buildings layer missing, skipping category"),
    }

    match inputs.land_use {
        Some(land_use) => {
            categories.push(road_exclusion(land_use, config));
            categories.push(water_exclusion(land_use));
        }
        None => warn!("land-use layer missing, skipping road and water categories"),
    }

    match inputs.fire_routes {
        Some(routes) => categories.push(fire_route_exclusion(routes, config)),
        None => warn!("fire-route layer missing, skipping category"),
    }

    match inputs.trees {
        Some(trees) => categories.push(tree_exclusion(trees, config)),
        None => warn!("tree register missing, skipping category"),
    }

    let combined = union_all(categories);
    info!(parts = combined.0.len(), "combined exclusion zone built");
    Ok(combined)
}

/// Buffered union of actual buildings (ancillary structures excluded)
pub fn building_exclusion(buildings: &[Building], config: &PlannerConfig) -> MultiPolygon<f64> {
    let params = BufferParams {
        distance: config.buffers.buildings,
        segments: config.buffer_segments,
    };

    let mut skipped = 0usize;
    let parts: Vec<MultiPolygon<f64>> = buildings
        .iter()
        .filter(|b| b.kind == BuildingKind::Building)
        .filter_map(|b| {
            if is_valid_polygon(&b.footprint) {
                Some(buffer_polygon(&b.footprint, &params))
            } else {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, "invalid building footprints skipped");
    }
    debug!(buffered = parts.len(), buffer_m = params.distance, "buildings buffered");
    union_all(parts)
}

/// Buffered union of road-surface land use
pub fn road_exclusion(land_use: &[LandUseZone], config: &PlannerConfig) -> MultiPolygon<f64> {
    let params = BufferParams {
        distance: config.buffers.roads,
        segments: config.buffer_segments,
    };

    let parts: Vec<MultiPolygon<f64>> = land_use
        .iter()
        .filter(|zone| zone.class.is_road() && is_valid_polygon(&zone.boundary))
        .map(|zone| buffer_polygon(&zone.boundary, &params))
        .collect();

    debug!(buffered = parts.len(), buffer_m = params.distance, "roads buffered");
    union_all(parts)
}

/// Buffered union of fire-access routes (polygons or lines)
pub fn fire_route_exclusion(routes: &[FireRoute], config: &PlannerConfig) -> MultiPolygon<f64> {
    let params = BufferParams {
        distance: config.buffers.fire_access,
        segments: config.buffer_segments,
    };

    let parts: Vec<MultiPolygon<f64>> = routes
        .iter()
        .map(|route| buffer_geometry(&route.geometry, &params))
        .collect();

    debug!(buffered = parts.len(), buffer_m = params.distance, "fire routes buffered");
    union_all(parts)
}

/// Per-tree dynamic buffers from crown diameter
pub fn tree_exclusion(trees: &[TreeRecord], config: &PlannerConfig) -> MultiPolygon<f64> {
    let parts: Vec<MultiPolygon<f64>> = trees
        .iter()
        .map(|tree| {
            let params = BufferParams {
                distance: tree_buffer_distance(tree, &config.buffers),
                segments: config.buffer_segments,
            };
            MultiPolygon(vec![buffer_point(&tree.location, &params)])
        })
        .collect();

    debug!(buffered = parts.len(), "trees buffered");
    union_all(parts)
}

/// Water bodies enter the exclusion zone unbuffered
pub fn water_exclusion(land_use: &[LandUseZone]) -> MultiPolygon<f64> {
    let parts: Vec<MultiPolygon<f64>> = land_use
        .iter()
        .filter(|zone| zone.class.is_water() && is_valid_polygon(&zone.boundary))
        .map(|zone| MultiPolygon(vec![zone.boundary.clone()]))
        .collect();

    debug!(count = parts.len(), "water bodies collected");
    union_all(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use canopy_core::vector::LandUseClass;
    use geo::{Area, Contains, Point};
    use geo_types::polygon;

    fn config() -> PlannerConfig {
        PlannerConfig::default()
    }

    fn tree(crown: Option<f64>) -> TreeRecord {
        TreeRecord {
            location: Point::new(0.0, 0.0),
            crown_diameter: crown,
            species: None,
        }
    }

    #[test]
    fn test_tree_buffer_from_crown() {
        let buffers = BufferDistances::default();

        // 8m crown: 4 + 2 = 6m
        assert_relative_eq!(tree_buffer_distance(&tree(Some(8.0)), &buffers), 6.0);
        // 2m crown: 1 + 2 = 3m, floored to 6m
        assert_relative_eq!(tree_buffer_distance(&tree(Some(2.0)), &buffers), 6.0);
        // 12m crown: 6 + 2 = 8m
        assert_relative_eq!(tree_buffer_distance(&tree(Some(12.0)), &buffers), 8.0);
        // Missing crown data uses the floor
        assert_relative_eq!(tree_buffer_distance(&tree(None), &buffers), 6.0);
        assert_relative_eq!(tree_buffer_distance(&tree(Some(f64::NAN)), &buffers), 6.0);
    }

    #[test]
    fn test_building_filter_excludes_ancillary() {
        let square = polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)
        ];
        let buildings = vec![
            Building {
                footprint: square.clone(),
                kind: BuildingKind::Building,
                floors: None,
            },
            Building {
                footprint: polygon![
                    (x: 100.0, y: 100.0), (x: 110.0, y: 100.0), (x: 110.0, y: 110.0),
                    (x: 100.0, y: 110.0), (x: 100.0, y: 100.0)
                ],
                kind: BuildingKind::Ancillary,
                floors: None,
            },
        ];

        let zone = building_exclusion(&buildings, &config());
        assert!(zone.contains(&Point::new(5.0, 5.0)));
        // Ancillary structure does not exclude
        assert!(!zone.contains(&Point::new(105.0, 105.0)));
        // 3m buffer reaches past the footprint
        assert!(zone.contains(&Point::new(12.0, 5.0)));
    }

    #[test]
    fn test_invalid_building_skipped_not_fatal() {
        let broken = Building {
            footprint: polygon![
                (x: 0.0, y: 0.0), (x: f64::NAN, y: 1.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)
            ],
            kind: BuildingKind::Building,
            floors: None,
        };

        let zone = building_exclusion(&[broken], &config());
        assert!(zone.0.is_empty());
    }

    #[test]
    fn test_missing_categories_are_not_fatal() {
        let zone = build_exclusion_zone(&ExclusionInputs::default(), &config()).unwrap();
        assert!(zone.0.is_empty());
    }

    #[test]
    fn test_water_is_unbuffered() {
        let pond = polygon![
            (x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 20.0),
            (x: 0.0, y: 20.0), (x: 0.0, y: 0.0)
        ];
        let land_use = vec![LandUseZone {
            boundary: pond,
            class: LandUseClass::Water,
        }];

        let zone = water_exclusion(&land_use);
        assert_relative_eq!(zone.unsigned_area(), 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_exclusion_monotone_in_buffer_distance() {
        let square = polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)
        ];
        let buildings = vec![Building {
            footprint: square,
            kind: BuildingKind::Building,
            floors: None,
        }];

        let mut narrow_cfg = config();
        narrow_cfg.buffers.buildings = 1.0;
        let mut wide_cfg = config();
        wide_cfg.buffers.buildings = 5.0;

        let narrow = building_exclusion(&buildings, &narrow_cfg);
        let wide = building_exclusion(&buildings, &wide_cfg);
        assert!(wide.unsigned_area() > narrow.unsigned_area());
    }
}
