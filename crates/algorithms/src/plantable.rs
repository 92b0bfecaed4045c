//! Plantable-area extraction
//!
//! The plantable area is the union of public green-space zones minus
//! the combined exclusion zone. An empty result is valid output, not an
//! error: a fully built-up district simply has nowhere to plant.

use crate::union::{is_valid_polygon, union_all};
use canopy_core::vector::LandUseZone;
use geo::{Area, BooleanOps, MultiPolygon};
use tracing::{debug, info, warn};

/// Derive the plantable area from land use and the exclusion zone.
///
/// Only green-space classes participate; invalid zone polygons are
/// skipped per feature.
pub fn extract_plantable_area(
    land_use: &[LandUseZone],
    exclusion: &MultiPolygon<f64>,
) -> MultiPolygon<f64> {
    let mut skipped = 0usize;
    let green: Vec<MultiPolygon<f64>> = land_use
        .iter()
        .filter(|zone| zone.class.is_green_space())
        .filter_map(|zone| {
            if is_valid_polygon(&zone.boundary) {
                Some(MultiPolygon(vec![zone.boundary.clone()]))
            } else {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, "invalid green-space polygons skipped");
    }
    if green.is_empty() {
        warn!("no green-space zones in land use, plantable area is empty");
        return MultiPolygon(vec![]);
    }

    let green_union = union_all(green);
    debug!(
        green_m2 = green_union.unsigned_area(),
        "green space dissolved"
    );

    let plantable = if exclusion.0.is_empty() {
        green_union
    } else {
        green_union.difference(exclusion)
    };

    if plantable.0.is_empty() {
        warn!("exclusion zone covers all green space, plantable area is empty");
    } else {
        info!(
            parts = plantable.0.len(),
            area_m2 = plantable.unsigned_area(),
            "plantable area extracted"
        );
    }
    plantable
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use canopy_core::vector::LandUseClass;
    use geo::{Contains, Point};
    use geo_types::polygon;

    fn zone(class: LandUseClass, x0: f64, y0: f64, size: f64) -> LandUseZone {
        LandUseZone {
            boundary: polygon![
                (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
                (x: x0, y: y0 + size), (x: x0, y: y0)
            ],
            class,
        }
    }

    #[test]
    fn test_only_green_space_participates() {
        let land_use = vec![
            zone(LandUseClass::Recreation, 0.0, 0.0, 10.0),
            zone(LandUseClass::Residential, 20.0, 0.0, 10.0),
            zone(LandUseClass::RoadTraffic, 40.0, 0.0, 10.0),
        ];

        let plantable = extract_plantable_area(&land_use, &MultiPolygon(vec![]));
        assert_relative_eq!(plantable.unsigned_area(), 100.0, epsilon = 1e-9);
        assert!(plantable.contains(&Point::new(5.0, 5.0)));
        assert!(!plantable.contains(&Point::new(25.0, 5.0)));
    }

    #[test]
    fn test_exclusion_subtracted() {
        let land_use = vec![zone(LandUseClass::Greenery, 0.0, 0.0, 10.0)];
        let exclusion = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 5.0, y: 10.0),
            (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)
        ]]);

        let plantable = extract_plantable_area(&land_use, &exclusion);
        assert_relative_eq!(plantable.unsigned_area(), 50.0, epsilon = 1e-6);
        assert!(plantable.contains(&Point::new(7.5, 5.0)));
        assert!(!plantable.contains(&Point::new(2.5, 5.0)));
    }

    #[test]
    fn test_fully_excluded_is_empty_not_error() {
        let land_use = vec![zone(LandUseClass::Forest, 0.0, 0.0, 10.0)];
        let exclusion = MultiPolygon(vec![polygon![
            (x: -5.0, y: -5.0), (x: 15.0, y: -5.0), (x: 15.0, y: 15.0),
            (x: -5.0, y: 15.0), (x: -5.0, y: -5.0)
        ]]);

        let plantable = extract_plantable_area(&land_use, &exclusion);
        assert!(plantable.0.is_empty());
    }

    #[test]
    fn test_no_green_space_is_empty() {
        let land_use = vec![zone(LandUseClass::Plaza, 0.0, 0.0, 10.0)];
        let plantable = extract_plantable_area(&land_use, &MultiPolygon(vec![]));
        assert!(plantable.0.is_empty());
    }
}
