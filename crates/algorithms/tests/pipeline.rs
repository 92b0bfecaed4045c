//! End-to-end pipeline test on a synthetic district
//!
//! One green square with a building, a road, an existing tree and a
//! fire route, driven through exclusion, plantable extraction, grid
//! generation, heat classification, scoring and rescoring.

use approx::assert_relative_eq;
use canopy_algorithms::exclusion::{build_exclusion_zone, ExclusionInputs};
use canopy_algorithms::grid::generate_candidates;
use canopy_algorithms::heat::{classify_ndvi, ndvi};
use canopy_algorithms::plantable::extract_plantable_area;
use canopy_algorithms::rescore::{rescale_heat_scores, rescore, top_n};
use canopy_algorithms::scoring::{Scorer, ScoringLayers};
use canopy_core::config::PlannerConfig;
use canopy_core::vector::{Building, BuildingKind, FireRoute, LandUseClass, LandUseZone, TreeRecord};
use canopy_core::{GeoTransform, Raster};
use geo::{Geometry, Intersects, LineString, Point};
use geo_types::polygon;

fn green_square(size: f64) -> LandUseZone {
    LandUseZone {
        boundary: polygon![
            (x: 0.0, y: 0.0), (x: size, y: 0.0), (x: size, y: size),
            (x: 0.0, y: size), (x: 0.0, y: 0.0)
        ],
        class: LandUseClass::Recreation,
    }
}

/// Constant heat raster over [0, 100] x [0, 100] with 10m cells
fn heat_raster(fill: f64) -> Raster<f64> {
    let mut r = Raster::filled(10, 10, fill);
    r.set_transform(GeoTransform::new(0.0, 100.0, 10.0, -10.0));
    r
}

#[test]
fn empty_exclusion_keeps_full_grid() {
    let config = PlannerConfig::default();
    let land_use = vec![green_square(100.0)];

    let exclusion = build_exclusion_zone(&ExclusionInputs::default(), &config).unwrap();
    assert!(exclusion.0.is_empty());

    let plantable = extract_plantable_area(&land_use, &exclusion);
    let candidates = generate_candidates(&plantable, config.grid_spacing).unwrap();

    // 100m square at 10m spacing, boundary points included
    assert_eq!(candidates.len(), 121);
}

#[test]
fn exclusion_and_plantable_are_disjoint() {
    let config = PlannerConfig::default();
    let land_use = vec![
        green_square(100.0),
        LandUseZone {
            boundary: polygon![
                (x: 40.0, y: -10.0), (x: 60.0, y: -10.0), (x: 60.0, y: 0.0),
                (x: 40.0, y: 0.0), (x: 40.0, y: -10.0)
            ],
            class: LandUseClass::RoadTraffic,
        },
    ];
    let buildings = vec![Building {
        footprint: polygon![
            (x: 20.0, y: 20.0), (x: 40.0, y: 20.0), (x: 40.0, y: 40.0),
            (x: 20.0, y: 40.0), (x: 20.0, y: 20.0)
        ],
        kind: BuildingKind::Building,
        floors: Some(3),
    }];
    let trees = vec![TreeRecord {
        location: Point::new(80.0, 80.0),
        crown_diameter: Some(8.0),
        species: Some("Tilia cordata".into()),
    }];
    let fire_routes = vec![FireRoute {
        geometry: Geometry::LineString(LineString::from(vec![(0.0, 60.0), (100.0, 60.0)])),
    }];

    let inputs = ExclusionInputs {
        buildings: Some(&buildings),
        land_use: Some(&land_use),
        fire_routes: Some(&fire_routes),
        trees: Some(&trees),
    };
    let exclusion = build_exclusion_zone(&inputs, &config).unwrap();
    let plantable = extract_plantable_area(&land_use, &exclusion);

    // Building interior, its 3m margin, the tree and the fire corridor
    // are all gone
    assert!(!plantable.intersects(&Point::new(30.0, 30.0)));
    assert!(!plantable.intersects(&Point::new(41.0, 30.0)));
    assert!(!plantable.intersects(&Point::new(80.0, 80.0)));
    assert!(!plantable.intersects(&Point::new(50.0, 61.0)));
    // Far corner survives
    assert!(plantable.intersects(&Point::new(5.0, 95.0)));

    // Every candidate stays inside the plantable area and outside the
    // exclusion interior
    let candidates = generate_candidates(&plantable, config.grid_spacing).unwrap();
    assert!(!candidates.is_empty());
    for candidate in &candidates {
        assert!(plantable.intersects(&candidate.location));
    }
}

#[test]
fn tree_buffer_floor_respected_through_pipeline() {
    let config = PlannerConfig::default();
    let land_use = vec![green_square(100.0)];
    // Tiny crown still produces the 6m minimum buffer
    let trees = vec![TreeRecord {
        location: Point::new(50.0, 50.0),
        crown_diameter: Some(1.0),
        species: None,
    }];

    let inputs = ExclusionInputs {
        trees: Some(&trees),
        ..ExclusionInputs::default()
    };
    let exclusion = build_exclusion_zone(&inputs, &config).unwrap();
    let plantable = extract_plantable_area(&land_use, &exclusion);

    assert!(!plantable.intersects(&Point::new(50.0, 55.0)));
    assert!(plantable.intersects(&Point::new(50.0, 57.0)));
}

#[test]
fn ndvi_to_banded_heat_to_scores() {
    let config = PlannerConfig::default();

    // West half barren, east half green
    let mut nir = Raster::filled(10, 10, 0.8);
    let mut red = Raster::filled(10, 10, 0.1);
    for row in 0..10 {
        for col in 0..5 {
            nir.set(row, col, 0.3).unwrap();
            red.set(row, col, 0.3).unwrap();
        }
    }
    let transform = GeoTransform::new(0.0, 100.0, 10.0, -10.0);
    nir.set_transform(transform);
    red.set_transform(transform);

    let index = ndvi(&nir, &red).unwrap();
    let banded = classify_ndvi(&index, &config.ndvi).unwrap();

    // West: NDVI 0 -> heat 100; east: NDVI ~0.78 -> heat 10
    assert_relative_eq!(banded.get(5, 2).unwrap(), 100.0);
    assert_relative_eq!(banded.get(5, 7).unwrap(), 10.0);

    let land_use = vec![green_square(100.0)];
    let plantable = extract_plantable_area(&land_use, &geo::MultiPolygon(vec![]));
    let candidates = generate_candidates(&plantable, config.grid_spacing).unwrap();

    let scorer = Scorer::new(
        &ScoringLayers {
            heat: Some(&banded),
            land_use: Some(&land_use),
            ..ScoringLayers::default()
        },
        &config,
    );
    let scored = scorer.score_candidates(candidates).unwrap();

    // Every candidate is fully scored with all fields in range
    for candidate in &scored {
        let scores = candidate.scores.unwrap();
        for v in [
            scores.heat,
            scores.spatial,
            scores.social,
            scores.maintenance,
            scores.final_score,
        ] {
            assert!((0.0..=100.0).contains(&v), "score out of range: {v}");
        }
        assert_relative_eq!(
            scores.final_score,
            config.weights.combine(
                scores.heat,
                scores.spatial,
                scores.social,
                scores.maintenance
            ),
            epsilon = 1e-12
        );
    }

    // Ranks are the permutation 1..=N in descending score order
    let mut ranks: Vec<u32> = scored.iter().filter_map(|c| c.rank).collect();
    assert!(scored
        .windows(2)
        .all(|w| w[0].final_score() >= w[1].final_score()));
    ranks.sort_unstable();
    assert_eq!(ranks, (1..=scored.len() as u32).collect::<Vec<_>>());

    // Barren side must outrank the green side
    let best = &scored[0];
    assert!(best.location.x() < 50.0);
    assert_relative_eq!(best.scores.unwrap().heat, 100.0);
}

#[test]
fn rescore_swaps_heat_and_preserves_the_rest() {
    let config = PlannerConfig::default();
    let land_use = vec![green_square(100.0)];
    let plantable = extract_plantable_area(&land_use, &geo::MultiPolygon(vec![]));
    let candidates = generate_candidates(&plantable, config.grid_spacing).unwrap();

    let initial_heat = heat_raster(30.0);
    let scorer = Scorer::new(
        &ScoringLayers {
            heat: Some(&initial_heat),
            land_use: Some(&land_use),
            ..ScoringLayers::default()
        },
        &config,
    );
    let mut scored = scorer.score_candidates(candidates).unwrap();
    let before: Vec<_> = scored
        .iter()
        .map(|c| (c.location, c.scores.unwrap()))
        .collect();

    let improved_heat = heat_raster(75.0);
    rescore(&mut scored, &improved_heat, &config.weights).unwrap();

    for candidate in &scored {
        let scores = candidate.scores.unwrap();
        let (_, old) = before
            .iter()
            .find(|(loc, _)| *loc == candidate.location)
            .unwrap();

        assert_relative_eq!(scores.heat, 75.0);
        assert_relative_eq!(scores.spatial, old.spatial);
        assert_relative_eq!(scores.social, old.social);
        assert_relative_eq!(scores.maintenance, old.maintenance);
    }

    // Second pass with the same raster changes nothing
    let snapshot: Vec<_> = scored
        .iter()
        .map(|c| (c.location, c.scores.unwrap().final_score, c.rank))
        .collect();
    rescore(&mut scored, &improved_heat, &config.weights).unwrap();
    let again: Vec<_> = scored
        .iter()
        .map(|c| (c.location, c.scores.unwrap().final_score, c.rank))
        .collect();
    assert_eq!(snapshot, again);
}

#[test]
fn rescale_then_top_n_export() {
    let config = PlannerConfig::default();
    let land_use = vec![green_square(100.0)];
    let plantable = extract_plantable_area(&land_use, &geo::MultiPolygon(vec![]));
    let candidates = generate_candidates(&plantable, config.grid_spacing).unwrap();

    // Linear west-east heat gradient
    let mut heat = heat_raster(0.0);
    for row in 0..10 {
        for col in 0..10 {
            heat.set(row, col, 20.0 + col as f64 * 5.0).unwrap();
        }
    }

    let scorer = Scorer::new(
        &ScoringLayers {
            heat: Some(&heat),
            land_use: Some(&land_use),
            ..ScoringLayers::default()
        },
        &config,
    );
    let mut scored = scorer.score_candidates(candidates).unwrap();

    rescale_heat_scores(&mut scored, &config.weights).unwrap();

    let heats: Vec<f64> = scored.iter().map(|c| c.scores.unwrap().heat).collect();
    let min = heats.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = heats.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert_relative_eq!(min, 0.0);
    assert_relative_eq!(max, 100.0);

    let top = top_n(&scored, 10);
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].rank, Some(1));
    assert!(top
        .windows(2)
        .all(|w| w[0].final_score() >= w[1].final_score()));
}
