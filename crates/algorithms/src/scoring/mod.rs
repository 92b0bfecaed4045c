//! Candidate scoring
//!
//! Four sub-scores per candidate, each on a 0-100 scale, combined with
//! configurable weights into the final score:
//!
//! - heat: heat raster sampled at the point, neutral 50 when the
//!   raster is missing or the point falls outside it
//! - spatial: building distance, tree distance and available space
//! - social: proximity to residential and education/recreation zones
//! - maintenance: road access plus the maintained-green-space base
//!
//! Missing optional layers degrade to documented defaults; scoring
//! itself never fails on absent data. Ranking is a stable descending
//! sort, so equal scores keep grid order.

pub mod index;

use crate::scoring::index::{PointIndex, PolygonIndex};
use crate::union::is_valid_polygon;
use canopy_core::config::PlannerConfig;
use canopy_core::vector::{Building, BuildingKind, Candidate, LandUseZone, ScoreSet, TreeRecord};
use canopy_core::{Raster, Result};
use geo::{Point, Polygon};
use rayon::prelude::*;
use tracing::{info, warn};

/// Neutral heat score when no raster value is available
pub const DEFAULT_HEAT: f64 = 50.0;
/// Residential proximity radius in meters
pub const RESIDENTIAL_RADIUS: f64 = 100.0;
/// Education/recreation proximity radius in meters
pub const EDUCATION_RADIUS: f64 = 150.0;

/// Input layers for one scoring run. Optional layers fall back to the
/// documented neutral defaults.
#[derive(Default)]
pub struct ScoringLayers<'a> {
    pub heat: Option<&'a Raster<f64>>,
    pub buildings: Option<&'a [Building]>,
    pub trees: Option<&'a [TreeRecord]>,
    /// Drives road access, residential and education proximity
    pub land_use: Option<&'a [LandUseZone]>,
    /// Green-space polygons for the available-space sub-score
    pub green_spaces: Option<&'a [Polygon<f64>]>,
}

// Residential and education indexes exist only when the land-use layer
// does; an empty class within a present layer scores 0, a missing
// layer scores the flat default.
struct SocialIndex {
    residential: PolygonIndex,
    education: PolygonIndex,
}

/// Prebuilt spatial indexes for one scoring run
pub struct Scorer<'a> {
    heat: Option<&'a Raster<f64>>,
    buildings: Option<PolygonIndex>,
    trees: Option<PointIndex>,
    roads: Option<PolygonIndex>,
    social: Option<SocialIndex>,
    green_spaces: Option<PolygonIndex>,
    config: &'a PlannerConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(layers: &ScoringLayers<'a>, config: &'a PlannerConfig) -> Self {
        let buildings = layers.buildings.map(|buildings| {
            PolygonIndex::build(
                buildings
                    .iter()
                    .filter(|b| b.kind == BuildingKind::Building)
                    .filter(|b| is_valid_polygon(&b.footprint))
                    .map(|b| b.footprint.clone())
                    .collect(),
            )
        });

        let trees = layers
            .trees
            .map(|trees| PointIndex::build(&trees.iter().map(|t| t.location).collect::<Vec<_>>()));

        let roads = layers.land_use.map(|land_use| {
            PolygonIndex::build(class_polygons(land_use, |c| c.is_road()))
        });

        let social = layers.land_use.map(|land_use| SocialIndex {
            residential: PolygonIndex::build(class_polygons(land_use, |c| {
                matches!(c, canopy_core::vector::LandUseClass::Residential)
            })),
            education: PolygonIndex::build(class_polygons(land_use, |c| {
                c.is_education_or_recreation()
            })),
        });

        let green_spaces = layers
            .green_spaces
            .map(|polygons| PolygonIndex::build(polygons.to_vec()));

        if layers.heat.is_none() {
            warn!("no heat raster, heat sub-score defaults to {DEFAULT_HEAT}");
        }
        if layers.land_use.is_none() {
            warn!("no land-use layer, social sub-score defaults to 50");
        }

        Self {
            heat: layers.heat,
            buildings,
            trees,
            roads,
            social,
            green_spaces,
            config,
        }
    }

    /// Score every candidate and assign 1-based ranks by descending
    /// final score. The returned list is sorted by rank.
    pub fn score_candidates(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        let total = candidates.len();

        let mut scored: Vec<Candidate> = candidates
            .into_par_iter()
            .map(|mut candidate| {
                candidate.scores = Some(self.score_point(&candidate.location));
                candidate.rank = None;
                candidate
            })
            .collect();

        // Stable sort keeps grid order for equal scores
        scored.sort_by(|a, b| {
            let fa = a.scores.map(|s| s.final_score).unwrap_or(f64::NEG_INFINITY);
            let fb = b.scores.map(|s| s.final_score).unwrap_or(f64::NEG_INFINITY);
            fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
        });
        for (i, candidate) in scored.iter_mut().enumerate() {
            candidate.rank = Some(i as u32 + 1);
        }

        info!(
            candidates = total,
            top = scored.first().and_then(|c| c.final_score()).unwrap_or(f64::NAN),
            "candidates scored and ranked"
        );
        Ok(scored)
    }

    /// All four sub-scores and their weighted combination for a point
    pub fn score_point(&self, point: &Point<f64>) -> ScoreSet {
        let heat = self.heat_score(point);
        let spatial = self.spatial_score(point);
        let social = self.social_score(point);
        let maintenance = self.maintenance_score(point);

        ScoreSet {
            heat,
            spatial,
            social,
            maintenance,
            final_score: self.config.weights.combine(heat, spatial, social, maintenance),
        }
    }

    /// Heat raster sample, neutral 50 for missing raster, out-of-bounds
    /// points or nodata cells
    pub fn heat_score(&self, point: &Point<f64>) -> f64 {
        let Some(raster) = self.heat else {
            return DEFAULT_HEAT;
        };
        match raster.sample(point.x(), point.y()) {
            Some(v) if !v.is_nan() => v,
            _ => DEFAULT_HEAT,
        }
    }

    /// Building distance, tree distance and available space, each worth
    /// up to 10 points, normalized to 0-100
    pub fn spatial_score(&self, point: &Point<f64>) -> f64 {
        let building = match self.buildings.as_ref().and_then(|idx| idx.nearest_distance(point)) {
            Some(d) => building_distance_points(d),
            None => 7.0,
        };

        let tree = match self.trees.as_ref().and_then(|idx| idx.nearest_distance(point)) {
            Some(d) => {
                if d > 10.0 {
                    10.0
                } else {
                    5.0
                }
            }
            None => 8.0,
        };

        let space = match self
            .green_spaces
            .as_ref()
            .and_then(|idx| idx.containing_area(point))
        {
            Some(area) => available_space_points(area),
            None => 7.0,
        };

        (building + tree + space) / 30.0 * 100.0
    }

    /// Residential and education proximity plus the public-access base,
    /// normalized to 0-100. Flat 50 without a land-use layer.
    pub fn social_score(&self, point: &Point<f64>) -> f64 {
        let Some(social) = self.social.as_ref() else {
            return 50.0;
        };

        let mut points = 6.0;
        if social.residential.within_distance(point, RESIDENTIAL_RADIUS) {
            points += 7.0;
        }
        if social.education.within_distance(point, EDUCATION_RADIUS) {
            points += 7.0;
        }
        points / 20.0 * 100.0
    }

    /// Road access distance plus the maintained-green-space base,
    /// normalized to 0-100
    pub fn maintenance_score(&self, point: &Point<f64>) -> f64 {
        let road = match self.roads.as_ref().and_then(|idx| idx.nearest_distance(point)) {
            Some(d) => road_distance_points(d),
            None => 7.0,
        };
        (road + 5.0) / 15.0 * 100.0
    }
}

fn class_polygons(
    land_use: &[LandUseZone],
    predicate: impl Fn(&canopy_core::vector::LandUseClass) -> bool,
) -> Vec<Polygon<f64>> {
    land_use
        .iter()
        .filter(|zone| predicate(&zone.class) && is_valid_polygon(&zone.boundary))
        .map(|zone| zone.boundary.clone())
        .collect()
}

// 3-8m is the optimal shading band; beyond 15m a tree no longer
// shades the facade
fn building_distance_points(distance: f64) -> f64 {
    if (3.0..=8.0).contains(&distance) {
        10.0
    } else if distance > 15.0 {
        5.0
    } else {
        7.0
    }
}

fn available_space_points(area: f64) -> f64 {
    if area > 25.0 {
        10.0
    } else if area >= 10.0 {
        7.0
    } else {
        4.0
    }
}

fn road_distance_points(distance: f64) -> f64 {
    if distance < 5.0 {
        10.0
    } else if distance < 10.0 {
        7.0
    } else {
        3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use canopy_core::vector::LandUseClass;
    use canopy_core::GeoTransform;
    use geo_types::polygon;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size), (x: x0, y: y0)
        ]
    }

    fn heat_raster(fill: f64) -> Raster<f64> {
        // 10x10 cells of 10m covering [0,100] x [0,100]
        let mut r = Raster::filled(10, 10, fill);
        r.set_transform(GeoTransform::new(0.0, 100.0, 10.0, -10.0));
        r
    }

    #[test]
    fn test_heat_score_samples_raster() {
        let config = PlannerConfig::default();
        let heat = heat_raster(80.0);
        let scorer = Scorer::new(
            &ScoringLayers {
                heat: Some(&heat),
                ..ScoringLayers::default()
            },
            &config,
        );

        assert_relative_eq!(scorer.heat_score(&Point::new(50.0, 50.0)), 80.0);
        // Outside the raster footprint: neutral default
        assert_relative_eq!(scorer.heat_score(&Point::new(500.0, 50.0)), DEFAULT_HEAT);
    }

    #[test]
    fn test_heat_score_without_raster_is_neutral() {
        let config = PlannerConfig::default();
        let scorer = Scorer::new(&ScoringLayers::default(), &config);
        assert_relative_eq!(scorer.heat_score(&Point::new(0.0, 0.0)), DEFAULT_HEAT);
    }

    #[test]
    fn test_spatial_bands() {
        assert_relative_eq!(building_distance_points(5.0), 10.0);
        assert_relative_eq!(building_distance_points(3.0), 10.0);
        assert_relative_eq!(building_distance_points(8.0), 10.0);
        assert_relative_eq!(building_distance_points(1.0), 7.0);
        assert_relative_eq!(building_distance_points(12.0), 7.0);
        assert_relative_eq!(building_distance_points(20.0), 5.0);

        assert_relative_eq!(available_space_points(30.0), 10.0);
        assert_relative_eq!(available_space_points(25.0), 7.0);
        assert_relative_eq!(available_space_points(10.0), 7.0);
        assert_relative_eq!(available_space_points(5.0), 4.0);

        assert_relative_eq!(road_distance_points(2.0), 10.0);
        assert_relative_eq!(road_distance_points(5.0), 7.0);
        assert_relative_eq!(road_distance_points(10.0), 3.0);
    }

    #[test]
    fn test_perfect_spatial_score() {
        // Building at 5m, tree at 12m, large green space: 10+10+10 = 100
        let config = PlannerConfig::default();
        let buildings = vec![Building {
            footprint: square(15.0, 5.0, 10.0),
            kind: BuildingKind::Building,
            floors: None,
        }];
        let trees = vec![TreeRecord {
            location: Point::new(10.0, 22.0),
            crown_diameter: None,
            species: None,
        }];
        let greens = vec![square(0.0, 0.0, 20.0)];

        let scorer = Scorer::new(
            &ScoringLayers {
                buildings: Some(&buildings),
                trees: Some(&trees),
                green_spaces: Some(&greens),
                ..ScoringLayers::default()
            },
            &config,
        );

        assert_relative_eq!(scorer.spatial_score(&Point::new(10.0, 10.0)), 100.0);
    }

    #[test]
    fn test_spatial_defaults_without_layers() {
        let config = PlannerConfig::default();
        let scorer = Scorer::new(&ScoringLayers::default(), &config);

        // (7 + 8 + 7) / 30 * 100
        assert_relative_eq!(
            scorer.spatial_score(&Point::new(0.0, 0.0)),
            22.0 / 30.0 * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_social_score_proximity() {
        let config = PlannerConfig::default();
        let land_use = vec![
            LandUseZone {
                boundary: square(0.0, 0.0, 10.0),
                class: LandUseClass::Residential,
            },
            LandUseZone {
                boundary: square(500.0, 0.0, 10.0),
                class: LandUseClass::SpecialFunction,
            },
        ];

        let scorer = Scorer::new(
            &ScoringLayers {
                land_use: Some(&land_use),
                ..ScoringLayers::default()
            },
            &config,
        );

        // Near residential only: (7 + 6) / 20 * 100 = 65
        assert_relative_eq!(scorer.social_score(&Point::new(50.0, 5.0)), 65.0);
        // Near neither: 6 / 20 * 100 = 30
        assert_relative_eq!(scorer.social_score(&Point::new(250.0, 5.0)), 30.0);
        // Near the education zone only: also 65
        assert_relative_eq!(scorer.social_score(&Point::new(450.0, 5.0)), 65.0);
    }

    #[test]
    fn test_social_flat_without_land_use() {
        let config = PlannerConfig::default();
        let scorer = Scorer::new(&ScoringLayers::default(), &config);
        assert_relative_eq!(scorer.social_score(&Point::new(0.0, 0.0)), 50.0);
    }

    #[test]
    fn test_maintenance_score() {
        let config = PlannerConfig::default();
        let land_use = vec![LandUseZone {
            boundary: square(0.0, 0.0, 10.0),
            class: LandUseClass::RoadTraffic,
        }];

        let scorer = Scorer::new(
            &ScoringLayers {
                land_use: Some(&land_use),
                ..ScoringLayers::default()
            },
            &config,
        );

        // 2m from the road: (10 + 5) / 15 * 100 = 100
        assert_relative_eq!(scorer.maintenance_score(&Point::new(12.0, 5.0)), 100.0);
        // 20m away: (3 + 5) / 15 * 100
        assert_relative_eq!(
            scorer.maintenance_score(&Point::new(30.0, 5.0)),
            8.0 / 15.0 * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_final_score_is_weighted_combination() {
        let config = PlannerConfig::default();
        let heat = heat_raster(100.0);
        let scorer = Scorer::new(
            &ScoringLayers {
                heat: Some(&heat),
                ..ScoringLayers::default()
            },
            &config,
        );

        let scores = scorer.score_point(&Point::new(50.0, 50.0));
        let expected = scores.heat * 0.4
            + scores.spatial * 0.3
            + scores.social * 0.2
            + scores.maintenance * 0.1;
        assert_relative_eq!(scores.final_score, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_ranking_descending_and_stable() {
        let config = PlannerConfig::default();
        // Heat gradient: hotter in the north half
        let mut heat = heat_raster(20.0);
        for row in 0..5 {
            for col in 0..10 {
                heat.set(row, col, 90.0).unwrap();
            }
        }

        let scorer = Scorer::new(
            &ScoringLayers {
                heat: Some(&heat),
                ..ScoringLayers::default()
            },
            &config,
        );

        let candidates = vec![
            Candidate::new(Point::new(15.0, 15.0)), // cool
            Candidate::new(Point::new(15.0, 85.0)), // hot
            Candidate::new(Point::new(25.0, 15.0)), // cool, later in grid order
        ];

        let scored = scorer.score_candidates(candidates).unwrap();

        assert_eq!(scored[0].location, Point::new(15.0, 85.0));
        assert_eq!(scored[0].rank, Some(1));
        // Tied scores keep input order
        assert_eq!(scored[1].location, Point::new(15.0, 15.0));
        assert_eq!(scored[2].location, Point::new(25.0, 15.0));
        assert_eq!(scored[2].rank, Some(3));
    }

    #[test]
    fn test_all_candidates_scored() {
        let config = PlannerConfig::default();
        let scorer = Scorer::new(&ScoringLayers::default(), &config);

        let candidates: Vec<Candidate> = (0..50)
            .map(|i| Candidate::new(Point::new(i as f64, 0.0)))
            .collect();

        let scored = scorer.score_candidates(candidates).unwrap();
        assert_eq!(scored.len(), 50);
        assert!(scored.iter().all(|c| c.scores.is_some() && c.rank.is_some()));

        // Ranks are a permutation of 1..=50
        let mut ranks: Vec<u32> = scored.iter().filter_map(|c| c.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=50).collect::<Vec<u32>>());
    }
}
