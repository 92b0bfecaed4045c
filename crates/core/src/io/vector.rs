//! GeoJSON layer loaders and artifact writers
//!
//! Maps GeoJSON feature properties onto the fixed record schema in
//! [`crate::vector`]. Property keys:
//!
//! - buildings: `kind` ("building" / "ancillary", default "building"),
//!   `floors` (integer, optional)
//! - land use: `land_use_type` (see [`crate::vector::LandUseClass`];
//!   unknown values become `other`)
//! - trees: `crown_diameter` (meters, optional), `species` (optional)
//! - candidates: the five score fields plus `rank`
//!
//! Input layers are expected pre-projected to the working CRS.

use crate::error::{Error, Result};
use crate::vector::{
    Building, BuildingKind, Candidate, FireRoute, LandUseClass, LandUseZone, ScoreSet, TreeRecord,
};
use geo_types::{Geometry, MultiPolygon, Point, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use std::path::Path;
use tracing::warn;

fn read_feature_collection(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let gj: GeoJson = text.parse()?;
    FeatureCollection::try_from(gj).map_err(Error::from)
}

fn feature_geometry(feature: &Feature) -> Result<Geometry<f64>> {
    let geom = feature
        .geometry
        .as_ref()
        .ok_or_else(|| Error::GeoJson("feature without geometry".into()))?;
    Geometry::try_from(geom.value.clone()).map_err(Error::from)
}

fn f64_property(feature: &Feature, key: &str) -> Option<f64> {
    feature.property(key).and_then(JsonValue::as_f64)
}

fn str_property<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature.property(key).and_then(JsonValue::as_str)
}

/// Flatten a geometry into its polygon parts, skipping everything else
fn polygons_of(geometry: Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p],
        Geometry::MultiPolygon(mp) => mp.0,
        _ => Vec::new(),
    }
}

/// Read building footprints
pub fn read_buildings(path: impl AsRef<Path>) -> Result<Vec<Building>> {
    let fc = read_feature_collection(path)?;
    let mut buildings = Vec::with_capacity(fc.features.len());

    for feature in &fc.features {
        let kind = match str_property(feature, "kind") {
            Some("ancillary") => BuildingKind::Ancillary,
            _ => BuildingKind::Building,
        };
        let floors = f64_property(feature, "floors").and_then(|f| {
            if f.is_finite() && (0.0..=f64::from(u16::MAX)).contains(&f) {
                Some(f as u16)
            } else {
                warn!(floors = f, "building floor count out of range, using the default");
                None
            }
        });

        for footprint in polygons_of(feature_geometry(feature)?) {
            buildings.push(Building {
                footprint,
                kind,
                floors,
            });
        }
    }

    Ok(buildings)
}

/// Read land-use zones; unknown categories map to `Other`
pub fn read_land_use(path: impl AsRef<Path>) -> Result<Vec<LandUseZone>> {
    let fc = read_feature_collection(path)?;
    let mut zones = Vec::with_capacity(fc.features.len());

    for feature in &fc.features {
        let class: LandUseClass = str_property(feature, "land_use_type")
            .unwrap_or("other")
            .parse()
            .unwrap_or(LandUseClass::Other);

        for boundary in polygons_of(feature_geometry(feature)?) {
            zones.push(LandUseZone { boundary, class });
        }
    }

    Ok(zones)
}

/// Read the municipal tree register (point features)
pub fn read_trees(path: impl AsRef<Path>) -> Result<Vec<TreeRecord>> {
    let fc = read_feature_collection(path)?;
    let mut trees = Vec::with_capacity(fc.features.len());

    for feature in &fc.features {
        let location = match feature_geometry(feature)? {
            Geometry::Point(p) => p,
            other => {
                warn!("skipping non-point tree feature: {:?}", kind_name(&other));
                continue;
            }
        };

        trees.push(TreeRecord {
            location,
            crown_diameter: f64_property(feature, "crown_diameter"),
            species: str_property(feature, "species").map(str::to_owned),
        });
    }

    Ok(trees)
}

/// Read fire-brigade access routes (polygons or lines)
pub fn read_fire_routes(path: impl AsRef<Path>) -> Result<Vec<FireRoute>> {
    let fc = read_feature_collection(path)?;
    fc.features
        .iter()
        .map(|feature| Ok(FireRoute { geometry: feature_geometry(feature)? }))
        .collect()
}

/// Read a persisted area artifact (exclusion zone, plantable area)
pub fn read_area(path: impl AsRef<Path>) -> Result<MultiPolygon<f64>> {
    let fc = read_feature_collection(path)?;
    let mut parts = Vec::new();
    for feature in &fc.features {
        parts.extend(polygons_of(feature_geometry(feature)?));
    }
    Ok(MultiPolygon(parts))
}

/// Write an area artifact as a single-feature GeoJSON snapshot
pub fn write_area(path: impl AsRef<Path>, area: &MultiPolygon<f64>) -> Result<()> {
    let feature = Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(area))),
        id: None,
        properties: None,
        foreign_members: None,
    };
    write_collection(path, vec![feature])
}

/// Write scored candidates with all score fields and ranks
pub fn write_candidates(path: impl AsRef<Path>, candidates: &[Candidate]) -> Result<()> {
    let features = candidates
        .iter()
        .map(|candidate| {
            let mut properties = JsonObject::new();
            if let Some(scores) = candidate.scores {
                properties.insert("heat_score".into(), scores.heat.into());
                properties.insert("spatial_score".into(), scores.spatial.into());
                properties.insert("social_score".into(), scores.social.into());
                properties.insert("maintenance_score".into(), scores.maintenance.into());
                properties.insert("final_score".into(), scores.final_score.into());
            }
            if let Some(rank) = candidate.rank {
                properties.insert("rank".into(), rank.into());
            }

            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &candidate.location,
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    write_collection(path, features)
}

/// Read a persisted candidate collection back, scores included
pub fn read_candidates(path: impl AsRef<Path>) -> Result<Vec<Candidate>> {
    let fc = read_feature_collection(path)?;
    let mut candidates = Vec::with_capacity(fc.features.len());

    for feature in &fc.features {
        let location: Point<f64> = match feature_geometry(feature)? {
            Geometry::Point(p) => p,
            other => {
                return Err(Error::GeoJson(format!(
                    "candidate must be a point, got {}",
                    kind_name(&other)
                )))
            }
        };

        let scores = match (
            f64_property(feature, "heat_score"),
            f64_property(feature, "spatial_score"),
            f64_property(feature, "social_score"),
            f64_property(feature, "maintenance_score"),
            f64_property(feature, "final_score"),
        ) {
            (Some(heat), Some(spatial), Some(social), Some(maintenance), Some(final_score)) => {
                Some(ScoreSet {
                    heat,
                    spatial,
                    social,
                    maintenance,
                    final_score,
                })
            }
            _ => None,
        };

        candidates.push(Candidate {
            location,
            scores,
            rank: f64_property(feature, "rank").map(|r| r as u32),
        });
    }

    Ok(candidates)
}

fn write_collection(path: impl AsRef<Path>, features: Vec<Feature>) -> Result<()> {
    let fc = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    std::fs::write(path.as_ref(), GeoJson::from(fc).to_string())?;
    Ok(())
}

fn kind_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
