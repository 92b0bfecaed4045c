//! Typed vector feature records
//!
//! Every input layer maps onto a fixed, explicit schema instead of an
//! open attribute bag: optional columns are enumerated here and their
//! fallback behavior is documented at the consuming stage.
//!
//! All geometries are expected in the single projected working CRS;
//! reprojection happens outside the core pipeline.

use geo_types::{Geometry, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Building subtype from the cadastral register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildingKind {
    /// An actual building; participates in exclusion buffering
    Building,
    /// Towers, storage and other ancillary structures
    Ancillary,
}

/// Building footprint with cadastral attributes
#[derive(Debug, Clone)]
pub struct Building {
    pub footprint: Polygon<f64>,
    pub kind: BuildingKind,
    /// Number of floors, if recorded
    pub floors: Option<u16>,
}

impl Building {
    /// Approximate height in meters from the floor count.
    ///
    /// Falls back to `default_floors` when the register has no value.
    pub fn approximate_height(&self, floor_height: f64, default_floors: u16) -> f64 {
        f64::from(self.floors.unwrap_or(default_floors)) * floor_height
    }
}

/// An existing tree from the municipal tree register
#[derive(Debug, Clone)]
pub struct TreeRecord {
    pub location: Point<f64>,
    /// Crown diameter in meters, if surveyed
    pub crown_diameter: Option<f64>,
    pub species: Option<String>,
}

/// Land-use category of a cadastral zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LandUseClass {
    Residential,
    RoadTraffic,
    Path,
    Plaza,
    MixedUseSealed,
    /// Sports, leisure and recreation areas
    Recreation,
    /// Areas of special functional use (schools, public institutions)
    SpecialFunction,
    /// Groves and small woody vegetation
    Greenery,
    Forest,
    Water,
    Other,
}

impl LandUseClass {
    /// Plantable public green space
    pub fn is_green_space(&self) -> bool {
        matches!(self, Self::Recreation | Self::Greenery | Self::Forest)
    }

    /// Impervious surface contributing to heat storage
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::RoadTraffic | Self::Plaza | Self::MixedUseSealed)
    }

    /// Road surface (exclusion buffering and maintenance access)
    pub fn is_road(&self) -> bool {
        matches!(self, Self::RoadTraffic | Self::Path)
    }

    /// Education or recreation use, relevant for the social sub-score
    pub fn is_education_or_recreation(&self) -> bool {
        matches!(self, Self::Recreation | Self::SpecialFunction)
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Self::Water)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::RoadTraffic => "road-traffic",
            Self::Path => "path",
            Self::Plaza => "plaza",
            Self::MixedUseSealed => "mixed-use-sealed",
            Self::Recreation => "recreation",
            Self::SpecialFunction => "special-function",
            Self::Greenery => "greenery",
            Self::Forest => "forest",
            Self::Water => "water",
            Self::Other => "other",
        }
    }
}

impl FromStr for LandUseClass {
    type Err = std::convert::Infallible;

    /// Unknown categories map to `Other`, never an error
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "residential" => Self::Residential,
            "road-traffic" => Self::RoadTraffic,
            "path" => Self::Path,
            "plaza" => Self::Plaza,
            "mixed-use-sealed" => Self::MixedUseSealed,
            "recreation" => Self::Recreation,
            "special-function" => Self::SpecialFunction,
            "greenery" => Self::Greenery,
            "forest" => Self::Forest,
            "water" => Self::Water,
            _ => Self::Other,
        })
    }
}

/// A cadastral land-use zone
#[derive(Debug, Clone)]
pub struct LandUseZone {
    pub boundary: Polygon<f64>,
    pub class: LandUseClass,
}

/// Fire-brigade access area or route (polygons or lines)
#[derive(Debug, Clone)]
pub struct FireRoute {
    pub geometry: Geometry<f64>,
}

/// The four sub-scores and their weighted combination, all in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub heat: f64,
    pub spatial: f64,
    pub social: f64,
    pub maintenance: f64,
    pub final_score: f64,
}

/// A grid-generated planting candidate inside the plantable area.
///
/// Scores and rank are filled by the scorer in one pass; rescoring
/// replaces them wholesale.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub location: Point<f64>,
    pub scores: Option<ScoreSet>,
    /// 1-based rank by descending final score
    pub rank: Option<u32>,
}

impl Candidate {
    pub fn new(location: Point<f64>) -> Self {
        Self {
            location,
            scores: None,
            rank: None,
        }
    }

    /// Final score, if the candidate has been scored
    pub fn final_score(&self) -> Option<f64> {
        self.scores.map(|s| s.final_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    #[test]
    fn test_land_use_parsing() {
        let class: LandUseClass = "residential".parse().unwrap();
        assert_eq!(class, LandUseClass::Residential);

        let unknown: LandUseClass = "vineyard".parse().unwrap();
        assert_eq!(unknown, LandUseClass::Other);
    }

    #[test]
    fn test_land_use_groups() {
        assert!(LandUseClass::Forest.is_green_space());
        assert!(LandUseClass::Plaza.is_sealed());
        assert!(LandUseClass::Path.is_road());
        assert!(LandUseClass::SpecialFunction.is_education_or_recreation());
        assert!(!LandUseClass::Residential.is_green_space());
    }

    #[test]
    fn test_building_height_fallback() {
        let poly = geo_types::polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)
        ];

        let with_floors = Building {
            footprint: poly.clone(),
            kind: BuildingKind::Building,
            floors: Some(4),
        };
        let without = Building {
            footprint: poly,
            kind: BuildingKind::Building,
            floors: None,
        };

        assert_eq!(with_floors.approximate_height(3.0, 2), 12.0);
        assert_eq!(without.approximate_height(3.0, 2), 6.0);
    }
}
