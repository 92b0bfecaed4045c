//! Coordinate Reference System handling
//!
//! All internal distance/area math runs in one fixed projected CRS with
//! meter units. Reprojection to geographic coordinates is the job of
//! external tooling; the core only records and compares codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of the default working CRS (ETRS89 / UTM zone 32N, meters).
pub const DEFAULT_EPSG: u32 = 25832;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// Default projected working CRS (EPSG:25832)
    pub fn working() -> Self {
        Self::from_epsg(DEFAULT_EPSG)
    }

    /// WGS84 geographic CRS (EPSG:4326), presentation boundary only
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get the EPSG code
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        self.epsg == other.epsg
    }

    /// Whether this is a geographic (degree-unit) CRS.
    ///
    /// Only the codes this pipeline can meet are recognized; everything
    /// else is assumed projected.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4326 | 4258)
    }

    /// String identifier ("EPSG:25832")
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::working()
    }
}
