//! Polygon set union
//!
//! Robust f64 boolean union over `geo::BooleanOps`, merged pairwise in
//! a balanced tree so large category unions stay cheap. Union is
//! commutative; merge order never changes the result.

use geo::{BooleanOps, Coord, MultiPolygon, Polygon};

/// Union an arbitrary collection of multipolygons into one
pub fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    parts.retain(|mp| !mp.0.is_empty());

    while parts.len() > 1 {
        let mut merged = Vec::with_capacity(parts.len() / 2 + 1);
        let mut iter = parts.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => merged.push(a.union(&b)),
                None => merged.push(a),
            }
        }
        parts = merged;
    }

    parts.into_iter().next().unwrap_or_else(|| MultiPolygon(vec![]))
}

/// Whether a polygon is safe to feed into buffering/boolean ops.
///
/// Rejects rings with fewer than four coordinates and any non-finite
/// coordinate. Invalid features are skipped per-feature upstream, never
/// fatal.
pub fn is_valid_polygon(polygon: &Polygon<f64>) -> bool {
    ring_ok(&polygon.exterior().0)
        && polygon.interiors().iter().all(|ring| ring_ok(&ring.0))
}

fn ring_ok(coords: &[Coord<f64>]) -> bool {
    coords.len() >= 4 && coords.iter().all(|c| c.x.is_finite() && c.y.is_finite())
}
