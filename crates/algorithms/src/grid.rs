//! Candidate grid generation
//!
//! Lays a regular point lattice over the plantable area's bounding box
//! and keeps the points that touch the area. Points on the boundary
//! count as inside, so a w x h box at spacing s yields up to
//! (w/s + 1) * (h/s + 1) candidates.

use canopy_core::vector::Candidate;
use canopy_core::{Error, Result};
use geo::{BoundingRect, Intersects, MultiPolygon, Point};
use tracing::{info, warn};

/// Generate unscored candidates on a regular lattice clipped to the
/// plantable area. Output order is row-major from the lower-left
/// corner and deterministic for identical inputs.
pub fn generate_candidates(
    plantable: &MultiPolygon<f64>,
    spacing: f64,
) -> Result<Vec<Candidate>> {
    if !(spacing > 0.0) {
        return Err(Error::InvalidParameter {
            name: "spacing",
            value: spacing.to_string(),
            reason: "grid spacing must be positive".into(),
        });
    }

    let Some(bbox) = plantable.bounding_rect() else {
        warn!("plantable area is empty, no candidates generated");
        return Ok(Vec::new());
    };

    let (min_x, min_y) = (bbox.min().x, bbox.min().y);
    let (max_x, max_y) = (bbox.max().x, bbox.max().y);

    // Inclusive of both box edges, with a tolerance against float
    // accumulation at the far edge
    let eps = spacing * 1e-9;
    let cols = ((max_x - min_x) / spacing + eps).floor() as usize + 1;
    let rows = ((max_y - min_y) / spacing + eps).floor() as usize + 1;

    let mut candidates = Vec::new();
    for row in 0..rows {
        let y = min_y + row as f64 * spacing;
        for col in 0..cols {
            let x = min_x + col as f64 * spacing;
            let point = Point::new(x, y);
            if plantable.intersects(&point) {
                candidates.push(Candidate::new(point));
            }
        }
    }

    info!(
        lattice = rows * cols,
        kept = candidates.len(),
        spacing_m = spacing,
        "candidate grid generated"
    );
    Ok(candidates)
}
