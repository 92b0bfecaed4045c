//! Flat tabular export of ranked candidates
//!
//! CSV is the hand-off format for downstream lookup/search services;
//! coordinates stay in the working CRS.

use crate::error::Result;
use crate::vector::Candidate;
use std::path::Path;

/// Write candidates as CSV with one row per candidate.
///
/// Columns: x, y, heat_score, spatial_score, social_score,
/// maintenance_score, final_score, rank. Unscored candidates get empty
/// score cells.
pub fn write_candidate_table(path: impl AsRef<Path>, candidates: &[Candidate]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record([
        "x",
        "y",
        "heat_score",
        "spatial_score",
        "social_score",
        "maintenance_score",
        "final_score",
        "rank",
    ])?;

    for candidate in candidates {
        let (x, y) = (candidate.location.x(), candidate.location.y());
        let rank = candidate
            .rank
            .map(|r| r.to_string())
            .unwrap_or_default();

        match candidate.scores {
            Some(s) => writer.write_record([
                format!("{:.3}", x),
                format!("{:.3}", y),
                format!("{:.2}", s.heat),
                format!("{:.2}", s.spatial),
                format!("{:.2}", s.social),
                format!("{:.2}", s.maintenance),
                format!("{:.2}", s.final_score),
                rank,
            ])?,
            None => writer.write_record([
                format!("{:.3}", x),
                format!("{:.3}", y),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                rank,
            ])?,
        }
    }

    writer.flush()?;
    Ok(())
}
