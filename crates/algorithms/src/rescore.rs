//! Rescoring and score recalibration
//!
//! When a better heat raster arrives, only the heat sub-score changes:
//! the spatial, social and maintenance sub-scores are preserved, finals
//! are recombined with the same weights and ranks reassigned. Running
//! the same rescore twice is a no-op.

use crate::scoring::DEFAULT_HEAT;
use canopy_core::config::ScoreWeights;
use canopy_core::vector::Candidate;
use canopy_core::{Error, Raster, Result};
use tracing::{info, warn};

/// Replace every candidate's heat sub-score from a new heat raster,
/// recombine finals and re-rank. All candidates must already carry
/// scores from a full scoring pass.
pub fn rescore(
    candidates: &mut Vec<Candidate>,
    heat: &Raster<f64>,
    weights: &ScoreWeights,
) -> Result<()> {
    for candidate in candidates.iter_mut() {
        let Some(scores) = candidate.scores.as_mut() else {
            return Err(Error::Stage(
                "rescore requires fully scored candidates, run scoring first".into(),
            ));
        };

        scores.heat = match heat.sample(candidate.location.x(), candidate.location.y()) {
            Some(v) if !v.is_nan() => v,
            _ => DEFAULT_HEAT,
        };
        scores.final_score = weights.combine(
            scores.heat,
            scores.spatial,
            scores.social,
            scores.maintenance,
        );
    }

    rerank(candidates);
    info!(candidates = candidates.len(), "candidates rescored");
    Ok(())
}

/// Stretch the heat sub-scores linearly onto [0, 100], recombine
/// finals and re-rank. A degenerate range (all heat scores equal)
/// leaves everything untouched.
pub fn rescale_heat_scores(candidates: &mut Vec<Candidate>, weights: &ScoreWeights) -> Result<()> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for candidate in candidates.iter() {
        let Some(scores) = candidate.scores else {
            return Err(Error::Stage(
                "rescale requires fully scored candidates, run scoring first".into(),
            ));
        };
        min = min.min(scores.heat);
        max = max.max(scores.heat);
    }

    if candidates.is_empty() {
        return Ok(());
    }
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        warn!(min, max, "heat score range is degenerate, skipping rescale");
        return Ok(());
    }

    for candidate in candidates.iter_mut() {
        let scores = candidate.scores.as_mut().unwrap();
        scores.heat = (scores.heat - min) / range * 100.0;
        scores.final_score = weights.combine(
            scores.heat,
            scores.spatial,
            scores.social,
            scores.maintenance,
        );
    }

    rerank(candidates);
    info!(old_min = min, old_max = max, "heat scores rescaled to 0-100");
    Ok(())
}

/// Keep only the `n` best-ranked candidates, in rank order
pub fn top_n(candidates: &[Candidate], n: usize) -> Vec<Candidate> {
    let mut sorted: Vec<Candidate> = candidates.to_vec();
    sorted.sort_by_key(|c| c.rank.unwrap_or(u32::MAX));
    sorted.truncate(n);
    sorted
}

// Stable descending sort by final score, ranks 1..=N
fn rerank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        let fa = a.final_score().unwrap_or(f64::NEG_INFINITY);
        let fb = b.final_score().unwrap_or(f64::NEG_INFINITY);
        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = Some(i as u32 + 1);
    }
}
