use std::time::Instant;

use anyhow::Result;
use tracing::debug;

use crate::ranking::{RankedWorkout, TermCounting, rank};
use crate::store::CandidateRetriever;

/// Splits a comma-separated muscle list. Absent or blank input means no
/// filter; otherwise every segment is trimmed and kept, empty ones included.
pub fn parse_muscle_terms(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .split(',')
            .map(|term| term.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn search_workouts<R: CandidateRetriever + ?Sized>(
    retriever: &R,
    terms: &[String],
    counting: TermCounting,
) -> Result<Vec<RankedWorkout>> {
    let started = Instant::now();

    let candidates = retriever.candidates(terms)?;
    let candidate_count = candidates.len();
    let ranked = rank(terms, candidates, counting);

    debug!(
        terms = ?terms,
        counting = ?counting,
        candidates = candidate_count,
        returned = ranked.len(),
        duration_ms = started.elapsed().as_secs_f64() * 1_000.0,
        "ranked workouts"
    );

    Ok(ranked)
}
