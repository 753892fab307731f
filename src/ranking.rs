//! Muscle relevance ranking.
//!
//! A workout's match count is the number of query terms (by occurrence, or
//! by distinct term) for which at least one of its primary or secondary
//! muscles carries that term as `name` or `name_en`. Results are bucketed by
//! match count, highest first; inside a bucket, workouts keep the order in
//! which they first matched.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::model::Workout;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TermCounting {
    /// Every occurrence of a term counts, so `Biceps,Biceps` scores 2.
    #[default]
    Occurrences,
    /// Repeated terms are collapsed before scoring.
    Distinct,
}

/// A ranked workout. `match_count` is `None` when no terms were given and
/// the candidates were passed through unscored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedWorkout {
    pub match_count: Option<u32>,
    pub workout: Workout,
}

struct Accumulated {
    workout: Workout,
    match_count: u32,
}

pub fn rank(
    terms: &[String],
    candidates: Vec<Workout>,
    counting: TermCounting,
) -> Vec<RankedWorkout> {
    if terms.is_empty() {
        return candidates
            .into_iter()
            .map(|workout| RankedWorkout {
                match_count: None,
                workout,
            })
            .collect();
    }

    let terms = effective_terms(terms, counting);
    let candidates = unique_by_id(candidates);

    // Insertion-ordered accumulator: `slots` keeps first-match order and
    // `slot_by_id` only indexes into it.
    let mut slots = Vec::<Accumulated>::new();
    let mut slot_by_id = HashMap::<i64, usize>::new();

    for term in terms {
        for workout in &candidates {
            if !workout.all_muscles().any(|muscle| muscle.matches(term)) {
                continue;
            }

            match slot_by_id.get(&workout.id) {
                Some(&slot) => slots[slot].match_count += 1,
                None => {
                    slot_by_id.insert(workout.id, slots.len());
                    slots.push(Accumulated {
                        workout: workout.clone(),
                        match_count: 1,
                    });
                }
            }
        }
    }

    let mut buckets = BTreeMap::<u32, Vec<Workout>>::new();
    for slot in slots {
        buckets
            .entry(slot.match_count)
            .or_default()
            .push(slot.workout);
    }

    buckets
        .into_iter()
        .rev()
        .flat_map(|(match_count, workouts)| {
            workouts.into_iter().map(move |workout| RankedWorkout {
                match_count: Some(match_count),
                workout,
            })
        })
        .collect()
}

fn effective_terms(terms: &[String], counting: TermCounting) -> Vec<&str> {
    match counting {
        TermCounting::Occurrences => terms.iter().map(String::as_str).collect(),
        TermCounting::Distinct => {
            let mut seen = HashSet::<&str>::new();
            terms
                .iter()
                .map(String::as_str)
                .filter(|term| seen.insert(*term))
                .collect()
        }
    }
}

fn unique_by_id(candidates: Vec<Workout>) -> Vec<Workout> {
    let mut seen = HashSet::<i64>::new();
    candidates
        .into_iter()
        .filter(|workout| seen.insert(workout.id))
        .collect()
}
