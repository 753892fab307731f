use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::{QueryArgs, term_counting};
use crate::model::Muscle;
use crate::ranking::{RankedWorkout, TermCounting};
use crate::search::{parse_muscle_terms, search_workouts};
use crate::store::WorkoutStore;

#[derive(Debug, Serialize)]
pub(crate) struct RankedResponse {
    pub(crate) query: Vec<String>,
    pub(crate) distinct_terms: bool,
    pub(crate) returned: usize,
    pub(crate) results: Vec<RankedWorkout>,
}

impl RankedResponse {
    pub(crate) fn new(
        query: Vec<String>,
        counting: TermCounting,
        results: Vec<RankedWorkout>,
    ) -> Self {
        Self {
            query,
            distinct_terms: counting == TermCounting::Distinct,
            returned: results.len(),
            results,
        }
    }
}

pub fn run(args: QueryArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let store = WorkoutStore::open_read_only(&db_path)?;

    let terms = parse_muscle_terms(args.muscles.as_deref());
    let counting = term_counting(args.distinct_terms);
    let mut results = search_workouts(&store, &terms, counting)?;
    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    info!(
        terms = ?terms,
        counting = ?counting,
        result_count = results.len(),
        "query completed"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        let response = RankedResponse::new(terms, counting, results);
        serde_json::to_writer_pretty(&mut output, &response)
            .context("failed to serialize query json output")?;
        writeln!(output)?;
    } else {
        write_text_response(&mut output, &terms, &results)?;
    }
    output.flush()?;

    Ok(())
}

fn write_text_response<W: Write>(
    output: &mut W,
    terms: &[String],
    results: &[RankedWorkout],
) -> Result<()> {
    if terms.is_empty() {
        writeln!(output, "Muscles: (all workouts)")?;
    } else {
        writeln!(output, "Muscles: {}", terms.join(","))?;
    }
    writeln!(output, "Results: {}", results.len())?;

    for (index, result) in results.iter().enumerate() {
        let workout = &result.workout;
        let category = workout
            .category
            .as_ref()
            .and_then(|category| category.name.as_deref())
            .unwrap_or("(uncategorized)");

        match result.match_count {
            Some(match_count) => writeln!(
                output,
                "{}.\t{}\t{}\tid={}\tmatches={}",
                index + 1,
                workout.name,
                category,
                workout.id,
                match_count
            )?,
            None => writeln!(
                output,
                "{}.\t{}\t{}\tid={}",
                index + 1,
                workout.name,
                category,
                workout.id
            )?,
        }

        writeln!(output, "\tprimary: {}", muscle_list(&workout.muscles))?;
        if !workout.muscles_secondary.is_empty() {
            writeln!(
                output,
                "\tsecondary: {}",
                muscle_list(&workout.muscles_secondary)
            )?;
        }
    }

    Ok(())
}

fn muscle_list(muscles: &[Muscle]) -> String {
    if muscles.is_empty() {
        return "-".to_string();
    }

    muscles
        .iter()
        .map(|muscle| match (muscle.name.as_deref(), muscle.name_en.as_deref()) {
            (Some(name), Some(name_en)) if name != name_en => format!("{name} ({name_en})"),
            (Some(name), _) => name.to_string(),
            (None, Some(name_en)) => name_en.to_string(),
            (None, None) => "?".to_string(),
        })
        .collect::<Vec<String>>()
        .join(", ")
}
