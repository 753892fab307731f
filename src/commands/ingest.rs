use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::model::{IngestCounts, IngestPaths, IngestRunManifest, Workout};
use crate::store::{DB_SCHEMA_VERSION, WorkoutStore};
use crate::util::{
    ensure_directory, now_utc_string, read_json, sha256_file, utc_compact_string,
    write_json_pretty,
};

#[derive(Debug, Default)]
struct PreparedCatalog {
    workouts: Vec<Workout>,
    duplicate_ids: usize,
    created_defaulted: usize,
    warnings: Vec<String>,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.store.cache_root.clone();
    ensure_directory(&cache_root)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.store.manifest_dir().join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args.store.resolved_db_path();
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    info!(
        catalog = %args.catalog_path.display(),
        db = %db_path.display(),
        run_id = %run_id,
        "starting ingest"
    );

    let catalog_sha256 = sha256_file(&args.catalog_path)?;
    let entries: Vec<serde_json::Value> = read_json(&args.catalog_path)?;
    let catalog_entries = entries.len();
    let prepared = prepare_catalog(entries, started_ts)?;

    for warning in &prepared.warnings {
        warn!(warning = %warning, "catalog warning");
    }

    let mut store = WorkoutStore::open_for_ingest(&db_path)?;
    let written = store.upsert_workouts(&prepared.workouts, args.replace)?;
    if args.replace {
        info!(removed = written.removed, "replaced existing workouts");
    }

    let workouts_total = store.count_workouts()?;
    let muscle_rows_total = store.count_muscle_rows()?;

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        replace: args.replace,
        catalog_sha256,
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            catalog_path: args.catalog_path.display().to_string(),
            db_path: db_path.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        counts: IngestCounts {
            catalog_entries,
            duplicate_ids: prepared.duplicate_ids,
            workouts_upserted: written.upserted,
            workouts_removed: written.removed,
            workouts_total,
            muscle_rows_total,
            created_defaulted: prepared.created_defaulted,
        },
        warnings: prepared.warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote ingest run manifest");
    info!(
        workouts = workouts_total,
        muscle_rows = muscle_rows_total,
        "ingest completed"
    );

    Ok(())
}

fn prepare_catalog(
    entries: Vec<serde_json::Value>,
    ingested_at: DateTime<Utc>,
) -> Result<PreparedCatalog> {
    let mut prepared = PreparedCatalog::default();
    let mut position_by_id = HashMap::<i64, usize>::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let mut workout: Workout = serde_json::from_value(entry)
            .with_context(|| format!("catalog entry {index} is not a valid workout"))?;

        if workout.name.trim().is_empty() {
            bail!("catalog entry {index} (id {}) has a blank name", workout.id);
        }

        if workout.created.is_none() {
            workout.created = Some(ingested_at);
            prepared.created_defaulted += 1;
        }

        match position_by_id.get(&workout.id) {
            Some(&position) => {
                prepared.duplicate_ids += 1;
                prepared.warnings.push(format!(
                    "duplicate workout id {} at entry {index}; later entry wins",
                    workout.id
                ));
                prepared.workouts[position] = workout;
            }
            None => {
                position_by_id.insert(workout.id, prepared.workouts.len());
                prepared.workouts.push(workout);
            }
        }
    }

    Ok(prepared)
}
