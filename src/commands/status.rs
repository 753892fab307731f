use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::IngestRunManifest;
use crate::store::WorkoutStore;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.store.manifest_dir();
    let db_path = args.store.resolved_db_path();

    info!(cache_root = %args.store.cache_root.display(), "status requested");

    match latest_ingest_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: IngestRunManifest = read_json(&path)?;
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                replace = manifest.replace,
                catalog = %manifest.paths.catalog_path,
                catalog_sha256 = %manifest.catalog_sha256,
                catalog_entries = manifest.counts.catalog_entries,
                duplicate_ids = manifest.counts.duplicate_ids,
                warnings = manifest.warnings.len(),
                "loaded latest ingest manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no ingest manifest found"),
    }

    if db_path.exists() {
        let store = WorkoutStore::open_read_only(&db_path)?;
        info!(
            path = %db_path.display(),
            schema_version = %store.metadata_value("db_schema_version")?.unwrap_or_default(),
            updated_at = %store.metadata_value("db_updated_at")?.unwrap_or_default(),
            workouts = store.count_workouts()?,
            muscle_rows = store.count_muscle_rows()?,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Ingest manifests are named `ingest_run_<compact utc>.json`, so the
/// lexicographically greatest name is the most recent run.
fn latest_ingest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let path = entry?.path();
        let is_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("ingest_run_") && name.ends_with(".json"));
        if is_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
