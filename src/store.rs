use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params, params_from_iter};
use tracing::debug;

use crate::model::{Muscle, Workout};
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "1.0.0";

/// Terms bound per candidate statement, well under SQLite's variable limit.
const MAX_TERMS_PER_STATEMENT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogWrite {
    pub removed: usize,
    pub upserted: usize,
}

/// Source of candidate workouts for a muscle query.
///
/// Implementations return every workout that has at least one muscle whose
/// `name` or `name_en` equals one of `terms`, or every workout when `terms`
/// is empty. Over-returning is allowed; ranking re-checks each match.
pub trait CandidateRetriever {
    fn candidates(&self, terms: &[String]) -> Result<Vec<Workout>>;
}

pub struct WorkoutStore {
    connection: Connection,
}

impl WorkoutStore {
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        let connection = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open database read-only: {}", db_path.display()))?;

        Ok(Self { connection })
    }

    pub fn open_for_ingest(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;

        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory db")?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Writes a catalog in one transaction.
    ///
    /// The new catalog takes `catalog_order` 0..n. Stored workouts it does not
    /// contain keep their relative order and move after it. With `replace`,
    /// they are deleted instead; a failed write leaves the store untouched.
    pub fn upsert_workouts(
        &mut self,
        workouts: &[Workout],
        replace: bool,
    ) -> Result<CatalogWrite> {
        let tx = self.connection.transaction()?;

        let removed = if replace {
            tx.execute("DELETE FROM workout_muscles", [])?;
            tx.execute("DELETE FROM workouts", [])?
        } else {
            tx.execute(
                "UPDATE workouts SET catalog_order = catalog_order + ?1",
                [workouts.len() as i64],
            )?;
            0
        };

        {
            let mut upsert_workout = tx.prepare(
                "
                INSERT INTO workouts(id, catalog_order, name, uuid, created, document_json)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                  catalog_order=excluded.catalog_order,
                  name=excluded.name,
                  uuid=excluded.uuid,
                  created=excluded.created,
                  document_json=excluded.document_json
                ",
            )?;
            let mut delete_muscles =
                tx.prepare("DELETE FROM workout_muscles WHERE workout_id = ?1")?;
            let mut insert_muscle = tx.prepare(
                "
                INSERT INTO workout_muscles(workout_id, role, position, name, name_en)
                VALUES(?1, ?2, ?3, ?4, ?5)
                ",
            )?;

            for (catalog_order, workout) in workouts.iter().enumerate() {
                let document_json = serde_json::to_string(workout)
                    .with_context(|| format!("failed to serialize workout {}", workout.id))?;

                upsert_workout
                    .execute(params![
                        workout.id,
                        catalog_order as i64,
                        &workout.name,
                        &workout.uuid,
                        workout.created,
                        document_json,
                    ])
                    .with_context(|| format!("failed to store workout {}", workout.id))?;

                delete_muscles.execute([workout.id])?;
                for (role, muscles) in [
                    ("primary", &workout.muscles),
                    ("secondary", &workout.muscles_secondary),
                ] {
                    insert_muscle_rows(&mut insert_muscle, workout.id, role, muscles)?;
                }
            }
        }

        touch_metadata(&tx)?;
        tx.commit()?;

        Ok(CatalogWrite {
            removed,
            upserted: workouts.len(),
        })
    }

    pub fn all_workouts(&self) -> Result<Vec<Workout>> {
        let mut statement = self.connection.prepare(
            "
            SELECT id, document_json
            FROM workouts
            ORDER BY catalog_order, id
            ",
        )?;

        let mut rows = statement.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(decode_workout(row.get(0)?, &row.get::<_, String>(1)?)?);
        }
        Ok(out)
    }

    pub fn find_candidates(&self, terms: &[String]) -> Result<Vec<Workout>> {
        if terms.is_empty() {
            return self.all_workouts();
        }

        // Blank names are stored as-is but never match, so blank terms are dropped.
        let unique_terms = terms
            .iter()
            .map(String::as_str)
            .filter(|term| !term.is_empty())
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .collect::<Vec<&str>>();

        let mut found = BTreeMap::<(i64, i64), String>::new();
        for chunk in unique_terms.chunks(MAX_TERMS_PER_STATEMENT) {
            let placeholders = (1..=chunk.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<String>>()
                .join(", ");
            let sql = format!(
                "
                SELECT w.catalog_order, w.id, w.document_json
                FROM workouts w
                WHERE w.id IN (
                  SELECT m.workout_id
                  FROM workout_muscles m
                  WHERE m.name IN ({placeholders}) OR m.name_en IN ({placeholders})
                )
                "
            );

            let mut statement = self
                .connection
                .prepare(&sql)
                .context("failed to prepare candidate query")?;
            let mut rows = statement.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                found.insert((row.get(0)?, row.get(1)?), row.get(2)?);
            }
        }

        let out = found
            .into_iter()
            .map(|((_, id), document_json)| decode_workout(id, &document_json))
            .collect::<Result<Vec<Workout>>>()?;

        debug!(
            terms = unique_terms.len(),
            candidates = out.len(),
            "retrieved candidate workouts"
        );
        Ok(out)
    }

    pub fn count_workouts(&self) -> Result<i64> {
        count_rows(&self.connection, "SELECT COUNT(*) FROM workouts")
    }

    pub fn count_muscle_rows(&self) -> Result<i64> {
        count_rows(&self.connection, "SELECT COUNT(*) FROM workout_muscles")
    }

    pub fn metadata_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .connection
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }
}

impl CandidateRetriever for WorkoutStore {
    fn candidates(&self, terms: &[String]) -> Result<Vec<Workout>> {
        self.find_candidates(terms)
    }
}

/// Catalog held in memory, in catalog order.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    workouts: Vec<Workout>,
}

#[cfg(test)]
impl InMemoryCatalog {
    pub fn new(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }
}

#[cfg(test)]
impl CandidateRetriever for InMemoryCatalog {
    fn candidates(&self, terms: &[String]) -> Result<Vec<Workout>> {
        if terms.is_empty() {
            return Ok(self.workouts.clone());
        }

        Ok(self
            .workouts
            .iter()
            .filter(|workout| {
                workout
                    .all_muscles()
                    .any(|muscle| terms.iter().any(|term| muscle.matches(term)))
            })
            .cloned()
            .collect())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS workouts (
          id INTEGER PRIMARY KEY,
          catalog_order INTEGER NOT NULL,
          name TEXT NOT NULL,
          uuid TEXT,
          created TEXT,
          document_json TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS workout_muscles (
          workout_id INTEGER NOT NULL,
          role TEXT NOT NULL CHECK (role IN ('primary', 'secondary')),
          position INTEGER NOT NULL,
          name TEXT,
          name_en TEXT,
          PRIMARY KEY (workout_id, role, position),
          FOREIGN KEY (workout_id) REFERENCES workouts(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_workouts_catalog_order ON workouts(catalog_order, id);
        CREATE INDEX IF NOT EXISTS idx_workout_muscles_name ON workout_muscles(name);
        CREATE INDEX IF NOT EXISTS idx_workout_muscles_name_en ON workout_muscles(name_en);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    touch_metadata(connection)?;

    Ok(())
}

fn touch_metadata(connection: &Connection) -> Result<()> {
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;
    Ok(())
}

fn insert_muscle_rows(
    statement: &mut rusqlite::Statement<'_>,
    workout_id: i64,
    role: &str,
    muscles: &[Muscle],
) -> Result<()> {
    for (position, muscle) in muscles.iter().enumerate() {
        statement.execute(params![
            workout_id,
            role,
            position as i64,
            &muscle.name,
            &muscle.name_en,
        ])?;
    }
    Ok(())
}

fn decode_workout(id: i64, document_json: &str) -> Result<Workout> {
    let workout: Workout = serde_json::from_str(document_json)
        .with_context(|| format!("failed to decode stored workout {id}"))?;
    if workout.id != id {
        bail!(
            "stored workout {id} carries mismatched document id {}",
            workout.id
        );
    }
    Ok(workout)
}

fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SAMPLE_CATALOG, workout};

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn seeded_store() -> WorkoutStore {
        let workouts: Vec<Workout> =
            serde_json::from_str(SAMPLE_CATALOG).expect("sample catalog should parse");
        let mut store = WorkoutStore::open_in_memory().expect("in-memory store");
        store.upsert_workouts(&workouts, false).expect("seed store");
        store
    }

    fn ids(workouts: &[Workout]) -> Vec<i64> {
        workouts.iter().map(|workout| workout.id).collect()
    }

    #[test]
    fn all_workouts_preserves_catalog_order() {
        let store = seeded_store();
        let all = store.all_workouts().expect("all workouts");
        assert_eq!(ids(&all), vec![74, 83, 91, 111]);
        assert_eq!(store.count_workouts().expect("count"), 4);
        assert_eq!(store.count_muscle_rows().expect("muscle rows"), 8);
    }

    #[test]
    fn find_candidates_matches_name_and_name_en_across_both_lists() {
        let store = seeded_store();

        let by_canonical = store.find_candidates(&terms(&["Biceps"])).expect("query");
        assert_eq!(ids(&by_canonical), vec![74, 91]);

        let by_localized = store
            .find_candidates(&terms(&["Triceps brachii"]))
            .expect("query");
        assert_eq!(ids(&by_localized), vec![83, 91]);

        let secondary_alias = store.find_candidates(&terms(&["Chest"])).expect("query");
        assert_eq!(ids(&secondary_alias), vec![83]);
    }

    #[test]
    fn find_candidates_returns_each_workout_once() {
        let store = seeded_store();
        let found = store
            .find_candidates(&terms(&["Biceps", "Lats", "Biceps", "Biceps brachii"]))
            .expect("query");
        assert_eq!(ids(&found), vec![74, 91]);
    }

    #[test]
    fn find_candidates_with_no_terms_returns_everything() {
        let store = seeded_store();
        let found = store.find_candidates(&[]).expect("query");
        assert_eq!(ids(&found), vec![74, 83, 91, 111]);
    }

    #[test]
    fn find_candidates_is_case_sensitive() {
        let store = seeded_store();
        let found = store.find_candidates(&terms(&["biceps"])).expect("query");
        assert!(found.is_empty());
    }

    #[test]
    fn upsert_replaces_existing_muscles() {
        let mut store = WorkoutStore::open_in_memory().expect("in-memory store");
        store
            .upsert_workouts(&[workout(1, &["Biceps"], &["Forearms"])], false)
            .expect("first upsert");
        store
            .upsert_workouts(&[workout(1, &["Triceps"], &[])], false)
            .expect("second upsert");

        assert!(store.find_candidates(&terms(&["Biceps"])).expect("query").is_empty());
        assert_eq!(
            ids(&store.find_candidates(&terms(&["Triceps"])).expect("query")),
            vec![1]
        );
        assert_eq!(store.count_muscle_rows().expect("muscle rows"), 1);
    }

    #[test]
    fn stored_document_round_trips_full_shape() {
        let store = seeded_store();
        let all = store.all_workouts().expect("all workouts");
        let curl = &all[0];
        assert_eq!(curl.name, "Biceps Curls With Dumbbell");
        assert_eq!(
            curl.category.as_ref().and_then(|value| value.name.as_deref()),
            Some("Arms")
        );
        assert_eq!(curl.muscles[0].is_front, Some(true));
        assert_eq!(curl.equipment.len(), 1);
    }

    #[test]
    fn replace_removes_workouts_missing_from_the_new_catalog() {
        let mut store = seeded_store();
        let written = store
            .upsert_workouts(&[workout(7, &["Calves"], &[])], true)
            .expect("replace");

        assert_eq!(written, CatalogWrite { removed: 4, upserted: 1 });
        assert_eq!(ids(&store.all_workouts().expect("all workouts")), vec![7]);
        assert_eq!(store.count_muscle_rows().expect("muscle rows"), 1);
    }

    #[test]
    fn failed_replace_keeps_previous_catalog() {
        let mut store = seeded_store();
        store
            .connection
            .execute_batch(
                "
                CREATE TEMP TRIGGER reject_workout_999
                BEFORE INSERT ON workouts WHEN NEW.id = 999
                BEGIN SELECT RAISE(ABORT, 'rejected'); END;
                ",
            )
            .expect("install trigger");

        let result = store.upsert_workouts(
            &[workout(7, &["Calves"], &[]), workout(999, &["Biceps"], &[])],
            true,
        );

        assert!(result.is_err());
        assert_eq!(
            ids(&store.all_workouts().expect("all workouts")),
            vec![74, 83, 91, 111]
        );
        assert_eq!(store.count_muscle_rows().expect("muscle rows"), 8);
    }

    #[test]
    fn new_catalog_comes_first_and_leftovers_keep_their_order() {
        let mut store = WorkoutStore::open_in_memory().expect("in-memory store");
        store
            .upsert_workouts(
                &[
                    workout(1, &["Biceps"], &[]),
                    workout(2, &["Biceps"], &[]),
                    workout(3, &["Biceps"], &[]),
                ],
                false,
            )
            .expect("first catalog");
        store
            .upsert_workouts(&[workout(3, &["Biceps"], &[])], false)
            .expect("second catalog");

        assert_eq!(ids(&store.all_workouts().expect("all workouts")), vec![3, 1, 2]);
        assert_eq!(
            ids(&store.find_candidates(&terms(&["Biceps"])).expect("query")),
            vec![3, 1, 2]
        );

        store
            .upsert_workouts(
                &[workout(2, &["Biceps"], &[]), workout(4, &["Biceps"], &[])],
                false,
            )
            .expect("third catalog");
        assert_eq!(
            ids(&store.all_workouts().expect("all workouts")),
            vec![2, 4, 3, 1]
        );
    }

    #[test]
    fn blank_muscle_names_are_never_candidates() {
        let mut store = WorkoutStore::open_in_memory().expect("in-memory store");
        store
            .upsert_workouts(
                &[workout(1, &[""], &[]), workout(2, &["Biceps"], &[""])],
                false,
            )
            .expect("seed store");

        assert!(store.find_candidates(&terms(&[""])).expect("query").is_empty());
        assert_eq!(
            ids(&store.find_candidates(&terms(&["Biceps", ""])).expect("query")),
            vec![2]
        );
    }

    #[test]
    fn find_candidates_splits_long_term_lists() {
        let store = seeded_store();
        // "Biceps" sorts into the first batch, "Triceps brachii" into the last.
        let mut many = (0..MAX_TERMS_PER_STATEMENT * 2 + 17)
            .map(|index| format!("Calf raise {index:05}"))
            .collect::<Vec<String>>();
        many.push("Triceps brachii".to_string());
        many.push("Biceps".to_string());

        let found = store.find_candidates(&many).expect("query");
        assert_eq!(ids(&found), vec![74, 83, 91]);
    }

    #[test]
    fn schema_version_is_recorded() {
        let store = WorkoutStore::open_in_memory().expect("in-memory store");
        assert_eq!(
            store.metadata_value("db_schema_version").expect("metadata"),
            Some(DB_SCHEMA_VERSION.to_string())
        );
        assert!(store.metadata_value("missing").expect("metadata").is_none());
    }

    #[test]
    fn in_memory_catalog_filters_like_the_database() {
        let workouts: Vec<Workout> =
            serde_json::from_str(SAMPLE_CATALOG).expect("sample catalog should parse");
        let catalog = InMemoryCatalog::new(workouts);

        let found = catalog.candidates(&terms(&["Triceps brachii"])).expect("query");
        assert_eq!(ids(&found), vec![83, 91]);
        assert_eq!(ids(&catalog.candidates(&[]).expect("query")), vec![74, 83, 91, 111]);
    }
}
