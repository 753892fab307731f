use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog workout document, stored and served in its full shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub exercise_base_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub muscles: Vec<Muscle>,
    #[serde(default)]
    pub muscles_secondary: Vec<Muscle>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub license_author: Option<String>,
    #[serde(default)]
    pub images: Vec<WorkoutImage>,
    #[serde(default)]
    pub videos: Vec<WorkoutVideo>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub variations: Vec<i64>,
    #[serde(default)]
    pub author_history: Vec<String>,
}

impl Workout {
    /// Primary muscles followed by secondary muscles.
    pub fn all_muscles(&self) -> impl Iterator<Item = &Muscle> {
        self.muscles.iter().chain(self.muscles_secondary.iter())
    }
}

/// A muscle reference. `name` is the localized name and `name_en` the
/// canonical English name; both are valid aliases when matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Muscle {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_front: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url_main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url_secondary: Option<String>,
}

impl Muscle {
    /// Exact, case-sensitive match on either alias. An empty term never matches.
    pub fn matches(&self, term: &str) -> bool {
        !term.is_empty()
            && (self.name.as_deref() == Some(term) || self.name_en.as_deref() == Some(term))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub full_name_en: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutImage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub exercise_base: Option<i64>,
    #[serde(default)]
    pub exercise_base_uuid: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_main: Option<bool>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub license: Option<i64>,
    #[serde(default)]
    pub license_title: Option<String>,
    #[serde(default)]
    pub license_object_url: Option<String>,
    #[serde(default)]
    pub license_author: Option<String>,
    #[serde(default)]
    pub license_author_url: Option<String>,
    #[serde(default)]
    pub license_derivative_source_url: Option<String>,
    #[serde(default)]
    pub author_history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutVideo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub exercise_base: Option<i64>,
    #[serde(default)]
    pub exercise_base_uuid: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub is_main: Option<bool>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub codec_long: Option<String>,
    #[serde(default)]
    pub license: Option<i64>,
    #[serde(default)]
    pub license_title: Option<String>,
    #[serde(default)]
    pub license_object_url: Option<String>,
    #[serde(default)]
    pub license_author: Option<String>,
    #[serde(default)]
    pub license_author_url: Option<String>,
    #[serde(default)]
    pub license_derivative_source_url: Option<String>,
    #[serde(default)]
    pub author_history: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub catalog_path: String,
    pub db_path: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestCounts {
    pub catalog_entries: usize,
    pub duplicate_ids: usize,
    pub workouts_upserted: usize,
    pub workouts_removed: usize,
    pub workouts_total: i64,
    pub muscle_rows_total: i64,
    pub created_defaulted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub replace: bool,
    pub catalog_sha256: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub warnings: Vec<String>,
}
