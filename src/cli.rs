use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ranking::TermCounting;

pub const DEFAULT_CACHE_ROOT: &str = ".cache/workouts";
pub const DB_FILE_NAME: &str = "workouts.sqlite";

#[derive(Parser, Debug)]
#[command(
    name = "workout-catalog",
    version,
    about = "Workout catalog store, muscle-ranked query and HTTP API"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Query(QueryArgs),
    Serve(ServeArgs),
    Status(StatusArgs),
}

/// Database location shared by every command.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

impl StoreArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.cache_root.join(DB_FILE_NAME))
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.cache_root.join("manifests")
    }
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON array of workout documents.
    #[arg(long)]
    pub catalog_path: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Swap the stored catalog for this one; workouts it lacks are removed.
    #[arg(long, default_value_t = false)]
    pub replace: bool,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Comma-separated muscle names; omit to list every workout.
    #[arg(long)]
    pub muscles: Option<String>,

    /// Count each distinct muscle once even if it is repeated.
    #[arg(long, default_value_t = false)]
    pub distinct_terms: bool,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// Default counting policy when a request does not set `distinct`.
    #[arg(long, default_value_t = false)]
    pub distinct_terms: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn term_counting(distinct_terms: bool) -> TermCounting {
    if distinct_terms {
        TermCounting::Distinct
    } else {
        TermCounting::Occurrences
    }
}
