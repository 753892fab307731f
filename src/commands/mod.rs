pub mod ingest;
pub mod query;
pub mod serve;
pub mod status;
