//! Single-flight report pipeline: read → aggregate → write
//!
//! At most one pipeline runs per process. Callers that arrive while a run is in
//! progress wait for it to finish and then run their own.

use super::names::NameResolver;
use super::report::build_report;
use super::sqlite_reader::{ReaderError, StoreReader};
use super::writer::{ReportWriter, WriterError};
use crate::config::StatsConfig;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

static PIPELINE_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug)]
pub enum PipelineError {
    Reader(ReaderError),
    Writer(WriterError),
}

impl From<ReaderError> for PipelineError {
    fn from(err: ReaderError) -> Self {
        PipelineError::Reader(err)
    }
}

impl From<WriterError> for PipelineError {
    fn from(err: WriterError) -> Self {
        PipelineError::Writer(err)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Reader(e) => write!(f, "Store read failed: {}", e),
            PipelineError::Writer(e) => write!(f, "Report write failed: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Reader(e) => Some(e),
            PipelineError::Writer(e) => Some(e),
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub generated_at: String,
    pub users: usize,
    pub runs: usize,
    pub current_season_key: Option<String>,
}

/// Run the pipeline against the local clock
pub fn run_pipeline(config: &StatsConfig) -> Result<PipelineOutcome, PipelineError> {
    run_pipeline_at(config, Local::now().date_naive(), Utc::now())
}

/// Run the pipeline with an explicit "today" (day-window figures) and "now"
/// (`generated_at`)
pub fn run_pipeline_at(
    config: &StatsConfig,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<PipelineOutcome, PipelineError> {
    // The guarded data is (), so a poisoned lock carries no broken state
    let _guard = PIPELINE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let started = Instant::now();

    log::info!("🚀 Building stats report from {}", config.db_path.display());

    let snapshot = {
        let reader = StoreReader::open(&config.db_path)?;
        reader.read_snapshot()?
    };

    let names = NameResolver::load(config.game_data_dir.as_deref());
    let report = build_report(&snapshot, &names, today, now);

    match report.summary.season.current_season_key.as_deref() {
        Some(key) => log::info!("🏆 Current season: {}", key),
        None => log::info!("🏆 No current season"),
    }

    let writer = ReportWriter::new(&config.output_path);
    let bytes_written = writer.write(&report)?;

    log::info!(
        "✅ Stats report ready in {:.2?}: {} users, {} runs",
        started.elapsed(),
        snapshot.users.len(),
        snapshot.runs.len()
    );

    Ok(PipelineOutcome {
        output_path: config.output_path.clone(),
        bytes_written,
        generated_at: report.generated_at,
        users: snapshot.users.len(),
        runs: snapshot.runs.len(),
        current_season_key: report.summary.season.current_season_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_for(dir: &std::path::Path) -> StatsConfig {
        StatsConfig {
            db_path: dir.join("ruins.db"),
            game_data_dir: None,
            output_path: dir.join("public").join("data").join("stats.json"),
            public_dir: dir.join("public"),
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }

    #[test]
    fn test_missing_store_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());

        let err = run_pipeline(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Reader(ReaderError::Open { .. })));
        assert!(!config.output_path.exists());
        assert!(!config.db_path.exists());
    }

    #[test]
    fn test_schema_error_keeps_previous_report() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        rusqlite::Connection::open(&config.db_path)
            .unwrap()
            .execute("CREATE TABLE users (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        std::fs::create_dir_all(config.output_path.parent().unwrap()).unwrap();
        std::fs::write(&config.output_path, "{\"previous\": true}").unwrap();

        let err = run_pipeline(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Reader(ReaderError::Database { .. })));
        assert_eq!(
            std::fs::read_to_string(&config.output_path).unwrap(),
            "{\"previous\": true}"
        );
    }
}
