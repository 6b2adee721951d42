//! Report configuration from environment variables

use std::env;
use std::path::{Path, PathBuf};

/// Configuration for the report pipeline and the stats server
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Path to the game's SQLite database file
    pub db_path: PathBuf,

    /// Directory holding heroes.json / enemies.json (None when absent)
    pub game_data_dir: Option<PathBuf>,

    /// Where the report is written
    pub output_path: PathBuf,

    /// Static files served by the stats server
    pub public_dir: PathBuf,

    /// Listen address for the stats server
    pub bind_addr: String,
}

impl StatsConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `DB_PATH` (default: ruins.db)
    /// - `GAME_DATA_DIR` (default: data, ignored unless it is a directory)
    /// - `STATS_OUTPUT_PATH` (default: public/data/stats.json)
    /// - `STATS_PUBLIC_DIR` (default: public)
    /// - `STATS_BIND_ADDR` (default: 0.0.0.0:8000)
    pub fn from_env() -> Self {
        let game_data_dir = env::var("GAME_DATA_DIR")
            .unwrap_or_else(|_| "data".to_string());

        Self {
            db_path: env::var("DB_PATH")
                .unwrap_or_else(|_| "ruins.db".to_string())
                .into(),

            game_data_dir: existing_dir(&game_data_dir),

            output_path: env::var("STATS_OUTPUT_PATH")
                .unwrap_or_else(|_| "public/data/stats.json".to_string())
                .into(),

            public_dir: env::var("STATS_PUBLIC_DIR")
                .unwrap_or_else(|_| "public".to_string())
                .into(),

            bind_addr: env::var("STATS_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        }
    }
}

fn existing_dir(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw);
    if path.is_dir() {
        Some(path.to_path_buf())
    } else {
        log::debug!("Game data dir {} not found, using built-in names", raw);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases live in one test: env vars are process-global and tests run in parallel.
    #[test]
    fn test_config_from_env() {
        env::remove_var("DB_PATH");
        env::remove_var("GAME_DATA_DIR");
        env::remove_var("STATS_OUTPUT_PATH");
        env::remove_var("STATS_PUBLIC_DIR");
        env::remove_var("STATS_BIND_ADDR");

        let config = StatsConfig::from_env();
        assert_eq!(config.db_path, PathBuf::from("ruins.db"));
        assert_eq!(config.output_path, PathBuf::from("public/data/stats.json"));
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.bind_addr, "0.0.0.0:8000");

        let dir = tempfile::tempdir().unwrap();
        env::set_var("DB_PATH", "/tmp/ruins-test.db");
        env::set_var("GAME_DATA_DIR", dir.path());
        env::set_var("STATS_OUTPUT_PATH", "/tmp/out/stats.json");

        let config = StatsConfig::from_env();
        assert_eq!(config.db_path, PathBuf::from("/tmp/ruins-test.db"));
        assert_eq!(config.game_data_dir.as_deref(), Some(dir.path()));
        assert_eq!(config.output_path, PathBuf::from("/tmp/out/stats.json"));

        env::set_var("GAME_DATA_DIR", "/definitely/not/a/dir");
        let config = StatsConfig::from_env();
        assert!(config.game_data_dir.is_none());

        env::remove_var("DB_PATH");
        env::remove_var("GAME_DATA_DIR");
        env::remove_var("STATS_OUTPUT_PATH");
    }
}
