//! Build Stats - one-shot report build
//!
//! Reads the game database read-only and rewrites the dashboard report.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin build_stats
//! ```
//!
//! ## Environment Variables
//!
//! - DB_PATH - Game SQLite database (default: ruins.db)
//! - GAME_DATA_DIR - heroes.json / enemies.json directory (default: data)
//! - STATS_OUTPUT_PATH - Report destination (default: public/data/stats.json)
//! - RUST_LOG - Logging level (optional, default: info)

use ruins_stats::{run_pipeline, StatsConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = StatsConfig::from_env();

    log::info!("🚀 Ruins stats build");
    log::info!("   Database: {}", config.db_path.display());
    match &config.game_data_dir {
        Some(dir) => log::info!("   Game data: {}", dir.display()),
        None => log::info!("   Game data: built-in names only"),
    }
    log::info!("   Output: {}", config.output_path.display());

    match run_pipeline(&config) {
        Ok(outcome) => {
            log::info!(
                "✅ {} written at {} ({} bytes)",
                outcome.output_path.display(),
                outcome.generated_at,
                outcome.bytes_written
            );
            Ok(())
        }
        Err(e) => {
            log::error!("❌ Stats build failed: {}", e);
            Err(e.into())
        }
    }
}
