//! Stats Server - dashboard files plus on-demand report rebuilds
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin stats_server
//! ```
//!
//! ## Environment Variables
//!
//! - DB_PATH - Game SQLite database (default: ruins.db)
//! - GAME_DATA_DIR - heroes.json / enemies.json directory (default: data)
//! - STATS_OUTPUT_PATH - Report destination (default: public/data/stats.json)
//! - STATS_PUBLIC_DIR - Static file root (default: public)
//! - STATS_BIND_ADDR - Listen address (default: 0.0.0.0:8000)
//! - RUST_LOG - Logging level (optional, default: info)

use ruins_stats::server::start_server;
use ruins_stats::StatsConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = StatsConfig::from_env();

    log::info!("🚀 Starting Ruins stats server");
    log::info!("   Database: {}", config.db_path.display());
    log::info!("   Output: {}", config.output_path.display());
    log::info!("   Bind: {}", config.bind_addr);

    if let Err(e) = start_server(config).await {
        log::error!("❌ Stats server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
