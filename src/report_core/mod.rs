//! Report Core - Store Snapshot to Dashboard Report
//!
//! This module turns one read-only pass over the game database into the
//! `stats.json` document the dashboard renders.
//!
//! # Architecture
//!
//! ```text
//! SQLite Database → StoreReader (read-only) → StoreSnapshot
//!     ↓
//! NameResolver (built-in + data/heroes.json, data/enemies.json)
//!     ↓
//! aggregate (totals, distributions, timeseries, monetization)
//! SeasonResolver (current season, season summaries, history)
//! DetailAssembler (leaderboard, active runs, users, per-user details)
//!     ↓
//! build_report → ReportWriter (ASCII JSON, temp file + rename)
//! ```

pub mod aggregation;
pub mod counter;
pub mod details;
pub mod json_fields;
pub mod names;
pub mod pipeline;
pub mod report;
pub mod rows;
pub mod season;
pub mod sqlite_reader;
pub mod timestamps;
pub mod writer;

pub use aggregation::{aggregate, Aggregates};
pub use counter::FrequencyCounter;
pub use details::DetailAssembler;
pub use names::NameResolver;
pub use pipeline::{run_pipeline, run_pipeline_at, PipelineError, PipelineOutcome};
pub use report::{build_report, Report};
pub use rows::StoreSnapshot;
pub use season::SeasonResolver;
pub use sqlite_reader::{ReaderError, StoreReader};
pub use writer::{ReportWriter, WriterError};
