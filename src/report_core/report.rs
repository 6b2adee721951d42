//! Report assembly
//!
//! Composes the aggregation, season and detail stages into the single nested
//! object the dashboard reads. The report is fully built in memory; writing it
//! is the writer's job.

use super::aggregation::{aggregate, Distributions, Monetization, Timeseries, Totals};
use super::details::{
    ActiveRunSnapshot, DetailAssembler, LeaderboardEntry, UserDetail, UserListEntry,
};
use super::names::NameResolver;
use super::rows::StoreSnapshot;
use super::season::{season_history, SeasonArchive, SeasonResolver, SeasonScalars, SeasonSummary};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(flatten)]
    pub season: SeasonScalars,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: String,
    pub summary: Summary,
    pub distributions: Distributions,
    pub timeseries: Timeseries,
    pub monetization: Monetization,
    pub seasons: Vec<SeasonSummary>,
    pub season_history: BTreeMap<String, SeasonArchive>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub active_runs: Vec<ActiveRunSnapshot>,
    pub users_list: Vec<UserListEntry>,
    pub user_details: BTreeMap<String, UserDetail>,
}

/// UTC, minute precision, e.g. `2025-06-10T14:05Z`
pub fn format_generated_at(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%MZ").to_string()
}

/// Build the full report from one store snapshot.
///
/// `today` drives the today / last-7-days figures; `now` only feeds
/// `generated_at`, so two builds over the same store differ in that field alone.
pub fn build_report(
    snapshot: &StoreSnapshot,
    names: &NameResolver,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Report {
    let aggregates = aggregate(snapshot, names, today);
    let seasons = SeasonResolver::new(&snapshot.seasons, &snapshot.user_season_stats);
    let details = DetailAssembler::new(snapshot, names, &seasons);

    Report {
        generated_at: format_generated_at(now),
        summary: Summary {
            season: seasons.scalars(),
            totals: aggregates.totals,
        },
        distributions: aggregates.distributions,
        timeseries: aggregates.timeseries,
        monetization: aggregates.monetization,
        seasons: seasons.summaries(&snapshot.user_season_stats, names),
        season_history: season_history(&snapshot.season_history),
        leaderboard: details.leaderboard(),
        active_runs: details.active_runs(),
        users_list: details.users_list(),
        user_details: details.user_details(),
    }
}
