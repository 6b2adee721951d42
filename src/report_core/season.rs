//! Current-season resolution and season-scoped aggregates
//!
//! The current season is the latest-starting open season; when every season has
//! ended it is the latest-starting season overall. Seasons whose start cannot be
//! parsed rank lowest, and ties keep the first season in store order.

use super::aggregation::{ratio, round2, saturating_sum};
use super::json_fields::parse_json;
use super::names::NameResolver;
use super::rows::{SeasonHistoryRow, SeasonRow, UserSeasonStatsRow};
use super::timestamps::parse_opt_timestamp;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Season-scoped scalars for the summary block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonScalars {
    pub current_season_key: Option<String>,
    pub total_users_season: i64,
    pub total_runs_season: i64,
    pub total_xp_season: i64,
    pub avg_max_floor_season: f64,
}

/// One user's counters for one season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonStatLine {
    pub season_key: Option<String>,
    pub max_floor: i64,
    pub total_runs: i64,
    pub deaths: i64,
    pub treasures_found: i64,
    pub chests_opened: i64,
    pub xp_gained: i64,
    pub max_floor_character: Option<String>,
}

/// Entry of the report's `seasons` list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    #[serde(flatten)]
    pub line: SeasonStatLine,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub user_id: Option<i64>,
}

/// Archived season record keyed by season key in `season_history`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonArchive {
    pub season_number: Option<i64>,
    pub winners: Value,
    pub summary: Value,
}

/// Pick the current season (see module docs)
pub fn current_season(seasons: &[SeasonRow]) -> Option<&SeasonRow> {
    let open: Vec<&SeasonRow> = seasons.iter().filter(|s| s.is_open()).collect();
    let candidates: Vec<&SeasonRow> = if open.is_empty() {
        seasons.iter().collect()
    } else {
        open
    };

    // Strictly-greater keeps the first of equal starts
    let mut best: Option<&SeasonRow> = None;
    for season in candidates {
        let replace = match best {
            None => true,
            Some(current) => {
                parse_opt_timestamp(season.started_at.as_deref())
                    > parse_opt_timestamp(current.started_at.as_deref())
            }
        };
        if replace {
            best = Some(season);
        }
    }
    best
}

/// Season lookups shared by the aggregation and detail stages
pub struct SeasonResolver<'a> {
    by_id: HashMap<i64, &'a SeasonRow>,
    current: Option<&'a SeasonRow>,
    current_rows: Vec<&'a UserSeasonStatsRow>,
    current_members: HashSet<i64>,
}

impl<'a> SeasonResolver<'a> {
    pub fn new(seasons: &'a [SeasonRow], user_season_stats: &'a [UserSeasonStatsRow]) -> Self {
        let current = current_season(seasons);
        let current_rows: Vec<&UserSeasonStatsRow> = match current {
            Some(season) => user_season_stats
                .iter()
                .filter(|row| row.season_id == Some(season.id))
                .collect(),
            None => Vec::new(),
        };
        let current_members = current_rows.iter().filter_map(|row| row.user_id).collect();

        let mut by_id = HashMap::new();
        for season in seasons {
            by_id.entry(season.id).or_insert(season);
        }

        Self {
            by_id,
            current,
            current_rows,
            current_members,
        }
    }

    pub fn current(&self) -> Option<&'a SeasonRow> {
        self.current
    }

    pub fn season(&self, season_id: Option<i64>) -> Option<&'a SeasonRow> {
        season_id.and_then(|id| self.by_id.get(&id).copied())
    }

    /// Whether the user has a stats row in the current season
    pub fn in_current_season(&self, user_id: i64) -> bool {
        self.current_members.contains(&user_id)
    }

    pub fn scalars(&self) -> SeasonScalars {
        let rows = &self.current_rows;
        let total_users = rows.len() as i64;
        let floor_sum = saturating_sum(rows.iter().map(|row| row.max_floor));

        SeasonScalars {
            current_season_key: self.current.and_then(|s| s.season_key.clone()),
            total_users_season: total_users,
            total_runs_season: saturating_sum(rows.iter().map(|row| row.total_runs)),
            total_xp_season: saturating_sum(rows.iter().map(|row| row.xp_gained)),
            avg_max_floor_season: round2(ratio(floor_sum as f64, total_users as f64)),
        }
    }

    /// Stat line for a row, or `None` when its season does not exist
    pub fn stat_line(&self, row: &UserSeasonStatsRow, names: &NameResolver) -> Option<SeasonStatLine> {
        let season = self.season(row.season_id)?;
        Some(SeasonStatLine {
            season_key: season.season_key.clone(),
            max_floor: row.max_floor,
            total_runs: row.total_runs,
            deaths: row.deaths,
            treasures_found: row.treasures_found,
            chests_opened: row.chests_opened,
            xp_gained: row.xp_gained,
            max_floor_character: row
                .max_floor_character
                .as_deref()
                .map(|hero| names.hero_name(hero).to_string()),
        })
    }

    /// Per-user-per-season summaries across all seasons
    pub fn summaries(&self, rows: &[UserSeasonStatsRow], names: &NameResolver) -> Vec<SeasonSummary> {
        rows.iter()
            .filter_map(|row| {
                let season = self.season(row.season_id)?;
                let line = self.stat_line(row, names)?;
                Some(SeasonSummary {
                    line,
                    started_at: season.started_at.clone(),
                    ended_at: season.ended_at.clone(),
                    user_id: row.user_id,
                })
            })
            .collect()
    }
}

/// Archive map keyed by season key; rows without a key are skipped
pub fn season_history(rows: &[SeasonHistoryRow]) -> BTreeMap<String, SeasonArchive> {
    let mut archive = BTreeMap::new();
    for row in rows {
        let Some(key) = row.season_key.clone() else {
            log::debug!("Skipping season_history row without season_key");
            continue;
        };
        archive.insert(
            key,
            SeasonArchive {
                season_number: row.season_number,
                winners: parse_json(row.winners_json.as_deref())
                    .unwrap_or_else(|| Value::Object(Map::new())),
                summary: parse_json(row.summary_json.as_deref())
                    .unwrap_or_else(|| Value::Object(Map::new())),
            },
        );
    }
    archive
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn season(id: i64, key: &str, started: Option<&str>, ended: Option<&str>) -> SeasonRow {
        SeasonRow {
            id,
            season_key: Some(key.to_string()),
            started_at: started.map(str::to_string),
            ended_at: ended.map(str::to_string),
        }
    }

    fn stats(user_id: i64, season_id: i64, floor: i64, runs: i64, xp: i64) -> UserSeasonStatsRow {
        UserSeasonStatsRow {
            user_id: Some(user_id),
            season_id: Some(season_id),
            max_floor: floor,
            total_runs: runs,
            xp_gained: xp,
            ..Default::default()
        }
    }

    #[test]
    fn test_open_season_wins() {
        let seasons = vec![
            season(1, "S1", Some("2025-01-01T00:00:00"), Some("2025-02-01T00:00:00")),
            season(2, "S2", Some("2025-02-01T00:00:00"), None),
        ];
        assert_eq!(current_season(&seasons).unwrap().season_key.as_deref(), Some("S2"));

        // An open season beats a later-starting ended one
        let seasons = vec![
            season(1, "S1", Some("2025-01-01T00:00:00"), None),
            season(2, "S2", Some("2025-03-01T00:00:00"), Some("2025-04-01T00:00:00")),
        ];
        assert_eq!(current_season(&seasons).unwrap().season_key.as_deref(), Some("S1"));
    }

    #[test]
    fn test_all_ended_falls_back_to_latest_start() {
        let seasons = vec![
            season(1, "S1", Some("2025-01-01T00:00:00"), Some("2025-02-01T00:00:00")),
            season(2, "S2", Some("2025-03-01T00:00:00"), Some("2025-04-01T00:00:00")),
            season(3, "S0", Some("2024-06-01T00:00:00"), Some("2024-07-01T00:00:00")),
        ];
        assert_eq!(current_season(&seasons).unwrap().season_key.as_deref(), Some("S2"));
    }

    #[test]
    fn test_no_seasons_and_ties() {
        assert!(current_season(&[]).is_none());

        let seasons = vec![
            season(1, "A", Some("2025-01-01T00:00:00"), None),
            season(2, "B", Some("2025-01-01T00:00:00"), None),
            season(3, "C", None, None),
        ];
        assert_eq!(current_season(&seasons).unwrap().season_key.as_deref(), Some("A"));
    }

    #[test]
    fn test_scalars_only_count_current_season() {
        let seasons = vec![
            season(1, "S1", Some("2025-01-01T00:00:00"), Some("2025-02-01T00:00:00")),
            season(2, "S2", Some("2025-02-01T00:00:00"), None),
        ];
        let rows = vec![
            stats(1, 1, 9, 10, 500),
            stats(1, 2, 4, 3, 120),
            stats(2, 2, 3, 2, 80),
            stats(3, 99, 7, 1, 10),
        ];
        let resolver = SeasonResolver::new(&seasons, &rows);
        let scalars = resolver.scalars();

        assert_eq!(scalars.current_season_key.as_deref(), Some("S2"));
        assert_eq!(scalars.total_users_season, 2);
        assert_eq!(scalars.total_runs_season, 5);
        assert_eq!(scalars.total_xp_season, 200);
        assert_eq!(scalars.avg_max_floor_season, 3.5);
        assert!(resolver.in_current_season(1));
        assert!(!resolver.in_current_season(3));

        // Summaries span all known seasons; unknown season 99 is skipped
        let summaries = resolver.summaries(&rows, &NameResolver::builtin());
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].line.season_key.as_deref(), Some("S1"));
        assert_eq!(summaries[0].ended_at.as_deref(), Some("2025-02-01T00:00:00"));
    }

    #[test]
    fn test_empty_season_is_guarded() {
        let seasons = vec![season(1, "S1", Some("2025-01-01T00:00:00"), None)];
        let resolver = SeasonResolver::new(&seasons, &[]);
        let scalars = resolver.scalars();
        assert_eq!(scalars.total_users_season, 0);
        assert_eq!(scalars.avg_max_floor_season, 0.0);

        let resolver = SeasonResolver::new(&[], &[]);
        assert_eq!(resolver.scalars(), SeasonScalars::default());
    }

    #[test]
    fn test_max_floor_character_is_resolved() {
        let seasons = vec![season(1, "S1", None, None)];
        let mut row = stats(1, 1, 4, 2, 10);
        row.max_floor_character = Some("assassin".to_string());
        let rows = vec![row];
        let resolver = SeasonResolver::new(&seasons, &rows);

        let line = resolver.stat_line(&rows[0], &NameResolver::builtin()).unwrap();
        assert_eq!(line.max_floor_character.as_deref(), Some("Ассасин"));
    }

    #[test]
    fn test_history_parses_json_columns() {
        let rows = vec![
            SeasonHistoryRow {
                season_key: Some("S1".into()),
                season_number: Some(1),
                winners_json: Some(r#"{"1": "mira"}"#.into()),
                summary_json: Some("{broken".into()),
            },
            SeasonHistoryRow::default(),
        ];
        let archive = season_history(&rows);

        assert_eq!(archive.len(), 1);
        assert_eq!(archive["S1"].winners, json!({"1": "mira"}));
        assert_eq!(archive["S1"].summary, json!({}));
    }
}
