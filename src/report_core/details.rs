//! Per-user detail records and active-run snapshots
//!
//! Joins the raw rows on user id (and run id for active runs). The opaque
//! `state_json` blob is parsed field by field: a missing or wrongly-typed field
//! becomes absent, it never drops the whole record.
//!
//! Store order is ascending rowid. When a user has more than one active run,
//! the first one in store order is their `active_run`.

use super::counter::FrequencyCounter;
use super::json_fields::{
    field_bool, field_len, field_number, field_object, field_scalar, field_string, key_string,
    parse_json, parse_json_list, parse_json_object,
};
use super::names::NameResolver;
use super::rows::{RunRow, StoreSnapshot, UserRow, UserStatsRow};
use super::season::{SeasonResolver, SeasonStatLine};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub hp: Option<Number>,
    pub hp_max: Option<Number>,
    pub ap: Option<Number>,
    pub ap_max: Option<Number>,
    pub armor: Option<Number>,
    pub accuracy: Option<Number>,
    pub evasion: Option<Number>,
    pub power: Option<Number>,
    pub luck: Option<Number>,
    /// Name of the equipped weapon
    pub weapon: Option<String>,
    pub potions: usize,
    pub scrolls: usize,
}

impl PlayerSnapshot {
    fn from_object(player: &Map<String, Value>) -> Self {
        Self {
            hp: field_number(player, "hp"),
            hp_max: field_number(player, "hp_max"),
            ap: field_number(player, "ap"),
            ap_max: field_number(player, "ap_max"),
            armor: field_number(player, "armor"),
            accuracy: field_number(player, "accuracy"),
            evasion: field_number(player, "evasion"),
            power: field_number(player, "power"),
            luck: field_number(player, "luck"),
            weapon: field_object(player, "weapon").and_then(|w| field_string(w, "name")),
            potions: field_len(player, "potions"),
            scrolls: field_len(player, "scrolls"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnemySnapshot {
    pub name: Option<String>,
    pub hp: Option<Number>,
    pub max_hp: Option<Number>,
    pub attack: Option<Number>,
    pub armor: Option<Number>,
    pub danger: Option<Value>,
}

impl EnemySnapshot {
    fn from_object(enemy: &Map<String, Value>) -> Self {
        Self {
            name: field_string(enemy, "name"),
            hp: field_number(enemy, "hp"),
            max_hp: field_number(enemy, "max_hp"),
            attack: field_number(enemy, "attack"),
            armor: field_number(enemy, "armor"),
            danger: field_scalar(enemy, "danger"),
        }
    }
}

/// Decoded `runs.state_json`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    pub floor: Option<Number>,
    pub phase: Option<String>,
    pub tutorial: Option<bool>,
    pub player: PlayerSnapshot,
    pub enemies: Vec<EnemySnapshot>,
}

impl RunState {
    pub fn parse(text: Option<&str>) -> Self {
        let Some(Value::Object(state)) = parse_json(text) else {
            return Self::default();
        };

        let player = field_object(&state, "player")
            .map(PlayerSnapshot::from_object)
            .unwrap_or_default();
        // Non-object entries are skipped
        let enemies = state
            .get("enemies")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(EnemySnapshot::from_object)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            floor: field_number(&state, "floor"),
            phase: field_string(&state, "phase"),
            tutorial: field_bool(&state, "tutorial"),
            player,
            enemies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveRunSnapshot {
    pub run_id: i64,
    pub user_id: Option<i64>,
    /// `None` when the owning user does not exist
    pub username: Option<String>,
    pub started_at: Option<String>,
    pub floor: Option<Number>,
    pub phase: Option<String>,
    pub tutorial: Option<bool>,
    pub player: PlayerSnapshot,
    pub enemies: Vec<EnemySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEntry {
    pub id: i64,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub max_floor: i64,
    pub is_active: u8,
    pub is_tutorial: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStatsDetail {
    pub total_runs: i64,
    pub deaths: i64,
    pub treasures_found: i64,
    pub chests_opened: i64,
    pub deaths_by_floor: BTreeMap<String, i64>,
    pub kills_by_type: BTreeMap<String, i64>,
    pub hero_runs: BTreeMap<String, i64>,
    pub total_kills: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseEntry {
    pub created_at: Option<String>,
    pub stars: i64,
    pub levels: i64,
    pub xp_added: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEntry {
    pub created_at: Option<String>,
    pub action: Option<String>,
    pub stars: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeEntry {
    pub badge_id: Option<String>,
    pub count: i64,
    pub last_awarded_season: Option<String>,
    pub last_awarded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastEntry {
    pub broadcast_key: Option<String>,
    pub sent_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    pub id: i64,
    pub username: String,
    pub created_at: Option<String>,
    pub max_floor: i64,
    pub xp: i64,
    pub tutorial_done: i64,
    pub unlocked_heroes: Vec<String>,
    pub stats: UserStatsDetail,
    pub runs: Vec<RunEntry>,
    pub seasons: Vec<SeasonStatLine>,
    pub purchases: Vec<PurchaseEntry>,
    pub actions: Vec<ActionEntry>,
    pub badges: Vec<BadgeEntry>,
    pub broadcasts: Vec<BroadcastEntry>,
    pub active_run: Option<ActiveRunSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub username: String,
    pub max_floor: i64,
    pub xp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserListEntry {
    pub id: i64,
    pub username: String,
    pub max_floor: i64,
    pub xp: i64,
    pub created_at: Option<String>,
    pub in_current_season: bool,
}

fn group_by_user<T>(rows: &[T], user_id: impl Fn(&T) -> Option<i64>) -> HashMap<i64, Vec<&T>> {
    let mut grouped: HashMap<i64, Vec<&T>> = HashMap::new();
    for row in rows {
        if let Some(id) = user_id(row) {
            grouped.entry(id).or_default().push(row);
        }
    }
    grouped
}

/// Reverse-chronological by start; runs without a start time come first
fn compare_runs(a: &RunRow, b: &RunRow) -> Ordering {
    let start = |run: &RunRow| run.started_at.clone().filter(|s| !s.is_empty());
    match (start(a), start(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x),
    }
}

/// Sort users by (max_floor, xp) descending and keep the top entries
pub fn leaderboard(users: &[UserRow], size: usize) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&UserRow> = users.iter().collect();
    ranked.sort_by(|a, b| (b.max_floor, b.xp).cmp(&(a.max_floor, a.xp)));
    ranked
        .into_iter()
        .take(size)
        .map(|user| LeaderboardEntry {
            id: user.id,
            username: user.display_name(),
            max_floor: user.max_floor,
            xp: user.xp,
        })
        .collect()
}

/// Builds the cross-table structures of the report from indexed rows
pub struct DetailAssembler<'a> {
    snapshot: &'a StoreSnapshot,
    names: &'a NameResolver,
    seasons: &'a SeasonResolver<'a>,
    users_by_id: HashMap<i64, &'a UserRow>,
    stats_by_user: HashMap<i64, &'a UserStatsRow>,
    runs_by_user: HashMap<i64, Vec<&'a RunRow>>,
    active_run_by_user: HashMap<i64, &'a RunRow>,
}

impl<'a> DetailAssembler<'a> {
    pub fn new(
        snapshot: &'a StoreSnapshot,
        names: &'a NameResolver,
        seasons: &'a SeasonResolver<'a>,
    ) -> Self {
        let users_by_id = snapshot.users.iter().map(|u| (u.id, u)).collect();

        // Duplicate stats rows: the last one wins
        let mut stats_by_user = HashMap::new();
        for row in &snapshot.user_stats {
            if let Some(user_id) = row.user_id {
                stats_by_user.insert(user_id, row);
            }
        }

        let mut runs_by_user = group_by_user(&snapshot.runs, |r| r.user_id);
        for runs in runs_by_user.values_mut() {
            runs.sort_by(|a, b| compare_runs(a, b));
        }

        let mut active_run_by_user = HashMap::new();
        for run in snapshot.runs.iter().filter(|r| r.is_active) {
            if let Some(user_id) = run.user_id {
                active_run_by_user.entry(user_id).or_insert(run);
            }
        }

        Self {
            snapshot,
            names,
            seasons,
            users_by_id,
            stats_by_user,
            runs_by_user,
            active_run_by_user,
        }
    }

    fn snapshot_run(&self, run: &RunRow) -> ActiveRunSnapshot {
        let state = RunState::parse(run.state_json.as_deref());
        let username = run
            .user_id
            .and_then(|id| self.users_by_id.get(&id))
            .map(|user| user.display_name());

        ActiveRunSnapshot {
            run_id: run.id,
            user_id: run.user_id,
            username,
            started_at: run.started_at.clone(),
            floor: state.floor,
            phase: state.phase,
            tutorial: state.tutorial,
            player: state.player,
            enemies: state.enemies,
        }
    }

    /// Snapshot of every run flagged active, in store order
    pub fn active_runs(&self) -> Vec<ActiveRunSnapshot> {
        self.snapshot
            .runs
            .iter()
            .filter(|run| run.is_active)
            .map(|run| self.snapshot_run(run))
            .collect()
    }

    pub fn users_list(&self) -> Vec<UserListEntry> {
        self.snapshot
            .users
            .iter()
            .map(|user| UserListEntry {
                id: user.id,
                username: user.display_name(),
                max_floor: user.max_floor,
                xp: user.xp,
                created_at: user.created_at.clone(),
                in_current_season: self.seasons.in_current_season(user.id),
            })
            .collect()
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard(&self.snapshot.users, LEADERBOARD_SIZE)
    }

    /// Detail records keyed by stringified user id
    pub fn user_details(&self) -> BTreeMap<String, UserDetail> {
        let purchases = group_by_user(&self.snapshot.star_purchases, |r| r.user_id);
        let actions = group_by_user(&self.snapshot.star_actions, |r| r.user_id);
        let badges = group_by_user(&self.snapshot.user_badges, |r| r.user_id);
        let broadcasts = group_by_user(&self.snapshot.user_broadcasts, |r| r.user_id);
        let season_rows = group_by_user(&self.snapshot.user_season_stats, |r| r.user_id);

        let mut details = BTreeMap::new();
        for user in &self.snapshot.users {
            let id = user.id;
            let detail = UserDetail {
                id,
                username: user.display_name(),
                created_at: user.created_at.clone(),
                max_floor: user.max_floor,
                xp: user.xp,
                tutorial_done: user.tutorial_done,
                unlocked_heroes: parse_json_list(user.unlocked_heroes_json.as_deref())
                    .iter()
                    .map(|hero| self.names.hero_name(&key_string(hero)).to_string())
                    .collect(),
                stats: self.user_stats(id),
                runs: self
                    .runs_by_user
                    .get(&id)
                    .map(|runs| runs.iter().map(|run| run_entry(run)).collect())
                    .unwrap_or_default(),
                seasons: season_rows
                    .get(&id)
                    .map(|rows| {
                        rows.iter()
                            .filter_map(|row| self.seasons.stat_line(row, self.names))
                            .collect()
                    })
                    .unwrap_or_default(),
                purchases: purchases
                    .get(&id)
                    .map(|rows| {
                        rows.iter()
                            .map(|p| PurchaseEntry {
                                created_at: p.created_at.clone(),
                                stars: p.stars,
                                levels: p.levels,
                                xp_added: p.xp_added,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                actions: actions
                    .get(&id)
                    .map(|rows| {
                        rows.iter()
                            .map(|a| ActionEntry {
                                created_at: a.created_at.clone(),
                                action: a.action.clone(),
                                stars: a.stars,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                badges: badges
                    .get(&id)
                    .map(|rows| {
                        rows.iter()
                            .map(|b| BadgeEntry {
                                badge_id: b.badge_id.clone(),
                                count: b.count,
                                last_awarded_season: b.last_awarded_season.clone(),
                                last_awarded_at: b.last_awarded_at.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                broadcasts: broadcasts
                    .get(&id)
                    .map(|rows| {
                        rows.iter()
                            .map(|b| BroadcastEntry {
                                broadcast_key: b.broadcast_key.clone(),
                                sent_at: b.sent_at.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                active_run: self
                    .active_run_by_user
                    .get(&id)
                    .map(|run| self.snapshot_run(run)),
            };
            details.insert(id.to_string(), detail);
        }
        details
    }

    fn user_stats(&self, user_id: i64) -> UserStatsDetail {
        let Some(row) = self.stats_by_user.get(&user_id) else {
            return UserStatsDetail::default();
        };

        let deaths_by_floor = FrequencyCounter::from_json_counts(&parse_json_object(row.deaths_by_floor.as_deref()));
        let kills = FrequencyCounter::from_json_counts(&parse_json_object(row.kills_json.as_deref()));
        let hero_runs = FrequencyCounter::from_json_counts(&parse_json_object(row.hero_runs_json.as_deref()));

        UserStatsDetail {
            total_runs: row.total_runs,
            deaths: row.deaths,
            treasures_found: row.treasures_found,
            chests_opened: row.chests_opened,
            deaths_by_floor: deaths_by_floor.to_map(),
            kills_by_type: self.names.remap_enemies(&kills).to_map(),
            hero_runs: self.names.remap_heroes(&hero_runs).to_map(),
            total_kills: kills.total(),
        }
    }
}

fn run_entry(run: &RunRow) -> RunEntry {
    RunEntry {
        id: run.id,
        started_at: run.started_at.clone(),
        ended_at: run.ended_at.clone(),
        max_floor: run.max_floor,
        is_active: u8::from(run.is_active),
        is_tutorial: u8::from(run.is_tutorial),
    }
}
