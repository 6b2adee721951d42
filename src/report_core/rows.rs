//! Row model for the ten source tables
//!
//! Values are read as native SQLite values and coerced null-safely here, so the
//! aggregation code never sees a NULL counter or a TEXT-typed integer.

use rusqlite::types::Value;
use rusqlite::Row;

/// A table the store reader can fetch in full
pub trait StoreRow: Sized {
    const TABLE: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Coerce a column to an integer: NULL → 0, REAL truncated, TEXT parsed
pub fn int_value(value: &Value) -> i64 {
    match value {
        Value::Integer(i) => *i,
        Value::Real(f) if f.is_finite() => f.trunc() as i64,
        Value::Text(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Like [`int_value`] but keeps NULL distinguishable (join keys)
pub fn opt_int(value: &Value) -> Option<i64> {
    match value {
        Value::Null => None,
        Value::Text(s) => s.trim().parse().ok(),
        other => Some(int_value(other)),
    }
}

pub fn opt_text(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Null => None,
    }
}

/// Truthiness of a flag column ("0" and "" count as false)
pub fn flag_value(value: &Value) -> bool {
    match value {
        Value::Integer(i) => *i != 0,
        Value::Real(f) => *f != 0.0,
        Value::Text(s) => {
            let s = s.trim();
            !s.is_empty() && s != "0"
        }
        Value::Blob(bytes) => !bytes.is_empty(),
        Value::Null => false,
    }
}

fn col(row: &Row<'_>, name: &str) -> rusqlite::Result<Value> {
    row.get::<_, Value>(name)
}

#[derive(Debug, Clone, Default)]
pub struct UserRow {
    pub id: i64,
    pub username: Option<String>,
    pub xp: i64,
    pub max_floor: i64,
    pub tutorial_done: i64,
    pub created_at: Option<String>,
    pub unlocked_heroes_json: Option<String>,
}

impl UserRow {
    /// Username, or a synthesized `user_<id>` label when none is set
    pub fn display_name(&self) -> String {
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("user_{}", self.id),
        }
    }
}

impl StoreRow for UserRow {
    const TABLE: &'static str = "users";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: int_value(&col(row, "id")?),
            username: opt_text(&col(row, "username")?),
            xp: int_value(&col(row, "xp")?),
            max_floor: int_value(&col(row, "max_floor")?),
            tutorial_done: int_value(&col(row, "tutorial_done")?),
            created_at: opt_text(&col(row, "created_at")?),
            unlocked_heroes_json: opt_text(&col(row, "unlocked_heroes_json")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub max_floor: i64,
    pub is_active: bool,
    pub is_tutorial: bool,
    pub state_json: Option<String>,
}

impl StoreRow for RunRow {
    const TABLE: &'static str = "runs";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: int_value(&col(row, "id")?),
            user_id: opt_int(&col(row, "user_id")?),
            started_at: opt_text(&col(row, "started_at")?),
            ended_at: opt_text(&col(row, "ended_at")?),
            max_floor: int_value(&col(row, "max_floor")?),
            is_active: flag_value(&col(row, "is_active")?),
            is_tutorial: flag_value(&col(row, "is_tutorial")?),
            state_json: opt_text(&col(row, "state_json")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserStatsRow {
    pub user_id: Option<i64>,
    pub total_runs: i64,
    pub deaths: i64,
    pub treasures_found: i64,
    pub chests_opened: i64,
    pub deaths_by_floor: Option<String>,
    pub kills_json: Option<String>,
    pub hero_runs_json: Option<String>,
}

impl StoreRow for UserStatsRow {
    const TABLE: &'static str = "user_stats";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: opt_int(&col(row, "user_id")?),
            total_runs: int_value(&col(row, "total_runs")?),
            deaths: int_value(&col(row, "deaths")?),
            treasures_found: int_value(&col(row, "treasures_found")?),
            chests_opened: int_value(&col(row, "chests_opened")?),
            deaths_by_floor: opt_text(&col(row, "deaths_by_floor")?),
            kills_json: opt_text(&col(row, "kills_json")?),
            hero_runs_json: opt_text(&col(row, "hero_runs_json")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserBadgeRow {
    pub user_id: Option<i64>,
    pub badge_id: Option<String>,
    pub count: i64,
    pub last_awarded_season: Option<String>,
    pub last_awarded_at: Option<String>,
}

impl StoreRow for UserBadgeRow {
    const TABLE: &'static str = "user_badges";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: opt_int(&col(row, "user_id")?),
            badge_id: opt_text(&col(row, "badge_id")?),
            count: int_value(&col(row, "count")?),
            last_awarded_season: opt_text(&col(row, "last_awarded_season")?),
            last_awarded_at: opt_text(&col(row, "last_awarded_at")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserBroadcastRow {
    pub user_id: Option<i64>,
    pub broadcast_key: Option<String>,
    pub sent_at: Option<String>,
}

impl StoreRow for UserBroadcastRow {
    const TABLE: &'static str = "user_broadcasts";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: opt_int(&col(row, "user_id")?),
            broadcast_key: opt_text(&col(row, "broadcast_key")?),
            sent_at: opt_text(&col(row, "sent_at")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeasonRow {
    pub id: i64,
    pub season_key: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

impl SeasonRow {
    /// A season with no (or an empty) end timestamp is still running
    pub fn is_open(&self) -> bool {
        self.ended_at.as_deref().map_or(true, |s| s.trim().is_empty())
    }
}

impl StoreRow for SeasonRow {
    const TABLE: &'static str = "seasons";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: int_value(&col(row, "id")?),
            season_key: opt_text(&col(row, "season_key")?),
            started_at: opt_text(&col(row, "started_at")?),
            ended_at: opt_text(&col(row, "ended_at")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserSeasonStatsRow {
    pub user_id: Option<i64>,
    pub season_id: Option<i64>,
    pub max_floor: i64,
    pub total_runs: i64,
    pub deaths: i64,
    pub treasures_found: i64,
    pub chests_opened: i64,
    pub xp_gained: i64,
    pub max_floor_character: Option<String>,
}

impl StoreRow for UserSeasonStatsRow {
    const TABLE: &'static str = "user_season_stats";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: opt_int(&col(row, "user_id")?),
            season_id: opt_int(&col(row, "season_id")?),
            max_floor: int_value(&col(row, "max_floor")?),
            total_runs: int_value(&col(row, "total_runs")?),
            deaths: int_value(&col(row, "deaths")?),
            treasures_found: int_value(&col(row, "treasures_found")?),
            chests_opened: int_value(&col(row, "chests_opened")?),
            xp_gained: int_value(&col(row, "xp_gained")?),
            max_floor_character: opt_text(&col(row, "max_floor_character")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeasonHistoryRow {
    pub season_key: Option<String>,
    pub season_number: Option<i64>,
    pub winners_json: Option<String>,
    pub summary_json: Option<String>,
}

impl StoreRow for SeasonHistoryRow {
    const TABLE: &'static str = "season_history";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            season_key: opt_text(&col(row, "season_key")?),
            season_number: opt_int(&col(row, "season_number")?),
            winners_json: opt_text(&col(row, "winners_json")?),
            summary_json: opt_text(&col(row, "summary_json")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StarPurchaseRow {
    pub user_id: Option<i64>,
    pub created_at: Option<String>,
    pub stars: i64,
    pub levels: i64,
    pub xp_added: i64,
}

impl StoreRow for StarPurchaseRow {
    const TABLE: &'static str = "star_purchases";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: opt_int(&col(row, "user_id")?),
            created_at: opt_text(&col(row, "created_at")?),
            stars: int_value(&col(row, "stars")?),
            levels: int_value(&col(row, "levels")?),
            xp_added: int_value(&col(row, "xp_added")?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StarActionRow {
    pub user_id: Option<i64>,
    pub created_at: Option<String>,
    pub action: Option<String>,
    pub stars: i64,
}

impl StoreRow for StarActionRow {
    const TABLE: &'static str = "star_actions";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: opt_int(&col(row, "user_id")?),
            created_at: opt_text(&col(row, "created_at")?),
            action: opt_text(&col(row, "action")?),
            stars: int_value(&col(row, "stars")?),
        })
    }
}

/// Full contents of every source table, in store (rowid) order
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub users: Vec<UserRow>,
    pub runs: Vec<RunRow>,
    pub user_stats: Vec<UserStatsRow>,
    pub user_badges: Vec<UserBadgeRow>,
    pub user_broadcasts: Vec<UserBroadcastRow>,
    pub seasons: Vec<SeasonRow>,
    pub user_season_stats: Vec<UserSeasonStatsRow>,
    pub season_history: Vec<SeasonHistoryRow>,
    pub star_purchases: Vec<StarPurchaseRow>,
    pub star_actions: Vec<StarActionRow>,
}
