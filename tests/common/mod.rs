//! Shared SQLite fixture for the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use ruins_stats::StatsConfig;
use std::fs;
use std::path::Path;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

pub fn at(hour: u32, min: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, hour, min, 0).unwrap()
}

pub fn config_for(dir: &Path) -> StatsConfig {
    StatsConfig {
        db_path: dir.join("ruins.db"),
        game_data_dir: Some(dir.join("data")),
        output_path: dir.join("public").join("data").join("stats.json"),
        public_dir: dir.join("public"),
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        username TEXT,
        xp INTEGER DEFAULT 0,
        max_floor INTEGER DEFAULT 0,
        tutorial_done INTEGER DEFAULT 0,
        created_at TEXT,
        unlocked_heroes_json TEXT
    );
    CREATE TABLE runs (
        id INTEGER PRIMARY KEY,
        user_id INTEGER,
        started_at TEXT,
        ended_at TEXT,
        max_floor INTEGER DEFAULT 0,
        is_active INTEGER DEFAULT 0,
        is_tutorial INTEGER DEFAULT 0,
        state_json TEXT
    );
    CREATE TABLE user_stats (
        user_id INTEGER PRIMARY KEY,
        total_runs INTEGER DEFAULT 0,
        deaths INTEGER DEFAULT 0,
        treasures_found INTEGER DEFAULT 0,
        chests_opened INTEGER DEFAULT 0,
        deaths_by_floor TEXT,
        kills_json TEXT,
        hero_runs_json TEXT
    );
    CREATE TABLE user_badges (
        user_id INTEGER,
        badge_id TEXT,
        count INTEGER DEFAULT 0,
        last_awarded_season TEXT,
        last_awarded_at TEXT
    );
    CREATE TABLE user_broadcasts (
        user_id INTEGER,
        broadcast_key TEXT,
        sent_at TEXT
    );
    CREATE TABLE seasons (
        id INTEGER PRIMARY KEY,
        season_key TEXT,
        started_at TEXT,
        ended_at TEXT
    );
    CREATE TABLE user_season_stats (
        user_id INTEGER,
        season_id INTEGER,
        max_floor INTEGER DEFAULT 0,
        total_runs INTEGER DEFAULT 0,
        deaths INTEGER DEFAULT 0,
        treasures_found INTEGER DEFAULT 0,
        chests_opened INTEGER DEFAULT 0,
        xp_gained INTEGER DEFAULT 0,
        max_floor_character TEXT
    );
    CREATE TABLE season_history (
        season_key TEXT,
        season_number INTEGER,
        winners_json TEXT,
        summary_json TEXT
    );
    CREATE TABLE star_purchases (
        user_id INTEGER,
        created_at TEXT,
        stars INTEGER DEFAULT 0,
        levels INTEGER DEFAULT 0,
        xp_added INTEGER DEFAULT 0
    );
    CREATE TABLE star_actions (
        user_id INTEGER,
        created_at TEXT,
        action TEXT,
        stars INTEGER DEFAULT 0
    );
";

const ACTIVE_STATE: &str = r#"{
    "floor": 3,
    "phase": "combat",
    "tutorial": false,
    "player": {"hp": 20, "hp_max": 30, "weapon": {"name": "Меч"}, "potions": [1, 2], "scrolls": []},
    "enemies": [{"name": "Скелет", "hp": 5, "max_hp": 10, "danger": 2}, "junk"]
}"#;

/// Three users, four runs (two active, one owned by a missing user), two
/// seasons (S2 open), star purchases and actions, one malformed kill column.
pub fn create_fixture(dir: &Path) -> StatsConfig {
    let config = config_for(dir);

    let conn = Connection::open(&config.db_path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    conn.execute_batch(
        "INSERT INTO users VALUES (1, 'mira', 500, 7, 1, '2025-05-01T10:00:00', '[\"wanderer\", \"berserk\"]');
         INSERT INTO users VALUES (2, NULL, 200, 7, 0, '2025-05-02T10:00:00', '[\"wanderer\"]');
         INSERT INTO users VALUES (3, 'bob', 900, 3, 1, '2025-05-03T10:00:00', '[\"assassin\"]');

         INSERT INTO runs VALUES (1, 1, '2025-06-09T10:00:00', '2025-06-09T10:30:00', 5, 0, 0, NULL);
         INSERT INTO runs VALUES (3, 2, '2025-06-10T11:00:00', '2025-06-10T11:10:00', 7, 0, 1, NULL);
         INSERT INTO runs VALUES (4, 99, '2025-06-08T11:00:00', NULL, 2, 1, 0, '{broken');

         INSERT INTO user_stats VALUES (1, 2, 1, 3, 4, '{\"3\": 1}', '{\"skeleton\": 4, \"rat\": 2}', '{\"wanderer\": 2}');
         INSERT INTO user_stats VALUES (2, 1, 1, 0, 1, '{\"3\": 1}', 'not json', '{\"berserk\": 1}');

         INSERT INTO user_badges VALUES (1, 'season_top1', 1, 'S1', '2025-05-01T00:00:00');
         INSERT INTO user_broadcasts VALUES (1, 's2_launch', '2025-05-01T00:00:00');

         INSERT INTO seasons VALUES (1, 'S1', '2025-04-01T00:00:00', '2025-05-01T00:00:00');
         INSERT INTO seasons VALUES (2, 'S2', '2025-05-01T00:00:00', NULL);

         INSERT INTO user_season_stats VALUES (1, 1, 4, 5, 1, 0, 0, 100, 'wanderer');
         INSERT INTO user_season_stats VALUES (1, 2, 7, 2, 1, 3, 4, 300, 'berserk');
         INSERT INTO user_season_stats VALUES (2, 2, 7, 1, 1, 0, 1, 50, NULL);

         INSERT INTO season_history VALUES ('S1', 1, '{\"1\": \"mira\"}', '{\"players\": 2}');

         INSERT INTO star_purchases VALUES (1, '2025-06-01T00:00:00', 50, 2, 400);
         INSERT INTO star_purchases VALUES (3, '2025-06-02T00:00:00', 25, 1, 200);

         INSERT INTO star_actions VALUES (1, '2025-06-03T00:00:00', 'revive', 10);
         INSERT INTO star_actions VALUES (1, '2025-06-04T00:00:00', NULL, 5);
         INSERT INTO star_actions VALUES (3, '2025-06-05T00:00:00', 'revive', 10);",
    )
    .unwrap();

    conn.execute(
        "INSERT INTO runs VALUES (2, 1, '2025-06-10T09:00:00', NULL, 3, 1, 0, ?1)",
        [ACTIVE_STATE],
    )
    .unwrap();

    let data_dir = dir.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("enemies.json"),
        r#"[{"id": "skeleton", "name": "Скелет"}, {"id": 7}]"#,
    )
    .unwrap();

    config
}
