//! Scalar totals, frequency distributions, time-series and monetization
//!
//! Everything is recomputed from the raw rows on each call. All ratios go
//! through [`ratio`], so an empty store produces zeros rather than NaN.

use super::counter::FrequencyCounter;
use super::json_fields::{key_string, parse_json_list, parse_json_object};
use super::names::NameResolver;
use super::rows::StoreSnapshot;
use super::timestamps::parse_opt_timestamp;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Bucket for star actions without a label
pub const UNKNOWN_ACTION: &str = "unknown";

/// `numerator / denominator`, or 0 when the denominator is zero
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Two decimals, exact halves to even (`2.125` → `2.12`)
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round_ties_even() / 100.0
    } else {
        0.0
    }
}

/// Sum that clamps at the i64 bounds instead of overflowing
pub fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0, i64::saturating_add)
}

/// All-time scalars for the summary block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total_users_all: i64,
    pub total_runs_all: i64,
    pub active_runs: i64,
    pub total_xp_all: i64,
    pub total_max_floor: i64,
    pub avg_max_floor_all: f64,
    pub tutorial_completion_rate: f64,
    pub total_deaths: i64,
    pub total_kills: i64,
    pub total_treasures: i64,
    pub total_chests: i64,
    pub avg_run_minutes: f64,
    pub runs_today: i64,
    pub runs_last_7_days: i64,
    pub avg_floor_today: f64,
    pub avg_floor_last_7_days: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distributions {
    pub deaths_by_floor: Vec<(String, i64)>,
    pub kills_by_type: Vec<(String, i64)>,
    pub hero_runs: Vec<(String, i64)>,
    pub unlocked_heroes: Vec<(String, i64)>,
    pub run_max_floor: Vec<(String, i64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeseries {
    pub runs_per_day: Vec<DayCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Monetization {
    pub purchase_count: i64,
    pub stars_bought: i64,
    pub levels_bought: i64,
    pub xp_from_purchases: i64,
    pub stars_spent: i64,
    pub spend_action_count: i64,
    pub actions_by_type: Vec<(String, i64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub totals: Totals,
    pub distributions: Distributions,
    pub timeseries: Timeseries,
    pub monetization: Monetization,
}

/// Compute every all-time figure of the report.
///
/// `today` is the local calendar date used for the today / last-7-days figures.
pub fn aggregate(snapshot: &StoreSnapshot, names: &NameResolver, today: NaiveDate) -> Aggregates {
    let mut totals = Totals::default();
    let mut distributions = Distributions::default();

    user_totals(snapshot, names, &mut totals, &mut distributions);
    stats_totals(snapshot, names, &mut totals, &mut distributions);
    let timeseries = run_activity(snapshot, today, &mut totals, &mut distributions);

    Aggregates {
        totals,
        distributions,
        timeseries,
        monetization: monetization(snapshot),
    }
}

fn user_totals(
    snapshot: &StoreSnapshot,
    names: &NameResolver,
    totals: &mut Totals,
    distributions: &mut Distributions,
) {
    let users = &snapshot.users;
    totals.total_users_all = users.len() as i64;
    totals.total_xp_all = saturating_sum(users.iter().map(|u| u.xp));
    totals.total_max_floor = saturating_sum(users.iter().map(|u| u.max_floor));
    totals.avg_max_floor_all = round2(ratio(
        totals.total_max_floor as f64,
        totals.total_users_all as f64,
    ));

    let tutorial_done = users.iter().filter(|u| u.tutorial_done != 0).count();
    totals.tutorial_completion_rate = round2(ratio(
        tutorial_done as f64 * 100.0,
        totals.total_users_all as f64,
    ));

    let mut unlocked = FrequencyCounter::new();
    for user in users {
        for hero in parse_json_list(user.unlocked_heroes_json.as_deref()) {
            unlocked.add(key_string(&hero), 1);
        }
    }
    distributions.unlocked_heroes = names.remap_heroes(&unlocked).most_common();
}

fn stats_totals(
    snapshot: &StoreSnapshot,
    names: &NameResolver,
    totals: &mut Totals,
    distributions: &mut Distributions,
) {
    let mut deaths_by_floor = FrequencyCounter::new();
    let mut kills = FrequencyCounter::new();
    let mut hero_runs = FrequencyCounter::new();

    for row in &snapshot.user_stats {
        totals.total_deaths = totals.total_deaths.saturating_add(row.deaths);
        totals.total_treasures = totals.total_treasures.saturating_add(row.treasures_found);
        totals.total_chests = totals.total_chests.saturating_add(row.chests_opened);
        deaths_by_floor.add_json_counts(&parse_json_object(row.deaths_by_floor.as_deref()));
        kills.add_json_counts(&parse_json_object(row.kills_json.as_deref()));
        hero_runs.add_json_counts(&parse_json_object(row.hero_runs_json.as_deref()));
    }

    let kills = names.remap_enemies(&kills);
    totals.total_kills = kills.total();

    distributions.deaths_by_floor = deaths_by_floor.most_common();
    distributions.kills_by_type = kills.most_common();
    distributions.hero_runs = names.remap_heroes(&hero_runs).most_common();
}

fn run_activity(
    snapshot: &StoreSnapshot,
    today: NaiveDate,
    totals: &mut Totals,
    distributions: &mut Distributions,
) -> Timeseries {
    let week_start = today - Duration::days(6);

    let mut run_max_floor = FrequencyCounter::new();
    let mut runs_per_day = FrequencyCounter::new();
    let mut durations = Vec::new();
    let mut today_floor_sum = 0i64;
    let mut week_floor_sum = 0i64;

    totals.total_runs_all = snapshot.runs.len() as i64;

    for run in &snapshot.runs {
        if run.is_active {
            totals.active_runs += 1;
        }
        run_max_floor.add(run.max_floor.to_string(), 1);

        let started = parse_opt_timestamp(run.started_at.as_deref());
        if let Some(started) = started {
            let day = started.date_naive();
            runs_per_day.add(day.format("%Y-%m-%d").to_string(), 1);
            if day == today {
                totals.runs_today += 1;
                today_floor_sum = today_floor_sum.saturating_add(run.max_floor);
            }
            if week_start <= day && day <= today {
                totals.runs_last_7_days += 1;
                week_floor_sum = week_floor_sum.saturating_add(run.max_floor);
            }
        }

        let ended = parse_opt_timestamp(run.ended_at.as_deref());
        if let (Some(started), Some(ended)) = (started, ended) {
            let minutes = (ended - started).num_milliseconds() as f64 / 60_000.0;
            if minutes >= 0.0 {
                durations.push(minutes);
            }
        }
    }

    totals.avg_run_minutes = round2(ratio(durations.iter().sum(), durations.len() as f64));
    totals.avg_floor_today = round2(ratio(today_floor_sum as f64, totals.runs_today as f64));
    totals.avg_floor_last_7_days = round2(ratio(
        week_floor_sum as f64,
        totals.runs_last_7_days as f64,
    ));

    // Count ties break by the higher floor first
    let mut floors = run_max_floor.most_common();
    floors.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| floor_key(&b.0).cmp(&floor_key(&a.0)))
    });
    distributions.run_max_floor = floors;

    Timeseries {
        runs_per_day: runs_per_day
            .sorted_by_key()
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect(),
    }
}

fn floor_key(key: &str) -> i64 {
    key.parse().unwrap_or(0)
}

fn monetization(snapshot: &StoreSnapshot) -> Monetization {
    let purchases = &snapshot.star_purchases;
    let mut actions_by_type = FrequencyCounter::new();
    let mut stars_spent = 0i64;

    for action in &snapshot.star_actions {
        let label = match action.action.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => UNKNOWN_ACTION,
        };
        actions_by_type.add(label, 1);
        stars_spent = stars_spent.saturating_add(action.stars);
    }

    Monetization {
        purchase_count: purchases.len() as i64,
        stars_bought: saturating_sum(purchases.iter().map(|p| p.stars)),
        levels_bought: saturating_sum(purchases.iter().map(|p| p.levels)),
        xp_from_purchases: saturating_sum(purchases.iter().map(|p| p.xp_added)),
        stars_spent,
        spend_action_count: snapshot.star_actions.len() as i64,
        actions_by_type: actions_by_type.most_common(),
    }
}
