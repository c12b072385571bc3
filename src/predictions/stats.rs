//! Stat normalization: turns the loosely-structured `teams/statistics`
//! payload into the fixed set of numbers the scorer needs.
//!
//! Nothing here fails. A field that is missing, non-numeric or zero is
//! replaced by a fixed default so that games played is never zero.

use serde_json::Value;

use super::models::{NormalizedStats, TeamSeasonStats, VenueSplit};

pub const DEFAULT_HOME_WINS: u32 = 8;
pub const DEFAULT_HOME_DRAWS: u32 = 4;
pub const DEFAULT_HOME_LOSSES: u32 = 3;
pub const DEFAULT_AWAY_WINS: u32 = 5;
pub const DEFAULT_AWAY_DRAWS: u32 = 6;
pub const DEFAULT_AWAY_LOSSES: u32 = 4;
pub const DEFAULT_HOME_GOALS_FOR: u32 = 18;
pub const DEFAULT_HOME_GOALS_AGAINST: u32 = 12;
pub const DEFAULT_AWAY_GOALS_FOR: u32 = 14;
pub const DEFAULT_AWAY_GOALS_AGAINST: u32 = 16;

/// Ceiling for any single season count; larger values are clamped to it.
pub const MAX_COUNT: u32 = 1_000;

impl TeamSeasonStats {
    /// Read the statistics object returned by the upstream feed.
    pub fn from_json(raw: &Value) -> Self {
        TeamSeasonStats {
            wins: venue_split(&raw["fixtures"]["wins"]),
            draws: venue_split(&raw["fixtures"]["draws"]),
            losses: venue_split(&raw["fixtures"]["loses"]),
            goals_for: venue_split(&raw["goals"]["for"]["total"]),
            goals_against: venue_split(&raw["goals"]["against"]["total"]),
            goals_for_average: read_number(&raw["goals"]["for"]["average"]["total"]),
            goals_for_percentage: read_number(&raw["goals"]["for"]["percentage"]["total"]),
        }
    }
}

fn venue_split(v: &Value) -> VenueSplit {
    VenueSplit {
        home: read_count(&v["home"]),
        away: read_count(&v["away"]),
    }
}

/// Non-negative integer, either as a JSON number or a numeric string,
/// clamped to [`MAX_COUNT`].
fn read_count(v: &Value) -> Option<u32> {
    let n = v
        .as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))?;
    Some(n.min(u64::from(MAX_COUNT)) as u32)
}

/// Float from a JSON number or a string such as `"1.7"` or `"45%"`.
fn read_number(v: &Value) -> Option<f64> {
    let n = v.as_f64().or_else(|| {
        v.as_str()
            .and_then(|s| s.trim().trim_end_matches('%').trim().parse::<f64>().ok())
    })?;
    n.is_finite().then_some(n)
}

fn or_default(value: Option<u32>, default: u32) -> u32 {
    match value {
        Some(n) if n > 0 => n,
        _ => default,
    }
}

/// Combine the home team's home record with the away team's away record.
pub fn normalize(home: &TeamSeasonStats, away: &TeamSeasonStats) -> NormalizedStats {
    NormalizedStats {
        home_wins: or_default(home.wins.home, DEFAULT_HOME_WINS),
        home_draws: or_default(home.draws.home, DEFAULT_HOME_DRAWS),
        home_losses: or_default(home.losses.home, DEFAULT_HOME_LOSSES),
        away_wins: or_default(away.wins.away, DEFAULT_AWAY_WINS),
        away_draws: or_default(away.draws.away, DEFAULT_AWAY_DRAWS),
        away_losses: or_default(away.losses.away, DEFAULT_AWAY_LOSSES),
        home_goals_for: or_default(home.goals_for.home, DEFAULT_HOME_GOALS_FOR),
        home_goals_against: or_default(home.goals_against.home, DEFAULT_HOME_GOALS_AGAINST),
        away_goals_for: or_default(away.goals_for.away, DEFAULT_AWAY_GOALS_FOR),
        away_goals_against: or_default(away.goals_against.away, DEFAULT_AWAY_GOALS_AGAINST),
    }
}

/// Season scoring trend of both sides, kept apart from the per-venue
/// goal differential used for strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalTrends {
    pub avg_goals: f64,
    pub over25_pct: u32,
}

pub fn goal_trends(home: &TeamSeasonStats, away: &TeamSeasonStats) -> GoalTrends {
    let avg_goals = home.goals_for_average.unwrap_or(0.0) + away.goals_for_average.unwrap_or(0.0);
    let pct_sum =
        home.goals_for_percentage.unwrap_or(0.0) + away.goals_for_percentage.unwrap_or(0.0);
    let over25_pct = (pct_sum / 2.0).round().clamp(0.0, 100.0) as u32;
    GoalTrends {
        avg_goals,
        over25_pct,
    }
}
