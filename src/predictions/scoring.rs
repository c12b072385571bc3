//! Pre-match outcome heuristic.
//!
//! A pure, deterministic pipeline from two teams' season statistics to a
//! [`MatchForecast`]:
//!
//! 1. **Strength**: win rate and per-game goal differential at the relevant
//!    venue, plus a fixed home advantage.
//! 2. **Probabilities**: strengths are turned into clamped raw shares, then
//!    rescaled so home/draw/away sum to exactly 100.
//! 3. **Outcome**: predicted winner and confidence from the three shares.
//! 4. **Over 2.5**: independent check on season scoring averages.
//!
//! There is no randomness. Variance between fixtures comes from
//! [`deterministic_variation`] seeded with the two team ids, so the same
//! fixture always yields the same forecast.

use chrono::FixedOffset;

use super::models::{MatchContext, MatchForecast, NormalizedStats, Probabilities, TeamSeasonStats, Winner};
use super::stats::{goal_trends, normalize};

/// Salt for the win/loss swing.
pub const WIN_VARIATION_SALT: i64 = 7;
/// Salt for the draw swing.
pub const DRAW_VARIATION_SALT: i64 = 13;

/// Strength bonus for playing at home.
const HOME_ADVANTAGE: f64 = 10.0;
/// Floor added to the strength total so near-zero strengths stay bounded.
const STRENGTH_FLOOR: f64 = 25.0;
const BASE_DRAW: f64 = 30.0;

const HOME_RANGE: (f64, f64) = (20.0, 60.0);
const AWAY_RANGE: (f64, f64) = (15.0, 55.0);
const DRAW_RANGE: (f64, f64) = (20.0, 40.0);

/// Over-2.5 thresholds.
pub const OVER25_MIN_AVG_GOALS: f64 = 2.5;
pub const OVER25_MIN_PCT: u32 = 10;

// ── Variation ────────────────────────────────────────────────────────────────

/// Reproducible pseudo-random value in `[0, 1)`:
/// `((id_a + id_b * factor) mod 100) / 100`.
///
/// The modulo is euclidean, so negative ids still land in range.
pub fn deterministic_variation(id_a: i64, id_b: i64, factor: i64) -> f64 {
    let combined = i128::from(id_a) + i128::from(id_b) * i128::from(factor);
    combined.rem_euclid(100) as f64 / 100.0
}

// ── Strength ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strength {
    pub home: f64,
    pub away: f64,
}

pub fn strength(stats: &NormalizedStats, home_id: i64, away_id: i64) -> Strength {
    // Never zero: normalization replaces zero counts with defaults.
    let home_played = f64::from(stats.home_games_played());
    let away_played = f64::from(stats.away_games_played());

    let home_win_rate = 100.0 * f64::from(stats.home_wins) / home_played;
    let away_win_rate = 100.0 * f64::from(stats.away_wins) / away_played;

    let home_goal_diff =
        (f64::from(stats.home_goals_for) - f64::from(stats.home_goals_against)) / home_played;
    let away_goal_diff =
        (f64::from(stats.away_goals_for) - f64::from(stats.away_goals_against)) / away_played;

    // -15..+15
    let variation = (deterministic_variation(home_id, away_id, WIN_VARIATION_SALT) - 0.5) * 30.0;

    Strength {
        home: home_win_rate * 0.4 + home_goal_diff * 8.0 + variation + HOME_ADVANTAGE,
        away: away_win_rate * 0.4 + away_goal_diff * 8.0 - variation / 2.0,
    }
}

// ── Probabilities ────────────────────────────────────────────────────────────

/// Turn two strengths into home/draw/away percentages summing to 100.
///
/// Home and away are rounded independently (half away from zero); draw takes
/// whatever remains, so it absorbs all rounding error.
pub fn normalize_probabilities(strength: Strength, home_id: i64, away_id: i64) -> Probabilities {
    let total = strength.home.abs() + strength.away.abs() + STRENGTH_FLOOR;

    let home_raw = (strength.home / total * 100.0).clamp(HOME_RANGE.0, HOME_RANGE.1);
    let away_raw = (strength.away / total * 100.0).clamp(AWAY_RANGE.0, AWAY_RANGE.1);

    // -5..+5
    let draw_variation = deterministic_variation(home_id, away_id, DRAW_VARIATION_SALT) * 10.0 - 5.0;
    let draw_raw = (BASE_DRAW + draw_variation).clamp(DRAW_RANGE.0, DRAW_RANGE.1);

    let sum = home_raw + draw_raw + away_raw;
    let home = (home_raw / sum * 100.0).round() as u32;
    let away = (away_raw / sum * 100.0).round() as u32;

    Probabilities {
        home,
        draw: 100 - home - away,
        away,
    }
}

// ── Outcome ──────────────────────────────────────────────────────────────────

/// Predicted winner and confidence.
///
/// Home needs to beat both others strictly; away only has to beat draw;
/// draw is the fallback. Confidence is the largest of the three shares.
pub fn classify_outcome(p: &Probabilities) -> (Winner, u32) {
    let winner = if p.home > p.away && p.home > p.draw {
        Winner::Home
    } else if p.away > p.draw {
        Winner::Away
    } else {
        Winner::Draw
    };
    (winner, p.home.max(p.draw).max(p.away))
}

// ── Over 2.5 ─────────────────────────────────────────────────────────────────

pub fn is_likely_over25(avg_goals: f64, over25_pct: u32) -> bool {
    avg_goals >= OVER25_MIN_AVG_GOALS && over25_pct >= OVER25_MIN_PCT
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Build the full forecast for one fixture.
pub fn predict_match(
    ctx: &MatchContext,
    home: &TeamSeasonStats,
    away: &TeamSeasonStats,
    display_offset: FixedOffset,
) -> MatchForecast {
    let normalized = normalize(home, away);
    let s = strength(&normalized, ctx.home_id, ctx.away_id);
    let probs = normalize_probabilities(s, ctx.home_id, ctx.away_id);
    let (predicted_winner, confidence) = classify_outcome(&probs);
    let trends = goal_trends(home, away);

    MatchForecast {
        home_team: ctx.home_team.clone(),
        away_team: ctx.away_team.clone(),
        league: ctx.league.clone(),
        match_date: ctx.display_date(display_offset),
        match_time: ctx.display_time(display_offset),
        avg_goals: trends.avg_goals,
        over25_pct: trends.over25_pct,
        is_likely_over25: is_likely_over25(trends.avg_goals, trends.over25_pct),
        home_win_prob: probs.home,
        draw_prob: probs.draw,
        away_win_prob: probs.away,
        predicted_winner,
        confidence,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
