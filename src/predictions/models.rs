use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A count split by the venue it was recorded at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VenueSplit {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

/// One team's season statistics as delivered by the upstream feed.
///
/// Every field is optional: the feed omits blocks for teams with no
/// recorded games, and the normalizer fills the gaps with fixed defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamSeasonStats {
    pub wins: VenueSplit,
    pub draws: VenueSplit,
    pub losses: VenueSplit,
    pub goals_for: VenueSplit,
    pub goals_against: VenueSplit,
    /// Season goals-for per game (`goals.for.average.total`)
    pub goals_for_average: Option<f64>,
    /// `goals.for.percentage.total`, 0–100
    pub goals_for_percentage: Option<f64>,
}

/// The ten venue-specific numbers the strength scorer works on: the home
/// team's home record and the away team's away record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedStats {
    pub home_wins: u32,
    pub home_draws: u32,
    pub home_losses: u32,
    pub away_wins: u32,
    pub away_draws: u32,
    pub away_losses: u32,
    pub home_goals_for: u32,
    pub home_goals_against: u32,
    pub away_goals_for: u32,
    pub away_goals_against: u32,
}

impl NormalizedStats {
    pub fn home_games_played(&self) -> u32 {
        self.home_wins
            .saturating_add(self.home_draws)
            .saturating_add(self.home_losses)
    }

    pub fn away_games_played(&self) -> u32 {
        self.away_wins
            .saturating_add(self.away_draws)
            .saturating_add(self.away_losses)
    }
}

/// A scheduled fixture. Team ids only seed the deterministic variation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchContext {
    pub fixture_id: i64,
    pub home_id: i64,
    pub home_team: String,
    pub away_id: i64,
    pub away_team: String,
    pub league_id: i64,
    pub league: String,
    pub kickoff: DateTime<Utc>,
}

impl MatchContext {
    /// Kickoff date as `d/m/yyyy` in the display offset.
    pub fn display_date(&self, offset: FixedOffset) -> String {
        format_display_date(self.kickoff.with_timezone(&offset))
    }

    /// Kickoff time as `HH:MM` in the display offset.
    pub fn display_time(&self, offset: FixedOffset) -> String {
        self.kickoff.with_timezone(&offset).format("%H:%M").to_string()
    }
}

pub fn format_display_date(at: DateTime<FixedOffset>) -> String {
    at.format("%-d/%-m/%Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Home,
    Draw,
    Away,
}

/// Three integer percentages that always sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probabilities {
    pub home: u32,
    pub draw: u32,
    pub away: u32,
}

/// Forecast for a single fixture, serialized in the shape the dashboard expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchForecast {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub match_date: String,
    pub match_time: String,
    /// Sum of both teams' season goals-for averages
    pub avg_goals: f64,
    pub over25_pct: u32,
    pub is_likely_over25: bool,
    pub home_win_prob: u32,
    pub draw_prob: u32,
    pub away_win_prob: u32,
    pub predicted_winner: Winner,
    pub confidence: u32,
}

/// Confidence at or above which a forecast is worth publishing on its own.
pub const RECOMMEND_CONFIDENCE: u32 = 50;

impl MatchForecast {
    /// Forecasts shown as cards and included in chat messages.
    pub fn is_recommended(&self) -> bool {
        self.is_likely_over25 || self.confidence >= RECOMMEND_CONFIDENCE
    }

    pub fn winner_label(&self) -> &str {
        match self.predicted_winner {
            Winner::Home => &self.home_team,
            Winner::Away => &self.away_team,
            Winner::Draw => "Empate",
        }
    }
}

/// Result of one forecast run, flagged when the fixed fallback set was served.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBatch {
    pub predictions: Vec<MatchForecast>,
    pub is_backup: bool,
}

impl PredictionBatch {
    /// Number of forecasts with an over-2.5 recommendation.
    pub fn over25_count(&self) -> usize {
        self.predictions.iter().filter(|p| p.is_likely_over25).count()
    }
}
