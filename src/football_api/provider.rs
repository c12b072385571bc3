use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::predictions::MatchContext;

/// Failure talking to the upstream statistics API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered 200 but listed errors in the payload (bad key, quota, ...).
    #[error("API reported errors: {0}")]
    Api(String),
}

/// Source of fixtures and team statistics.
#[async_trait]
pub trait FootballDataSource: Send + Sync {
    /// All fixtures scheduled on `date` (UTC).
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<MatchContext>, ApiError>;

    /// Raw season statistics for one team in one league.
    async fn fetch_team_statistics(
        &self,
        team_id: i64,
        league_id: i64,
        season: i32,
    ) -> Result<serde_json::Value, ApiError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
