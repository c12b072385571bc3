pub mod client;
pub mod provider;

pub use client::ApiFootball;
pub use provider::{ApiError, FootballDataSource};

use chrono::{DateTime, Datelike, Duration, FixedOffset, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::predictions::{
    fallback_batch, predict_match, MatchContext, MatchForecast, PredictionBatch, TeamSeasonStats,
};

/// Fetches upcoming fixtures and team statistics and turns them into forecasts.
#[derive(Clone)]
pub struct ForecastService {
    source: Arc<dyn FootballDataSource>,
    max_fixtures: usize,
    display_offset: FixedOffset,
}

impl ForecastService {
    pub fn new(
        source: Arc<dyn FootballDataSource>,
        max_fixtures: usize,
        display_offset: FixedOffset,
    ) -> Self {
        ForecastService {
            source,
            max_fixtures,
            display_offset,
        }
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Forecast the earliest not-yet-started fixtures of today and tomorrow (UTC).
    ///
    /// Both days are fetched concurrently; a failure of either aborts the run.
    /// Fixtures are then handled one at a time, each fetching the two teams'
    /// statistics concurrently. A fixture whose statistics cannot be fetched
    /// is skipped.
    pub async fn collect_forecasts(&self, now: DateTime<Utc>) -> Result<Vec<MatchForecast>, ApiError> {
        let today = now.date_naive();
        let tomorrow = (now + Duration::days(1)).date_naive();
        info!("Fetching fixtures for {} and {} from {}", today, tomorrow, self.source.name());

        let (today_fixtures, tomorrow_fixtures) = futures_util::future::try_join(
            self.source.fetch_fixtures(today),
            self.source.fetch_fixtures(tomorrow),
        )
        .await?;

        let total = today_fixtures.len() + tomorrow_fixtures.len();
        let mut upcoming: Vec<MatchContext> = today_fixtures
            .into_iter()
            .chain(tomorrow_fixtures)
            .filter(|f| f.kickoff > now)
            .collect();
        info!("Found {} future fixtures from {} total", upcoming.len(), total);

        upcoming.sort_by_key(|f| f.kickoff);
        upcoming.truncate(self.max_fixtures);

        let season = now.year();
        let mut forecasts = Vec::with_capacity(upcoming.len());
        for fixture in &upcoming {
            match self.forecast_fixture(fixture, season).await {
                Ok(Some(forecast)) => forecasts.push(forecast),
                Ok(None) => warn!(
                    "No statistics for fixture {} ({} vs {}), skipping",
                    fixture.fixture_id, fixture.home_team, fixture.away_team
                ),
                Err(e) => warn!(
                    "Error processing fixture {} ({} vs {}): {}",
                    fixture.fixture_id, fixture.home_team, fixture.away_team, e
                ),
            }
        }

        Ok(forecasts)
    }

    async fn forecast_fixture(
        &self,
        fixture: &MatchContext,
        season: i32,
    ) -> Result<Option<MatchForecast>, ApiError> {
        let (home_raw, away_raw) = futures_util::future::try_join(
            self.source
                .fetch_team_statistics(fixture.home_id, fixture.league_id, season),
            self.source
                .fetch_team_statistics(fixture.away_id, fixture.league_id, season),
        )
        .await?;

        if home_raw.is_null() || away_raw.is_null() {
            return Ok(None);
        }

        let home = TeamSeasonStats::from_json(&home_raw);
        let away = TeamSeasonStats::from_json(&away_raw);
        Ok(Some(predict_match(fixture, &home, &away, self.display_offset)))
    }

    /// Live forecasts, or the fixed fallback set when the upstream is
    /// unreachable or has nothing upcoming.
    pub async fn forecasts_or_fallback(&self, now: DateTime<Utc>) -> PredictionBatch {
        match self.collect_forecasts(now).await {
            Ok(predictions) if !predictions.is_empty() => PredictionBatch {
                predictions,
                is_backup: false,
            },
            Ok(_) => {
                warn!("No forecasts from {}, using fallback data", self.source.name());
                fallback_batch(now, self.display_offset)
            }
            Err(e) => {
                warn!("{} failed, using fallback data: {}", self.source.name(), e);
                fallback_batch(now, self.display_offset)
            }
        }
    }
}
