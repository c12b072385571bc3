use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::provider::{ApiError, FootballDataSource};
use crate::predictions::MatchContext;

/// Client for the API-Football v3 REST API.
/// Docs: <https://www.api-football.com/documentation-v3>
#[derive(Clone)]
pub struct ApiFootball {
    http: Client,
    api_key: Option<String>,
    /// Base URL, overridable for tests and proxies
    base_url: String,
}

impl ApiFootball {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiFootball {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path);
        Url::parse_with_params(&raw, params).map_err(|e| ApiError::Api(format!("invalid URL {raw}: {e}")))
    }

    /// GET an endpoint and return the payload's `response` field.
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = self.endpoint(path, params)?;
        debug!("GET {}", url);

        let mut req = self.http.get(url.clone());
        if let Some(key) = &self.api_key {
            req = req.header("x-apisports-key", key);
        }

        let resp = req.send().await.map_err(|source| {
            if source.is_timeout() {
                ApiError::Timeout { url: url.to_string() }
            } else {
                ApiError::Http { url: url.to_string(), source }
            }
        })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        let mut raw: Value = resp.json().await.map_err(|source| {
            if source.is_timeout() {
                ApiError::Timeout { url: url.to_string() }
            } else {
                ApiError::Decode { url: url.to_string(), source }
            }
        })?;

        if let Some(errors) = reported_errors(&raw) {
            return Err(ApiError::Api(errors));
        }

        Ok(raw.get_mut("response").map(Value::take).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl FootballDataSource for ApiFootball {
    fn name(&self) -> &str {
        "API-Football"
    }

    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<MatchContext>, ApiError> {
        let response = self
            .get("fixtures", &[("date", date.format("%Y-%m-%d").to_string())])
            .await?;
        let fixtures = parse_fixtures_response(&response);
        debug!("{} fixtures on {}", fixtures.len(), date);
        Ok(fixtures)
    }

    async fn fetch_team_statistics(
        &self,
        team_id: i64,
        league_id: i64,
        season: i32,
    ) -> Result<Value, ApiError> {
        self.get(
            "teams/statistics",
            &[
                ("team", team_id.to_string()),
                ("league", league_id.to_string()),
                ("season", season.to_string()),
            ],
        )
        .await
    }
}

// ── Parsing helpers ────────────────────────────────────────────────────────────

/// API-Football reports auth and quota problems with HTTP 200 and a
/// non-empty `errors` field (either an array or an object).
fn reported_errors(raw: &Value) -> Option<String> {
    let errors = &raw["errors"];
    let present = match errors {
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => false,
    };
    present.then(|| errors.to_string())
}

fn parse_fixtures_response(response: &Value) -> Vec<MatchContext> {
    let items = match response.as_array() {
        Some(a) => a,
        None => return vec![],
    };

    items
        .iter()
        .filter_map(|item| {
            let kickoff = item["fixture"]["date"]
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc))
                .or_else(|| {
                    item["fixture"]["timestamp"]
                        .as_i64()
                        .and_then(|ts| DateTime::from_timestamp(ts, 0))
                })?;

            Some(MatchContext {
                fixture_id: item["fixture"]["id"].as_i64().unwrap_or(0),
                home_id: item["teams"]["home"]["id"].as_i64()?,
                home_team: item["teams"]["home"]["name"].as_str()?.to_string(),
                away_id: item["teams"]["away"]["id"].as_i64()?,
                away_team: item["teams"]["away"]["name"].as_str()?.to_string(),
                league_id: item["league"]["id"].as_i64()?,
                league: item["league"]["name"].as_str().unwrap_or("unknown").to_string(),
                kickoff,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_fixtures() {
        let response = json!([
            {
                "fixture": { "id": 1035037, "date": "2025-03-08T17:30:00+01:00", "timestamp": 1741451400 },
                "league": { "id": 39, "name": "Premier League" },
                "teams": {
                    "home": { "id": 33, "name": "Manchester United" },
                    "away": { "id": 40, "name": "Liverpool" }
                }
            },
            {
                "fixture": { "id": 2, "timestamp": 1741460400 },
                "league": { "id": 140, "name": "La Liga" },
                "teams": {
                    "home": { "id": 541, "name": "Real Madrid" },
                    "away": { "id": 529, "name": "Barcelona" }
                }
            }
        ]);
        let fixtures = parse_fixtures_response(&response);
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].fixture_id, 1035037);
        assert_eq!(fixtures[0].home_team, "Manchester United");
        assert_eq!(fixtures[0].away_id, 40);
        assert_eq!(fixtures[0].league_id, 39);
        assert_eq!(
            fixtures[0].kickoff,
            Utc.with_ymd_and_hms(2025, 3, 8, 16, 30, 0).unwrap()
        );
        assert_eq!(fixtures[1].kickoff, Utc.timestamp_opt(1741460400, 0).unwrap());
    }

    #[test]
    fn test_parse_fixtures_skips_incomplete_entries() {
        let response = json!([
            { "fixture": { "id": 1 }, "league": { "id": 39 }, "teams": {} },
            {
                "fixture": { "id": 2, "date": "2025-03-08T20:00:00+00:00" },
                "league": { "id": 39, "name": "Premier League" },
                "teams": { "home": { "id": 1, "name": "A" }, "away": { "name": "B" } }
            }
        ]);
        assert!(parse_fixtures_response(&response).is_empty());
        assert!(parse_fixtures_response(&Value::Null).is_empty());
    }

    #[test]
    fn test_reported_errors() {
        assert_eq!(reported_errors(&json!({ "errors": [], "response": [] })), None);
        assert_eq!(reported_errors(&json!({ "response": [] })), None);
        let err = reported_errors(&json!({ "errors": { "token": "Error/Missing application key" } }));
        assert!(err.unwrap().contains("Missing application key"));
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let api = ApiFootball::new("https://example.test/v3/", None, Duration::from_secs(1)).unwrap();
        let url = api
            .endpoint("teams/statistics", &[("team", "33".into()), ("season", "2025".into())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v3/teams/statistics?team=33&season=2025"
        );
    }
}
