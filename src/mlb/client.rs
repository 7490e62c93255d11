//! MLB Stats API client.
//!
//! API base: https://statsapi.mlb.com/api/v1
//! Auth: none. Endpoints used:
//!   /schedule?sportId=1&date=YYYY-MM-DD
//!   /game/{gamePk}/boxscore
//!   /stats?stats=season|byDateRange&group=hitting|pitching&season=YYYY
//!
//! Rate-limited (429), server-error (5xx) and timed-out calls are retried
//! a bounded number of times with a fixed delay. Everything else fails
//! immediately.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::schema::{Boxscore, ScheduleGame, ScheduleResponse, Split, StatsResponse};
use super::{DateRange, Game, SplitGroup, StatsSource};
use crate::calendar::{parse_date, LeagueCalendar};
use crate::types::StatsError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://statsapi.mlb.com/api/v1";
const USER_AGENT: &str = "dugout/0.1";
const SPORT_ID: u32 = 1;

/// Row cap for aggregate requests.
const SEASON_SPLITS_LIMIT: u32 = 1000;
const RANGE_SPLITS_LIMIT: u32 = 5000;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct MlbClientConfig {
    pub base_url: String,
    /// Per-call timeout; exceeding it counts as a transient failure.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for MlbClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct MlbClient {
    http: Client,
    config: MlbClientConfig,
    calendar: LeagueCalendar,
}

impl MlbClient {
    pub fn new(config: MlbClientConfig, calendar: LeagueCalendar) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for MLB Stats API")?;

        Ok(Self {
            http,
            config: MlbClientConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            calendar,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// One HTTP round trip, with the failure classified.
    async fn fetch_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, StatsError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| StatsError::transient(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(StatsError::transient(format!("HTTP {status} from {url}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatsError::UpstreamRejected {
                status: status.as_u16(),
                message: format!("{url}: {}", body.chars().take(200).collect::<String>()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| StatsError::transient(format!("Reading body from {url} failed: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| StatsError::malformed(format!("Failed to parse response from {url}: {e}")))
    }

    async fn fetch_with_retry<T: DeserializeOwned>(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, StatsError> {
        let attempts = self.config.max_retries + 1;
        let mut last_error: Option<StatsError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                debug!(
                    attempt,
                    delay_ms = self.config.retry_delay.as_millis() as u64,
                    what,
                    "Retrying MLB Stats API call"
                );
                tokio::time::sleep(self.config.retry_delay).await;
            }

            match self.fetch_once(url, query).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        what,
                        error = %e,
                        "Transient MLB Stats API failure"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        let detail = last_error
            .map(|e| e.technical_message())
            .unwrap_or_default();
        Err(StatsError::transient(format!(
            "{what} failed after {attempts} attempts: {detail}"
        )))
    }
}

impl From<ScheduleGame> for Game {
    fn from(g: ScheduleGame) -> Self {
        let side_label = |side: Option<&super::schema::ScheduleSide>| {
            side.and_then(|s| s.team.label()).map(String::from)
        };
        let teams = g.teams.as_ref();
        Game {
            game_id: g.game_pk,
            game_type: g.game_type.clone(),
            status: g.status.as_ref().and_then(|s| s.detailed_state.clone()),
            away_team: side_label(teams.and_then(|t| t.away.as_ref())),
            home_team: side_label(teams.and_then(|t| t.home.as_ref())),
        }
    }
}

#[async_trait]
impl StatsSource for MlbClient {
    async fn games_by_date(&self, date: &str) -> Result<Vec<Game>, StatsError> {
        let date = parse_date(date)?;
        if self.calendar.is_future(date) {
            debug!(date = %date, "Date is in the future, no games to fetch");
            return Ok(Vec::new());
        }

        let query = [("sportId", SPORT_ID.to_string()), ("date", date.to_string())];
        let schedule: ScheduleResponse = self
            .fetch_with_retry("schedule", &self.url("/schedule"), &query)
            .await?;

        let games: Vec<Game> = schedule
            .dates
            .into_iter()
            .flat_map(|d| d.games)
            .map(Game::from)
            .collect();

        info!(date = %date, games = games.len(), "Fetched MLB schedule");
        Ok(games)
    }

    async fn game_boxscore(&self, game_id: u64) -> Result<Boxscore, StatsError> {
        let what = format!("boxscore for game {game_id}");
        let url = self.url(&format!("/game/{game_id}/boxscore"));
        let boxscore: Boxscore = self.fetch_with_retry(&what, &url, &[]).await?;

        if let Err(missing) = boxscore.sides() {
            return Err(StatsError::malformed(format!(
                "Boxscore for game {game_id} is missing the {missing}"
            )));
        }

        debug!(game_id, "Fetched boxscore");
        Ok(boxscore)
    }

    async fn season_splits(
        &self,
        group: SplitGroup,
        season: i32,
        range: Option<DateRange>,
    ) -> Result<Vec<Split>, StatsError> {
        let mut query = vec![
            ("group", group.as_str().to_string()),
            ("season", season.to_string()),
            ("sportId", SPORT_ID.to_string()),
        ];
        match range {
            Some(r) => {
                query.push(("stats", "byDateRange".to_string()));
                query.push(("startDate", r.start.to_string()));
                query.push(("endDate", r.end.to_string()));
                query.push(("limit", RANGE_SPLITS_LIMIT.to_string()));
            }
            None => {
                query.push(("stats", "season".to_string()));
                query.push(("limit", SEASON_SPLITS_LIMIT.to_string()));
            }
        }

        let what = format!("{group} splits for {season}");
        let response: StatsResponse = self
            .fetch_with_retry(&what, &self.url("/stats"), &query)
            .await?;

        let splits = response
            .stats
            .into_iter()
            .next()
            .map(|g| g.splits)
            .unwrap_or_default();

        debug!(%group, season, ?range, rows = splits.len(), "Fetched splits");
        Ok(splits)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
