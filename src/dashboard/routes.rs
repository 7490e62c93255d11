//! HTTP route handlers.
//!
//! All endpoints return JSON. Components are built once at startup and
//! shared via `Arc<ServiceState>`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::calendar::{parse_date, LeagueCalendar};
use crate::engine::pipeline::{FetchOptions, StatsPipeline};
use crate::engine::replacement::ReplacementLevel;
use crate::engine::weekly::WeeklyAggregator;
use crate::roster::RosterAnnotator;
use crate::types::{PlayerStats, StatsError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct ServiceState {
    pub pipeline: StatsPipeline,
    pub weekly: WeeklyAggregator,
    pub replacement: ReplacementLevel,
    /// Absent when roster enrichment is disabled.
    pub roster: Option<RosterAnnotator>,
    pub calendar: LeagueCalendar,
}

pub type AppState = Arc<ServiceState>;

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub date: Option<String>,
    /// Any value bypasses the cache read.
    pub nocache: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyQuery {
    pub season: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonQuery {
    pub season: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Vec<PlayerStats>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Vec<PlayerStats>>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A classified failure plus the request context it is reported with.
#[derive(Debug)]
pub struct ApiError {
    pub error: StatsError,
    pub date: Option<String>,
    /// The stats endpoint echoes an empty `stats` array on 400.
    pub with_empty_stats: bool,
}

impl ApiError {
    fn new(error: StatsError) -> Self {
        Self {
            error,
            date: None,
            with_empty_stats: false,
        }
    }

    fn for_stats(error: StatsError, date: String) -> Self {
        Self {
            error,
            date: Some(date),
            with_empty_stats: true,
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(error: StatsError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.error {
            StatsError::InvalidInput(message) => {
                let body = ErrorBody {
                    error: message,
                    details: None,
                    timestamp: None,
                    date: self.date,
                    stats: self.with_empty_stats.then(Vec::new),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            other => {
                error!(error = %other, date = ?self.date, "Request failed");
                let body = ErrorBody {
                    error: other.user_message(),
                    details: Some(other.technical_message()),
                    timestamp: Some(chrono::Utc::now().to_rfc3339()),
                    date: self.date,
                    stats: None,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn parse_season(raw: Option<&str>) -> Result<Option<i32>, StatsError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i32>() {
        Ok(season) if raw.len() == 4 && season > 0 => Ok(Some(season)),
        _ => Err(StatsError::InvalidInput(format!(
            "Invalid season: '{raw}'. Expected YYYY."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/stats?date=YYYY-MM-DD&nocache=1
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    let options = FetchOptions {
        bypass_cache: query.nocache.is_some(),
    };
    let requested = query.date.as_deref();

    let daily = state
        .pipeline
        .stats_for_date(requested, options)
        .await
        .map_err(|e| {
            let date = requested
                .map(String::from)
                .unwrap_or_else(|| state.calendar.yesterday().to_string());
            ApiError::for_stats(e, date)
        })?;

    info!(
        date = %daily.date,
        players = daily.stats.len(),
        origin = ?daily.origin,
        persisted = daily.persisted,
        "Served daily stats"
    );

    Ok(Json(StatsResponse {
        stats: daily.stats,
        date: daily.date.to_string(),
        message: daily.message,
    }))
}

/// GET /api/weekly-points?season=YYYY&endDate=YYYY-MM-DD
pub async fn get_weekly_points(
    State(state): State<AppState>,
    Query(query): Query<WeeklyQuery>,
) -> Result<Response, ApiError> {
    let season = parse_season(query.season.as_deref())?;
    let end_date = query
        .end_date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_date)
        .transpose()?;

    let (plan, mut players) = state.weekly.weekly_points(season, end_date).await?;
    if let Some(roster) = &state.roster {
        roster.annotate(&mut players, plan.season).await;
    }

    Ok(Json(players).into_response())
}

/// GET /api/replacement-level?season=YYYY
pub async fn get_replacement_level(
    State(state): State<AppState>,
    Query(query): Query<SeasonQuery>,
) -> Result<Response, ApiError> {
    let season = state
        .replacement
        .season_or_current(parse_season(query.season.as_deref())?);
    let report = state.replacement.report(season).await?;

    if report.is_empty() {
        return Ok(Json(MessageResponse {
            message: format!("No season statistics are available for {season} yet."),
        })
        .into_response());
    }
    Ok(Json(report).into_response())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
