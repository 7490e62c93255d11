//! JSON API exercised through the router with fake upstreams.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use dugout::calendar::LeagueCalendar;
use dugout::dashboard::{build_router, ServiceState};
use dugout::engine::normalizer::StatsNormalizer;
use dugout::engine::pipeline::StatsPipeline;
use dugout::engine::replacement::{ReplacementConfig, ReplacementLevel};
use dugout::engine::weekly::WeeklyAggregator;
use dugout::mlb::StatsSource;
use dugout::roster::{RosterAnnotator, RosterSource};
use dugout::scoring::ScoringEngine;
use dugout::storage::{PlayerStatsRepository, SqliteStatsRepository};
use dugout::types::StatsError;

use crate::fake_source::{boxscore, hitter, single_line, split, ten_point_line, FakeStatsSource};

struct FixedRoster(Vec<&'static str>);

#[async_trait]
impl RosterSource for FixedRoster {
    async fn rostered_names(&self, _season: i32) -> Result<Vec<String>, StatsError> {
        Ok(self.0.iter().map(|n| n.to_string()).collect())
    }
}

fn calendar() -> LeagueCalendar {
    LeagueCalendar::fixed(
        chrono_tz::America::New_York,
        Utc.with_ymd_and_hms(2024, 7, 4, 16, 0, 0).unwrap(),
    )
}

fn source() -> FakeStatsSource {
    FakeStatsSource::new()
        .with_game(
            "2024-07-03",
            745001,
            boxscore(
                vec![hitter(646240, "Rafael Devers", "3B", ten_point_line())],
                vec![hitter(665742, "Juan Soto", "RF", single_line())],
            ),
        )
        .with_splits(
            vec![
                split(608070, "José Ramírez", "3B", ten_point_line()),
                split(680757, "Steven Kwan", "LF", single_line()),
                split(1, "Never Played", "C", json!({ "gamesPlayed": 0 })),
            ],
            vec![],
        )
}

async fn app(roster: Option<RosterAnnotator>) -> Router {
    let repository = SqliteStatsRepository::in_memory().await.unwrap();
    repository.ensure_schema().await.unwrap();
    let source: Arc<dyn StatsSource> = Arc::new(source());
    let scoring = ScoringEngine::default();

    build_router(Arc::new(ServiceState {
        pipeline: StatsPipeline::new(
            source.clone(),
            Arc::new(repository),
            StatsNormalizer::new(scoring.clone()),
            calendar(),
        ),
        weekly: WeeklyAggregator::new(source.clone(), scoring.clone(), calendar()),
        replacement: ReplacementLevel::new(source, scoring, ReplacementConfig::default(), calendar()),
        roster,
        calendar: calendar(),
    }))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_stats_defaults_to_yesterday() {
    let (status, json) = get(app(None).await, "/api/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["date"], "2024-07-03");
    let stats = json["stats"].as_array().unwrap();
    assert_eq!(stats.len(), 2);

    let devers = stats.iter().find(|s| s["id"] == 646240).unwrap();
    assert_eq!(devers["points"], 10.0);
    assert_eq!(devers["team"], "BOS");
    assert_eq!(devers["opponentTeam"], "NYY");
    assert_eq!(devers["isHomeTeam"], false);
    assert_eq!(devers["battingStats"]["homeRuns"], 1);
    assert!(json.get("message").is_none());
}

#[tokio::test]
async fn test_stats_rejects_malformed_date() {
    let (status, json) = get(app(None).await, "/api/stats?date=2024-13-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["stats"], json!([]));
}

#[tokio::test]
async fn test_weekly_points_buckets_by_week() {
    // Season opens Friday March 1st; weeks start Monday the 4th.
    let (status, json) = get(app(None).await, "/api/weekly-points?season=2024&endDate=2024-03-17").await;

    assert_eq!(status, StatusCode::OK);
    let players = json.as_array().unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["fullName"], "José Ramírez");
    assert_eq!(players[0]["weeklyPoints"], json!([10.0, 10.0]));
    assert_eq!(players[0]["totalPoints"], 20.0);
    assert_eq!(players[1]["weeklyPoints"], json!([1.0, 1.0]));
    assert_eq!(players[0]["isRostered"], false);
}

#[tokio::test]
async fn test_weekly_points_marks_rostered_players() {
    let roster = RosterAnnotator::new(Arc::new(FixedRoster(vec!["Jose Ramirez"])), None);
    let (status, json) = get(
        app(Some(roster)).await,
        "/api/weekly-points?season=2024&endDate=2024-03-10",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let players = json.as_array().unwrap();
    assert_eq!(players[0]["isRostered"], true);
    assert_eq!(players[1]["isRostered"], false);
}

#[tokio::test]
async fn test_replacement_level_groups_by_position() {
    let (status, json) = get(app(None).await, "/api/replacement-level?season=2024").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["season"], 2024);
    assert_eq!(json["leagueSize"], 7);
    let groups = json["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    for group in groups {
        let first = &group["players"][0];
        assert_eq!(first["rank"], 1);
        assert!(first["fantasyPoints"].as_f64().unwrap() > 0.0);
    }
}
