//! Cache-first daily pipeline against a real SQLite cache.

use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use dugout::calendar::LeagueCalendar;
use dugout::engine::normalizer::StatsNormalizer;
use dugout::engine::pipeline::{FetchOptions, StatsOrigin, StatsPipeline};
use dugout::storage::{PlayerStatsRepository, SqliteStatsRepository};
use dugout::types::StatsError;

use crate::fake_source::{bench, boxscore, hitter, single_line, ten_point_line, FakeStatsSource};

const PAST: &str = "2024-07-02";
const TODAY: &str = "2024-07-04";

fn calendar() -> LeagueCalendar {
    LeagueCalendar::fixed(
        chrono_tz::America::New_York,
        Utc.with_ymd_and_hms(2024, 7, 4, 16, 0, 0).unwrap(),
    )
}

fn one_game_source(date: &str) -> FakeStatsSource {
    FakeStatsSource::new().with_game(
        date,
        745001,
        boxscore(
            vec![
                hitter(1, "Ceddanne Rafaela", "CF", single_line()),
                hitter(2, "Rafael Devers", "3B", ten_point_line()),
                bench(3, "Connor Wong"),
            ],
            vec![hitter(4, "Juan Soto", "RF", single_line())],
        ),
    )
}

async fn setup(source: FakeStatsSource) -> (StatsPipeline, Arc<FakeStatsSource>, Arc<SqliteStatsRepository>) {
    let repository = Arc::new(SqliteStatsRepository::in_memory().await.unwrap());
    repository.ensure_schema().await.unwrap();
    let source = Arc::new(source);
    let pipeline = StatsPipeline::new(
        source.clone(),
        repository.clone(),
        StatsNormalizer::default(),
        calendar(),
    );
    (pipeline, source, repository)
}

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_past_date_is_fetched_once_then_served_from_cache() {
    let (pipeline, source, repository) = setup(one_game_source(PAST)).await;

    let first = pipeline.stats_for_date(Some(PAST), FetchOptions::default()).await.unwrap();
    assert_eq!(first.origin, StatsOrigin::Upstream);
    assert!(first.persisted);
    assert_eq!(first.stats.len(), 3);
    // Upstream order follows the boxscore: away roster first.
    let ids: Vec<u64> = first.stats.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec![1, 2, 4]);
    assert_eq!(first.stats[1].points(), 10.0);

    let second = pipeline.stats_for_date(Some(PAST), FetchOptions::default()).await.unwrap();
    assert_eq!(second.origin, StatsOrigin::Cache);
    assert_eq!(second.stats.len(), 3);
    // Cached rows come back by points, ties by id.
    let ids: Vec<u64> = second.stats.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec![2, 1, 4]);

    assert_eq!(source.schedule_calls(), 1);
    assert_eq!(source.boxscore_calls(), 1);
    assert_eq!(repository.find_by_date(day(PAST)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_today_is_never_persisted() {
    let (pipeline, source, repository) = setup(one_game_source(TODAY)).await;

    let first = pipeline.stats_for_date(Some(TODAY), FetchOptions::default()).await.unwrap();
    assert!(!first.persisted);
    assert_eq!(first.stats.len(), 3);

    let second = pipeline.stats_for_date(Some(TODAY), FetchOptions::default()).await.unwrap();
    assert_eq!(second.origin, StatsOrigin::Upstream);

    assert_eq!(source.schedule_calls(), 2);
    assert!(repository.find_by_date(day(TODAY)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bypass_refetches_without_duplicating_rows() {
    let (pipeline, source, repository) = setup(one_game_source(PAST)).await;

    pipeline.stats_for_date(Some(PAST), FetchOptions::default()).await.unwrap();
    let refreshed = pipeline
        .stats_for_date(Some(PAST), FetchOptions { bypass_cache: true })
        .await
        .unwrap();

    assert_eq!(refreshed.origin, StatsOrigin::Upstream);
    assert_eq!(source.schedule_calls(), 2);
    assert_eq!(repository.find_by_date(day(PAST)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_bypass_refetch_replaces_stale_cached_lines() {
    let repository = Arc::new(SqliteStatsRepository::in_memory().await.unwrap());
    repository.ensure_schema().await.unwrap();
    let pipeline_with = |source: FakeStatsSource| {
        StatsPipeline::new(Arc::new(source), repository.clone(), StatsNormalizer::default(), calendar())
    };
    let soto = |line| {
        FakeStatsSource::new().with_game(PAST, 745001, boxscore(vec![], vec![hitter(665742, "Juan Soto", "RF", line)]))
    };

    // Cached while the game was still in progress.
    let early = pipeline_with(soto(single_line()));
    let first = early.stats_for_date(Some(PAST), FetchOptions::default()).await.unwrap();
    assert!(first.persisted);
    assert_eq!(first.stats[0].points(), 1.0);

    let late = pipeline_with(soto(ten_point_line()));
    let refreshed = late
        .stats_for_date(Some(PAST), FetchOptions { bypass_cache: true })
        .await
        .unwrap();
    assert!(refreshed.persisted);
    assert_eq!(refreshed.stats[0].points(), 10.0);

    let cached = late.stats_for_date(Some(PAST), FetchOptions::default()).await.unwrap();
    assert_eq!(cached.origin, StatsOrigin::Cache);
    assert_eq!(cached.stats.len(), 1);
    assert_eq!(cached.stats[0].points(), 10.0);
}

#[tokio::test]
async fn test_empty_slate_returns_message_and_stores_nothing() {
    let (pipeline, _source, repository) = setup(FakeStatsSource::new()).await;

    let daily = pipeline.stats_for_date(Some("2024-01-15"), FetchOptions::default()).await.unwrap();
    assert!(daily.stats.is_empty());
    assert!(!daily.persisted);
    let message = daily.message.unwrap();
    assert!(message.contains("January 15, 2024"), "{message}");
    assert!(repository.find_by_date(day("2024-01-15")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_game_does_not_sink_the_day() {
    let source = one_game_source(PAST).with_failing_game(PAST, 745002);
    let (pipeline, source, repository) = setup(source).await;

    let daily = pipeline.stats_for_date(Some(PAST), FetchOptions::default()).await.unwrap();
    assert_eq!(daily.stats.len(), 3);
    assert!(!daily.persisted);
    assert_eq!(source.boxscore_calls(), 2);
    assert!(repository.find_by_date(day(PAST)).await.unwrap().is_empty());

    // Nothing cached, so the next request goes back upstream.
    let again = pipeline.stats_for_date(Some(PAST), FetchOptions::default()).await.unwrap();
    assert_eq!(again.origin, StatsOrigin::Upstream);
    assert_eq!(source.schedule_calls(), 2);
}

#[tokio::test]
async fn test_every_game_failing_surfaces_the_error() {
    let source = FakeStatsSource::new()
        .with_failing_game(PAST, 745001)
        .with_failing_game(PAST, 745002);
    let (pipeline, _source, repository) = setup(source).await;

    let err = pipeline
        .stats_for_date(Some(PAST), FetchOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(err.technical_message().contains("745001"));
    assert!(repository.find_by_date(day(PAST)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_date_never_reaches_upstream() {
    let (pipeline, source, _repository) = setup(one_game_source(PAST)).await;

    let err = pipeline
        .stats_for_date(Some("2024-7-2"), FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StatsError::InvalidInput(_)));
    assert_eq!(source.schedule_calls(), 0);
}
