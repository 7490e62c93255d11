//! File-backed SQLite cache survives a reopen.

use chrono::NaiveDate;
use uuid::Uuid;

use dugout::engine::normalizer::StatsNormalizer;
use dugout::storage::{PlayerStatsRepository, SqliteStatsRepository};

use crate::fake_source::{boxscore, hitter, single_line, ten_point_line};

#[tokio::test]
async fn test_rows_survive_reopen() {
    let path = std::env::temp_dir().join(format!("dugout-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let stats = StatsNormalizer::default()
        .normalize(
            &boxscore(
                vec![hitter(10, "Rafael Devers", "3B", ten_point_line())],
                vec![hitter(20, "Aaron Judge", "RF", single_line())],
            ),
            746100,
            date,
        )
        .unwrap();

    {
        let repo = SqliteStatsRepository::connect(&url, 2).await.unwrap();
        repo.ensure_schema().await.unwrap();
        repo.save_batch(&stats).await.unwrap();
        repo.pool().close().await;
    }

    let repo = SqliteStatsRepository::connect(&url, 2).await.unwrap();
    repo.ensure_schema().await.unwrap();
    let rows = repo.find_by_date(date).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name(), "Rafael Devers");
    assert_eq!(rows[0].team(), "BOS");
    assert_eq!(rows[1].is_home_team(), Some(true));
    assert_eq!(rows, stats_sorted(stats));

    repo.pool().close().await;
    let _ = std::fs::remove_file(&path);
}

fn stats_sorted(mut stats: Vec<dugout::types::PlayerStats>) -> Vec<dugout::types::PlayerStats> {
    stats.sort_by(|a, b| b.points().total_cmp(&a.points()).then(a.id().cmp(&b.id())));
    stats
}
