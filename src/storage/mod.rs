//! Persistence layer.
//!
//! Player-game rows keyed by game date, stored in SQLite through `sqlx`.
//! The repository knows nothing about freshness: it stores what it is
//! given and returns what matches the date. Read-through policy lives in
//! the pipeline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

use crate::types::{
    BattingCounts, BattingStats, Innings, PitchingCounts, PitchingStats, PlayerStats,
    PlayerStatsInput,
};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS player_stats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id INTEGER NOT NULL,
        game_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        team TEXT NOT NULL,
        opponent_team TEXT NOT NULL DEFAULT '',
        position TEXT NOT NULL,
        at_bats INTEGER NOT NULL DEFAULT 0,
        hits INTEGER NOT NULL DEFAULT 0,
        home_runs INTEGER NOT NULL DEFAULT 0,
        rbis INTEGER NOT NULL DEFAULT 0,
        runs INTEGER NOT NULL DEFAULT 0,
        stolen_bases INTEGER NOT NULL DEFAULT 0,
        strikeouts INTEGER NOT NULL DEFAULT 0,
        walks INTEGER NOT NULL DEFAULT 0,
        innings_pitched REAL NOT NULL DEFAULT 0,
        earned_runs INTEGER NOT NULL DEFAULT 0,
        wins INTEGER NOT NULL DEFAULT 0,
        losses INTEGER NOT NULL DEFAULT 0,
        saves INTEGER NOT NULL DEFAULT 0,
        pitching_strikeouts INTEGER NOT NULL DEFAULT 0,
        hits_allowed INTEGER NOT NULL DEFAULT 0,
        walks_issued INTEGER NOT NULL DEFAULT 0,
        games_started INTEGER NOT NULL DEFAULT 0,
        holds INTEGER,
        points REAL NOT NULL,
        is_position_player_pitching INTEGER NOT NULL DEFAULT 0,
        is_home INTEGER,
        game_date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_player_stats_player_game
        ON player_stats (player_id, game_id)",
    "CREATE INDEX IF NOT EXISTS idx_player_stats_game_date
        ON player_stats (game_date)",
];

/// Upsert keyed on `(player_id, game_id)`: a refetch replaces the row.
const INSERT_ROW: &str = "INSERT INTO player_stats (
        player_id, game_id, name, team, opponent_team, position,
        at_bats, hits, home_runs, rbis, runs, stolen_bases, strikeouts, walks,
        innings_pitched, earned_runs, wins, losses, saves,
        pitching_strikeouts, hits_allowed, walks_issued, games_started, holds,
        points, is_position_player_pitching, is_home, game_date
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (player_id, game_id) DO UPDATE SET
        name = excluded.name,
        team = excluded.team,
        opponent_team = excluded.opponent_team,
        position = excluded.position,
        at_bats = excluded.at_bats,
        hits = excluded.hits,
        home_runs = excluded.home_runs,
        rbis = excluded.rbis,
        runs = excluded.runs,
        stolen_bases = excluded.stolen_bases,
        strikeouts = excluded.strikeouts,
        walks = excluded.walks,
        innings_pitched = excluded.innings_pitched,
        earned_runs = excluded.earned_runs,
        wins = excluded.wins,
        losses = excluded.losses,
        saves = excluded.saves,
        pitching_strikeouts = excluded.pitching_strikeouts,
        hits_allowed = excluded.hits_allowed,
        walks_issued = excluded.walks_issued,
        games_started = excluded.games_started,
        holds = excluded.holds,
        points = excluded.points,
        is_position_player_pitching = excluded.is_position_player_pitching,
        is_home = excluded.is_home,
        game_date = excluded.game_date,
        created_at = CURRENT_TIMESTAMP";

const SELECT_BY_DATE: &str = "SELECT
        player_id, game_id, name, team, opponent_team, position,
        at_bats, hits, home_runs, rbis, runs, stolen_bases, strikeouts, walks,
        innings_pitched, earned_runs, wins, losses, saves,
        pitching_strikeouts, hits_allowed, walks_issued, games_started, holds,
        points, is_position_player_pitching, is_home, game_date
    FROM player_stats
    WHERE game_date = ?
    ORDER BY points DESC, id ASC";

// ---------------------------------------------------------------------------
// Repository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerStatsRepository: Send + Sync {
    /// Create tables and indexes if absent. Idempotent.
    async fn ensure_schema(&self) -> Result<()>;

    /// Rows for one game date, highest points first.
    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<PlayerStats>>;

    async fn save(&self, stats: &PlayerStats) -> Result<()>;

    /// All-or-nothing write. Empty input is a no-op.
    async fn save_batch(&self, stats: &[PlayerStats]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct PlayerStatsRow {
    player_id: i64,
    game_id: i64,
    name: String,
    team: String,
    opponent_team: String,
    position: String,
    at_bats: i64,
    hits: i64,
    home_runs: i64,
    rbis: i64,
    runs: i64,
    stolen_bases: i64,
    strikeouts: i64,
    walks: i64,
    innings_pitched: f64,
    earned_runs: i64,
    wins: i64,
    losses: i64,
    saves: i64,
    pitching_strikeouts: i64,
    hits_allowed: i64,
    walks_issued: i64,
    games_started: i64,
    holds: Option<i64>,
    points: f64,
    is_position_player_pitching: bool,
    is_home: Option<bool>,
    game_date: String,
}

fn count(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("Column {column} out of range: {value}"))
}

impl TryFrom<PlayerStatsRow> for PlayerStats {
    type Error = anyhow::Error;

    fn try_from(row: PlayerStatsRow) -> Result<Self> {
        let batting = BattingStats::create(BattingCounts {
            at_bats: count("at_bats", row.at_bats)?,
            hits: count("hits", row.hits)?,
            home_runs: count("home_runs", row.home_runs)?,
            rbi: count("rbis", row.rbis)?,
            runs: count("runs", row.runs)?,
            stolen_bases: count("stolen_bases", row.stolen_bases)?,
            strikeouts: count("strikeouts", row.strikeouts)?,
            walks: count("walks", row.walks)?,
        })?;

        let innings_pitched = Innings::from_decimal(row.innings_pitched).with_context(|| {
            format!("Column innings_pitched is not valid notation: {}", row.innings_pitched)
        })?;
        let pitching = PitchingStats::new(PitchingCounts {
            innings_pitched,
            earned_runs: count("earned_runs", row.earned_runs)?,
            pitching_strikeouts: count("pitching_strikeouts", row.pitching_strikeouts)?,
            hits_allowed: count("hits_allowed", row.hits_allowed)?,
            walks_issued: count("walks_issued", row.walks_issued)?,
            wins: count("wins", row.wins)?,
            losses: count("losses", row.losses)?,
            saves: count("saves", row.saves)?,
            holds: row.holds.map(|h| count("holds", h)).transpose()?,
            games_started: count("games_started", row.games_started)?,
        });

        let game_date = NaiveDate::parse_from_str(&row.game_date, "%Y-%m-%d")
            .with_context(|| format!("Column game_date is not a date: {}", row.game_date))?;

        Ok(PlayerStats::create(PlayerStatsInput {
            id: u64::try_from(row.player_id).context("Column player_id is negative")?,
            game_id: u64::try_from(row.game_id).context("Column game_id is negative")?,
            name: row.name,
            team: row.team,
            opponent_team: row.opponent_team,
            position: row.position,
            points: row.points,
            batting_stats: batting,
            pitching_stats: pitching,
            game_date,
            is_position_player_pitching: row.is_position_player_pitching,
            is_home_team: row.is_home,
        })?)
    }
}

async fn insert_row<'e, E>(executor: E, stats: &PlayerStats) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let b = stats.batting_stats();
    let p = stats.pitching_stats();

    sqlx::query(INSERT_ROW)
        .bind(i64::try_from(stats.id()).context("player id out of range")?)
        .bind(i64::try_from(stats.game_id()).context("game id out of range")?)
        .bind(stats.name())
        .bind(stats.team())
        .bind(stats.opponent_team())
        .bind(stats.position())
        .bind(b.at_bats())
        .bind(b.hits())
        .bind(b.home_runs())
        .bind(b.rbi())
        .bind(b.runs())
        .bind(b.stolen_bases())
        .bind(b.strikeouts())
        .bind(b.walks())
        .bind(p.innings_pitched().as_decimal())
        .bind(p.earned_runs())
        .bind(p.wins())
        .bind(p.losses())
        .bind(p.saves())
        .bind(p.pitching_strikeouts())
        .bind(p.hits_allowed())
        .bind(p.walks_issued())
        .bind(p.games_started())
        .bind(p.holds())
        .bind(stats.points())
        .bind(stats.is_position_player_pitching())
        .bind(stats.is_home_team())
        .bind(stats.game_date().to_string())
        .execute(executor)
        .await
        .with_context(|| format!("Failed to insert stats for player {}", stats.id()))?;
    Ok(())
}

pub struct SqliteStatsRepository {
    pool: SqlitePool,
}

impl SqliteStatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {url}"))?;
        info!(url, max_connections, "Connected to SQLite");
        Ok(Self::new(pool))
    }

    /// Private in-memory database on a single pinned connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PlayerStatsRepository for SqliteStatsRepository {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create player_stats schema")?;
        }
        debug!("player_stats schema ready");
        Ok(())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<PlayerStats>> {
        let rows: Vec<PlayerStatsRow> = sqlx::query_as(SELECT_BY_DATE)
            .bind(date.to_string())
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to read stats for {date}"))?;

        let stats = rows
            .into_iter()
            .map(PlayerStats::try_from)
            .collect::<Result<Vec<_>>>()?;
        debug!(date = %date, rows = stats.len(), "Read cached stats");
        Ok(stats)
    }

    async fn save(&self, stats: &PlayerStats) -> Result<()> {
        insert_row(&self.pool, stats).await
    }

    async fn save_batch(&self, stats: &[PlayerStats]) -> Result<()> {
        if stats.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        for s in stats {
            insert_row(&mut *tx, s).await?;
        }
        tx.commit().await.context("Failed to commit stats batch")?;

        info!(rows = stats.len(), "Persisted stats batch");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
