//! Deterministic in-memory `StatsSource` for integration testing.
//!
//! Schedules, boxscores and splits are registered up front; every call
//! is counted so tests can assert on cache behaviour.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use dugout::mlb::schema::{Boxscore, Split};
use dugout::mlb::{DateRange, Game, SplitGroup, StatsSource};
use dugout::types::StatsError;

#[derive(Default)]
pub struct FakeStatsSource {
    schedules: HashMap<String, Vec<Game>>,
    boxscores: HashMap<u64, Boxscore>,
    failing_games: HashSet<u64>,
    hitting: Vec<Split>,
    pitching: Vec<Split>,
    pub schedule_calls: AtomicUsize,
    pub boxscore_calls: AtomicUsize,
    pub splits_calls: AtomicUsize,
}

impl FakeStatsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(mut self, date: &str, game_id: u64, boxscore: Boxscore) -> Self {
        self.schedules
            .entry(date.to_string())
            .or_default()
            .push(Game::new(game_id));
        self.boxscores.insert(game_id, boxscore);
        self
    }

    /// Scheduled, but every boxscore fetch fails.
    pub fn with_failing_game(mut self, date: &str, game_id: u64) -> Self {
        self.schedules
            .entry(date.to_string())
            .or_default()
            .push(Game::new(game_id));
        self.failing_games.insert(game_id);
        self
    }

    pub fn with_splits(mut self, hitting: Vec<Split>, pitching: Vec<Split>) -> Self {
        self.hitting = hitting;
        self.pitching = pitching;
        self
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn boxscore_calls(&self) -> usize {
        self.boxscore_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsSource for FakeStatsSource {
    async fn games_by_date(&self, date: &str) -> Result<Vec<Game>, StatsError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.schedules.get(date).cloned().unwrap_or_default())
    }

    async fn game_boxscore(&self, game_id: u64) -> Result<Boxscore, StatsError> {
        self.boxscore_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_games.contains(&game_id) {
            return Err(StatsError::transient(format!(
                "boxscore for game {game_id} failed after 4 attempts: HTTP 503"
            )));
        }
        self.boxscores
            .get(&game_id)
            .cloned()
            .ok_or_else(|| StatsError::UpstreamRejected {
                status: 404,
                message: format!("no boxscore for game {game_id}"),
            })
    }

    async fn season_splits(
        &self,
        group: SplitGroup,
        _season: i32,
        _range: Option<DateRange>,
    ) -> Result<Vec<Split>, StatsError> {
        self.splits_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match group {
            SplitGroup::Hitting => self.hitting.clone(),
            SplitGroup::Pitching => self.pitching.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn hitter(id: u64, name: &str, pos: &str, batting: Value) -> Value {
    json!({
        "person": { "id": id, "fullName": name },
        "position": { "abbreviation": pos },
        "stats": { "batting": batting, "pitching": {} }
    })
}

pub fn bench(id: u64, name: &str) -> Value {
    json!({
        "person": { "id": id, "fullName": name },
        "position": { "abbreviation": "C" },
        "stats": { "batting": {}, "pitching": {} }
    })
}

pub fn boxscore(away: Vec<Value>, home: Vec<Value>) -> Boxscore {
    let keyed = |players: Vec<Value>| -> serde_json::Map<String, Value> {
        players
            .into_iter()
            .map(|p| (format!("ID{}", p["person"]["id"]), p))
            .collect()
    };
    serde_json::from_value(json!({
        "teams": {
            "away": { "team": { "name": "Boston Red Sox", "abbreviation": "BOS" }, "players": keyed(away) },
            "home": { "team": { "name": "New York Yankees", "abbreviation": "NYY" }, "players": keyed(home) }
        }
    }))
    .unwrap()
}

/// A 10-point line: 3-for-5, double, homer, 2 RBI, run, steal, walk, 2 K.
pub fn ten_point_line() -> Value {
    json!({ "gamesPlayed": 1, "atBats": 5, "hits": 3, "doubles": 1, "homeRuns": 1,
            "rbi": 2, "runs": 1, "stolenBases": 1, "baseOnBalls": 1, "strikeOuts": 2 })
}

/// 1-for-4 single: 1 point.
pub fn single_line() -> Value {
    json!({ "gamesPlayed": 1, "atBats": 4, "hits": 1 })
}

pub fn split(id: u64, name: &str, pos: &str, stat: Value) -> Split {
    serde_json::from_value(json!({
        "player": { "id": id, "fullName": name },
        "team": { "name": "Cleveland Guardians" },
        "position": { "abbreviation": pos },
        "stat": stat
    }))
    .unwrap()
}
