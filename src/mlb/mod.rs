//! Upstream sports-data integration.
//!
//! `StatsSource` is the only seam between the pipeline and the public MLB
//! Stats API. `MlbClient` is the HTTP implementation; tests substitute
//! mocks or in-memory sources.

pub mod client;
pub mod schema;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::StatsError;
use schema::{Boxscore, Split};

/// Which aggregate group a splits request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitGroup {
    Hitting,
    Pitching,
}

impl SplitGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitGroup::Hitting => "hitting",
            SplitGroup::Pitching => "pitching",
        }
    }
}

impl std::fmt::Display for SplitGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One scheduled game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub game_id: u64,
    pub game_type: Option<String>,
    pub status: Option<String>,
    pub away_team: Option<String>,
    pub home_team: Option<String>,
}

impl Game {
    pub fn new(game_id: u64) -> Self {
        Self {
            game_id,
            game_type: None,
            status: None,
            away_team: None,
            home_team: None,
        }
    }
}

/// Read-only access to schedule, boxscore and splits data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Games scheduled on `date` (`YYYY-MM-DD`), in schedule order.
    async fn games_by_date(&self, date: &str) -> Result<Vec<Game>, StatsError>;

    async fn game_boxscore(&self, game_id: u64) -> Result<Boxscore, StatsError>;

    /// Season aggregates, or a date-range aggregate when `range` is set.
    async fn season_splits(
        &self,
        group: SplitGroup,
        season: i32,
        range: Option<DateRange>,
    ) -> Result<Vec<Split>, StatsError>;
}
