//! Raw MLB Stats API payloads (JSON → Rust).
//!
//! Every field the upstream may omit is optional here; shape checks and
//! conversion into domain types happen in the normalizer. Counts are kept
//! as `i64` so a negative value fails validation for one player instead of
//! failing deserialization of the whole payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Shared references
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

impl TeamRef {
    /// Abbreviation when present, otherwise the full name.
    pub fn label(&self) -> Option<&str> {
        self.abbreviation
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.name.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: u64,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRef {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

// ---------------------------------------------------------------------------
// Schedule: /schedule?sportId=1&date=YYYY-MM-DD
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    #[serde(default)]
    pub total_games: Option<u32>,
    #[serde(default)]
    pub dates: Vec<ScheduleDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDate {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub game_pk: u64,
    /// "R" regular season, "S" spring, "P"/"F"/"D"/"L"/"W" postseason.
    #[serde(default)]
    pub game_type: Option<String>,
    #[serde(default)]
    pub status: Option<GameStatus>,
    #[serde(default)]
    pub teams: Option<ScheduleTeams>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    #[serde(default)]
    pub abstract_game_state: Option<String>,
    #[serde(default)]
    pub detailed_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScheduleTeams {
    #[serde(default)]
    pub away: Option<ScheduleSide>,
    #[serde(default)]
    pub home: Option<ScheduleSide>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScheduleSide {
    #[serde(default)]
    pub team: TeamRef,
}

// ---------------------------------------------------------------------------
// Boxscore: /game/{gamePk}/boxscore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Boxscore {
    #[serde(default)]
    pub teams: Option<BoxscoreTeams>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BoxscoreTeams {
    #[serde(default)]
    pub away: Option<TeamBoxscore>,
    #[serde(default)]
    pub home: Option<TeamBoxscore>,
}

impl Boxscore {
    /// Both team sides, or the name of the first missing one.
    pub fn sides(&self) -> Result<(&TeamBoxscore, &TeamBoxscore), &'static str> {
        let teams = self.teams.as_ref().ok_or("teams")?;
        let away = teams.away.as_ref().ok_or("away team")?;
        let home = teams.home.as_ref().ok_or("home team")?;
        Ok((away, home))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TeamBoxscore {
    #[serde(default)]
    pub team: TeamRef,
    /// Keyed by "ID{personId}".
    #[serde(default)]
    pub players: BTreeMap<String, BoxscorePlayer>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BoxscorePlayer {
    pub person: Person,
    #[serde(default)]
    pub position: Option<PositionRef>,
    #[serde(default)]
    pub stats: Option<PlayerGameStats>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerGameStats {
    #[serde(default)]
    pub batting: Option<RawBatting>,
    #[serde(default)]
    pub pitching: Option<RawPitching>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBatting {
    #[serde(default)]
    pub games_played: Option<i64>,
    #[serde(default)]
    pub at_bats: Option<i64>,
    #[serde(default)]
    pub hits: Option<i64>,
    #[serde(default)]
    pub doubles: Option<i64>,
    #[serde(default)]
    pub triples: Option<i64>,
    #[serde(default)]
    pub home_runs: Option<i64>,
    #[serde(default)]
    pub rbi: Option<i64>,
    #[serde(default)]
    pub runs: Option<i64>,
    #[serde(default)]
    pub base_on_balls: Option<i64>,
    #[serde(default)]
    pub strike_outs: Option<i64>,
    #[serde(default)]
    pub stolen_bases: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPitching {
    #[serde(default)]
    pub games_played: Option<i64>,
    #[serde(default)]
    pub games_started: Option<i64>,
    /// Baseball notation as a string, e.g. "6.2".
    #[serde(default)]
    pub innings_pitched: Option<String>,
    #[serde(default)]
    pub hits: Option<i64>,
    #[serde(default)]
    pub earned_runs: Option<i64>,
    #[serde(default)]
    pub base_on_balls: Option<i64>,
    #[serde(default)]
    pub strike_outs: Option<i64>,
    #[serde(default)]
    pub wins: Option<i64>,
    #[serde(default)]
    pub losses: Option<i64>,
    #[serde(default)]
    pub saves: Option<i64>,
    #[serde(default)]
    pub holds: Option<i64>,
}

// ---------------------------------------------------------------------------
// Splits: /stats?stats=season|byDateRange&group=hitting|pitching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub stats: Vec<StatGroup>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatGroup {
    #[serde(default)]
    pub splits: Vec<Split>,
}

/// One player's aggregate line for a season or date range.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Split {
    #[serde(default)]
    pub player: Option<Person>,
    #[serde(default)]
    pub team: Option<TeamRef>,
    #[serde(default)]
    pub position: Option<PositionRef>,
    #[serde(default)]
    pub stat: Option<SplitStat>,
}

/// Union of hitting and pitching aggregate fields; only the group that
/// was requested is populated.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitStat {
    #[serde(default)]
    pub games_played: Option<i64>,
    #[serde(default)]
    pub games_started: Option<i64>,
    #[serde(default)]
    pub at_bats: Option<i64>,
    #[serde(default)]
    pub hits: Option<i64>,
    #[serde(default)]
    pub doubles: Option<i64>,
    #[serde(default)]
    pub triples: Option<i64>,
    #[serde(default)]
    pub home_runs: Option<i64>,
    #[serde(default)]
    pub rbi: Option<i64>,
    #[serde(default)]
    pub runs: Option<i64>,
    #[serde(default)]
    pub base_on_balls: Option<i64>,
    #[serde(default)]
    pub strike_outs: Option<i64>,
    #[serde(default)]
    pub stolen_bases: Option<i64>,
    #[serde(default)]
    pub innings_pitched: Option<String>,
    #[serde(default)]
    pub earned_runs: Option<i64>,
    #[serde(default)]
    pub wins: Option<i64>,
    #[serde(default)]
    pub losses: Option<i64>,
    #[serde(default)]
    pub saves: Option<i64>,
    #[serde(default)]
    pub holds: Option<i64>,
}
