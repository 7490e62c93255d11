//! Shared domain types for DUGOUT.
//!
//! The value objects (`Innings`, `BattingStats`, `PitchingStats`) and the
//! `PlayerStats` aggregate are immutable once built and are only
//! constructed through validating factories. `PlayerWeekly` is the
//! per-player row produced by the weekly aggregation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Innings
// ---------------------------------------------------------------------------

/// Innings pitched, stored as total recorded outs.
///
/// Baseball notation encodes outs in the fractional digit: `6.1` is six
/// innings and one out, `6.2` six innings and two outs. `6.3` does not
/// exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Innings {
    outs: u32,
}

impl Innings {
    pub const ZERO: Innings = Innings { outs: 0 };

    pub fn from_outs(outs: u32) -> Self {
        Self { outs }
    }

    /// Parse baseball notation (`"6.2"`, `"7"`, `"0.1"`).
    /// Returns `None` for anything malformed.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (whole, partial) = text.split_once('.').unwrap_or((text, "0"));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let whole: u32 = whole.parse().ok()?;
        let partial = match partial {
            "" | "0" => 0,
            "1" => 1,
            "2" => 2,
            _ => return None,
        };

        whole.checked_mul(3)?.checked_add(partial).map(Self::from_outs)
    }

    /// Rebuild from the decimal notation value (`6.2` → 20 outs).
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let whole = value.trunc();
        let partial = ((value - whole) * 10.0).round() as u32;
        if partial > 2 || whole > f64::from(u32::MAX / 3) {
            return None;
        }
        Some(Self::from_outs(whole as u32 * 3 + partial))
    }

    pub fn outs(&self) -> u32 {
        self.outs
    }

    pub fn whole_innings(&self) -> u32 {
        self.outs / 3
    }

    pub fn is_zero(&self) -> bool {
        self.outs == 0
    }

    /// The decimal notation value (`20` outs → `6.2`).
    pub fn as_decimal(&self) -> f64 {
        f64::from(self.whole_innings()) + f64::from(self.outs % 3) / 10.0
    }
}

impl fmt::Display for Innings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.whole_innings(), self.outs % 3)
    }
}

impl Serialize for Innings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Innings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Notation {
            Number(f64),
            Text(String),
        }

        let parsed = match Notation::deserialize(deserializer)? {
            Notation::Number(n) => Innings::from_decimal(n),
            Notation::Text(s) => Innings::parse(&s),
        };
        parsed.ok_or_else(|| serde::de::Error::custom("invalid innings pitched notation"))
    }
}

// ---------------------------------------------------------------------------
// Batting
// ---------------------------------------------------------------------------

/// Raw batting counts for one player-game, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattingCounts {
    pub at_bats: u32,
    pub hits: u32,
    pub home_runs: u32,
    pub rbi: u32,
    pub runs: u32,
    pub stolen_bases: u32,
    pub strikeouts: u32,
    pub walks: u32,
}

/// Validated batting line. `Default` is the zero-filled line used when a
/// player did not bat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct BattingStats(BattingCounts);

impl BattingStats {
    /// Validate and freeze a batting line. Fails when hits exceed at-bats.
    pub fn create(counts: BattingCounts) -> Result<Self, StatsError> {
        if counts.hits > counts.at_bats {
            return Err(StatsError::Validation(format!(
                "hits ({}) cannot exceed at-bats ({})",
                counts.hits, counts.at_bats
            )));
        }
        Ok(Self(counts))
    }

    pub fn counts(&self) -> &BattingCounts {
        &self.0
    }

    pub fn at_bats(&self) -> u32 {
        self.0.at_bats
    }

    pub fn hits(&self) -> u32 {
        self.0.hits
    }

    pub fn home_runs(&self) -> u32 {
        self.0.home_runs
    }

    pub fn rbi(&self) -> u32 {
        self.0.rbi
    }

    pub fn runs(&self) -> u32 {
        self.0.runs
    }

    pub fn stolen_bases(&self) -> u32 {
        self.0.stolen_bases
    }

    pub fn strikeouts(&self) -> u32 {
        self.0.strikeouts
    }

    pub fn walks(&self) -> u32 {
        self.0.walks
    }
}

// ---------------------------------------------------------------------------
// Pitching
// ---------------------------------------------------------------------------

/// Raw pitching counts for one player-game.
///
/// `holds` is `None` when the upstream did not report it at all, which is
/// not the same as a reported zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchingCounts {
    pub innings_pitched: Innings,
    pub earned_runs: u32,
    pub pitching_strikeouts: u32,
    pub hits_allowed: u32,
    pub walks_issued: u32,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
    pub holds: Option<u32>,
    pub games_started: u32,
}

/// Pitching line. Every count is unsigned, so there is nothing further to
/// reject once the counts exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct PitchingStats(PitchingCounts);

impl PitchingStats {
    pub fn new(counts: PitchingCounts) -> Self {
        Self(counts)
    }

    pub fn counts(&self) -> &PitchingCounts {
        &self.0
    }

    pub fn innings_pitched(&self) -> Innings {
        self.0.innings_pitched
    }

    pub fn earned_runs(&self) -> u32 {
        self.0.earned_runs
    }

    pub fn pitching_strikeouts(&self) -> u32 {
        self.0.pitching_strikeouts
    }

    pub fn hits_allowed(&self) -> u32 {
        self.0.hits_allowed
    }

    pub fn walks_issued(&self) -> u32 {
        self.0.walks_issued
    }

    pub fn wins(&self) -> u32 {
        self.0.wins
    }

    pub fn losses(&self) -> u32 {
        self.0.losses
    }

    pub fn saves(&self) -> u32 {
        self.0.saves
    }

    pub fn holds(&self) -> Option<u32> {
        self.0.holds
    }

    pub fn games_started(&self) -> u32 {
        self.0.games_started
    }
}

// ---------------------------------------------------------------------------
// PlayerStats
// ---------------------------------------------------------------------------

/// Everything needed to build a `PlayerStats`.
#[derive(Debug, Clone)]
pub struct PlayerStatsInput {
    pub id: u64,
    pub game_id: u64,
    pub name: String,
    pub team: String,
    pub opponent_team: String,
    pub position: String,
    pub points: f64,
    pub batting_stats: BattingStats,
    pub pitching_stats: PitchingStats,
    pub game_date: NaiveDate,
    pub is_position_player_pitching: bool,
    pub is_home_team: Option<bool>,
}

/// One player's line for one game, with computed fantasy points.
///
/// Both stat blocks are always present; the unused one is zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    id: u64,
    game_id: u64,
    name: String,
    team: String,
    opponent_team: String,
    position: String,
    points: f64,
    batting_stats: BattingStats,
    pitching_stats: PitchingStats,
    game_date: NaiveDate,
    is_position_player_pitching: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_home_team: Option<bool>,
}

impl PlayerStats {
    /// Validate and freeze. Name, team and position must be non-empty.
    pub fn create(input: PlayerStatsInput) -> Result<Self, StatsError> {
        for (field, value) in [
            ("name", &input.name),
            ("team", &input.team),
            ("position", &input.position),
        ] {
            if value.trim().is_empty() {
                return Err(StatsError::Validation(format!(
                    "player {} has an empty {field}",
                    input.id
                )));
            }
        }
        if !input.points.is_finite() {
            return Err(StatsError::Validation(format!(
                "player {} has non-finite points",
                input.id
            )));
        }

        Ok(Self {
            id: input.id,
            game_id: input.game_id,
            name: input.name,
            team: input.team,
            opponent_team: input.opponent_team,
            position: input.position,
            points: input.points,
            batting_stats: input.batting_stats,
            pitching_stats: input.pitching_stats,
            game_date: input.game_date,
            is_position_player_pitching: input.is_position_player_pitching,
            is_home_team: input.is_home_team,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn opponent_team(&self) -> &str {
        &self.opponent_team
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn batting_stats(&self) -> &BattingStats {
        &self.batting_stats
    }

    pub fn pitching_stats(&self) -> &PitchingStats {
        &self.pitching_stats
    }

    pub fn game_date(&self) -> NaiveDate {
        self.game_date
    }

    pub fn is_position_player_pitching(&self) -> bool {
        self.is_position_player_pitching
    }

    pub fn is_home_team(&self) -> Option<bool> {
        self.is_home_team
    }
}

impl fmt::Display for PlayerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} vs {}) {:.1} pts on {}",
            self.name, self.team, self.position, self.opponent_team, self.points, self.game_date
        )
    }
}

// ---------------------------------------------------------------------------
// PlayerWeekly
// ---------------------------------------------------------------------------

/// Season-to-date fantasy points for one player, bucketed by week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWeekly {
    pub id: u64,
    pub full_name: String,
    pub team_name: String,
    pub position_abbr: String,
    /// One entry per week window, zero when the player did not appear.
    pub weekly_points: Vec<f64>,
    pub total_points: f64,
    pub is_rostered: bool,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

const UNAVAILABLE_MESSAGE: &str =
    "The MLB stats service is temporarily unavailable. Please try again in a few minutes.";

/// Classified failures of the stats pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StatsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {technical}")]
    UpstreamTransient { technical: String, user_message: String },

    #[error("Malformed upstream response: {technical}")]
    UpstreamMalformed { technical: String, user_message: String },

    #[error("Upstream rejected request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Roster enrichment failed: {0}")]
    Enrichment(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl StatsError {
    pub fn transient(technical: impl Into<String>) -> Self {
        StatsError::UpstreamTransient {
            technical: technical.into(),
            user_message: UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    pub fn malformed(technical: impl Into<String>) -> Self {
        StatsError::UpstreamMalformed {
            technical: technical.into(),
            user_message: "The MLB stats service returned incomplete data. Please try again later."
                .to_string(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StatsError::UpstreamTransient { .. })
    }

    /// Message safe to show an end user.
    pub fn user_message(&self) -> String {
        match self {
            StatsError::InvalidInput(msg) => msg.clone(),
            StatsError::UpstreamTransient { user_message, .. }
            | StatsError::UpstreamMalformed { user_message, .. } => user_message.clone(),
            StatsError::UpstreamRejected { .. } => {
                "The MLB stats service could not find the requested data.".to_string()
            }
            StatsError::Validation(_) | StatsError::Enrichment(_) | StatsError::Persistence(_) => {
                "Failed to fetch player stats.".to_string()
            }
        }
    }

    /// Diagnostic detail, separate from the user-facing message.
    pub fn technical_message(&self) -> String {
        match self {
            StatsError::UpstreamTransient { technical, .. }
            | StatsError::UpstreamMalformed { technical, .. } => technical.clone(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
