//! Boxscore → `PlayerStats`.
//!
//! Away side first, then home. Each player's batting and pitching blocks
//! are scored and summed, the role is resolved, and the result is built
//! through the validating factories. One bad player line is logged and
//! skipped; it never aborts the rest of the boxscore.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::mlb::schema::{Boxscore, BoxscorePlayer, RawBatting, RawPitching, SplitStat};
use crate::scoring::position::{self, PitchingAppearance};
use crate::scoring::{BattingLine, PitchingLine, ScoringEngine};
use crate::types::{
    BattingCounts, BattingStats, Innings, PitchingCounts, PitchingStats, PlayerStats,
    PlayerStatsInput, StatsError,
};

#[derive(Debug, Clone, Default)]
pub struct StatsNormalizer {
    scoring: ScoringEngine,
}

impl StatsNormalizer {
    pub fn new(scoring: ScoringEngine) -> Self {
        Self { scoring }
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Every qualifying player line in one game.
    ///
    /// Fails only when the boxscore is missing a team side.
    pub fn normalize(
        &self,
        boxscore: &Boxscore,
        game_id: u64,
        game_date: NaiveDate,
    ) -> Result<Vec<PlayerStats>, StatsError> {
        let (away, home) = boxscore.sides().map_err(|missing| {
            StatsError::malformed(format!("Boxscore for game {game_id} is missing the {missing}"))
        })?;

        let away_label = away.team.label().unwrap_or_default();
        let home_label = home.team.label().unwrap_or_default();

        let mut out = Vec::new();
        let mut skipped = 0usize;

        for (side, team, opponent, is_home) in [
            (away, away_label, home_label, false),
            (home, home_label, away_label, true),
        ] {
            for player in side.players.values() {
                let context = GameContext {
                    game_id,
                    game_date,
                    team,
                    opponent,
                    is_home,
                };
                match self.normalize_player(player, &context) {
                    Ok(Some(stats)) => out.push(stats),
                    Ok(None) => {}
                    Err(e) => {
                        skipped += 1;
                        warn!(
                            game_id,
                            player_id = player.person.id,
                            error = %e,
                            "Skipping invalid player line"
                        );
                    }
                }
            }
        }

        debug!(game_id, players = out.len(), skipped, "Normalized boxscore");
        Ok(out)
    }

    /// `Ok(None)` when the player recorded nothing relevant.
    fn normalize_player(
        &self,
        player: &BoxscorePlayer,
        ctx: &GameContext<'_>,
    ) -> Result<Option<PlayerStats>, StatsError> {
        let stats = player.stats.as_ref();
        let raw_batting = stats
            .and_then(|s| s.batting.as_ref())
            .filter(|b| b.games_played.unwrap_or(0) > 0);
        let raw_pitching = stats
            .and_then(|s| s.pitching.as_ref())
            .filter(|p| p.games_played.unwrap_or(0) > 0);

        let mut points = 0.0;

        let batting = match raw_batting {
            Some(raw) => {
                let line = batting_line(raw)?;
                points += self.scoring.score_batting(&line);
                BattingStats::create(BattingCounts {
                    at_bats: count("atBats", raw.at_bats)?,
                    hits: line.hits,
                    home_runs: line.home_runs,
                    rbi: line.rbi,
                    runs: line.runs,
                    stolen_bases: line.stolen_bases,
                    strikeouts: line.strikeouts,
                    walks: line.walks,
                })?
            }
            None => BattingStats::default(),
        };

        let (pitching, appearance) = match raw_pitching {
            Some(raw) => {
                let line = pitching_line(raw)?;
                points += self.scoring.score_pitching(&line);

                let innings = line
                    .innings_pitched
                    .as_deref()
                    .and_then(Innings::parse)
                    .unwrap_or(Innings::ZERO);
                let games_started = count("gamesStarted", raw.games_started)?;
                let stats = PitchingStats::new(PitchingCounts {
                    innings_pitched: innings,
                    earned_runs: line.earned_runs,
                    pitching_strikeouts: line.strikeouts,
                    hits_allowed: line.hits_allowed,
                    walks_issued: line.walks_issued,
                    wins: line.wins,
                    losses: line.losses,
                    saves: line.saves,
                    holds: line.holds,
                    games_started,
                });
                let appearance = PitchingAppearance {
                    games_played: count("gamesPlayed", raw.games_played)?,
                    games_started,
                    saves: line.saves,
                    holds: line.holds,
                    innings,
                };
                (stats, Some(appearance))
            }
            None => (PitchingStats::default(), None),
        };

        if !has_relevant_activity(&batting, &pitching) {
            return Ok(None);
        }

        let nominal = player
            .position
            .as_ref()
            .and_then(|p| p.abbreviation.as_deref())
            .unwrap_or_default();
        let role = position::classify(nominal, appearance.as_ref());
        let flag = position::is_position_player_pitching(&role, pitching.innings_pitched());

        PlayerStats::create(PlayerStatsInput {
            id: player.person.id,
            game_id: ctx.game_id,
            name: player.person.full_name.clone().unwrap_or_default(),
            team: ctx.team.to_string(),
            opponent_team: ctx.opponent.to_string(),
            position: role,
            points,
            batting_stats: batting,
            pitching_stats: pitching,
            game_date: ctx.game_date,
            is_position_player_pitching: flag,
            is_home_team: Some(ctx.is_home),
        })
        .map(Some)
    }
}

struct GameContext<'a> {
    game_id: u64,
    game_date: NaiveDate,
    team: &'a str,
    opponent: &'a str,
    is_home: bool,
}

/// Did-not-play and pinch-running-only lines are dropped.
pub fn has_relevant_activity(batting: &BattingStats, pitching: &PitchingStats) -> bool {
    batting.at_bats() > 0
        || batting.walks() > 0
        || batting.strikeouts() > 0
        || !pitching.innings_pitched().is_zero()
        || pitching.pitching_strikeouts() > 0
}

// ---------------------------------------------------------------------------
// Raw → scoring lines
// ---------------------------------------------------------------------------

/// Strict conversion for boxscore counts: absent is zero, negative is
/// a validation failure.
fn count(field: &str, value: Option<i64>) -> Result<u32, StatsError> {
    let v = value.unwrap_or(0);
    u32::try_from(v).map_err(|_| StatsError::Validation(format!("{field} out of range: {v}")))
}

fn optional_count(field: &str, value: Option<i64>) -> Result<Option<u32>, StatsError> {
    value.map(|v| count(field, Some(v))).transpose()
}

fn batting_line(raw: &RawBatting) -> Result<BattingLine, StatsError> {
    Ok(BattingLine {
        hits: count("hits", raw.hits)?,
        doubles: count("doubles", raw.doubles)?,
        triples: count("triples", raw.triples)?,
        home_runs: count("homeRuns", raw.home_runs)?,
        rbi: count("rbi", raw.rbi)?,
        runs: count("runs", raw.runs)?,
        stolen_bases: count("stolenBases", raw.stolen_bases)?,
        walks: count("baseOnBalls", raw.base_on_balls)?,
        strikeouts: count("strikeOuts", raw.strike_outs)?,
    })
}

fn pitching_line(raw: &RawPitching) -> Result<PitchingLine, StatsError> {
    Ok(PitchingLine {
        innings_pitched: raw.innings_pitched.clone(),
        earned_runs: count("earnedRuns", raw.earned_runs)?,
        wins: count("wins", raw.wins)?,
        losses: count("losses", raw.losses)?,
        saves: count("saves", raw.saves)?,
        strikeouts: count("strikeOuts", raw.strike_outs)?,
        hits_allowed: count("hits", raw.hits)?,
        walks_issued: count("baseOnBalls", raw.base_on_balls)?,
        holds: optional_count("holds", raw.holds)?,
    })
}

/// Aggregate split counts. Out-of-range values are treated as zero.
fn lenient(value: Option<i64>) -> u32 {
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

pub fn split_batting_line(stat: &SplitStat) -> BattingLine {
    BattingLine {
        hits: lenient(stat.hits),
        doubles: lenient(stat.doubles),
        triples: lenient(stat.triples),
        home_runs: lenient(stat.home_runs),
        rbi: lenient(stat.rbi),
        runs: lenient(stat.runs),
        stolen_bases: lenient(stat.stolen_bases),
        walks: lenient(stat.base_on_balls),
        strikeouts: lenient(stat.strike_outs),
    }
}

pub fn split_pitching_line(stat: &SplitStat) -> PitchingLine {
    PitchingLine {
        innings_pitched: stat.innings_pitched.clone(),
        earned_runs: lenient(stat.earned_runs),
        wins: lenient(stat.wins),
        losses: lenient(stat.losses),
        saves: lenient(stat.saves),
        strikeouts: lenient(stat.strike_outs),
        hits_allowed: lenient(stat.hits),
        walks_issued: lenient(stat.base_on_balls),
        holds: stat.holds.and_then(|h| u32::try_from(h).ok()),
    }
}

pub fn split_games_played(stat: &SplitStat) -> u32 {
    lenient(stat.games_played)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
