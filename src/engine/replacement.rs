//! Season replacement-level report.
//!
//! Season splits are scored with the same engine as daily stats, grouped by
//! full position name and ranked. A position's replacement rank is
//! `league_size × roster slots`; players above half of it are elite, the
//! rest above it are starters, everyone below is replacement level.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::normalizer::{split_batting_line, split_games_played, split_pitching_line};
use crate::calendar::LeagueCalendar;
use crate::mlb::schema::{Split, SplitStat};
use crate::mlb::{SplitGroup, StatsSource};
use crate::scoring::position::{full_position_name, RELIEF_PITCHER, STARTING_PITCHER};
use crate::scoring::ScoringEngine;
use crate::types::StatsError;

const DEFAULT_LEAGUE_SIZE: u32 = 7;

/// Display order for position groups. Others follow alphabetically.
const POSITION_ORDER: [&str; 10] = [
    "Catcher",
    "First Base",
    "Second Base",
    "Third Base",
    "Shortstop",
    "Outfield",
    "Designated Hitter",
    "Utility",
    "Starting Pitcher",
    "Relief Pitcher",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplacementConfig {
    pub league_size: u32,
    /// Roster slots per team, keyed by full position name.
    pub slots: BTreeMap<String, u32>,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        let slots = [
            ("Catcher", 1),
            ("First Base", 1),
            ("Second Base", 1),
            ("Third Base", 1),
            ("Shortstop", 1),
            ("Outfield", 3),
            ("Designated Hitter", 1),
            ("Utility", 1),
            ("Starting Pitcher", 3),
            ("Relief Pitcher", 4),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            league_size: DEFAULT_LEAGUE_SIZE,
            slots,
        }
    }
}

impl ReplacementConfig {
    /// Rank at which a position drops to replacement level.
    pub fn threshold(&self, position: &str) -> usize {
        let slots = self.slots.get(position).copied().unwrap_or(1);
        (self.league_size * slots) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Elite,
    Starter,
    Replacement,
}

/// Tier for the zero-based `index` within a position group.
pub fn tier_for(index: usize, threshold: usize) -> Tier {
    if (index as f64) < threshold as f64 * 0.5 {
        Tier::Elite
    } else if index < threshold {
        Tier::Starter
    } else {
        Tier::Replacement
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlayer {
    pub id: u64,
    pub full_name: String,
    pub team_name: String,
    pub position_abbr: String,
    pub games_played: u32,
    pub fantasy_points: f64,
    /// One-based.
    pub rank: usize,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionGroup {
    pub position: String,
    pub replacement_rank: usize,
    pub players: Vec<RankedPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementReport {
    pub season: i32,
    pub league_size: u32,
    pub groups: Vec<PositionGroup>,
}

impl ReplacementReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

struct Candidate {
    id: u64,
    full_name: String,
    team_name: String,
    position_abbr: String,
    games_played: u32,
    points: f64,
}

fn candidate(split: &Split, stat: &SplitStat, position_abbr: String, points: f64) -> Option<Candidate> {
    let player = split.player.as_ref()?;
    let team = split.team.as_ref()?;
    Some(Candidate {
        id: player.id,
        full_name: player.full_name.clone().unwrap_or_default(),
        team_name: team.name.clone().unwrap_or_default(),
        position_abbr,
        games_played: split_games_played(stat),
        points,
    })
}

pub struct ReplacementLevel {
    source: Arc<dyn StatsSource>,
    scoring: ScoringEngine,
    config: ReplacementConfig,
    calendar: LeagueCalendar,
}

impl ReplacementLevel {
    pub fn new(
        source: Arc<dyn StatsSource>,
        scoring: ScoringEngine,
        config: ReplacementConfig,
        calendar: LeagueCalendar,
    ) -> Self {
        Self {
            source,
            scoring,
            config,
            calendar,
        }
    }

    /// The requested season, or the one today belongs to.
    pub fn season_or_current(&self, season: Option<i32>) -> i32 {
        season.unwrap_or_else(|| LeagueCalendar::infer_season(self.calendar.today()))
    }

    pub async fn report(&self, season: i32) -> Result<ReplacementReport, StatsError> {
        let (hitting, pitching) = futures::try_join!(
            self.source.season_splits(SplitGroup::Hitting, season, None),
            self.source.season_splits(SplitGroup::Pitching, season, None),
        )?;
        let report = self.build_report(season, &hitting, &pitching);
        info!(
            season,
            hitters = hitting.len(),
            pitchers = pitching.len(),
            groups = report.groups.len(),
            "Built replacement-level report"
        );
        Ok(report)
    }

    pub fn build_report(&self, season: i32, hitting: &[Split], pitching: &[Split]) -> ReplacementReport {
        let mut groups: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();

        for split in hitting {
            let (Some(stat), Some(position)) = (split.stat.as_ref(), split.position.as_ref()) else {
                continue;
            };
            if split_games_played(stat) == 0 {
                continue;
            }
            let abbr = position.abbreviation.clone().unwrap_or_else(|| "Unknown".to_string());
            let points = self.scoring.score_batting(&split_batting_line(stat));
            if let Some(c) = candidate(split, stat, abbr, points) {
                groups
                    .entry(full_position_name(&c.position_abbr).to_string())
                    .or_default()
                    .push(c);
            }
        }

        for split in pitching {
            let Some(stat) = split.stat.as_ref() else {
                continue;
            };
            let line = split_pitching_line(stat);
            let started = stat.games_started.unwrap_or(0) > 0;
            let relieved = line.saves > 0 || line.holds.unwrap_or(0) > 0;
            if split_games_played(stat) == 0 || !(started || relieved) {
                continue;
            }
            let abbr = if started { STARTING_PITCHER } else { RELIEF_PITCHER };
            let points = self.scoring.score_pitching(&line);
            if let Some(c) = candidate(split, stat, abbr.to_string(), points) {
                groups
                    .entry(full_position_name(abbr).to_string())
                    .or_default()
                    .push(c);
            }
        }

        let mut ordered: Vec<(String, Vec<Candidate>)> = groups.into_iter().collect();
        ordered.sort_by_key(|(name, _)| {
            let slot = POSITION_ORDER
                .iter()
                .position(|p| p == name)
                .unwrap_or(POSITION_ORDER.len());
            (slot, name.clone())
        });

        let groups = ordered
            .into_iter()
            .map(|(position, mut players)| {
                players.sort_by(|a, b| b.points.total_cmp(&a.points).then(a.id.cmp(&b.id)));
                let threshold = self.config.threshold(&position);
                let players = players
                    .into_iter()
                    .enumerate()
                    .map(|(i, c)| RankedPlayer {
                        id: c.id,
                        full_name: c.full_name,
                        team_name: c.team_name,
                        position_abbr: c.position_abbr,
                        games_played: c.games_played,
                        fantasy_points: c.points,
                        rank: i + 1,
                        tier: tier_for(i, threshold),
                    })
                    .collect();
                PositionGroup {
                    position,
                    replacement_rank: threshold,
                    players,
                }
            })
            .collect();

        ReplacementReport {
            season,
            league_size: self.config.league_size,
            groups,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
