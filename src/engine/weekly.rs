//! Weekly fantasy points for a season.
//!
//! The season is cut into Monday-to-Sunday windows starting at the first
//! Monday on or after the season start. Each window's hitting and pitching
//! splits are fetched together; windows are walked one after another.
//! Points accumulate in a per-player builder that is frozen and sorted once
//! every window has been processed.

use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::normalizer::{split_batting_line, split_games_played, split_pitching_line};
use crate::calendar::LeagueCalendar;
use crate::mlb::schema::Split;
use crate::mlb::{DateRange, SplitGroup, StatsSource};
use crate::scoring::ScoringEngine;
use crate::types::{PlayerWeekly, StatsError};

/// One Monday-to-Sunday window, truncated at the end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub fn first_monday_on_or_after(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_monday()) % 7;
    date.checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(date)
}

pub fn week_windows(season_start: NaiveDate, end: NaiveDate) -> Vec<WeekWindow> {
    let mut windows = Vec::new();
    let mut start = first_monday_on_or_after(season_start);

    while start <= end {
        let Some(sunday) = start.checked_add_days(Days::new(6)) else {
            break;
        };
        windows.push(WeekWindow {
            index: windows.len(),
            start,
            end: sunday.min(end),
        });
        match start.checked_add_days(Days::new(7)) {
            Some(next) => start = next,
            None => break,
        }
    }
    windows
}

/// Season, clamped end date and the windows in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPlan {
    pub season: i32,
    pub end: NaiveDate,
    pub windows: Vec<WeekWindow>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Mutable accumulator keyed by player id.
#[derive(Debug)]
struct WeeklyBuilder {
    weeks: usize,
    players: HashMap<u64, PlayerWeekly>,
}

impl WeeklyBuilder {
    fn new(weeks: usize) -> Self {
        Self {
            weeks,
            players: HashMap::new(),
        }
    }

    fn add(&mut self, week: usize, split: &Split, points: f64) {
        let Some(person) = split.player.as_ref() else {
            return;
        };
        let weeks = self.weeks;
        let entry = self.players.entry(person.id).or_insert_with(|| PlayerWeekly {
            id: person.id,
            full_name: person.full_name.clone().unwrap_or_default(),
            team_name: split
                .team
                .as_ref()
                .and_then(|t| t.name.clone())
                .unwrap_or_default(),
            position_abbr: split
                .position
                .as_ref()
                .and_then(|p| p.abbreviation.clone())
                .unwrap_or_default(),
            weekly_points: vec![0.0; weeks],
            total_points: 0.0,
            is_rostered: false,
        });
        if let Some(slot) = entry.weekly_points.get_mut(week) {
            *slot += points;
        }
    }

    /// Highest total first, ties by id.
    fn finish(self) -> Vec<PlayerWeekly> {
        let mut players: Vec<PlayerWeekly> = self
            .players
            .into_values()
            .map(|mut p| {
                p.total_points = p.weekly_points.iter().sum();
                p
            })
            .collect();
        players.sort_by(|a, b| {
            b.total_points
                .total_cmp(&a.total_points)
                .then(a.id.cmp(&b.id))
        });
        players
    }
}

fn scoreable(split: &Split) -> bool {
    split.player.is_some()
        && split
            .stat
            .as_ref()
            .is_some_and(|s| split_games_played(s) > 0)
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

pub struct WeeklyAggregator {
    source: Arc<dyn StatsSource>,
    scoring: ScoringEngine,
    calendar: LeagueCalendar,
}

impl WeeklyAggregator {
    pub fn new(source: Arc<dyn StatsSource>, scoring: ScoringEngine, calendar: LeagueCalendar) -> Self {
        Self {
            source,
            scoring,
            calendar,
        }
    }

    /// Resolve the season and end date.
    ///
    /// With no end date, today is used; a season later than this year moves
    /// that default forward into the season. The end is clamped to the
    /// season end.
    pub fn plan(&self, season: Option<i32>, end_date: Option<NaiveDate>) -> WeeklyPlan {
        let mut end = end_date.unwrap_or_else(|| self.calendar.today());
        if end_date.is_none() {
            if let Some(s) = season.filter(|s| *s > end.year()) {
                end = with_year(end, s);
            }
        }
        let season = season.unwrap_or_else(|| LeagueCalendar::infer_season(end));

        if let Some(season_end) = self.calendar.season_end(season) {
            end = end.min(season_end);
        }
        let windows = self
            .calendar
            .season_start(season)
            .map(|start| week_windows(start, end))
            .unwrap_or_default();

        WeeklyPlan {
            season,
            end,
            windows,
        }
    }

    pub async fn aggregate(&self, plan: &WeeklyPlan) -> Result<Vec<PlayerWeekly>, StatsError> {
        let mut builder = WeeklyBuilder::new(plan.windows.len());

        for window in &plan.windows {
            let range = Some(DateRange {
                start: window.start,
                end: window.end,
            });
            let (hitting, pitching) = futures::try_join!(
                self.source.season_splits(SplitGroup::Hitting, plan.season, range),
                self.source.season_splits(SplitGroup::Pitching, plan.season, range),
            )?;

            for split in hitting.iter().filter(|s| scoreable(s)) {
                if let Some(stat) = split.stat.as_ref() {
                    let points = self.scoring.score_batting(&split_batting_line(stat));
                    builder.add(window.index, split, points);
                }
            }
            for split in pitching.iter().filter(|s| scoreable(s)) {
                if let Some(stat) = split.stat.as_ref() {
                    let points = self.scoring.score_pitching(&split_pitching_line(stat));
                    builder.add(window.index, split, points);
                }
            }

            debug!(
                week = window.index,
                start = %window.start,
                end = %window.end,
                hitters = hitting.len(),
                pitchers = pitching.len(),
                "Aggregated week"
            );
        }

        let players = builder.finish();
        info!(
            season = plan.season,
            weeks = plan.windows.len(),
            players = players.len(),
            "Weekly aggregation complete"
        );
        Ok(players)
    }

    pub async fn weekly_points(
        &self,
        season: Option<i32>,
        end_date: Option<NaiveDate>,
    ) -> Result<(WeeklyPlan, Vec<PlayerWeekly>), StatsError> {
        let plan = self.plan(season, end_date);
        let players = self.aggregate(&plan).await?;
        Ok((plan, players))
    }
}

/// Same month and day in `year`; Feb 29 becomes Feb 28 when needed.
fn with_year(date: NaiveDate, year: i32) -> NaiveDate {
    date.with_year(year)
        .or_else(|| date.with_day(28).and_then(|d| d.with_year(year)))
        .unwrap_or(date)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
