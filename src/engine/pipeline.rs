//! Read-through stats pipeline for one date.
//!
//! ```text
//! RESOLVE_DATE → CHECK_CACHE ─┬─ hit  → RETURN
//!                             └─ miss → FETCH_UPSTREAM → NORMALIZE ─┬─ empty    → RETURN (message)
//!                                                                   └─ nonempty → PERSIST? → RETURN
//! ```
//!
//! Cache reads that fail fall through to upstream; cache writes that fail
//! are logged. Today's results are never persisted, and neither is a day
//! on which any game failed to load.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::normalizer::StatsNormalizer;
use crate::calendar::{parse_date, LeagueCalendar};
use crate::mlb::StatsSource;
use crate::storage::PlayerStatsRepository;
use crate::types::{PlayerStats, StatsError};

/// Where a day's stats came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsOrigin {
    Cache,
    Upstream,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Skip the cache read. Results may still be written.
    pub bypass_cache: bool,
}

/// One date's result.
#[derive(Debug, Clone)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub stats: Vec<PlayerStats>,
    pub origin: StatsOrigin,
    pub persisted: bool,
    /// Set when `stats` is empty.
    pub message: Option<String>,
}

pub struct StatsPipeline {
    source: Arc<dyn StatsSource>,
    repository: Arc<dyn PlayerStatsRepository>,
    normalizer: StatsNormalizer,
    calendar: LeagueCalendar,
}

impl StatsPipeline {
    pub fn new(
        source: Arc<dyn StatsSource>,
        repository: Arc<dyn PlayerStatsRepository>,
        normalizer: StatsNormalizer,
        calendar: LeagueCalendar,
    ) -> Self {
        Self {
            source,
            repository,
            normalizer,
            calendar,
        }
    }

    pub fn calendar(&self) -> &LeagueCalendar {
        &self.calendar
    }

    /// Explicit date when given, otherwise yesterday in the league's home
    /// timezone.
    pub fn resolve_date(&self, requested: Option<&str>) -> Result<NaiveDate, StatsError> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_date(raw),
            None => Ok(self.calendar.yesterday()),
        }
    }

    pub async fn stats_for_date(
        &self,
        requested: Option<&str>,
        options: FetchOptions,
    ) -> Result<DailyStats, StatsError> {
        let date = self.resolve_date(requested)?;

        if !options.bypass_cache {
            if let Some(cached) = self.check_cache(date).await {
                return Ok(cached);
            }
        } else {
            debug!(date = %date, "Cache bypass requested");
        }

        let fetched = self.fetch_upstream(date).await?;
        if fetched.is_empty() {
            return Ok(fetched.into_daily(date, &self.calendar));
        }

        let persisted = if fetched.failures.is_empty() {
            self.persist(date, &fetched.stats).await
        } else {
            warn!(
                date = %date,
                failed_games = fetched.failures.len(),
                "Partial day, not caching"
            );
            false
        };
        Ok(DailyStats {
            date,
            stats: fetched.stats,
            origin: StatsOrigin::Upstream,
            persisted,
            message: None,
        })
    }

    async fn check_cache(&self, date: NaiveDate) -> Option<DailyStats> {
        match self.repository.find_by_date(date).await {
            Ok(rows) if !rows.is_empty() => {
                info!(date = %date, rows = rows.len(), "Serving stats from cache");
                Some(DailyStats {
                    date,
                    stats: rows,
                    origin: StatsOrigin::Cache,
                    persisted: true,
                    message: None,
                })
            }
            Ok(_) => {
                debug!(date = %date, "Cache miss");
                None
            }
            Err(e) => {
                let err = persistence_error(&e);
                warn!(date = %date, error = %err, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn fetch_upstream(&self, date: NaiveDate) -> Result<Fetched, StatsError> {
        let games = self.source.games_by_date(&date.to_string()).await?;
        let mut fetched = Fetched {
            games: games.len(),
            ..Fetched::default()
        };

        for game in &games {
            let result = self
                .source
                .game_boxscore(game.game_id)
                .await
                .and_then(|boxscore| self.normalizer.normalize(&boxscore, game.game_id, date));

            match result {
                Ok(mut lines) => fetched.stats.append(&mut lines),
                Err(e) => {
                    warn!(date = %date, game_id = game.game_id, error = %e, "Skipping game");
                    fetched.failures.push(e);
                }
            }
        }

        info!(
            date = %date,
            games = fetched.games,
            failed_games = fetched.failures.len(),
            players = fetched.stats.len(),
            "Fetched stats from upstream"
        );

        // Every game failed: nothing partial to serve.
        if fetched.games > 0 && fetched.failures.len() == fetched.games {
            if let Some(first) = std::mem::take(&mut fetched.failures).into_iter().next() {
                return Err(first);
            }
        }
        Ok(fetched)
    }

    /// Returns whether the rows were written.
    async fn persist(&self, date: NaiveDate, stats: &[PlayerStats]) -> bool {
        if self.calendar.is_today(date) || self.calendar.is_future(date) {
            debug!(date = %date, "Not caching stats for an unfinished day");
            return false;
        }
        match self.repository.save_batch(stats).await {
            Ok(()) => true,
            Err(e) => {
                let err = persistence_error(&e);
                warn!(date = %date, error = %err, "Failed to cache stats");
                false
            }
        }
    }
}

/// Repository failures carry `anyhow` context; classify them here.
fn persistence_error(e: &anyhow::Error) -> StatsError {
    StatsError::Persistence(format!("{e:#}"))
}

#[derive(Default)]
struct Fetched {
    games: usize,
    stats: Vec<PlayerStats>,
    failures: Vec<StatsError>,
}

impl Fetched {
    fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    fn into_daily(self, date: NaiveDate, calendar: &LeagueCalendar) -> DailyStats {
        let message = if self.games == 0 {
            calendar.availability_message(date)
        } else {
            calendar.no_performances_message(date)
        };
        DailyStats {
            date,
            stats: Vec::new(),
            origin: StatsOrigin::Upstream,
            persisted: false,
            message: Some(message),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
