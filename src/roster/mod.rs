//! Best-effort "on a fantasy roster" enrichment.
//!
//! A `RosterSource` yields the full names rostered in a fantasy league;
//! `RosterAnnotator` flags matching players. Matching is case- and
//! accent-insensitive. Any failure leaves the players untouched.

pub mod espn;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::types::{PlayerWeekly, StatsError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Full names of every rostered player for `season`.
    async fn rostered_names(&self, season: i32) -> Result<Vec<String>, StatsError>;
}

/// Lowercase and strip combining diacritical marks (U+0300–U+036F).
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

pub struct RosterAnnotator {
    source: Arc<dyn RosterSource>,
    /// Roster season to query regardless of the stats season.
    season_override: Option<i32>,
}

impl RosterAnnotator {
    pub fn new(source: Arc<dyn RosterSource>, season_override: Option<i32>) -> Self {
        Self {
            source,
            season_override,
        }
    }

    /// Set `is_rostered` on every match. Returns how many were flagged;
    /// zero when the roster could not be fetched.
    pub async fn annotate(&self, players: &mut [PlayerWeekly], season: i32) -> usize {
        let season = self.season_override.unwrap_or(season);
        let names = match self.source.rostered_names(season).await {
            Ok(names) => names,
            Err(e) => {
                warn!(season, error = %e, "Roster enrichment skipped");
                return 0;
            }
        };

        let rostered: HashSet<String> = names.iter().map(|n| normalize_name(n)).collect();
        let mut flagged = 0;
        for player in players.iter_mut() {
            if rostered.contains(&normalize_name(&player.full_name)) {
                player.is_rostered = true;
                flagged += 1;
            }
        }

        info!(season, rostered = rostered.len(), flagged, "Annotated rostered players");
        flagged
    }
}
