//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a partial file (or none) still yields a
//! runnable service. Secrets (ESPN cookies) are referenced by env-var name
//! and resolved at startup.

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::calendar::{parse_month_day, DEFAULT_SEASON_END, DEFAULT_SEASON_START};
use crate::engine::replacement::ReplacementConfig;
use crate::mlb::client::{MlbClientConfig, DEFAULT_BASE_URL};
use crate::scoring::InningsConvention;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub league: LeagueConfig,
    pub scoring: ScoringConfig,
    pub roster: RosterConfig,
    pub replacement: ReplacementConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://dugout.db?mode=rwc".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 15,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl UpstreamConfig {
    pub fn client_config(&self) -> MlbClientConfig {
        MlbClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LeagueConfig {
    /// IANA timezone that defines "today".
    pub timezone: String,
    /// `MM-DD`
    pub season_start: String,
    pub season_end: String,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".into(),
            season_start: format!("{:02}-{:02}", DEFAULT_SEASON_START.0, DEFAULT_SEASON_START.1),
            season_end: format!("{:02}-{:02}", DEFAULT_SEASON_END.0, DEFAULT_SEASON_END.1),
        }
    }
}

impl LeagueConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Unknown timezone '{}': {e}", self.timezone))
    }

    /// (start, end) as (month, day) pairs.
    pub fn season_bounds(&self) -> Result<((u32, u32), (u32, u32))> {
        let start = parse_month_day(&self.season_start)
            .with_context(|| format!("Invalid season_start: {}", self.season_start))?;
        let end = parse_month_day(&self.season_end)
            .with_context(|| format!("Invalid season_end: {}", self.season_end))?;
        Ok((start, end))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub innings_convention: InningsConvention,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RosterConfig {
    pub enabled: bool,
    pub league_id_env: String,
    pub swid_env: String,
    pub espn_s2_env: String,
    /// Roster season to query instead of the stats season.
    pub season: Option<i32>,
    pub segment: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            league_id_env: "ESPN_LEAGUE_ID".into(),
            swid_env: "ESPN_SWID".into(),
            espn_s2_env: "ESPN_S2".into(),
            season: None,
            segment: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.league.tz()?;
        config.league.season_bounds()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
