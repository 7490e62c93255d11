//! DUGOUT: MLB fantasy points service.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the stats cache, wires the upstream clients into the engine
//! and serves the JSON API until Ctrl+C.

use anyhow::Result;
use secrecy::SecretString;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use dugout::calendar::LeagueCalendar;
use dugout::config::{self, AppConfig, RosterConfig};
use dugout::dashboard::{self, ServiceState};
use dugout::engine::normalizer::StatsNormalizer;
use dugout::engine::pipeline::StatsPipeline;
use dugout::engine::replacement::ReplacementLevel;
use dugout::engine::weekly::WeeklyAggregator;
use dugout::mlb::client::MlbClient;
use dugout::mlb::StatsSource;
use dugout::roster::espn::{EspnCredentials, EspnRosterClient};
use dugout::roster::RosterAnnotator;
use dugout::scoring::{PointsSystem, ScoringEngine};
use dugout::storage::{PlayerStatsRepository, SqliteStatsRepository};

const CONFIG_PATH: &str = "config.toml";

const BANNER: &str = r#"
 ____  _   _  ____  ___  _   _ _____
|  _ \| | | |/ ___|/ _ \| | | |_   _|
| | | | | | | |  _| | | | | | | | |
| |_| | |_| | |_| | |_| | |_| | | |
|____/ \___/ \____|\___/ \___/  |_|

  MLB fantasy points service
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::AppConfig::load(CONFIG_PATH)?
    } else {
        AppConfig::default()
    };

    init_logging();

    println!("{BANNER}");
    if !Path::new(CONFIG_PATH).exists() {
        warn!(path = CONFIG_PATH, "No config file found, using defaults");
    }
    info!(
        timezone = %cfg.league.timezone,
        database = %cfg.database.url,
        upstream = %cfg.upstream.base_url,
        innings = ?cfg.scoring.innings_convention,
        "DUGOUT starting up"
    );

    // -- Initialise components -------------------------------------------

    let (season_start, season_end) = cfg.league.season_bounds()?;
    let calendar = LeagueCalendar::system(cfg.league.tz()?)
        .with_season_bounds(season_start, season_end);

    let repository = SqliteStatsRepository::connect(&cfg.database.url, cfg.database.max_connections).await?;
    repository.ensure_schema().await?;
    let repository: Arc<dyn PlayerStatsRepository> = Arc::new(repository);

    let source: Arc<dyn StatsSource> =
        Arc::new(MlbClient::new(cfg.upstream.client_config(), calendar.clone())?);

    let scoring = ScoringEngine::new(PointsSystem::with_convention(cfg.scoring.innings_convention));

    let pipeline = StatsPipeline::new(
        source.clone(),
        repository,
        StatsNormalizer::new(scoring.clone()),
        calendar.clone(),
    );
    let weekly = WeeklyAggregator::new(source.clone(), scoring.clone(), calendar.clone());
    let replacement = ReplacementLevel::new(
        source,
        scoring,
        cfg.replacement.clone(),
        calendar.clone(),
    );

    let roster = build_roster(&cfg.roster)?;

    let state = Arc::new(ServiceState {
        pipeline,
        weekly,
        replacement,
        roster,
        calendar,
    });

    dashboard::serve(state, &cfg.server.host, cfg.server.port).await?;

    info!("DUGOUT shut down cleanly.");
    Ok(())
}

/// Roster enrichment is optional; missing credentials disable it.
fn build_roster(cfg: &RosterConfig) -> Result<Option<RosterAnnotator>> {
    if !cfg.enabled {
        info!("Roster enrichment disabled");
        return Ok(None);
    }

    let resolved = (
        AppConfig::resolve_env(&cfg.league_id_env),
        AppConfig::resolve_env(&cfg.swid_env),
        AppConfig::resolve_env(&cfg.espn_s2_env),
    );
    let (league_id, swid, espn_s2) = match resolved {
        (Ok(league_id), Ok(swid), Ok(espn_s2)) => (league_id, swid, espn_s2),
        (league_id, swid, espn_s2) => {
            let missing: Vec<String> = [league_id.err(), swid.err(), espn_s2.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect();
            warn!(missing = ?missing, "ESPN credentials incomplete, roster enrichment disabled");
            return Ok(None);
        }
    };

    let credentials = EspnCredentials {
        league_id,
        swid: SecretString::new(swid),
        espn_s2: SecretString::new(espn_s2),
    };
    let client = EspnRosterClient::new(credentials, cfg.segment)?;
    info!(season_override = ?cfg.season, "Roster enrichment enabled");
    Ok(Some(RosterAnnotator::new(Arc::new(client), cfg.season)))
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dugout=info"));

    let json_logging = std::env::var("DUGOUT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
