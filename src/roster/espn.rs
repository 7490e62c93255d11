//! ESPN fantasy baseball league rosters.
//!
//! Primary host: https://lm-api-reads.fantasy.espn.com/apis/v3
//! Legacy host:  https://fantasy.espn.com/apis/v3 (fallback, `mRoster` only)
//! Auth: private leagues need the `SWID` and `espn_s2` session cookies.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::RosterSource;
use crate::types::StatsError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const PRIMARY_HOST: &str = "https://lm-api-reads.fantasy.espn.com";
pub const LEGACY_HOST: &str = "https://fantasy.espn.com";
const PRIMARY_VIEWS: [&str; 5] = ["mRoster", "mTeam", "mSettings", "modular", "mNav"];
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "dugout/0.1";

#[derive(Clone)]
pub struct EspnCredentials {
    pub league_id: String,
    pub swid: SecretString,
    pub espn_s2: SecretString,
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct LeagueResponse {
    #[serde(default)]
    teams: Vec<EspnTeam>,
}

#[derive(Debug, Default, Deserialize)]
struct EspnTeam {
    #[serde(default)]
    roster: Option<EspnRoster>,
}

#[derive(Debug, Default, Deserialize)]
struct EspnRoster {
    #[serde(default)]
    entries: Vec<RosterEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterEntry {
    #[serde(default)]
    player_pool_entry: Option<PoolEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct PoolEntry {
    #[serde(default)]
    player: Option<EspnPlayer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnPlayer {
    #[serde(default)]
    full_name: Option<String>,
}

impl LeagueResponse {
    fn names(self) -> Vec<String> {
        self.teams
            .into_iter()
            .filter_map(|t| t.roster)
            .flat_map(|r| r.entries)
            .filter_map(|e| e.player_pool_entry?.player?.full_name)
            .filter(|n| !n.trim().is_empty())
            .collect()
    }
}

/// `SWID=…; espn_s2=…`, with `espn_s2` percent-decoded when it carries
/// escapes.
pub fn cookie_header(swid: &str, espn_s2: &str) -> String {
    let s2 = if espn_s2.contains('%') {
        urlencoding::decode(espn_s2)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| espn_s2.to_string())
    } else {
        espn_s2.to_string()
    };
    format!("SWID={swid}; espn_s2={s2}")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct EspnRosterClient {
    http: Client,
    credentials: EspnCredentials,
    segment: u32,
    primary_host: String,
    legacy_host: String,
}

impl EspnRosterClient {
    pub fn new(credentials: EspnCredentials, segment: u32) -> Result<Self> {
        Self::with_hosts(credentials, segment, PRIMARY_HOST, LEGACY_HOST)
    }

    pub fn with_hosts(
        credentials: EspnCredentials,
        segment: u32,
        primary_host: &str,
        legacy_host: &str,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for ESPN")?;

        Ok(Self {
            http,
            credentials,
            segment,
            primary_host: primary_host.trim_end_matches('/').to_string(),
            legacy_host: legacy_host.trim_end_matches('/').to_string(),
        })
    }

    fn league_path(&self, season: i32) -> String {
        format!(
            "/apis/v3/games/flb/seasons/{season}/segments/{}/leagues/{}",
            self.segment, self.credentials.league_id
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let cookie = cookie_header(
            self.credentials.swid.expose_secret(),
            self.credentials.espn_s2.expose_secret(),
        );
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie).context("ESPN cookie contains invalid characters")?,
        );
        Ok(headers)
    }

    async fn fetch(&self, url: &str, views: &[&str]) -> Result<LeagueResponse> {
        let query: Vec<(&str, &str)> = views.iter().map(|v| ("view", *v)).collect();
        let response = self
            .http
            .get(url)
            .headers(self.headers()?)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("ESPN request failed: {url}"))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if !status.is_success() {
            bail!("ESPN returned HTTP {status} for {url}");
        }
        if !is_json {
            bail!("ESPN returned a non-JSON response for {url}");
        }

        response
            .json::<LeagueResponse>()
            .await
            .with_context(|| format!("Failed to parse ESPN league response from {url}"))
    }

    async fn fetch_names(&self, season: i32) -> Result<Vec<String>> {
        let path = self.league_path(season);
        let primary = format!("{}{path}", self.primary_host);

        let league = match self.fetch(&primary, &PRIMARY_VIEWS).await {
            Ok(league) => league,
            Err(e) => {
                warn!(error = %e, "ESPN primary host failed, trying legacy host");
                let legacy = format!("{}{path}", self.legacy_host);
                self.fetch(&legacy, &["mRoster"]).await?
            }
        };

        let names = league.names();
        debug!(season, names = names.len(), "Fetched ESPN rosters");
        Ok(names)
    }
}

#[async_trait]
impl RosterSource for EspnRosterClient {
    async fn rostered_names(&self, season: i32) -> Result<Vec<String>, StatsError> {
        self.fetch_names(season)
            .await
            .map_err(|e| StatsError::Enrichment(format!("{e:#}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap as AxumHeaders;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    fn credentials() -> EspnCredentials {
        EspnCredentials {
            league_id: "12345".into(),
            swid: SecretString::new("{ABC-DEF}".into()),
            espn_s2: SecretString::new("AE%2Bx%3D%3D".into()),
        }
    }

    fn league_body() -> serde_json::Value {
        json!({
            "teams": [
                { "roster": { "entries": [
                    { "playerPoolEntry": { "player": { "fullName": "José Ramírez" } } },
                    { "playerPoolEntry": { "player": { "fullName": "Aaron Judge" } } }
                ] } },
                { "roster": { "entries": [ { "playerPoolEntry": {} }, {} ] } },
                {}
            ]
        })
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    const LEAGUE_ROUTE: &str = "/apis/v3/games/flb/seasons/:season/segments/:segment/leagues/:league";

    async fn json_league(headers: AxumHeaders) -> Response {
        let cookie = headers.get("cookie").and_then(|v| v.to_str().ok()).unwrap_or_default();
        if cookie != "SWID={ABC-DEF}; espn_s2=AE+x==" {
            return (axum::http::StatusCode::UNAUTHORIZED, "bad cookie").into_response();
        }
        Json(league_body()).into_response()
    }

    async fn html_page() -> Response {
        (
            [(axum::http::header::CONTENT_TYPE, "text/html")],
            "<html>login</html>",
        )
            .into_response()
    }

    #[test]
    fn test_cookie_decodes_espn_s2() {
        assert_eq!(
            cookie_header("{ABC}", "AE%2Bx%3D%3D"),
            "SWID={ABC}; espn_s2=AE+x=="
        );
        assert_eq!(cookie_header("{ABC}", "plain"), "SWID={ABC}; espn_s2=plain");
    }

    #[test]
    fn test_names_skip_incomplete_entries() {
        let league: LeagueResponse = serde_json::from_value(league_body()).unwrap();
        assert_eq!(league.names(), vec!["José Ramírez", "Aaron Judge"]);
    }

    #[tokio::test]
    async fn test_primary_host_success() {
        let base = spawn(Router::new().route(LEAGUE_ROUTE, get(json_league))).await;
        let client = EspnRosterClient::with_hosts(credentials(), 0, &base, "http://127.0.0.1:1").unwrap();
        let names = client.rostered_names(2024).await.unwrap();
        assert_eq!(names.len(), 2);
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_is_not_json() {
        let primary = spawn(Router::new().route(LEAGUE_ROUTE, get(html_page))).await;
        let legacy = spawn(Router::new().route(LEAGUE_ROUTE, get(json_league))).await;
        let client = EspnRosterClient::with_hosts(credentials(), 0, &primary, &legacy).unwrap();
        let names = client.rostered_names(2024).await.unwrap();
        assert!(names.contains(&"Aaron Judge".to_string()));
    }

    #[tokio::test]
    async fn test_both_hosts_failing_is_enrichment_error() {
        let primary = spawn(Router::new().route(LEAGUE_ROUTE, get(html_page))).await;
        let legacy = spawn(Router::new().route(LEAGUE_ROUTE, get(html_page))).await;
        let client = EspnRosterClient::with_hosts(credentials(), 0, &primary, &legacy).unwrap();
        let err = client.rostered_names(2024).await.unwrap_err();
        assert!(matches!(err, StatsError::Enrichment(_)));
    }
}
