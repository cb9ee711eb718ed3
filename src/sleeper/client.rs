// HTTP provider client.
//
// Wraps the Sleeper public API plus the market valuation feed behind the
// `LeagueProvider` trait so orchestration code (and its tests) never talk
// to the network directly. The player directory and value lists are cached
// per process with a configured TTL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::cache::TtlCache;
use super::types::{
    DraftDetail, DraftSummary, LeagueInfo, LeagueRoster, LeagueUser, MarketValue,
    PlayerDirectory, SleeperAccount, TradedPickDto,
};
use crate::config::Config;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The resource doesn't exist upstream (404, or Sleeper's `null` body
    /// for unknown ids).
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure or a response body that didn't match the expected
    /// shape.
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Everything the sync and read paths need from the outside world.
#[async_trait]
pub trait LeagueProvider: Send + Sync {
    async fn league(&self, league_id: &str) -> Result<LeagueInfo, ProviderError>;
    async fn league_users(&self, league_id: &str) -> Result<Vec<LeagueUser>, ProviderError>;
    async fn league_rosters(&self, league_id: &str) -> Result<Vec<LeagueRoster>, ProviderError>;
    async fn traded_picks(&self, league_id: &str) -> Result<Vec<TradedPickDto>, ProviderError>;
    async fn league_drafts(&self, league_id: &str) -> Result<Vec<DraftSummary>, ProviderError>;
    async fn draft_detail(&self, draft_id: &str) -> Result<DraftDetail, ProviderError>;
    /// Full player directory (id → metadata). Cached per process.
    async fn player_directory(&self) -> Result<Arc<PlayerDirectory>, ProviderError>;
    /// Market valuation list for a league of `num_teams` teams. Cached per
    /// parameter set.
    async fn market_values(&self, num_teams: u32) -> Result<Arc<Vec<MarketValue>>, ProviderError>;
    async fn user_by_name(&self, username: &str) -> Result<SleeperAccount, ProviderError>;
}

// ---------------------------------------------------------------------------
// SleeperClient
// ---------------------------------------------------------------------------

pub struct SleeperClient {
    http: reqwest::Client,
    base_url: String,
    values_url: String,
    dynasty: bool,
    num_qbs: u32,
    ppr: f64,
    players_cache: TtlCache<(), PlayerDirectory>,
    values_cache: TtlCache<String, Vec<MarketValue>>,
}

impl SleeperClient {
    /// Build a client from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.sleeper.base_url.trim_end_matches('/').to_string(),
            values_url: config.sleeper.values_url.clone(),
            dynasty: config.values.dynasty,
            num_qbs: config.values.num_qbs,
            ppr: config.values.ppr,
            players_cache: TtlCache::new(Duration::from_secs(config.cache.players_ttl_secs)),
            values_cache: TtlCache::new(Duration::from_secs(config.cache.values_ttl_secs)),
        }
    }

    /// GET a JSON body. 404 maps to `NotFound`; other error statuses and
    /// body-shape mismatches map to `Transport`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        debug!(url, "provider request");
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(url.to_string()));
        }
        Ok(response.error_for_status()?.json::<T>().await?)
    }

    /// GET an endpoint where Sleeper signals "unknown id" as a literal
    /// `null` body instead of a 404.
    async fn get_required<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let value: Option<T> = self.get_json(url).await?;
        value.ok_or_else(|| ProviderError::NotFound(url.to_string()))
    }

    /// GET a list endpoint, treating a `null` body as empty.
    async fn get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, ProviderError> {
        let value: Option<Vec<T>> = self.get_json(url).await?;
        Ok(value.unwrap_or_default())
    }
}

#[async_trait]
impl LeagueProvider for SleeperClient {
    async fn league(&self, league_id: &str) -> Result<LeagueInfo, ProviderError> {
        self.get_required(&format!("{}/league/{league_id}", self.base_url))
            .await
    }

    async fn league_users(&self, league_id: &str) -> Result<Vec<LeagueUser>, ProviderError> {
        self.get_list(&format!("{}/league/{league_id}/users", self.base_url))
            .await
    }

    async fn league_rosters(&self, league_id: &str) -> Result<Vec<LeagueRoster>, ProviderError> {
        self.get_list(&format!("{}/league/{league_id}/rosters", self.base_url))
            .await
    }

    async fn traded_picks(&self, league_id: &str) -> Result<Vec<TradedPickDto>, ProviderError> {
        self.get_list(&format!("{}/league/{league_id}/traded_picks", self.base_url))
            .await
    }

    async fn league_drafts(&self, league_id: &str) -> Result<Vec<DraftSummary>, ProviderError> {
        self.get_list(&format!("{}/league/{league_id}/drafts", self.base_url))
            .await
    }

    async fn draft_detail(&self, draft_id: &str) -> Result<DraftDetail, ProviderError> {
        self.get_required(&format!("{}/draft/{draft_id}", self.base_url))
            .await
    }

    async fn player_directory(&self) -> Result<Arc<PlayerDirectory>, ProviderError> {
        if let Some(directory) = self.players_cache.get(&()) {
            return Ok(directory);
        }
        let directory: PlayerDirectory = self
            .get_json(&format!("{}/players/nfl", self.base_url))
            .await?;
        debug!(players = directory.len(), "player directory refreshed");
        Ok(self.players_cache.insert((), directory))
    }

    async fn market_values(&self, num_teams: u32) -> Result<Arc<Vec<MarketValue>>, ProviderError> {
        let query = values_query(self.dynasty, self.num_qbs, num_teams, self.ppr);
        let key: String = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        if let Some(values) = self.values_cache.get(&key) {
            return Ok(values);
        }

        debug!(url = %self.values_url, %key, "market value request");
        let response = self.http.get(&self.values_url).query(&query).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(self.values_url.clone()));
        }
        let values: Vec<MarketValue> = response.error_for_status()?.json().await?;
        Ok(self.values_cache.insert(key, values))
    }

    async fn user_by_name(&self, username: &str) -> Result<SleeperAccount, ProviderError> {
        self.get_required(&format!("{}/user/{username}", self.base_url))
            .await
    }
}

/// Query parameters for the market valuation endpoint.
fn values_query(dynasty: bool, num_qbs: u32, num_teams: u32, ppr: f64) -> Vec<(&'static str, String)> {
    vec![
        ("isDynasty", dynasty.to_string()),
        ("numQbs", num_qbs.to_string()),
        ("numTeams", num_teams.to_string()),
        ("ppr", format_ppr(ppr)),
    ]
}

/// Render the PPR value the way the endpoint expects: whole numbers
/// without a decimal point ("1", not "1.0"), fractions as-is ("0.5").
fn format_ppr(ppr: f64) -> String {
    if ppr.fract() == 0.0 {
        format!("{}", ppr as i64)
    } else {
        format!("{ppr}")
    }
}
