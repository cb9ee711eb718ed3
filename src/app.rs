// Application state and orchestration logic.
//
// The sync path pulls everything from the provider, derives the pick
// ledger, and only then touches the store; the read path serves cached
// rows and recomputes team needs on every request. HTTP concerns stay in
// the server module.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::ledger::{build_ledger, DraftOrder, TradedPick};
use crate::model::{
    resolve_current_season, resolve_players, resolve_round_count, DraftPick, League, Roster,
    UpdateDraftPick, User,
};
use crate::needs::{compute_team_needs, NeedsStrategy, Position};
use crate::sleeper::client::{LeagueProvider, ProviderError};
use crate::sleeper::types::{MarketValue, PlayerDirectory, SleeperAccount};

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AppError {
    /// The requested resource doesn't exist (league never synced, unknown
    /// pick or user).
    #[error("{0}")]
    NotFound(String),

    /// The request payload is malformed (empty team order, blank comment).
    #[error("{0}")]
    Validation(String),

    /// The caller didn't supply a user identity where one is required.
    #[error("{0}")]
    Unauthorized(String),

    /// The provider failed on data the operation cannot proceed without.
    /// Nothing has been written when this surfaces from a sync.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// A storage or serialization failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub provider: Arc<dyn LeagueProvider>,
}

impl AppState {
    pub fn new(config: Config, db: Database, provider: Arc<dyn LeagueProvider>) -> Self {
        Self {
            config,
            db,
            provider,
        }
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Mirror a league from the provider into the store.
///
/// League metadata and the roster list are required: any failure there
/// aborts before a single write. Users, trades, and draft orders degrade
/// to defaults, matching what the upstream omits for young leagues. The
/// pick rebuild itself is atomic inside the store.
pub async fn sync_league(state: &AppState, league_id: &str) -> Result<(), AppError> {
    info!(league_id, "starting league sync");

    let league_info = state.provider.league(league_id).await.map_err(|e| match e {
        ProviderError::NotFound(_) => AppError::NotFound("League not found".to_string()),
        other => AppError::Upstream(other.to_string()),
    })?;

    let roster_dtos = state
        .provider
        .league_rosters(league_id)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    if roster_dtos.is_empty() {
        return Err(AppError::Upstream(format!(
            "league {league_id} returned no rosters"
        )));
    }

    let user_dtos = match state.provider.league_users(league_id).await {
        Ok(users) => users,
        Err(e) => {
            warn!(league_id, error = %e, "user fetch failed; syncing without users");
            vec![]
        }
    };

    let trade_dtos = match state.provider.traded_picks(league_id).await {
        Ok(trades) => trades,
        Err(e) => {
            warn!(league_id, error = %e, "traded-pick fetch failed; assuming no trades");
            vec![]
        }
    };

    let mut draft_orders: Vec<DraftOrder> = Vec::new();
    match state.provider.league_drafts(league_id).await {
        Ok(summaries) => {
            for summary in summaries {
                match state.provider.draft_detail(&summary.draft_id).await {
                    Ok(detail) => draft_orders.extend(detail.to_draft_order()),
                    Err(e) => {
                        warn!(draft_id = %summary.draft_id, error = %e,
                              "draft detail fetch failed; slots unavailable for it");
                    }
                }
            }
        }
        Err(e) => {
            warn!(league_id, error = %e, "draft list fetch failed; no slot resolution");
        }
    }

    // All inputs are in hand; assemble rows.
    let season_label = league_info.season.clone().unwrap_or_else(|| {
        use chrono::Datelike;
        chrono::Utc::now().year().to_string()
    });
    let league = League {
        league_id: league_id.to_string(),
        name: league_info
            .name
            .unwrap_or_else(|| "Unknown League".to_string()),
        total_rosters: league_info
            .total_rosters
            .unwrap_or(roster_dtos.len() as u32),
        season: season_label,
        avatar: league_info.avatar,
        settings: league_info.settings.unwrap_or_else(|| serde_json::json!({})),
    };

    let rosters: Vec<Roster> = roster_dtos
        .iter()
        .map(|r| Roster {
            league_id: league_id.to_string(),
            roster_id: r.roster_id,
            owner_id: r.owner_id.clone(),
            settings: r.merged_settings(),
        })
        .collect();

    let users: Vec<User> = user_dtos
        .into_iter()
        .map(|u| User {
            user_id: u.user_id,
            league_id: league_id.to_string(),
            display_name: u.display_name.unwrap_or_else(|| "Unknown".to_string()),
            avatar: u.avatar,
        })
        .collect();

    let current_season = resolve_current_season(&league.season);
    let rounds = resolve_round_count(&league.settings);
    let roster_ids: Vec<u32> = rosters.iter().map(|r| r.roster_id).collect();
    let trades: Vec<TradedPick> = trade_dtos.into_iter().map(Into::into).collect();

    let picks = build_ledger(
        league_id,
        current_season,
        rounds,
        &roster_ids,
        &trades,
        &draft_orders,
    );

    state.db.upsert_league(&league)?;
    state.db.upsert_rosters(&rosters)?;
    state.db.upsert_users(&users)?;
    let inserted = state.db.replace_picks(league_id, picks)?;

    info!(
        league_id,
        rounds,
        rosters = roster_ids.len(),
        picks = inserted,
        "league sync complete"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// The combined dashboard payload for one league.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueDataResponse {
    pub league: League,
    pub rosters: Vec<Roster>,
    pub users: Vec<User>,
    pub picks: Vec<DraftPick>,
    /// Roster id → graded positions, highest need first.
    pub team_needs: BTreeMap<u32, Vec<TeamNeedEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_order: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_players: Option<BTreeMap<u32, Vec<TeamPlayer>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick_predictions: Option<BTreeMap<i64, Vec<PredictionEntry>>>,
}

/// A need score at presentation precision (whole points).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNeedEntry {
    pub position: Position,
    pub score: i64,
}

/// A rostered player resolved through the player directory.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPlayer {
    pub player_id: String,
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionEntry {
    pub user_id: String,
    pub comment: String,
}

/// Serve the cached league view, recomputing team needs against whatever
/// analytics data is currently available. Directory or value outages
/// degrade the scores (depth counts, then placeholder hashes) but never
/// fail the request.
pub async fn league_data(state: &AppState, league_id: &str) -> Result<LeagueDataResponse, AppError> {
    let league = state
        .db
        .get_league(league_id)?
        .ok_or_else(|| AppError::NotFound("League not found".to_string()))?;
    let rosters = state.db.get_rosters(league_id)?;
    let users = state.db.get_users(league_id)?;
    let picks = state.db.get_picks(league_id)?;
    let team_order = state.db.get_team_order(league_id)?;
    let predictions = state.db.get_predictions(league_id)?;

    let directory = match state.provider.player_directory().await {
        Ok(directory) => Some(directory),
        Err(e) => {
            warn!(error = %e, "player directory unavailable; using placeholder needs");
            None
        }
    };
    let values = match &directory {
        Some(_) => match state.provider.market_values(league.total_rosters).await {
            Ok(values) => Some(values),
            Err(e) => {
                warn!(error = %e, "market values unavailable; scoring by roster depth");
                None
            }
        },
        None => None,
    };

    let positions_by_player = directory.as_ref().map(|d| tracked_positions(d));
    let value_table = values.as_ref().map(|v| value_table(v));
    let needs = match &positions_by_player {
        Some(positions) => compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions,
                values: value_table.as_ref(),
            },
        ),
        None => compute_team_needs(&rosters, NeedsStrategy::PlaceholderHash),
    };
    let team_needs = needs
        .into_iter()
        .map(|(roster_id, graded)| {
            let entries = graded
                .into_iter()
                .map(|n| TeamNeedEntry {
                    position: n.position,
                    score: n.score.round() as i64,
                })
                .collect();
            (roster_id, entries)
        })
        .collect();

    let team_players = directory.as_ref().map(|d| roster_players(&rosters, d));

    let pick_predictions = if predictions.is_empty() {
        None
    } else {
        let mut grouped: BTreeMap<i64, Vec<PredictionEntry>> = BTreeMap::new();
        for p in predictions {
            grouped.entry(p.pick_id).or_default().push(PredictionEntry {
                user_id: p.user_id,
                comment: p.comment,
            });
        }
        Some(grouped)
    };

    Ok(LeagueDataResponse {
        league,
        rosters,
        users,
        picks,
        team_needs,
        team_order,
        team_players,
        pick_predictions,
    })
}

/// Player id → tracked position, for every directory entry the engine
/// grades.
fn tracked_positions(directory: &PlayerDirectory) -> HashMap<String, Position> {
    directory
        .iter()
        .filter_map(|(id, info)| {
            let pos = info.position.as_deref().and_then(Position::from_str_pos)?;
            Some((id.clone(), pos))
        })
        .collect()
}

/// Player id → market value for every valuation entry with a Sleeper id.
fn value_table(values: &[MarketValue]) -> HashMap<String, f64> {
    values
        .iter()
        .filter_map(|v| Some((v.player.sleeper_id.clone()?, v.value)))
        .collect()
}

/// Resolve each roster's player ids through the directory for display.
fn roster_players(
    rosters: &[Roster],
    directory: &PlayerDirectory,
) -> BTreeMap<u32, Vec<TeamPlayer>> {
    rosters
        .iter()
        .map(|roster| {
            let players = resolve_players(roster.settings.as_ref())
                .unwrap_or_default()
                .into_iter()
                .map(|id| match directory.get(&id) {
                    Some(info) => TeamPlayer {
                        player_id: id,
                        name: info.display_name(),
                        position: info.position.clone(),
                        team: info.team.clone(),
                    },
                    None => TeamPlayer {
                        player_id: id,
                        name: "Unknown Player".to_string(),
                        position: None,
                        team: None,
                    },
                })
                .collect();
            (roster.roster_id, players)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pick, order, and prediction operations
// ---------------------------------------------------------------------------

/// Apply a manual slot override and/or comment to a pick.
pub fn update_pick(
    state: &AppState,
    pick_id: i64,
    update: &UpdateDraftPick,
) -> Result<DraftPick, AppError> {
    state
        .db
        .update_pick(pick_id, update)?
        .ok_or_else(|| AppError::NotFound("Pick not found".to_string()))
}

/// Save the display column order for a league.
pub fn set_team_order(state: &AppState, league_id: &str, order: &[u32]) -> Result<(), AppError> {
    if order.is_empty() {
        return Err(AppError::Validation(
            "Team order must not be empty".to_string(),
        ));
    }
    state.db.set_team_order(league_id, order)?;
    Ok(())
}

/// Save a user's prediction on a pick. Requires a caller-supplied user id.
pub fn save_prediction(
    state: &AppState,
    pick_id: i64,
    user_id: Option<&str>,
    comment: &str,
) -> Result<(), AppError> {
    let user_id = user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing user id".to_string()))?;
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(AppError::Validation(
            "Comment must not be empty".to_string(),
        ));
    }
    if state.db.save_prediction(pick_id, user_id, comment)? {
        Ok(())
    } else {
        Err(AppError::NotFound("Pick not found".to_string()))
    }
}

/// Remove a user's prediction from a pick.
pub fn delete_prediction(
    state: &AppState,
    pick_id: i64,
    user_id: Option<&str>,
) -> Result<(), AppError> {
    let user_id = user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing user id".to_string()))?;
    if state.db.delete_prediction(pick_id, user_id)? {
        Ok(())
    } else {
        Err(AppError::NotFound("Prediction not found".to_string()))
    }
}

/// Resolve a Sleeper account by username, for the dashboard's sign-in.
pub async fn lookup_user(state: &AppState, username: &str) -> Result<SleeperAccount, AppError> {
    state.provider.user_by_name(username).await.map_err(|e| match e {
        ProviderError::NotFound(_) => AppError::NotFound("User not found".to_string()),
        other => AppError::Upstream(other.to_string()),
    })
}
