// Wire types for the Sleeper API and the market valuation feed.
//
// Every field the dashboard doesn't strictly need is optional: upstream
// payloads have dropped and renamed fields across seasons, and a sync must
// degrade rather than fail when optional data is missing.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::ledger::{DraftOrder, DraftType, TradedPick};

// ---------------------------------------------------------------------------
// League endpoints
// ---------------------------------------------------------------------------

/// `GET /league/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueInfo {
    pub league_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub total_rosters: Option<u32>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
}

/// `GET /league/{id}/users` entries.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueUser {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// `GET /league/{id}/rosters` entries.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueRoster {
    pub roster_id: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
    #[serde(default)]
    pub starters: Option<Vec<String>>,
    #[serde(default)]
    pub settings: Option<Value>,
}

impl LeagueRoster {
    /// Merge the roster's player/starter lists into its settings blob so a
    /// single stored JSON object carries everything the needs engine reads.
    pub fn merged_settings(&self) -> Option<Value> {
        let mut merged = match &self.settings {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        };
        if let Some(players) = &self.players {
            merged.insert("players".to_string(), serde_json::json!(players));
        }
        if let Some(starters) = &self.starters {
            merged.insert("starters".to_string(), serde_json::json!(starters));
        }
        if merged.is_empty() && self.settings.is_none() {
            return None;
        }
        Some(Value::Object(merged))
    }
}

/// `GET /league/{id}/traded_picks` entries. `roster_id` is the original
/// slot owner, `owner_id` the roster holding the pick now.
#[derive(Debug, Clone, Deserialize)]
pub struct TradedPickDto {
    pub season: String,
    pub round: u32,
    pub roster_id: u32,
    pub owner_id: u32,
    #[serde(default)]
    pub previous_owner_id: Option<u32>,
}

impl From<TradedPickDto> for TradedPick {
    fn from(dto: TradedPickDto) -> Self {
        TradedPick {
            season: dto.season,
            round: dto.round,
            roster_id: dto.roster_id,
            owner_id: dto.owner_id,
            previous_owner_id: dto.previous_owner_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Draft endpoints
// ---------------------------------------------------------------------------

/// `GET /league/{id}/drafts` entries: enough to know which drafts to pull
/// details for.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftSummary {
    pub draft_id: String,
    #[serde(default)]
    pub season: Option<String>,
}

/// `GET /draft/{draft_id}`: carries the slot-to-roster assignment used for
/// pick-slot resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftDetail {
    pub draft_id: String,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(rename = "type", default)]
    pub draft_type: Option<String>,
    /// Keys are draft slots as strings ("1", "2", …); values may be null
    /// before the draft order is set.
    #[serde(default)]
    pub slot_to_roster_id: Option<HashMap<String, Option<u32>>>,
}

impl DraftDetail {
    /// Convert into a ledger [`DraftOrder`], when this draft carries a
    /// season and at least one assigned slot. Null and unparsable slots
    /// are dropped here; coverage is checked by the ledger builder.
    pub fn to_draft_order(&self) -> Option<DraftOrder> {
        let season = self.season.clone()?;
        let slots = self.slot_to_roster_id.as_ref()?;

        let slot_to_roster: BTreeMap<u32, u32> = slots
            .iter()
            .filter_map(|(slot, roster)| Some((slot.parse::<u32>().ok()?, (*roster)?)))
            .collect();
        if slot_to_roster.is_empty() {
            return None;
        }

        Some(DraftOrder {
            season,
            draft_type: DraftType::parse(self.draft_type.as_deref().unwrap_or("snake")),
            slot_to_roster,
        })
    }
}

// ---------------------------------------------------------------------------
// Player directory
// ---------------------------------------------------------------------------

/// One entry of `GET /players/nfl` (id → metadata).
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

impl PlayerInfo {
    /// Best-effort display name: `full_name`, else "first last", else a
    /// placeholder. Team defenses have no name fields at all.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.full_name {
            return name.clone();
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => "Unknown Player".to_string(),
        }
    }
}

/// The full player directory, keyed by Sleeper player id.
pub type PlayerDirectory = HashMap<String, PlayerInfo>;

// ---------------------------------------------------------------------------
// Market valuations
// ---------------------------------------------------------------------------

/// One entry of the market valuation list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketValue {
    pub player: MarketPlayer,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPlayer {
    /// Sleeper player id; the join key back to rosters. Missing for
    /// players the valuation source hasn't mapped.
    #[serde(default)]
    pub sleeper_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

// ---------------------------------------------------------------------------
// Account lookup
// ---------------------------------------------------------------------------

/// `GET /user/{username}`: used by the dashboard's username sign-in.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct SleeperAccount {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn league_tolerates_minimal_payload() {
        let league: LeagueInfo =
            serde_json::from_value(json!({"league_id": "123"})).unwrap();
        assert_eq!(league.league_id, "123");
        assert!(league.name.is_none());
        assert!(league.settings.is_none());
    }

    #[test]
    fn merged_settings_combines_stats_and_player_lists() {
        let roster: LeagueRoster = serde_json::from_value(json!({
            "roster_id": 4,
            "owner_id": "u4",
            "players": ["4034", "6794"],
            "starters": ["4034"],
            "settings": {"wins": 9, "losses": 4, "fpts": 1610}
        }))
        .unwrap();

        let merged = roster.merged_settings().unwrap();
        assert_eq!(merged["wins"], 9);
        assert_eq!(merged["players"], json!(["4034", "6794"]));
        assert_eq!(merged["starters"], json!(["4034"]));
    }

    #[test]
    fn merged_settings_without_any_data_is_none() {
        let roster: LeagueRoster =
            serde_json::from_value(json!({"roster_id": 1})).unwrap();
        assert!(roster.merged_settings().is_none());
    }

    #[test]
    fn merged_settings_keeps_stats_without_players() {
        let roster: LeagueRoster = serde_json::from_value(json!({
            "roster_id": 2,
            "settings": {"wins": 1}
        }))
        .unwrap();
        let merged = roster.merged_settings().unwrap();
        assert_eq!(merged["wins"], 1);
        assert!(merged.get("players").is_none());
    }

    #[test]
    fn draft_detail_converts_to_order() {
        let detail: DraftDetail = serde_json::from_value(json!({
            "draft_id": "d1",
            "season": "2025",
            "type": "snake",
            "slot_to_roster_id": {"1": 3, "2": 1, "3": 2}
        }))
        .unwrap();

        let order = detail.to_draft_order().unwrap();
        assert_eq!(order.season, "2025");
        assert_eq!(order.draft_type, DraftType::Snake);
        assert_eq!(
            order.slot_to_roster.values().copied().collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn draft_detail_drops_null_and_bad_slots() {
        let detail: DraftDetail = serde_json::from_value(json!({
            "draft_id": "d1",
            "season": "2025",
            "type": "linear",
            "slot_to_roster_id": {"1": 3, "2": null, "junk": 9}
        }))
        .unwrap();

        let order = detail.to_draft_order().unwrap();
        assert_eq!(order.slot_to_roster.len(), 1);
        assert_eq!(order.slot_to_roster[&1], 3);
    }

    #[test]
    fn draft_detail_without_mapping_is_none() {
        let detail: DraftDetail = serde_json::from_value(json!({
            "draft_id": "d1",
            "season": "2025"
        }))
        .unwrap();
        assert!(detail.to_draft_order().is_none());

        let unscheduled: DraftDetail = serde_json::from_value(json!({
            "draft_id": "d2",
            "slot_to_roster_id": {"1": 1}
        }))
        .unwrap();
        assert!(unscheduled.to_draft_order().is_none(), "season required");
    }

    #[test]
    fn market_value_parses_camel_case() {
        let value: MarketValue = serde_json::from_value(json!({
            "player": {"sleeperId": "4034", "name": "P. Mahomes", "position": "QB"},
            "value": 9651.0
        }))
        .unwrap();
        assert_eq!(value.player.sleeper_id.as_deref(), Some("4034"));
        assert_eq!(value.value, 9651.0);
    }

    #[test]
    fn player_display_name_fallbacks() {
        let full: PlayerInfo =
            serde_json::from_value(json!({"full_name": "Justin Jefferson"})).unwrap();
        assert_eq!(full.display_name(), "Justin Jefferson");

        let split: PlayerInfo =
            serde_json::from_value(json!({"first_name": "Ja'Marr", "last_name": "Chase"}))
                .unwrap();
        assert_eq!(split.display_name(), "Ja'Marr Chase");

        let defense: PlayerInfo = serde_json::from_value(json!({"position": "DEF"})).unwrap();
        assert_eq!(defense.display_name(), "Unknown Player");
    }
}
