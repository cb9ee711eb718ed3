// Row types shared by the store, the engines, and the HTTP layer, plus
// accessor helpers for the provider-shaped settings blobs.
//
// Sleeper nests league- and roster-level knobs inside free-form JSON
// `settings` objects whose field names have drifted across API versions.
// Every read of such a field goes through a `resolve_*` helper here so the
// known variants and default policies live in exactly one place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Stored rows
// ---------------------------------------------------------------------------

/// League metadata, overwritten wholesale on every sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub league_id: String,
    pub name: String,
    pub total_rosters: u32,
    /// Season label as reported upstream (year as text, e.g. "2025").
    pub season: String,
    pub avatar: Option<String>,
    /// Raw provider settings blob (draft round count, scoring, slot layout).
    pub settings: Value,
}

/// A team within a league. Identity is (league, rosterId); the owning user
/// is optional because orphaned rosters exist upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub league_id: String,
    pub roster_id: u32,
    pub owner_id: Option<String>,
    /// Record stats merged with the roster's player/starter id lists so the
    /// needs engine can re-run from cached data alone.
    pub settings: Option<Value>,
}

/// External display identity scoped to a league.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub league_id: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

/// A resolved draft pick. `roster_id` is the historical slot the pick
/// belongs to; `owner_id` is whoever holds it after trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPick {
    pub id: i64,
    pub league_id: String,
    pub season: String,
    pub round: u32,
    pub roster_id: u32,
    pub owner_id: u32,
    pub previous_owner_id: Option<u32>,
    /// Resolved position string like "1.04", or a manual override.
    pub pick_slot: Option<String>,
    /// Free-text note attached to the pick.
    pub comment: Option<String>,
}

/// A pick row before insertion (no row id yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDraftPick {
    pub league_id: String,
    pub season: String,
    pub round: u32,
    pub roster_id: u32,
    pub owner_id: u32,
    pub previous_owner_id: Option<u32>,
    pub pick_slot: Option<String>,
    pub comment: Option<String>,
}

/// Patch payload for a pick. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDraftPick {
    pub pick_slot: Option<String>,
    pub comment: Option<String>,
}

/// A per-user free-text annotation on a pick, additive to the canonical
/// `comment` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickPrediction {
    pub pick_id: i64,
    pub user_id: String,
    pub comment: String,
}

// ---------------------------------------------------------------------------
// Settings-blob accessors
// ---------------------------------------------------------------------------

/// Rounds generated per season when the league settings don't say.
pub const DEFAULT_DRAFT_ROUNDS: u32 = 3;

/// Number of rookie-draft rounds for a league.
///
/// Reads `draft_rounds` (current field name) then `rounds` (older payloads)
/// from the league settings blob; anything absent, non-numeric, or below 1
/// falls back to [`DEFAULT_DRAFT_ROUNDS`].
pub fn resolve_round_count(settings: &Value) -> u32 {
    for key in ["draft_rounds", "rounds"] {
        if let Some(n) = settings.get(key).and_then(Value::as_u64) {
            if n >= 1 {
                return n as u32;
            }
        }
    }
    DEFAULT_DRAFT_ROUNDS
}

/// Parse the league's season label into a year, falling back to the
/// current calendar year when unparsable.
pub fn resolve_current_season(season: &str) -> i32 {
    use chrono::Datelike;
    season
        .trim()
        .parse::<i32>()
        .unwrap_or_else(|_| chrono::Utc::now().year())
}

/// Player ids held by a roster, from the merged settings blob.
///
/// Returns `None` when the blob has no `players` array at all (the provider
/// never reported roster composition), as opposed to `Some(vec![])` for a
/// genuinely empty roster. The needs engine treats those differently.
pub fn resolve_players(settings: Option<&Value>) -> Option<Vec<String>> {
    let arr = settings?.get("players")?.as_array()?;
    Some(
        arr.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

/// Starter player ids, when the provider reported them.
pub fn resolve_starters(settings: Option<&Value>) -> Option<Vec<String>> {
    let arr = settings?.get("starters")?.as_array()?;
    Some(
        arr.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

/// Win/loss record and points-for, with zeros for anything missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamRecord {
    pub wins: i64,
    pub losses: i64,
    pub fpts: f64,
}

/// Extract a roster's record from its settings blob.
///
/// Sleeper splits points-for into an integer part (`fpts`) and a two-digit
/// fraction (`fpts_decimal`); both are recombined here.
pub fn resolve_record(settings: Option<&Value>) -> TeamRecord {
    let Some(s) = settings else {
        return TeamRecord::default();
    };
    let int_field = |key: &str| s.get(key).and_then(Value::as_i64).unwrap_or(0);
    let fpts_whole = int_field("fpts") as f64;
    let fpts_decimal = int_field("fpts_decimal") as f64;
    TeamRecord {
        wins: int_field("wins"),
        losses: int_field("losses"),
        fpts: fpts_whole + fpts_decimal / 100.0,
    }
}

/// A roster's slot in the upcoming startup/rookie draft, when known.
pub fn resolve_draft_position(settings: Option<&Value>) -> Option<u32> {
    let s = settings?;
    for key in ["draft_position", "draft_slot"] {
        if let Some(n) = s.get(key).and_then(Value::as_u64) {
            return Some(n as u32);
        }
    }
    None
}
