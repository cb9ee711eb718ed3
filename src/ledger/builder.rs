// Pick ledger construction.
//
// Given the roster set, trade records, and (optionally) draft orders for a
// league, produce the full set of resolved pick ownership rows for the
// current season plus the following seasons. The build is pure: all I/O
// (fetching inputs, swapping the persisted set) happens in the caller.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::NewDraftPick;

/// How many seasons of picks each sync generates, current season included.
pub const SEASONS_AHEAD: i32 = 3;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A trade record: the pick originally belonging to `roster_id` in
/// (`season`, `round`) is now held by `owner_id`.
#[derive(Debug, Clone)]
pub struct TradedPick {
    pub season: String,
    pub round: u32,
    /// Original slot owner.
    pub roster_id: u32,
    /// Current holder after the trade.
    pub owner_id: u32,
    /// Immediate prior holder, for transfer display.
    pub previous_owner_id: Option<u32>,
}

/// Draft format; decides whether round order reverses between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftType {
    Snake,
    Linear,
}

impl DraftType {
    /// Parse the provider's draft type string. Anything that isn't
    /// explicitly a snake draft keeps the same order every round.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("snake") {
            DraftType::Snake
        } else {
            DraftType::Linear
        }
    }
}

/// The slot assignment for one season's draft: draft slot (1-based) to the
/// roster drafting there.
#[derive(Debug, Clone)]
pub struct DraftOrder {
    pub season: String,
    pub draft_type: DraftType,
    pub slot_to_roster: BTreeMap<u32, u32>,
}

/// Synthetic identity of a pick, stable across rebuilds.
pub type PickKey = (String, u32, u32); // (season, round, original roster)

// ---------------------------------------------------------------------------
// Ledger build
// ---------------------------------------------------------------------------

/// Build the complete pick set for a league.
///
/// Emits one row per (season, round, roster) over `[current_season,
/// current_season + SEASONS_AHEAD)` and rounds `1..=rounds`. Ownership
/// follows the matching trade record when one exists for the exact
/// (season, round, original roster) key, otherwise stays with the original
/// roster. Slot strings are filled per season when a usable draft order
/// exists (see [`round_one_order`]).
pub fn build_ledger(
    league_id: &str,
    current_season: i32,
    rounds: u32,
    roster_ids: &[u32],
    trades: &[TradedPick],
    drafts: &[DraftOrder],
) -> Vec<NewDraftPick> {
    // Exact-key trade lookup. Upstream data occasionally repeats a key;
    // the first record wins so rebuilds stay deterministic.
    let mut trade_index: HashMap<PickKey, &TradedPick> = HashMap::new();
    for trade in trades {
        trade_index
            .entry((trade.season.clone(), trade.round, trade.roster_id))
            .or_insert(trade);
    }

    // Per-season round-1 order, only for seasons with complete coverage.
    let mut season_orders: HashMap<&str, (DraftType, Vec<u32>)> = HashMap::new();
    for draft in drafts {
        if let Some(order) = round_one_order(draft, roster_ids) {
            season_orders
                .entry(draft.season.as_str())
                .or_insert((draft.draft_type, order));
        }
    }

    let mut picks = Vec::with_capacity(
        roster_ids.len() * rounds as usize * SEASONS_AHEAD as usize,
    );

    for year in current_season..current_season + SEASONS_AHEAD {
        let season = year.to_string();
        let order = season_orders.get(season.as_str());

        for round in 1..=rounds {
            // Zero-based slot position per roster for this round, when the
            // season's order is known.
            let positions: Option<HashMap<u32, usize>> = order.map(|(dt, base)| {
                round_order(base, round, *dt)
                    .into_iter()
                    .enumerate()
                    .map(|(idx, rid)| (rid, idx))
                    .collect()
            });

            for &roster_id in roster_ids {
                let traded = trade_index.get(&(season.clone(), round, roster_id));
                let pick_slot = positions
                    .as_ref()
                    .and_then(|p| p.get(&roster_id))
                    .map(|&idx| format_slot(round, idx));

                picks.push(NewDraftPick {
                    league_id: league_id.to_string(),
                    season: season.clone(),
                    round,
                    roster_id,
                    owner_id: traded.map_or(roster_id, |t| t.owner_id),
                    previous_owner_id: traded.and_then(|t| t.previous_owner_id),
                    pick_slot,
                    comment: None,
                });
            }
        }
    }

    picks
}

/// Re-apply user edits from a prior generation onto freshly built rows.
///
/// The rebuild discards old rows wholesale, so any stored `pick_slot`
/// override or `comment` must be matched back by synthetic key. A carried
/// `pick_slot` wins over a freshly computed one: the stored value is either
/// a manual override or the same computed string.
pub fn carry_forward(
    picks: &mut [NewDraftPick],
    prior: &HashMap<PickKey, (Option<String>, Option<String>)>,
) {
    for pick in picks.iter_mut() {
        let key = (pick.season.clone(), pick.round, pick.roster_id);
        if let Some((slot, comment)) = prior.get(&key) {
            if slot.is_some() {
                pick.pick_slot = slot.clone();
            }
            if comment.is_some() {
                pick.comment = comment.clone();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Slot ordering
// ---------------------------------------------------------------------------

/// Extract the canonical round-1 order from a draft's slot mapping.
///
/// Usable only when the mapping is a permutation of the league's roster
/// set: every roster appears exactly once. Partial or stale mappings (mid
/// startup draft, roster count changed) yield `None` and the season's picks
/// carry no slot strings.
fn round_one_order(draft: &DraftOrder, roster_ids: &[u32]) -> Option<Vec<u32>> {
    if draft.slot_to_roster.len() != roster_ids.len() || roster_ids.is_empty() {
        return None;
    }
    let expected: HashSet<u32> = roster_ids.iter().copied().collect();
    let mapped: HashSet<u32> = draft.slot_to_roster.values().copied().collect();
    if mapped != expected {
        return None;
    }
    // BTreeMap iteration is slot-ascending, which is the round-1 order.
    Some(draft.slot_to_roster.values().copied().collect())
}

/// Order of rosters on the clock in `round`, given the round-1 order.
fn round_order(base: &[u32], round: u32, draft_type: DraftType) -> Vec<u32> {
    if draft_type == DraftType::Snake && round % 2 == 0 {
        base.iter().rev().copied().collect()
    } else {
        base.to_vec()
    }
}

/// Format a zero-based position in a round as "round.position", two-digit
/// padded (e.g. "1.04", "2.10").
fn format_slot(round: u32, index: usize) -> String {
    format!("{}.{:02}", round, index + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
