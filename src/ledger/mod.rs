// Draft-pick ledger generation: trade resolution, slot ordering, and
// carryover of user edits across rebuilds.

pub mod builder;

pub use builder::{
    build_ledger, carry_forward, DraftOrder, DraftType, PickKey, TradedPick, SEASONS_AHEAD,
};
