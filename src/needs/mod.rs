// Positional need scoring: roster strength versus the league average.

pub mod strength;

pub use strength::{compute_team_needs, NeedsStrategy, TeamNeed};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Positions the needs engine grades. Kickers and defenses carry too little
/// dynasty value to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
}

/// Grading order; also the tie-break order for equal scores.
pub const TRACKED_POSITIONS: [Position; 4] =
    [Position::QB, Position::RB, Position::WR, Position::TE];

impl Position {
    /// Parse a provider position string. Returns `None` for anything the
    /// engine doesn't track (K, DEF, IDP slots, combo designations).
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
