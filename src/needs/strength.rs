// Need-score computation.
//
// Strength per position is the sum of market values of the rostered players
// there; the need score compares that against the league average:
//
//   score = clamp(50 + (1 - strength/average) * 50, 0, 100)
//
// Average strength scores 50, an empty position 100, twice the average (or
// better) 0. Scores stay floating point here; rounding is presentation.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{Position, TRACKED_POSITIONS};
use crate::model::{resolve_players, resolve_record, Roster};

/// One graded position for one roster. Higher score = greater need.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNeed {
    pub position: Position,
    pub score: f64,
}

/// How roster strength is measured.
///
/// The placeholder variant exists for leagues where the provider never
/// returned roster composition: scores are then a stable hash of the
/// roster's identity and record, so repeated reads don't jitter. It is a
/// stand-in policy, not a strength computation.
#[derive(Debug, Clone, Copy)]
pub enum NeedsStrategy<'a> {
    Strength {
        /// Player id to tracked position, from the player directory.
        positions: &'a HashMap<String, Position>,
        /// Player id to market value. `None` degrades every rostered
        /// player at a tracked position to a uniform weight of 1, turning
        /// the score into a depth count.
        values: Option<&'a HashMap<String, f64>>,
    },
    PlaceholderHash,
}

/// Compute need scores for every roster, highest need first per roster.
///
/// Under [`NeedsStrategy::Strength`], rosters whose settings blob carries
/// no player list at all still fall back to placeholder scores; an empty
/// list is a real zero-strength roster and scores 100 everywhere.
pub fn compute_team_needs(
    rosters: &[Roster],
    strategy: NeedsStrategy<'_>,
) -> BTreeMap<u32, Vec<TeamNeed>> {
    let mut needs: BTreeMap<u32, Vec<TeamNeed>> = BTreeMap::new();

    match strategy {
        NeedsStrategy::PlaceholderHash => {
            for roster in rosters {
                needs.insert(roster.roster_id, sorted_by_need(placeholder_needs(roster)));
            }
        }
        NeedsStrategy::Strength { positions, values } => {
            // Strength per roster per position, None when the roster's
            // composition is unknown.
            let strengths: Vec<Option<HashMap<Position, f64>>> = rosters
                .iter()
                .map(|r| {
                    resolve_players(r.settings.as_ref())
                        .map(|players| position_strengths(&players, positions, values))
                })
                .collect();

            // League average per position over the full roster count.
            let divisor = rosters.len().max(1) as f64;
            let mut averages: HashMap<Position, f64> = HashMap::new();
            for pos in TRACKED_POSITIONS {
                let total: f64 = strengths
                    .iter()
                    .filter_map(|s| s.as_ref())
                    .map(|s| s.get(&pos).copied().unwrap_or(0.0))
                    .sum();
                averages.insert(pos, total / divisor);
            }

            for (roster, strength) in rosters.iter().zip(&strengths) {
                let graded = match strength {
                    Some(by_pos) => TRACKED_POSITIONS
                        .iter()
                        .map(|&pos| TeamNeed {
                            position: pos,
                            score: need_score(
                                by_pos.get(&pos).copied().unwrap_or(0.0),
                                averages[&pos],
                            ),
                        })
                        .collect(),
                    None => placeholder_needs(roster),
                };
                needs.insert(roster.roster_id, sorted_by_need(graded));
            }
        }
    }

    needs
}

/// Sum strengths per tracked position for one roster's player list.
/// Players outside the tracked set or missing from the directory are
/// ignored; with a value table, rostered players it doesn't cover
/// contribute nothing.
fn position_strengths(
    players: &[String],
    positions: &HashMap<String, Position>,
    values: Option<&HashMap<String, f64>>,
) -> HashMap<Position, f64> {
    let mut strengths: HashMap<Position, f64> = HashMap::new();
    for player_id in players {
        let Some(&pos) = positions.get(player_id) else {
            continue;
        };
        let value = match values {
            Some(table) => table.get(player_id).copied().unwrap_or(0.0),
            None => 1.0,
        };
        *strengths.entry(pos).or_insert(0.0) += value;
    }
    strengths
}

/// Convert raw strength into a need score in [0, 100]. The average is
/// floored at 1 so empty positions across the whole league grade as
/// maximum need instead of dividing by zero.
fn need_score(strength: f64, average: f64) -> f64 {
    let average = average.max(1.0);
    (50.0 + (1.0 - strength / average) * 50.0).clamp(0.0, 100.0)
}

/// Descending by score; equal scores keep QB, RB, WR, TE order (the input
/// order, preserved by the stable sort).
fn sorted_by_need(mut graded: Vec<TeamNeed>) -> Vec<TeamNeed> {
    graded.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    graded
}

// ---------------------------------------------------------------------------
// Placeholder strategy
// ---------------------------------------------------------------------------

/// Stable pseudo-random scores for a roster with unknown composition,
/// seeded by identity and record so results repeat until new data arrives.
fn placeholder_needs(roster: &Roster) -> Vec<TeamNeed> {
    let record = resolve_record(roster.settings.as_ref());
    TRACKED_POSITIONS
        .iter()
        .map(|&pos| {
            let seed = format!(
                "{}|{}|{}|{:.2}|{}",
                roster.roster_id, record.wins, record.losses, record.fpts, pos
            );
            TeamNeed {
                position: pos,
                score: (fnv1a(seed.as_bytes()) % 101) as f64,
            }
        })
        .collect()
}

/// FNV-1a 64-bit. Used instead of the stdlib hasher because the scores
/// must be identical across processes and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster(roster_id: u32, players: &[&str]) -> Roster {
        Roster {
            league_id: "league_1".to_string(),
            roster_id,
            owner_id: Some(format!("user_{roster_id}")),
            settings: Some(json!({
                "wins": 7, "losses": 6, "fpts": 1500,
                "players": players,
            })),
        }
    }

    fn roster_without_players(roster_id: u32) -> Roster {
        Roster {
            league_id: "league_1".to_string(),
            roster_id,
            owner_id: None,
            settings: Some(json!({"wins": 3, "losses": 10, "fpts": 1100})),
        }
    }

    fn directory(entries: &[(&str, Position)]) -> HashMap<String, Position> {
        entries
            .iter()
            .map(|(id, pos)| (id.to_string(), *pos))
            .collect()
    }

    fn score_for(needs: &[TeamNeed], pos: Position) -> f64 {
        needs
            .iter()
            .find(|n| n.position == pos)
            .expect("position graded")
            .score
    }

    #[test]
    fn average_strength_scores_fifty() {
        let positions = directory(&[("a", Position::RB), ("b", Position::RB)]);
        let mut values = HashMap::new();
        values.insert("a".to_string(), 40.0);
        values.insert("b".to_string(), 40.0);

        let rosters = vec![roster(1, &["a"]), roster(2, &["b"])];
        let needs = compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions: &positions,
                values: Some(&values),
            },
        );

        assert_eq!(score_for(&needs[&1], Position::RB), 50.0);
        assert_eq!(score_for(&needs[&2], Position::RB), 50.0);
    }

    #[test]
    fn lopsided_league_hits_both_extremes() {
        // Two rosters, one QB worth 100 on roster A, nothing on roster B.
        // Average = 50, so A grades 0 (no need) and B grades 100.
        let positions = directory(&[("qb1", Position::QB)]);
        let mut values = HashMap::new();
        values.insert("qb1".to_string(), 100.0);

        let rosters = vec![roster(1, &["qb1"]), roster(2, &[])];
        let needs = compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions: &positions,
                values: Some(&values),
            },
        );

        assert_eq!(score_for(&needs[&1], Position::QB), 0.0);
        assert_eq!(score_for(&needs[&2], Position::QB), 100.0);
    }

    #[test]
    fn scores_always_within_bounds() {
        let positions = directory(&[
            ("a", Position::WR),
            ("b", Position::WR),
            ("c", Position::WR),
        ]);
        let mut values = HashMap::new();
        values.insert("a".to_string(), 9000.0);
        values.insert("b".to_string(), 1.0);
        values.insert("c".to_string(), 250.0);

        let rosters = vec![roster(1, &["a"]), roster(2, &["b"]), roster(3, &["c"])];
        let needs = compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions: &positions,
                values: Some(&values),
            },
        );

        for graded in needs.values() {
            for need in graded {
                assert!((0.0..=100.0).contains(&need.score), "score {}", need.score);
            }
        }
        // 9000 vs an average of ~3083 is far past 2x: clamped to 0.
        assert_eq!(score_for(&needs[&1], Position::WR), 0.0);
    }

    #[test]
    fn missing_value_table_degrades_to_depth_count() {
        let positions = directory(&[
            ("te1", Position::TE),
            ("te2", Position::TE),
            ("te3", Position::TE),
        ]);

        // Roster 1 has two TEs, roster 2 has one. Depth average = 1.5.
        let rosters = vec![roster(1, &["te1", "te2"]), roster(2, &["te3"])];
        let needs = compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions: &positions,
                values: None,
            },
        );

        // 50 + (1 - 2/1.5) * 50 = 33.33..; 50 + (1 - 1/1.5) * 50 = 66.66..
        assert!((score_for(&needs[&1], Position::TE) - 100.0 / 3.0).abs() < 1e-9);
        assert!((score_for(&needs[&2], Position::TE) - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_and_untracked_players_are_ignored() {
        let positions = directory(&[("rb1", Position::RB)]);
        let rosters = vec![
            roster(1, &["rb1", "kicker9", "mystery"]),
            roster(2, &["rb_not_in_directory"]),
        ];
        let needs = compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions: &positions,
                values: None,
            },
        );

        // Only rb1 counted anywhere. The RB average (0.5) floors to 1, so
        // the lone RB grades exactly average.
        assert_eq!(score_for(&needs[&1], Position::RB), 50.0);
        assert_eq!(score_for(&needs[&2], Position::RB), 100.0);
        assert_eq!(score_for(&needs[&1], Position::QB), 100.0);
    }

    #[test]
    fn output_sorted_descending_with_stable_ties() {
        let positions = directory(&[("qb1", Position::QB)]);
        let rosters = vec![roster(1, &["qb1"]), roster(2, &[])];
        let needs = compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions: &positions,
                values: None,
            },
        );

        let graded = &needs[&1];
        for pair in graded.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // RB/WR/TE all score 100 for roster 1; ties keep tracked order.
        assert_eq!(graded[0].position, Position::RB);
        assert_eq!(graded[1].position, Position::WR);
        assert_eq!(graded[2].position, Position::TE);
        assert_eq!(graded[3].position, Position::QB);
    }

    #[test]
    fn placeholder_scores_are_stable_and_bounded() {
        let rosters = vec![roster_without_players(1), roster_without_players(2)];

        let first = compute_team_needs(&rosters, NeedsStrategy::PlaceholderHash);
        let second = compute_team_needs(&rosters, NeedsStrategy::PlaceholderHash);
        assert_eq!(first, second, "same inputs must grade identically");

        for graded in first.values() {
            assert_eq!(graded.len(), 4);
            for need in graded {
                assert!((0.0..=100.0).contains(&need.score));
            }
            for pair in graded.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    #[test]
    fn placeholder_changes_with_record() {
        let stale = roster_without_players(1);
        let mut improved = stale.clone();
        improved.settings = Some(json!({"wins": 9, "losses": 4, "fpts": 1800}));

        let before = compute_team_needs(
            std::slice::from_ref(&stale),
            NeedsStrategy::PlaceholderHash,
        );
        let after = compute_team_needs(
            std::slice::from_ref(&improved),
            NeedsStrategy::PlaceholderHash,
        );
        assert_ne!(before, after, "a new record should reseed the scores");
    }

    #[test]
    fn rosters_without_player_lists_fall_back_per_roster() {
        let positions = directory(&[("wr1", Position::WR)]);
        let rosters = vec![roster(1, &["wr1"]), roster_without_players(2)];
        let needs = compute_team_needs(
            &rosters,
            NeedsStrategy::Strength {
                positions: &positions,
                values: None,
            },
        );

        // Roster 1 is really graded (WR average 0.5 floors to 1, lone WR
        // grades average); roster 2 matches its placeholder grades.
        assert_eq!(score_for(&needs[&1], Position::WR), 50.0);
        let fallback =
            compute_team_needs(&rosters[1..], NeedsStrategy::PlaceholderHash);
        assert_eq!(needs[&2], fallback[&2]);
    }
}
