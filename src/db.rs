// SQLite persistence layer for synced league data.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::ledger::{carry_forward, PickKey};
use crate::model::{DraftPick, League, NewDraftPick, PickPrediction, Roster, UpdateDraftPick, User};

/// SQLite-backed store for leagues, rosters, users, the pick ledger, team
/// display order, and per-user pick predictions.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leagues (
                league_id     TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                total_rosters INTEGER NOT NULL,
                season        TEXT NOT NULL,
                avatar        TEXT,
                settings      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS rosters (
                league_id TEXT NOT NULL,
                roster_id INTEGER NOT NULL,
                owner_id  TEXT,
                settings  TEXT,
                PRIMARY KEY (league_id, roster_id)
            );

            CREATE TABLE IF NOT EXISTS users (
                user_id      TEXT NOT NULL,
                league_id    TEXT NOT NULL,
                display_name TEXT NOT NULL,
                avatar       TEXT,
                PRIMARY KEY (user_id, league_id)
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id         TEXT NOT NULL,
                season            TEXT NOT NULL,
                round             INTEGER NOT NULL,
                roster_id         INTEGER NOT NULL,
                owner_id          INTEGER NOT NULL,
                previous_owner_id INTEGER,
                pick_slot         TEXT,
                comment           TEXT,
                UNIQUE (league_id, season, round, roster_id)
            );

            CREATE TABLE IF NOT EXISTS league_team_order (
                league_id     TEXT PRIMARY KEY,
                display_order TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pick_predictions (
                league_id TEXT NOT NULL,
                season    TEXT NOT NULL,
                round     INTEGER NOT NULL,
                roster_id INTEGER NOT NULL,
                user_id   TEXT NOT NULL,
                comment   TEXT NOT NULL,
                PRIMARY KEY (league_id, season, round, roster_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_draft_picks_league
                ON draft_picks(league_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Leagues
    // ------------------------------------------------------------------

    /// Insert or overwrite a league row.
    pub fn upsert_league(&self, league: &League) -> Result<()> {
        let conn = self.conn();
        let settings = serde_json::to_string(&league.settings)
            .context("failed to serialize league settings")?;
        conn.execute(
            "INSERT INTO leagues (league_id, name, total_rosters, season, avatar, settings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(league_id) DO UPDATE SET
                name          = excluded.name,
                total_rosters = excluded.total_rosters,
                season        = excluded.season,
                avatar        = excluded.avatar,
                settings      = excluded.settings",
            params![
                league.league_id,
                league.name,
                league.total_rosters,
                league.season,
                league.avatar,
                settings,
            ],
        )
        .context("failed to upsert league")?;
        Ok(())
    }

    /// Load a league by id. Returns `None` when it was never synced.
    pub fn get_league(&self, league_id: &str) -> Result<Option<League>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT league_id, name, total_rosters, season, avatar, settings
             FROM leagues WHERE league_id = ?1",
            params![league_id],
            |row| {
                let settings: String = row.get(5)?;
                Ok((
                    League {
                        league_id: row.get(0)?,
                        name: row.get(1)?,
                        total_rosters: row.get(2)?,
                        season: row.get(3)?,
                        avatar: row.get(4)?,
                        settings: serde_json::Value::Null,
                    },
                    settings,
                ))
            },
        )
        .optional()
        .context("failed to query league")?
        .map(|(mut league, settings)| {
            league.settings = serde_json::from_str(&settings)
                .context("failed to deserialize league settings")?;
            Ok(league)
        })
        .transpose()
    }

    // ------------------------------------------------------------------
    // Rosters
    // ------------------------------------------------------------------

    /// Upsert all rosters for a league in a single transaction.
    /// Identity is (league, rosterId).
    pub fn upsert_rosters(&self, rosters: &[Roster]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin roster transaction")?;
        for roster in rosters {
            let settings = roster
                .settings
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .context("failed to serialize roster settings")?;
            tx.execute(
                "INSERT INTO rosters (league_id, roster_id, owner_id, settings)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(league_id, roster_id) DO UPDATE SET
                    owner_id = excluded.owner_id,
                    settings = excluded.settings",
                params![roster.league_id, roster.roster_id, roster.owner_id, settings],
            )
            .context("failed to upsert roster")?;
        }
        tx.commit().context("failed to commit rosters")
    }

    /// Load a league's rosters ordered by roster id.
    pub fn get_rosters(&self, league_id: &str) -> Result<Vec<Roster>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT league_id, roster_id, owner_id, settings
                 FROM rosters WHERE league_id = ?1 ORDER BY roster_id",
            )
            .context("failed to prepare roster query")?;

        let rosters = stmt
            .query_map(params![league_id], |row| {
                let settings: Option<String> = row.get(3)?;
                Ok((
                    Roster {
                        league_id: row.get(0)?,
                        roster_id: row.get(1)?,
                        owner_id: row.get(2)?,
                        settings: None,
                    },
                    settings,
                ))
            })
            .context("failed to query rosters")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map roster rows")?
            .into_iter()
            .map(|(mut roster, settings)| {
                roster.settings = settings
                    .map(|s| serde_json::from_str(&s))
                    .transpose()
                    .context("failed to deserialize roster settings")?;
                Ok(roster)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(rosters)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Upsert the league's user list in a single transaction.
    pub fn upsert_users(&self, users: &[User]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin user transaction")?;
        for user in users {
            tx.execute(
                "INSERT INTO users (user_id, league_id, display_name, avatar)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, league_id) DO UPDATE SET
                    display_name = excluded.display_name,
                    avatar       = excluded.avatar",
                params![user.user_id, user.league_id, user.display_name, user.avatar],
            )
            .context("failed to upsert user")?;
        }
        tx.commit().context("failed to commit users")
    }

    /// Load a league's users.
    pub fn get_users(&self, league_id: &str) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT user_id, league_id, display_name, avatar
                 FROM users WHERE league_id = ?1 ORDER BY user_id",
            )
            .context("failed to prepare user query")?;

        let users = stmt
            .query_map(params![league_id], |row| {
                Ok(User {
                    user_id: row.get(0)?,
                    league_id: row.get(1)?,
                    display_name: row.get(2)?,
                    avatar: row.get(3)?,
                })
            })
            .context("failed to query users")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map user rows")?;

        Ok(users)
    }

    // ------------------------------------------------------------------
    // Draft picks
    // ------------------------------------------------------------------

    /// Atomically swap a league's pick ledger for a freshly built one.
    ///
    /// Runs in a single transaction: prior `pick_slot` / `comment` values
    /// are read and carried onto matching synthetic keys, the old rows are
    /// deleted, and the new set is inserted. Readers never observe an empty
    /// or partially rebuilt ledger. Returns the number of rows inserted.
    pub fn replace_picks(&self, league_id: &str, mut picks: Vec<NewDraftPick>) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin pick rebuild transaction")?;

        let prior: HashMap<PickKey, (Option<String>, Option<String>)> = {
            let mut stmt = tx
                .prepare(
                    "SELECT season, round, roster_id, pick_slot, comment
                     FROM draft_picks WHERE league_id = ?1",
                )
                .context("failed to prepare prior-pick query")?;
            let rows = stmt
                .query_map(params![league_id], |row| {
                    Ok((
                        (row.get::<_, String>(0)?, row.get(1)?, row.get(2)?),
                        (row.get(3)?, row.get(4)?),
                    ))
                })
                .context("failed to query prior picks")?
                .collect::<std::result::Result<HashMap<_, _>, _>>()
                .context("failed to map prior pick rows")?;
            rows
        };

        carry_forward(&mut picks, &prior);

        tx.execute(
            "DELETE FROM draft_picks WHERE league_id = ?1",
            params![league_id],
        )
        .context("failed to clear prior picks")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO draft_picks
                        (league_id, season, round, roster_id, owner_id,
                         previous_owner_id, pick_slot, comment)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .context("failed to prepare pick insert")?;
            for pick in &picks {
                stmt.execute(params![
                    pick.league_id,
                    pick.season,
                    pick.round,
                    pick.roster_id,
                    pick.owner_id,
                    pick.previous_owner_id,
                    pick.pick_slot,
                    pick.comment,
                ])
                .context("failed to insert pick")?;
            }
        }

        tx.commit().context("failed to commit pick rebuild")?;
        Ok(picks.len())
    }

    /// Load a league's picks ordered by season, round, then original slot.
    pub fn get_picks(&self, league_id: &str) -> Result<Vec<DraftPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, league_id, season, round, roster_id, owner_id,
                        previous_owner_id, pick_slot, comment
                 FROM draft_picks WHERE league_id = ?1
                 ORDER BY season, round, roster_id",
            )
            .context("failed to prepare pick query")?;

        let picks = stmt
            .query_map(params![league_id], map_pick_row)
            .context("failed to query picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pick rows")?;

        Ok(picks)
    }

    /// Load a single pick by row id.
    pub fn get_pick(&self, id: i64) -> Result<Option<DraftPick>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, league_id, season, round, roster_id, owner_id,
                    previous_owner_id, pick_slot, comment
             FROM draft_picks WHERE id = ?1",
            params![id],
            map_pick_row,
        )
        .optional()
        .context("failed to query pick")
    }

    /// Patch a pick's slot override and/or comment. Absent fields keep
    /// their stored value. Returns the updated row, or `None` if the id
    /// doesn't exist.
    pub fn update_pick(&self, id: i64, update: &UpdateDraftPick) -> Result<Option<DraftPick>> {
        {
            let conn = self.conn();
            let changed = conn
                .execute(
                    "UPDATE draft_picks SET
                        pick_slot = COALESCE(?2, pick_slot),
                        comment   = COALESCE(?3, comment)
                     WHERE id = ?1",
                    params![id, update.pick_slot, update.comment],
                )
                .context("failed to update pick")?;
            if changed == 0 {
                return Ok(None);
            }
        }
        self.get_pick(id)
    }

    // ------------------------------------------------------------------
    // Team display order
    // ------------------------------------------------------------------

    /// Store the saved column order (roster ids) for a league.
    pub fn set_team_order(&self, league_id: &str, order: &[u32]) -> Result<()> {
        let conn = self.conn();
        let json = serde_json::to_string(order).context("failed to serialize team order")?;
        conn.execute(
            "INSERT INTO league_team_order (league_id, display_order) VALUES (?1, ?2)
             ON CONFLICT(league_id) DO UPDATE SET display_order = excluded.display_order",
            params![league_id, json],
        )
        .context("failed to set team order")?;
        Ok(())
    }

    /// Load the saved column order, if one was ever stored.
    pub fn get_team_order(&self, league_id: &str) -> Result<Option<Vec<u32>>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT display_order FROM league_team_order WHERE league_id = ?1",
                params![league_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query team order")?;

        json.map(|j| serde_json::from_str(&j).context("failed to deserialize team order"))
            .transpose()
    }

    // ------------------------------------------------------------------
    // Pick predictions
    // ------------------------------------------------------------------

    /// Save (or overwrite) a user's prediction for a pick.
    ///
    /// Predictions are stored under the pick's synthetic key rather than
    /// its row id, so they survive the wholesale ledger rebuild the same
    /// way slot overrides do. Returns `false` when the pick id is unknown.
    pub fn save_prediction(&self, pick_id: i64, user_id: &str, comment: &str) -> Result<bool> {
        let Some(pick) = self.get_pick(pick_id)? else {
            return Ok(false);
        };
        let conn = self.conn();
        conn.execute(
            "INSERT INTO pick_predictions (league_id, season, round, roster_id, user_id, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(league_id, season, round, roster_id, user_id)
             DO UPDATE SET comment = excluded.comment",
            params![
                pick.league_id,
                pick.season,
                pick.round,
                pick.roster_id,
                user_id,
                comment,
            ],
        )
        .context("failed to save prediction")?;
        Ok(true)
    }

    /// Remove a user's prediction for a pick. Returns `false` when either
    /// the pick id or the prediction doesn't exist.
    pub fn delete_prediction(&self, pick_id: i64, user_id: &str) -> Result<bool> {
        let Some(pick) = self.get_pick(pick_id)? else {
            return Ok(false);
        };
        let conn = self.conn();
        let deleted = conn
            .execute(
                "DELETE FROM pick_predictions
                 WHERE league_id = ?1 AND season = ?2 AND round = ?3
                   AND roster_id = ?4 AND user_id = ?5",
                params![pick.league_id, pick.season, pick.round, pick.roster_id, user_id],
            )
            .context("failed to delete prediction")?;
        Ok(deleted > 0)
    }

    /// All predictions for a league, addressed by the *current* pick row
    /// ids (the join re-resolves synthetic keys after each rebuild).
    pub fn get_predictions(&self, league_id: &str) -> Result<Vec<PickPrediction>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT dp.id, pp.user_id, pp.comment
                 FROM pick_predictions pp
                 JOIN draft_picks dp
                   ON dp.league_id = pp.league_id
                  AND dp.season    = pp.season
                  AND dp.round     = pp.round
                  AND dp.roster_id = pp.roster_id
                 WHERE pp.league_id = ?1
                 ORDER BY dp.id, pp.user_id",
            )
            .context("failed to prepare prediction query")?;

        let predictions = stmt
            .query_map(params![league_id], |row| {
                Ok(PickPrediction {
                    pick_id: row.get(0)?,
                    user_id: row.get(1)?,
                    comment: row.get(2)?,
                })
            })
            .context("failed to query predictions")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map prediction rows")?;

        Ok(predictions)
    }
}

/// Shared row mapper for pick queries.
fn map_pick_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DraftPick> {
    Ok(DraftPick {
        id: row.get(0)?,
        league_id: row.get(1)?,
        season: row.get(2)?,
        round: row.get(3)?,
        roster_id: row.get(4)?,
        owner_id: row.get(5)?,
        previous_owner_id: row.get(6)?,
        pick_slot: row.get(7)?,
        comment: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::build_ledger;
    use serde_json::json;

    const LEAGUE: &str = "league_1";

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_league() -> League {
        League {
            league_id: LEAGUE.to_string(),
            name: "Dynasty Degens".to_string(),
            total_rosters: 12,
            season: "2025".to_string(),
            avatar: None,
            settings: json!({"draft_rounds": 4}),
        }
    }

    fn sample_roster(roster_id: u32) -> Roster {
        Roster {
            league_id: LEAGUE.to_string(),
            roster_id,
            owner_id: Some(format!("user_{roster_id}")),
            settings: Some(json!({"wins": 7, "losses": 6, "players": ["4034"]})),
        }
    }

    fn three_roster_ledger() -> Vec<NewDraftPick> {
        build_ledger(LEAGUE, 2025, 3, &[1, 2, 3], &[], &[])
    }

    // ------------------------------------------------------------------
    // Schema / leagues
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "leagues",
            "rosters",
            "users",
            "draft_picks",
            "league_team_order",
            "pick_predictions",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn league_round_trip_and_overwrite() {
        let db = test_db();
        assert!(db.get_league(LEAGUE).unwrap().is_none());

        db.upsert_league(&sample_league()).unwrap();
        let loaded = db.get_league(LEAGUE).unwrap().unwrap();
        assert_eq!(loaded.name, "Dynasty Degens");
        assert_eq!(loaded.total_rosters, 12);
        assert_eq!(loaded.settings, json!({"draft_rounds": 4}));

        let mut updated = sample_league();
        updated.name = "Dynasty Degens II".to_string();
        updated.season = "2026".to_string();
        db.upsert_league(&updated).unwrap();

        let loaded = db.get_league(LEAGUE).unwrap().unwrap();
        assert_eq!(loaded.name, "Dynasty Degens II");
        assert_eq!(loaded.season, "2026");
    }

    // ------------------------------------------------------------------
    // Rosters / users
    // ------------------------------------------------------------------

    #[test]
    fn rosters_upsert_without_duplicates() {
        let db = test_db();
        db.upsert_rosters(&[sample_roster(1), sample_roster(2)])
            .unwrap();
        // Re-sync the same rosters with changed settings.
        let mut changed = sample_roster(1);
        changed.settings = Some(json!({"wins": 8}));
        db.upsert_rosters(&[changed]).unwrap();

        let rosters = db.get_rosters(LEAGUE).unwrap();
        assert_eq!(rosters.len(), 2);
        assert_eq!(rosters[0].roster_id, 1);
        assert_eq!(rosters[0].settings, Some(json!({"wins": 8})));
        assert_eq!(rosters[1].roster_id, 2);
    }

    #[test]
    fn users_scoped_to_league() {
        let db = test_db();
        db.upsert_users(&[
            User {
                user_id: "u1".to_string(),
                league_id: LEAGUE.to_string(),
                display_name: "Alice".to_string(),
                avatar: None,
            },
            User {
                user_id: "u1".to_string(),
                league_id: "other_league".to_string(),
                display_name: "Alice Elsewhere".to_string(),
                avatar: None,
            },
        ])
        .unwrap();

        let users = db.get_users(LEAGUE).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].display_name, "Alice");
    }

    // ------------------------------------------------------------------
    // Pick ledger rebuild
    // ------------------------------------------------------------------

    #[test]
    fn replace_picks_inserts_full_ledger() {
        let db = test_db();
        let inserted = db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        assert_eq!(inserted, 3 * 3 * 3);

        let picks = db.get_picks(LEAGUE).unwrap();
        assert_eq!(picks.len(), 27);
        // Ordered by season, round, slot.
        assert_eq!(picks[0].season, "2025");
        assert_eq!(picks[0].round, 1);
        assert_eq!(picks[0].roster_id, 1);
    }

    #[test]
    fn replace_picks_carries_overrides_forward() {
        let db = test_db();
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();

        // User sets a slot override and a note on one pick.
        let target = db
            .get_picks(LEAGUE)
            .unwrap()
            .into_iter()
            .find(|p| p.season == "2026" && p.round == 2 && p.roster_id == 3)
            .unwrap();
        db.update_pick(
            target.id,
            &UpdateDraftPick {
                pick_slot: Some("Late 2nd".to_string()),
                comment: Some("probably a WR".to_string()),
            },
        )
        .unwrap()
        .unwrap();

        // Re-sync with identical upstream data.
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();

        let picks = db.get_picks(LEAGUE).unwrap();
        assert_eq!(picks.len(), 27, "resync must not grow the ledger");
        let carried = picks
            .iter()
            .find(|p| p.season == "2026" && p.round == 2 && p.roster_id == 3)
            .unwrap();
        assert_eq!(carried.pick_slot.as_deref(), Some("Late 2nd"));
        assert_eq!(carried.comment.as_deref(), Some("probably a WR"));

        // Everything else is still pristine.
        let untouched = picks
            .iter()
            .filter(|p| p.pick_slot.is_none() && p.comment.is_none())
            .count();
        assert_eq!(untouched, 26);
    }

    #[test]
    fn replace_picks_is_idempotent_modulo_row_ids() {
        let db = test_db();
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        let first: Vec<_> = db
            .get_picks(LEAGUE)
            .unwrap()
            .into_iter()
            .map(|p| (p.season, p.round, p.roster_id, p.owner_id, p.pick_slot, p.comment))
            .collect();

        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        let second: Vec<_> = db
            .get_picks(LEAGUE)
            .unwrap()
            .into_iter()
            .map(|p| (p.season, p.round, p.roster_id, p.owner_id, p.pick_slot, p.comment))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn replace_picks_leaves_other_leagues_alone() {
        let db = test_db();
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        db.replace_picks("other_league", build_ledger("other_league", 2025, 1, &[1], &[], &[]))
            .unwrap();

        assert_eq!(db.get_picks(LEAGUE).unwrap().len(), 27);
        assert_eq!(db.get_picks("other_league").unwrap().len(), 3);
    }

    // ------------------------------------------------------------------
    // Pick updates
    // ------------------------------------------------------------------

    #[test]
    fn update_pick_patches_only_provided_fields() {
        let db = test_db();
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        let id = db.get_picks(LEAGUE).unwrap()[0].id;

        let updated = db
            .update_pick(
                id,
                &UpdateDraftPick {
                    pick_slot: Some("1.01".to_string()),
                    comment: None,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.pick_slot.as_deref(), Some("1.01"));
        assert_eq!(updated.comment, None);

        let updated = db
            .update_pick(
                id,
                &UpdateDraftPick {
                    pick_slot: None,
                    comment: Some("stud incoming".to_string()),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.pick_slot.as_deref(), Some("1.01"), "slot kept");
        assert_eq!(updated.comment.as_deref(), Some("stud incoming"));
    }

    #[test]
    fn update_pick_unknown_id_returns_none() {
        let db = test_db();
        let result = db
            .update_pick(9999, &UpdateDraftPick::default())
            .unwrap();
        assert!(result.is_none());
    }

    // ------------------------------------------------------------------
    // Team display order
    // ------------------------------------------------------------------

    #[test]
    fn team_order_round_trip_and_overwrite() {
        let db = test_db();
        assert!(db.get_team_order(LEAGUE).unwrap().is_none());

        db.set_team_order(LEAGUE, &[5, 2, 8]).unwrap();
        assert_eq!(db.get_team_order(LEAGUE).unwrap(), Some(vec![5, 2, 8]));

        db.set_team_order(LEAGUE, &[8, 5, 2]).unwrap();
        assert_eq!(db.get_team_order(LEAGUE).unwrap(), Some(vec![8, 5, 2]));
    }

    // ------------------------------------------------------------------
    // Predictions
    // ------------------------------------------------------------------

    #[test]
    fn predictions_round_trip_by_current_pick_id() {
        let db = test_db();
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        let pick = db.get_picks(LEAGUE).unwrap()[0].clone();

        assert!(db.save_prediction(pick.id, "u1", "QB here").unwrap());
        assert!(db.save_prediction(pick.id, "u2", "trade down").unwrap());

        let predictions = db.get_predictions(LEAGUE).unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions
            .iter()
            .all(|p| p.pick_id == pick.id));

        // Overwrite one user's prediction.
        assert!(db.save_prediction(pick.id, "u1", "WR actually").unwrap());
        let predictions = db.get_predictions(LEAGUE).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(
            predictions
                .iter()
                .find(|p| p.user_id == "u1")
                .unwrap()
                .comment,
            "WR actually"
        );
    }

    #[test]
    fn predictions_survive_ledger_rebuild() {
        let db = test_db();
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        let pick = db.get_picks(LEAGUE).unwrap()[0].clone();
        db.save_prediction(pick.id, "u1", "QB here").unwrap();

        // Rebuild assigns fresh row ids; the prediction must follow the
        // synthetic key to the new row.
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        let new_pick = db
            .get_picks(LEAGUE)
            .unwrap()
            .into_iter()
            .find(|p| {
                p.season == pick.season && p.round == pick.round && p.roster_id == pick.roster_id
            })
            .unwrap();

        let predictions = db.get_predictions(LEAGUE).unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].pick_id, new_pick.id);
        assert_eq!(predictions[0].comment, "QB here");
    }

    #[test]
    fn prediction_for_unknown_pick_is_rejected() {
        let db = test_db();
        assert!(!db.save_prediction(12345, "u1", "nope").unwrap());
        assert!(!db.delete_prediction(12345, "u1").unwrap());
    }

    #[test]
    fn delete_prediction_removes_only_that_user() {
        let db = test_db();
        db.replace_picks(LEAGUE, three_roster_ledger()).unwrap();
        let pick = db.get_picks(LEAGUE).unwrap()[0].clone();
        db.save_prediction(pick.id, "u1", "QB").unwrap();
        db.save_prediction(pick.id, "u2", "RB").unwrap();

        assert!(db.delete_prediction(pick.id, "u1").unwrap());
        assert!(!db.delete_prediction(pick.id, "u1").unwrap(), "already gone");

        let predictions = db.get_predictions(LEAGUE).unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].user_id, "u2");
    }
}
