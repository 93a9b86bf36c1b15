// SQLite persistence layer for the player pool.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::players::{PlayerRecord, Position};

/// SQLite-backed store for the ingested player pool.
///
/// The position index is the query path for filtered lists, standing in
/// for the upstream deployment's secondary index on the same column.
pub struct PlayerStore {
    conn: Mutex<Connection>,
}

impl PlayerStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral in-memory store (useful for
    /// tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                player_id        TEXT PRIMARY KEY,
                first_name       TEXT,
                last_name        TEXT,
                search_full_name TEXT NOT NULL,
                team             TEXT NOT NULL,
                position         TEXT NOT NULL,
                injury_status    TEXT,
                status           TEXT,
                updated_at       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_players_position ON players(position);
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

    /// Insert or replace a player row. Re-syncing the same player_id
    /// overwrites the previous row and refreshes its `updated_at` stamp.
    pub fn upsert_player(&self, player: &PlayerRecord) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO players
                (player_id, first_name, last_name, search_full_name, team, position, injury_status, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                player.player_id,
                player.first_name,
                player.last_name,
                player.search_full_name,
                player.team,
                player.position.as_str(),
                player.injury_status,
                player.status,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .context("failed to upsert player")?;
        Ok(())
    }

    /// All players at one position, via the position index.
    pub fn players_by_position(&self, position: Position) -> Result<Vec<PlayerRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player_id, first_name, last_name, search_full_name, team, position, injury_status, status
                 FROM players WHERE position = ?1 ORDER BY search_full_name",
            )
            .context("failed to prepare position query")?;

        let players = stmt
            .query_map(params![position.as_str()], row_to_player)
            .context("failed to query players by position")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;

        Ok(players)
    }

    /// Full scan of the player pool.
    pub fn all_players(&self) -> Result<Vec<PlayerRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player_id, first_name, last_name, search_full_name, team, position, injury_status, status
                 FROM players ORDER BY search_full_name",
            )
            .context("failed to prepare scan query")?;

        let players = stmt
            .query_map([], row_to_player)
            .context("failed to scan players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;

        Ok(players)
    }

    /// Number of stored players.
    pub fn player_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))
            .context("failed to count players")?;
        Ok(count as usize)
    }
}

fn row_to_player(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlayerRecord> {
    let position_str: String = row.get(5)?;
    let position = Position::from_str_pos(&position_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown position: {position_str}").into(),
        )
    })?;

    Ok(PlayerRecord {
        player_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        search_full_name: row.get(3)?,
        team: row.get(4)?,
        position,
        injury_status: row.get(6)?,
        status: row.get(7)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
