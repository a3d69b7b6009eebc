//! # Player Repository
//!
//! Database operations for players.
//!
//! ## Name Matching
//! ```text
//! POST /api/players { "name": "alice" }
//!      │
//!      ▼
//! find_or_create("alice")
//!      │   SELECT ... WHERE name = ?1 COLLATE NOCASE
//!      ├── found "Alice" (pid_003) ──► (Alice, created = false)
//!      └── none ──► INSERT pid_{max+1} ──► (alice, created = true)
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use pokernight_core::ids::{self, PLAYER_PREFIX};
use pokernight_core::Player;

/// Row shape of the `players` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PlayerRecord {
    id: String,
    name: String,
    seven_two_wins: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlayerRecord> for Player {
    fn from(r: PlayerRecord) -> Self {
        Player {
            id: r.id,
            name: r.name,
            seven_two_wins: r.seven_two_wins,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT_PLAYER: &str =
    "SELECT id, name, seven_two_wins, created_at, updated_at FROM players";

/// Repository for player database operations.
#[derive(Debug, Clone)]
pub struct PlayerRepository {
    pool: SqlitePool,
}

impl PlayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PlayerRepository { pool }
    }

    /// All players, alphabetical ignoring case.
    pub async fn list(&self) -> DbResult<Vec<Player>> {
        let records = sqlx::query_as::<_, PlayerRecord>(&format!(
            "{} ORDER BY name COLLATE NOCASE, id",
            SELECT_PLAYER
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Player::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Player>> {
        let record = sqlx::query_as::<_, PlayerRecord>(&format!("{} WHERE id = ?1", SELECT_PLAYER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Player::from))
    }

    /// Case-insensitive name lookup.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Player>> {
        let record = sqlx::query_as::<_, PlayerRecord>(&format!(
            "{} WHERE name = ?1 COLLATE NOCASE",
            SELECT_PLAYER
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Player::from))
    }

    /// Returns the player with this name, creating them if needed.
    ///
    /// ## Returns
    /// `(player, created)` where `created` is false when an existing player
    /// matched ignoring case.
    ///
    /// `name` must already be validated (trimmed, non-empty).
    pub async fn find_or_create(&self, name: &str) -> DbResult<(Player, bool)> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, PlayerRecord>(&format!(
            "{} WHERE name = ?1 COLLATE NOCASE",
            SELECT_PLAYER
        ))
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(record) = existing {
            tx.commit().await?;
            debug!(player_id = %record.id, "Player already exists");
            return Ok((record.into(), false));
        }

        let existing_ids: Vec<String> = sqlx::query_scalar("SELECT id FROM players")
            .fetch_all(&mut *tx)
            .await?;
        let max = existing_ids
            .iter()
            .filter_map(|id| ids::sequence_number(PLAYER_PREFIX, id))
            .max();
        let id = ids::next_player_id(max);
        let now = Utc::now();

        let record = sqlx::query_as::<_, PlayerRecord>(
            r#"
            INSERT INTO players (id, name, seven_two_wins, created_at, updated_at)
            VALUES (?1, ?2, 0, ?3, ?3)
            RETURNING id, name, seven_two_wins, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(player_id = %id, name = %name, "Player created");
        Ok((record.into(), true))
    }

    /// Adds `delta` to the lifetime 7-2 win count, clamping at zero.
    pub async fn adjust_seven_two_wins(&self, id: &str, delta: i64) -> DbResult<Player> {
        let record = sqlx::query_as::<_, PlayerRecord>(
            r#"
            UPDATE players
            SET seven_two_wins = MAX(seven_two_wins + ?1, 0), updated_at = ?2
            WHERE id = ?3
            RETURNING id, name, seven_two_wins, created_at, updated_at
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Player", id))?;

        debug!(player_id = %id, seven_two_wins = record.seven_two_wins, "7-2 wins updated");
        Ok(record.into())
    }

    /// Renames a player. Fails with `UniqueViolation` if the name is taken.
    pub async fn rename(&self, id: &str, name: &str) -> DbResult<Player> {
        let result = sqlx::query_as::<_, PlayerRecord>(
            r#"
            UPDATE players SET name = ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING id, name, seven_two_wins, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        let record = match result {
            Ok(Some(record)) => record,
            Ok(None) => return Err(DbError::not_found("Player", id)),
            Err(e) => {
                return Err(match DbError::from(e) {
                    DbError::UniqueViolation { .. } => DbError::duplicate("name", name),
                    other => other,
                })
            }
        };

        info!(player_id = %id, name = %name, "Player renamed");
        Ok(record.into())
    }

    /// Deletes a player together with their entries, RSVPs and
    /// subscriptions.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM players WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Player", id));
        }

        info!(player_id = %id, "Player deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
