//! # Session Repository
//!
//! Database operations for poker sessions.
//!
//! ## Stored Chip Distribution
//! ```text
//! sessions.chip_distribution   TEXT   {"Black":10,"Blue":10,"Green":13,"Red":14,"White":20}
//! sessions.total_chips         INT    67
//! ```
//! A value that no longer parses is logged and read back as `None`; the
//! session service then recomputes and stores a fresh one.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::next_dated_ordinal;
use pokernight_core::ids::{self, SESSION_PREFIX};
use pokernight_core::{ChipDistribution, Money, Session, SessionStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
struct SessionRecord {
    id: String,
    date: NaiveDate,
    buy_in_cents: i64,
    status: SessionStatus,
    chip_distribution: Option<String>,
    total_chips: Option<i64>,
    wisdom_quote: Option<String>,
    wisdom_player_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRecord> for Session {
    fn from(r: SessionRecord) -> Self {
        let chip_distribution = r.chip_distribution.as_deref().and_then(|json| {
            match serde_json::from_str::<ChipDistribution>(json) {
                Ok(distribution) => Some(distribution),
                Err(e) => {
                    warn!(session_id = %r.id, error = %e, "Ignoring unreadable chip distribution");
                    None
                }
            }
        });

        Session {
            total_chips: chip_distribution.as_ref().and(r.total_chips),
            id: r.id,
            date: r.date,
            buy_in_cents: r.buy_in_cents,
            status: r.status,
            chip_distribution,
            wisdom_quote: r.wisdom_quote,
            wisdom_player_id: r.wisdom_player_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SESSION_COLUMNS: &str = "id, date, buy_in_cents, status, chip_distribution, total_chips, \
     wisdom_quote, wisdom_player_id, created_at, updated_at";

/// Repository for session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Creates an ACTIVE session numbered `sid_YYYYMMDD_N` for its date.
    pub async fn create(
        &self,
        date: NaiveDate,
        buy_in: Money,
        chips: &ChipDistribution,
    ) -> DbResult<Session> {
        let mut tx = self.pool.begin().await?;
        let session = Self::insert_in(&mut tx, date, buy_in, chips).await?;
        tx.commit().await?;

        info!(
            session_id = %session.id,
            buy_in = %buy_in,
            total_chips = chips.total_chips(),
            "Session created"
        );
        Ok(session)
    }

    /// [`create`](Self::create) inside a caller's transaction.
    pub(crate) async fn insert_in(
        tx: &mut Transaction<'_, Sqlite>,
        date: NaiveDate,
        buy_in: Money,
        chips: &ChipDistribution,
    ) -> DbResult<Session> {
        let chips_json = serde_json::to_string(chips)?;
        let now = Utc::now();

        let ordinal = next_dated_ordinal(tx, "sessions", SESSION_PREFIX, date).await?;
        let id = ids::session_id(date, ordinal);

        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            r#"
            INSERT INTO sessions
                (id, date, buy_in_cents, status, chip_distribution, total_chips, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'ACTIVE', ?4, ?5, ?6, ?6)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(&id)
        .bind(date)
        .bind(buy_in.cents())
        .bind(chips_json)
        .bind(chips.total_chips())
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        Ok(record.into())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Session>> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM sessions WHERE id = ?1",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Session::from))
    }

    /// All sessions, newest first.
    pub async fn list(&self) -> DbResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM sessions ORDER BY date DESC, created_at DESC, id DESC",
            SESSION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Session::from).collect())
    }

    /// ACTIVE sessions, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM sessions WHERE status = ?1 ORDER BY date DESC, created_at DESC, id DESC",
            SESSION_COLUMNS
        ))
        .bind(SessionStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Session::from).collect())
    }

    /// Ends or reactivates a session.
    pub async fn set_status(&self, id: &str, status: SessionStatus) -> DbResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE sessions SET status = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Session", id))?;

        info!(session_id = %id, status = %status, "Session status changed");
        Ok(record.into())
    }

    /// Stores a (re)computed chip distribution and its chip total.
    pub async fn set_chip_distribution(&self, id: &str, chips: &ChipDistribution) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sessions SET chip_distribution = ?1, total_chips = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(serde_json::to_string(chips)?)
        .bind(chips.total_chips())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Session", id));
        }

        debug!(session_id = %id, total_chips = chips.total_chips(), "Chip distribution stored");
        Ok(())
    }

    /// Changes the buy-in price and re-prices every entry of the session in
    /// the same transaction.
    pub async fn update_buy_in(
        &self,
        id: &str,
        buy_in: Money,
        chips: &ChipDistribution,
    ) -> DbResult<Session> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            r#"
            UPDATE sessions
            SET buy_in_cents = ?1, chip_distribution = ?2, total_chips = ?3, updated_at = ?4
            WHERE id = ?5
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(buy_in.cents())
        .bind(serde_json::to_string(chips)?)
        .bind(chips.total_chips())
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Session", id))?;

        let repriced = sqlx::query(
            r#"
            UPDATE entries
            SET total_buy_in_cents = buy_in_count * ?1,
                profit_cents = payout_cents - buy_in_count * ?1,
                updated_at = ?2
            WHERE session_id = ?3
            "#,
        )
        .bind(buy_in.cents())
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            session_id = %id,
            buy_in = %buy_in,
            entries = repriced.rows_affected(),
            "Session buy-in changed"
        );
        Ok(record.into())
    }

    /// Sets or clears the words of wisdom.
    pub async fn set_wisdom(
        &self,
        id: &str,
        quote: Option<&str>,
        player_id: Option<&str>,
    ) -> DbResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            r#"
            UPDATE sessions SET wisdom_quote = ?1, wisdom_player_id = ?2, updated_at = ?3
            WHERE id = ?4
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(quote)
        .bind(player_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Session", id))?;

        Ok(record.into())
    }

    /// Deletes a session and its entries.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Session", id));
        }

        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
