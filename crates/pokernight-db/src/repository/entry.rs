//! # Entry Repository
//!
//! Database operations for session entries (one row per player per session).
//!
//! ## Derived Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_buy_in_cents = buy_in_count × sessions.buy_in_cents             │
//! │  profit_cents       = payout_cents − total_buy_in_cents                │
//! │                                                                         │
//! │  Every write that touches buy_in_count or payout_cents rewrites both   │
//! │  derived columns in the same statement.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use pokernight_core::ids::{self, ENTRY_PREFIX};
use pokernight_core::{Entry, Money, PlayerSessionHistory, SessionStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
struct EntryRecord {
    id: String,
    session_id: String,
    player_id: String,
    player_name: String,
    buy_in_count: i64,
    total_buy_in_cents: i64,
    payout_cents: i64,
    profit_cents: i64,
    session_seven_two_wins: i64,
    session_strikes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EntryRecord> for Entry {
    fn from(r: EntryRecord) -> Self {
        Entry {
            id: r.id,
            session_id: r.session_id,
            player_id: r.player_id,
            player_name: r.player_name,
            buy_in_count: r.buy_in_count,
            total_buy_in_cents: r.total_buy_in_cents,
            payout_cents: r.payout_cents,
            profit_cents: r.profit_cents,
            session_seven_two_wins: r.session_seven_two_wins,
            session_strikes: r.session_strikes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct HistoryRecord {
    session_id: String,
    date: NaiveDate,
    status: SessionStatus,
    buy_in_count: i64,
    total_buy_in_cents: i64,
    payout_cents: i64,
    profit_cents: i64,
    session_seven_two_wins: i64,
    session_strikes: i64,
}

impl From<HistoryRecord> for PlayerSessionHistory {
    fn from(r: HistoryRecord) -> Self {
        PlayerSessionHistory {
            session_id: r.session_id,
            date: r.date,
            status: r.status,
            buy_in_count: r.buy_in_count,
            total_buy_in_cents: r.total_buy_in_cents,
            payout_cents: r.payout_cents,
            profit_cents: r.profit_cents,
            session_seven_two_wins: r.session_seven_two_wins,
            session_strikes: r.session_strikes,
        }
    }
}

const SELECT_ENTRY: &str = r#"
    SELECT e.id, e.session_id, e.player_id, p.name AS player_name,
           e.buy_in_count, e.total_buy_in_cents, e.payout_cents, e.profit_cents,
           e.session_seven_two_wins, e.session_strikes, e.created_at, e.updated_at
    FROM entries e
    JOIN players p ON p.id = e.player_id
"#;

/// Per-session counters that can be stepped up and down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCounter {
    SevenTwoWins,
    Strikes,
}

impl SessionCounter {
    fn column(self) -> &'static str {
        match self {
            SessionCounter::SevenTwoWins => "session_seven_two_wins",
            SessionCounter::Strikes => "session_strikes",
        }
    }
}

/// Repository for entry database operations.
#[derive(Debug, Clone)]
pub struct EntryRepository {
    pool: SqlitePool,
}

impl EntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EntryRepository { pool }
    }

    /// Entries of one session in the order players joined.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<Entry>> {
        let records = sqlx::query_as::<_, EntryRecord>(&format!(
            "{} WHERE e.session_id = ?1 ORDER BY e.created_at, e.id",
            SELECT_ENTRY
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Entry::from).collect())
    }

    /// Every entry, for statistics.
    pub async fn list_all(&self) -> DbResult<Vec<Entry>> {
        let records = sqlx::query_as::<_, EntryRecord>(&format!(
            "{} ORDER BY e.created_at, e.id",
            SELECT_ENTRY
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Entry::from).collect())
    }

    pub async fn list_for_player(&self, player_id: &str) -> DbResult<Vec<Entry>> {
        let records = sqlx::query_as::<_, EntryRecord>(&format!(
            "{} WHERE e.player_id = ?1 ORDER BY e.created_at, e.id",
            SELECT_ENTRY
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Entry::from).collect())
    }

    /// A player's sessions, newest first.
    pub async fn history_for_player(&self, player_id: &str) -> DbResult<Vec<PlayerSessionHistory>> {
        let records = sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT e.session_id, s.date, s.status,
                   e.buy_in_count, e.total_buy_in_cents, e.payout_cents, e.profit_cents,
                   e.session_seven_two_wins, e.session_strikes
            FROM entries e
            JOIN sessions s ON s.id = e.session_id
            WHERE e.player_id = ?1
            ORDER BY s.date DESC, s.created_at DESC, s.id DESC
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(PlayerSessionHistory::from).collect())
    }

    pub async fn get(&self, session_id: &str, player_id: &str) -> DbResult<Option<Entry>> {
        let record = sqlx::query_as::<_, EntryRecord>(&format!(
            "{} WHERE e.session_id = ?1 AND e.player_id = ?2",
            SELECT_ENTRY
        ))
        .bind(session_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Entry::from))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Entry>> {
        let record = sqlx::query_as::<_, EntryRecord>(&format!("{} WHERE e.id = ?1", SELECT_ENTRY))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Entry::from))
    }

    /// Records `count` buy-ins at `buy_in` each, creating the entry on the
    /// player's first buy-in of the session.
    pub async fn add_buy_ins(
        &self,
        session_id: &str,
        player_id: &str,
        count: i64,
        buy_in: Money,
    ) -> DbResult<Entry> {
        let mut tx = self.pool.begin().await?;
        let entry = Self::add_buy_ins_in(&mut tx, session_id, player_id, count, buy_in).await?;
        tx.commit().await?;

        info!(
            session_id = %session_id,
            player_id = %player_id,
            added = count,
            buy_in_count = entry.buy_in_count,
            "Buy-ins recorded"
        );
        Ok(entry)
    }

    /// [`add_buy_ins`](Self::add_buy_ins) inside a caller's transaction.
    pub(crate) async fn add_buy_ins_in(
        tx: &mut Transaction<'_, Sqlite>,
        session_id: &str,
        player_id: &str,
        count: i64,
        buy_in: Money,
    ) -> DbResult<Entry> {
        let now = Utc::now();
        let existing = Self::fetch_in(tx, session_id, player_id).await?;

        let entry_id = match existing {
            Some(entry) => {
                let buy_in_count = entry.buy_in_count + count;
                let total = buy_in * buy_in_count;
                sqlx::query(
                    r#"
                    UPDATE entries
                    SET buy_in_count = ?1, total_buy_in_cents = ?2,
                        profit_cents = payout_cents - ?2, updated_at = ?3
                    WHERE id = ?4
                    "#,
                )
                .bind(buy_in_count)
                .bind(total.cents())
                .bind(now)
                .bind(&entry.id)
                .execute(&mut **tx)
                .await?;
                entry.id
            }
            None => {
                let existing_ids: Vec<String> = sqlx::query_scalar("SELECT id FROM entries")
                    .fetch_all(&mut **tx)
                    .await?;
                let max = existing_ids
                    .iter()
                    .filter_map(|id| ids::sequence_number(ENTRY_PREFIX, id))
                    .max();
                let id = ids::next_entry_id(max);
                let total = buy_in * count;

                sqlx::query(
                    r#"
                    INSERT INTO entries
                        (id, session_id, player_id, buy_in_count, total_buy_in_cents,
                         payout_cents, profit_cents, session_seven_two_wins, session_strikes,
                         created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, 0, 0, ?7, ?7)
                    "#,
                )
                .bind(&id)
                .bind(session_id)
                .bind(player_id)
                .bind(count)
                .bind(total.cents())
                .bind((-total).cents())
                .bind(now)
                .execute(&mut **tx)
                .await?;
                id
            }
        };

        Self::fetch_in(tx, session_id, player_id)
            .await?
            .ok_or_else(|| DbError::not_found("Entry", entry_id.as_str()))
    }

    /// Takes back one buy-in.
    ///
    /// ## Returns
    /// * `Ok(Some(entry))` - Remaining buy-ins
    /// * `Ok(None)` - That was the last buy-in; the entry was deleted
    pub async fn remove_buy_in(
        &self,
        session_id: &str,
        player_id: &str,
        buy_in: Money,
    ) -> DbResult<Option<Entry>> {
        let mut tx = self.pool.begin().await?;

        let entry = Self::fetch_in(&mut tx, session_id, player_id)
            .await?
            .ok_or_else(|| DbError::not_found("Entry", format!("{}/{}", session_id, player_id)))?;

        if entry.buy_in_count <= 1 {
            sqlx::query("DELETE FROM entries WHERE id = ?1")
                .bind(&entry.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            info!(session_id = %session_id, player_id = %player_id, "Last buy-in removed, entry deleted");
            return Ok(None);
        }

        let buy_in_count = entry.buy_in_count - 1;
        let total = buy_in * buy_in_count;
        sqlx::query(
            r#"
            UPDATE entries
            SET buy_in_count = ?1, total_buy_in_cents = ?2,
                profit_cents = payout_cents - ?2, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(buy_in_count)
        .bind(total.cents())
        .bind(Utc::now())
        .bind(&entry.id)
        .execute(&mut *tx)
        .await?;

        let updated = Self::fetch_in(&mut tx, session_id, player_id)
            .await?
            .ok_or_else(|| DbError::not_found("Entry", entry.id.as_str()))?;
        tx.commit().await?;

        debug!(session_id = %session_id, player_id = %player_id, buy_in_count, "Buy-in removed");
        Ok(Some(updated))
    }

    /// Records what the player cashed out with.
    pub async fn set_payout(&self, session_id: &str, player_id: &str, payout: Money) -> DbResult<Entry> {
        let result = sqlx::query(
            r#"
            UPDATE entries
            SET payout_cents = ?1, profit_cents = ?1 - total_buy_in_cents, updated_at = ?2
            WHERE session_id = ?3 AND player_id = ?4
            "#,
        )
        .bind(payout.cents())
        .bind(Utc::now())
        .bind(session_id)
        .bind(player_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Entry", format!("{}/{}", session_id, player_id)));
        }

        info!(session_id = %session_id, player_id = %player_id, payout = %payout, "Payout recorded");
        self.require(session_id, player_id).await
    }

    /// Steps a per-session counter by `delta`, never below zero.
    pub async fn adjust_counter(
        &self,
        session_id: &str,
        player_id: &str,
        counter: SessionCounter,
        delta: i64,
    ) -> DbResult<Entry> {
        let column = counter.column();
        let result = sqlx::query(&format!(
            "UPDATE entries SET {col} = MAX({col} + ?1, 0), updated_at = ?2 \
             WHERE session_id = ?3 AND player_id = ?4",
            col = column
        ))
        .bind(delta)
        .bind(Utc::now())
        .bind(session_id)
        .bind(player_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Entry", format!("{}/{}", session_id, player_id)));
        }

        debug!(session_id = %session_id, player_id = %player_id, counter = column, delta, "Counter adjusted");
        self.require(session_id, player_id).await
    }

    /// Admin correction of an entry. Totals are re-derived from the
    /// session's current buy-in.
    pub async fn update(
        &self,
        id: &str,
        buy_in_count: i64,
        payout: Money,
        seven_two_wins: i64,
        strikes: i64,
    ) -> DbResult<Entry> {
        let result = sqlx::query(
            r#"
            UPDATE entries
            SET buy_in_count = ?1,
                total_buy_in_cents = ?1 * (SELECT buy_in_cents FROM sessions WHERE id = entries.session_id),
                payout_cents = ?2,
                profit_cents = ?2 - ?1 * (SELECT buy_in_cents FROM sessions WHERE id = entries.session_id),
                session_seven_two_wins = ?3,
                session_strikes = ?4,
                updated_at = ?5
            WHERE id = ?6
            "#,
        )
        .bind(buy_in_count)
        .bind(payout.cents())
        .bind(seven_two_wins)
        .bind(strikes)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Entry", id));
        }

        info!(entry_id = %id, buy_in_count, payout = %payout, "Entry updated by admin");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Entry", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Entry", id));
        }

        info!(entry_id = %id, "Entry deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn require(&self, session_id: &str, player_id: &str) -> DbResult<Entry> {
        self.get(session_id, player_id)
            .await?
            .ok_or_else(|| DbError::not_found("Entry", format!("{}/{}", session_id, player_id)))
    }

    async fn fetch_in(
        tx: &mut Transaction<'_, Sqlite>,
        session_id: &str,
        player_id: &str,
    ) -> DbResult<Option<Entry>> {
        let record = sqlx::query_as::<_, EntryRecord>(&format!(
            "{} WHERE e.session_id = ?1 AND e.player_id = ?2",
            SELECT_ENTRY
        ))
        .bind(session_id)
        .bind(player_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(record.map(Entry::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use pokernight_core::{compute_chip_distribution, Session};

    const BUY_IN: Money = Money::from_cents(2000);

    async fn setup() -> (Database, Session, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = db
            .sessions()
            .create(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                BUY_IN,
                &compute_chip_distribution(BUY_IN).unwrap(),
            )
            .await
            .unwrap();
        let (alice, _) = db.players().find_or_create("Alice").await.unwrap();
        (db, session, alice.id)
    }

    #[tokio::test]
    async fn test_add_buy_ins_creates_then_accumulates() {
        let (db, session, alice) = setup().await;

        let entry = db.entries().add_buy_ins(&session.id, &alice, 1, BUY_IN).await.unwrap();
        assert_eq!(entry.id, "eid_0001");
        assert_eq!(entry.player_name, "Alice");
        assert_eq!(entry.total_buy_in_cents, 2000);
        assert_eq!(entry.profit_cents, -2000);

        let entry = db.entries().add_buy_ins(&session.id, &alice, 2, BUY_IN).await.unwrap();
        assert_eq!(entry.id, "eid_0001");
        assert_eq!(entry.buy_in_count, 3);
        assert_eq!(entry.total_buy_in_cents, 6000);
        assert_eq!(entry.profit_cents, -6000);
    }

    #[tokio::test]
    async fn test_payout_recomputes_profit() {
        let (db, session, alice) = setup().await;
        db.entries().add_buy_ins(&session.id, &alice, 2, BUY_IN).await.unwrap();

        let entry = db
            .entries()
            .set_payout(&session.id, &alice, Money::from_cents(5500))
            .await
            .unwrap();
        assert_eq!(entry.payout_cents, 5500);
        assert_eq!(entry.profit_cents, 1500);

        // A later buy-in keeps the payout and lowers the profit.
        let entry = db.entries().add_buy_ins(&session.id, &alice, 1, BUY_IN).await.unwrap();
        assert_eq!(entry.profit_cents, -500);
    }

    #[tokio::test]
    async fn test_remove_last_buy_in_deletes_entry() {
        let (db, session, alice) = setup().await;
        db.entries().add_buy_ins(&session.id, &alice, 2, BUY_IN).await.unwrap();

        let remaining = db.entries().remove_buy_in(&session.id, &alice, BUY_IN).await.unwrap();
        assert_eq!(remaining.map(|e| e.buy_in_count), Some(1));

        let remaining = db.entries().remove_buy_in(&session.id, &alice, BUY_IN).await.unwrap();
        assert!(remaining.is_none());
        assert!(db.entries().get(&session.id, &alice).await.unwrap().is_none());

        assert!(matches!(
            db.entries().remove_buy_in(&session.id, &alice, BUY_IN).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_counters_never_negative() {
        let (db, session, alice) = setup().await;
        db.entries().add_buy_ins(&session.id, &alice, 1, BUY_IN).await.unwrap();
        let entries = db.entries();

        let e = entries
            .adjust_counter(&session.id, &alice, SessionCounter::Strikes, 1)
            .await
            .unwrap();
        assert_eq!(e.session_strikes, 1);
        let e = entries
            .adjust_counter(&session.id, &alice, SessionCounter::Strikes, -1)
            .await
            .unwrap();
        assert_eq!(e.session_strikes, 0);
        let e = entries
            .adjust_counter(&session.id, &alice, SessionCounter::SevenTwoWins, -1)
            .await
            .unwrap();
        assert_eq!(e.session_seven_two_wins, 0);

        assert!(matches!(
            entries
                .adjust_counter(&session.id, "pid_999", SessionCounter::Strikes, 1)
                .await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let (db, older, alice) = setup().await;
        let newer = db
            .sessions()
            .create(
                NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
                BUY_IN,
                &compute_chip_distribution(BUY_IN).unwrap(),
            )
            .await
            .unwrap();
        db.entries().add_buy_ins(&older.id, &alice, 1, BUY_IN).await.unwrap();
        db.entries().add_buy_ins(&newer.id, &alice, 3, BUY_IN).await.unwrap();

        let history = db.entries().history_for_player(&alice).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|h| h.session_id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
        assert_eq!(history[0].buy_in_count, 3);
        assert_eq!(history[0].status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_admin_update_uses_session_buy_in() {
        let (db, session, alice) = setup().await;
        let entry = db.entries().add_buy_ins(&session.id, &alice, 1, BUY_IN).await.unwrap();

        let updated = db
            .entries()
            .update(&entry.id, 3, Money::from_cents(10_000), 1, 2)
            .await
            .unwrap();
        assert_eq!(updated.total_buy_in_cents, 6000);
        assert_eq!(updated.profit_cents, 4000);
        assert_eq!(updated.session_seven_two_wins, 1);
        assert_eq!(updated.session_strikes, 2);

        db.entries().delete(&entry.id).await.unwrap();
        assert_eq!(db.entries().count().await.unwrap(), 0);
    }
}
