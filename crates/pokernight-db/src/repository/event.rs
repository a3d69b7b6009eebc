//! # Event Repository
//!
//! Calendar events and the RSVPs attached to them.
//!
//! ```text
//! calendar_events (evt_20240112_1) ◄──── event_rsvps (event_id, player_id) YES|NO|MAYBE
//!        │
//!        └── session_id ──► sessions   (set by "start session")
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::entry::EntryRepository;
use crate::repository::next_dated_ordinal;
use crate::repository::session::SessionRepository;
use pokernight_core::ids::{self, EVENT_PREFIX};
use pokernight_core::{CalendarEvent, ChipDistribution, Money, Rsvp, RsvpStatus, Session};

#[derive(Debug, Clone, sqlx::FromRow)]
struct EventRecord {
    id: String,
    title: String,
    date: NaiveDate,
    time: Option<String>,
    location: Option<String>,
    description: Option<String>,
    buy_in_cents: i64,
    max_players: Option<i64>,
    session_id: Option<String>,
    is_cancelled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRecord {
    fn into_event(self, rsvps: Vec<Rsvp>) -> CalendarEvent {
        CalendarEvent {
            id: self.id,
            title: self.title,
            date: self.date,
            time: self.time,
            location: self.location,
            description: self.description,
            buy_in_cents: self.buy_in_cents,
            max_players: self.max_players,
            session_id: self.session_id,
            is_cancelled: self.is_cancelled,
            rsvps,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RsvpRecord {
    event_id: String,
    player_id: String,
    player_name: String,
    status: RsvpStatus,
    updated_at: DateTime<Utc>,
}

impl From<RsvpRecord> for Rsvp {
    fn from(r: RsvpRecord) -> Self {
        Rsvp {
            event_id: r.event_id,
            player_id: r.player_id,
            player_name: r.player_name,
            status: r.status,
            updated_at: r.updated_at,
        }
    }
}

const EVENT_COLUMNS: &str = "id, title, date, time, location, description, buy_in_cents, \
     max_players, session_id, is_cancelled, created_at, updated_at";

const SELECT_RSVP: &str = r#"
    SELECT r.event_id, r.player_id, p.name AS player_name, r.status, r.updated_at
    FROM event_rsvps r
    JOIN players p ON p.id = r.player_id
"#;

/// Validated fields of a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub buy_in: Money,
    pub max_players: Option<i64>,
}

/// Partial event update. `None` leaves a field alone; for the clearable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub buy_in: Option<Money>,
    pub max_players: Option<Option<i64>>,
}

/// Result of [`EventRepository::start_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSessionStart {
    pub session: Session,
    /// The event, now carrying `session_id`.
    pub event: CalendarEvent,
    /// Players seated with one buy-in, by name.
    pub seated: Vec<String>,
}

/// Repository for calendar events and RSVPs.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EventRepository { pool }
    }

    pub async fn create(&self, event: &NewEvent) -> DbResult<CalendarEvent> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let ordinal = next_dated_ordinal(&mut tx, "calendar_events", EVENT_PREFIX, event.date).await?;
        let id = ids::event_id(event.date, ordinal);

        let record = sqlx::query_as::<_, EventRecord>(&format!(
            r#"
            INSERT INTO calendar_events
                (id, title, date, time, location, description, buy_in_cents, max_players,
                 session_id, is_cancelled, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, 0, ?9, ?9)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(&id)
        .bind(&event.title)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(&event.description)
        .bind(event.buy_in.cents())
        .bind(event.max_players)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(event_id = %id, date = %event.date, "Calendar event created");
        Ok(record.into_event(Vec::new()))
    }

    /// Event with its RSVPs.
    pub async fn get(&self, id: &str) -> DbResult<Option<CalendarEvent>> {
        let record = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {} FROM calendar_events WHERE id = ?1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => {
                let rsvps = self.rsvps_for(id).await?;
                Ok(Some(record.into_event(rsvps)))
            }
            None => Ok(None),
        }
    }

    /// All events by date, soonest first.
    pub async fn list(&self) -> DbResult<Vec<CalendarEvent>> {
        let records = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {} FROM calendar_events ORDER BY date, time, id",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        self.attach_rsvps(records).await
    }

    /// Events on or after `today` that are not cancelled.
    pub async fn list_upcoming(&self, today: NaiveDate) -> DbResult<Vec<CalendarEvent>> {
        let records = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {} FROM calendar_events WHERE date >= ?1 AND is_cancelled = 0 ORDER BY date, time, id",
            EVENT_COLUMNS
        ))
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        self.attach_rsvps(records).await
    }

    pub async fn update(&self, id: &str, update: &EventUpdate) -> DbResult<CalendarEvent> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {} FROM calendar_events WHERE id = ?1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Event", id))?;

        let title = update.title.clone().unwrap_or(current.title);
        let date = update.date.unwrap_or(current.date);
        let time = update.time.clone().unwrap_or(current.time);
        let location = update.location.clone().unwrap_or(current.location);
        let description = update.description.clone().unwrap_or(current.description);
        let buy_in_cents = update.buy_in.map(|m| m.cents()).unwrap_or(current.buy_in_cents);
        let max_players = update.max_players.unwrap_or(current.max_players);

        sqlx::query(
            r#"
            UPDATE calendar_events
            SET title = ?1, date = ?2, time = ?3, location = ?4, description = ?5,
                buy_in_cents = ?6, max_players = ?7, updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(title)
        .bind(date)
        .bind(time)
        .bind(location)
        .bind(description)
        .bind(buy_in_cents)
        .bind(max_players)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(event_id = %id, "Calendar event updated");
        self.require(id).await
    }

    pub async fn set_cancelled(&self, id: &str, cancelled: bool) -> DbResult<CalendarEvent> {
        let result = sqlx::query(
            "UPDATE calendar_events SET is_cancelled = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(cancelled)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Event", id));
        }

        info!(event_id = %id, cancelled, "Calendar event cancellation changed");
        self.require(id).await
    }

    /// Opens a session for the event, links it and records one buy-in for
    /// every YES RSVP, all in one transaction. Nothing is written when any
    /// step fails.
    ///
    /// An event that is already linked is rejected as a duplicate
    /// `session_id`; a cancelled one is not linkable either.
    pub async fn start_session(
        &self,
        id: &str,
        buy_in: Money,
        chips: &ChipDistribution,
    ) -> DbResult<EventSessionStart> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {} FROM calendar_events WHERE id = ?1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Event", id))?;

        let session = SessionRepository::insert_in(&mut tx, record.date, buy_in, chips).await?;

        let linked = sqlx::query(
            r#"
            UPDATE calendar_events SET session_id = ?1, updated_at = ?2
            WHERE id = ?3 AND session_id IS NULL AND is_cancelled = 0
            "#,
        )
        .bind(&session.id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if linked.rows_affected() == 0 {
            return Err(DbError::duplicate("session_id", id));
        }

        let confirmed: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.player_id FROM event_rsvps r
            JOIN players p ON p.id = r.player_id
            WHERE r.event_id = ?1 AND r.status = 'YES'
            ORDER BY p.name COLLATE NOCASE
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        for player_id in &confirmed {
            EntryRepository::add_buy_ins_in(&mut tx, &session.id, player_id, 1, buy_in).await?;
        }

        tx.commit().await?;

        info!(
            event_id = %id,
            session_id = %session.id,
            seated = confirmed.len(),
            "Session started from calendar event"
        );

        Ok(EventSessionStart {
            event: self.require(id).await?,
            session,
            seated: confirmed,
        })
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Event", id));
        }

        info!(event_id = %id, "Calendar event deleted");
        Ok(())
    }

    /// Creates or replaces a player's answer.
    pub async fn upsert_rsvp(
        &self,
        event_id: &str,
        player_id: &str,
        status: RsvpStatus,
    ) -> DbResult<CalendarEvent> {
        sqlx::query(
            r#"
            INSERT INTO event_rsvps (event_id, player_id, status, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (event_id, player_id)
            DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at
            "#,
        )
        .bind(event_id)
        .bind(player_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(event_id = %event_id, player_id = %player_id, status = %status, "RSVP recorded");
        self.require(event_id).await
    }

    pub async fn delete_rsvp(&self, event_id: &str, player_id: &str) -> DbResult<CalendarEvent> {
        let result = sqlx::query("DELETE FROM event_rsvps WHERE event_id = ?1 AND player_id = ?2")
            .bind(event_id)
            .bind(player_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RSVP", format!("{}/{}", event_id, player_id)));
        }

        self.require(event_id).await
    }

    async fn require(&self, id: &str) -> DbResult<CalendarEvent> {
        self.get(id).await?.ok_or_else(|| DbError::not_found("Event", id))
    }

    async fn rsvps_for(&self, event_id: &str) -> DbResult<Vec<Rsvp>> {
        let records = sqlx::query_as::<_, RsvpRecord>(&format!(
            "{} WHERE r.event_id = ?1 ORDER BY p.name COLLATE NOCASE",
            SELECT_RSVP
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Rsvp::from).collect())
    }

    async fn attach_rsvps(&self, records: Vec<EventRecord>) -> DbResult<Vec<CalendarEvent>> {
        let all = sqlx::query_as::<_, RsvpRecord>(&format!(
            "{} ORDER BY p.name COLLATE NOCASE",
            SELECT_RSVP
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let rsvps = all
                    .iter()
                    .filter(|r| r.event_id == record.id)
                    .cloned()
                    .map(Rsvp::from)
                    .collect();
                record.into_event(rsvps)
            })
            .collect())
    }
}
