//! # Session Service
//!
//! Session rules that span more than one repository.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create / start_from_event                                              │
//! │        │  chip distribution computed and stored                         │
//! │        ▼                                                                │
//! │   ┌─────────┐   end (results pushed)    ┌─────────┐                    │
//! │   │ ACTIVE  │ ────────────────────────► │  ENDED  │ ──► delete          │
//! │   │         │ ◄──────────────────────── │         │                    │
//! │   └─────────┘        reactivate         └─────────┘                    │
//! │   buy-ins may change                    buy-ins frozen                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use pokernight_core::validation::{
    validate_buy_in_count, validate_optional_text, validate_payout, validate_session_buy_in,
};
use pokernight_core::{
    compute_chip_distribution, CalendarEvent, CoreError, Entry, Money, Session,
    SessionStatus,
};
use pokernight_db::{Database, DbError, SessionCounter};

use crate::error::{ApiError, ApiResult};
use crate::services::notification_service::{NotificationService, PushSender};

/// A session with its entries, as `GET /api/sessions/{id}` returns it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetails {
    pub session_info: Session,
    pub entries: Vec<Entry>,
}

/// Result of turning an event into a session.
#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session: Session,
    pub event: CalendarEvent,
    /// Player ids seated from YES RSVPs.
    pub added_players: Vec<String>,
}

/// Admin changes to a session. Absent fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct SessionAdminUpdate {
    pub buy_in: Option<Money>,
    pub status: Option<SessionStatus>,
    pub wisdom_quote: Option<Option<String>>,
    pub wisdom_player_id: Option<Option<String>>,
}

pub struct SessionService<'a> {
    db: &'a Database,
}

impl<'a> SessionService<'a> {
    pub fn new(db: &'a Database) -> Self {
        SessionService { db }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Fetches a session, storing a fresh chip distribution when none is
    /// stored or the stored one was unreadable.
    pub async fn get(&self, id: &str) -> ApiResult<Session> {
        let mut session = self
            .db
            .sessions()
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", id))?;

        if session.chip_distribution.is_none() {
            let chips = compute_chip_distribution(session.buy_in())?;
            self.db.sessions().set_chip_distribution(id, &chips).await?;
            info!(session_id = %id, total_chips = chips.total_chips(), "Chip distribution recomputed");
            session.total_chips = Some(chips.total_chips());
            session.chip_distribution = Some(chips);
        }

        Ok(session)
    }

    pub async fn details(&self, id: &str) -> ApiResult<SessionDetails> {
        let session = self.get(id).await?;
        let entries = self.db.entries().list_for_session(id).await?;
        Ok(SessionDetails {
            session_info: session,
            entries,
        })
    }

    /// The session, or `InvalidSessionStatus` unless it is ACTIVE.
    pub async fn require_active(&self, id: &str) -> ApiResult<Session> {
        let session = self
            .db
            .sessions()
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", id))?;

        if !session.is_active() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: session.id,
                status: session.status.to_string(),
            }
            .into());
        }

        Ok(session)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn create(&self, date: NaiveDate, buy_in: Money) -> ApiResult<Session> {
        validate_session_buy_in(buy_in)?;
        let chips = compute_chip_distribution(buy_in)?;

        Ok(self.db.sessions().create(date, buy_in, &chips).await?)
    }

    /// Marks the session ENDED and pushes the results. Ending an ended
    /// session changes nothing and sends nothing.
    pub async fn end(&self, id: &str, sender: &dyn PushSender) -> ApiResult<Session> {
        let session = self
            .db
            .sessions()
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", id))?;

        if !session.is_active() {
            return Ok(session);
        }

        let session = self.db.sessions().set_status(id, SessionStatus::Ended).await?;
        info!(session_id = %id, "Session ended");

        // Delivery problems never undo the end.
        if let Err(e) = NotificationService::new(self.db, sender)
            .send_session_results(&session)
            .await
        {
            warn!(session_id = %id, error = %e, "Failed to dispatch session results");
        }

        Ok(session)
    }

    pub async fn reactivate(&self, id: &str) -> ApiResult<Session> {
        let session = self.db.sessions().set_status(id, SessionStatus::Active).await?;
        info!(session_id = %id, "Session reactivated");
        Ok(session)
    }

    /// Deletes an ENDED session and its entries.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let session = self
            .db
            .sessions()
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", id))?;

        if session.is_active() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: session.id,
                status: session.status.to_string(),
            }
            .into());
        }

        self.db.sessions().delete(id).await?;
        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Sets or clears the words of wisdom. A credited player must exist.
    pub async fn set_wisdom(
        &self,
        id: &str,
        quote: Option<&str>,
        player_id: Option<&str>,
    ) -> ApiResult<Session> {
        let quote = validate_optional_text("wisdom_quote", quote)?;
        let player_id = player_id.map(str::trim).filter(|p| !p.is_empty());

        if let Some(player_id) = player_id {
            self.db
                .players()
                .get_by_id(player_id)
                .await?
                .ok_or_else(|| DbError::not_found("Player", player_id))?;
        }

        Ok(self
            .db
            .sessions()
            .set_wisdom(id, quote.as_deref(), player_id)
            .await?)
    }

    /// Applies admin changes in order: buy-in (re-prices entries), wisdom,
    /// then status. Status changes made here never push notifications.
    pub async fn admin_update(&self, id: &str, update: SessionAdminUpdate) -> ApiResult<Session> {
        let mut session = self.get(id).await?;

        if let Some(buy_in) = update.buy_in {
            validate_session_buy_in(buy_in)?;
            let chips = compute_chip_distribution(buy_in)?;
            session = self.db.sessions().update_buy_in(id, buy_in, &chips).await?;
            info!(session_id = %id, buy_in = %buy_in, "Session buy-in changed");
        }

        if update.wisdom_quote.is_some() || update.wisdom_player_id.is_some() {
            let quote = update
                .wisdom_quote
                .unwrap_or_else(|| session.wisdom_quote.clone());
            let player_id = update
                .wisdom_player_id
                .unwrap_or_else(|| session.wisdom_player_id.clone());
            session = self
                .set_wisdom(id, quote.as_deref(), player_id.as_deref())
                .await?;
        }

        if let Some(status) = update.status {
            if status != session.status {
                session = self.db.sessions().set_status(id, status).await?;
            }
        }

        Ok(session)
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Records buy-ins for a player in an ACTIVE session and returns every
    /// entry of the session.
    pub async fn add_buy_ins(
        &self,
        session_id: &str,
        player_id: &str,
        count: i64,
    ) -> ApiResult<Vec<Entry>> {
        validate_buy_in_count(count)?;
        let session = self.require_active(session_id).await?;
        self.db
            .players()
            .get_by_id(player_id)
            .await?
            .ok_or_else(|| DbError::not_found("Player", player_id))?;

        self.db
            .entries()
            .add_buy_ins(session_id, player_id, count, session.buy_in())
            .await?;

        Ok(self.db.entries().list_for_session(session_id).await?)
    }

    /// Takes back one buy-in. The last one removes the player from the
    /// session.
    pub async fn remove_buy_in(&self, session_id: &str, player_id: &str) -> ApiResult<Vec<Entry>> {
        let session = self.require_active(session_id).await?;

        self.db
            .entries()
            .remove_buy_in(session_id, player_id, session.buy_in())
            .await
            .map_err(|e| entry_error(e, session_id, player_id))?;

        Ok(self.db.entries().list_for_session(session_id).await?)
    }

    pub async fn set_payout(
        &self,
        session_id: &str,
        player_id: &str,
        payout: Money,
    ) -> ApiResult<Vec<Entry>> {
        validate_payout(payout)?;

        self.db
            .entries()
            .set_payout(session_id, player_id, payout)
            .await
            .map_err(|e| entry_error(e, session_id, player_id))?;

        Ok(self.db.entries().list_for_session(session_id).await?)
    }

    /// Steps a per-session 7-2 or strike counter by one in either
    /// direction. Counters stop at zero.
    pub async fn adjust_counter(
        &self,
        session_id: &str,
        player_id: &str,
        counter: SessionCounter,
        delta: i64,
    ) -> ApiResult<Vec<Entry>> {
        self.db
            .entries()
            .adjust_counter(session_id, player_id, counter, delta)
            .await
            .map_err(|e| entry_error(e, session_id, player_id))?;

        Ok(self.db.entries().list_for_session(session_id).await?)
    }

    // =========================================================================
    // Calendar
    // =========================================================================

    /// Opens a session for an event and seats everyone who answered YES
    /// with one buy-in each.
    ///
    /// ## Rules
    /// - Cancelled events are refused (`EventCancelled`)
    /// - An event starts at most one session (`EventAlreadyStarted`)
    pub async fn start_from_event(&self, event_id: &str) -> ApiResult<StartedSession> {
        let event = self
            .db
            .events()
            .get(event_id)
            .await?
            .ok_or_else(|| DbError::not_found("Event", event_id))?;

        if event.is_cancelled {
            return Err(CoreError::EventCancelled {
                event_id: event.id,
            }
            .into());
        }
        if let Some(session_id) = event.session_id {
            return Err(CoreError::EventAlreadyStarted {
                event_id: event.id,
                session_id,
            }
            .into());
        }

        let buy_in = event.buy_in();
        validate_session_buy_in(buy_in)?;
        let chips = compute_chip_distribution(buy_in)?;

        let started = self
            .db
            .events()
            .start_session(event_id, buy_in, &chips)
            .await?;

        Ok(StartedSession {
            session: started.session,
            event: started.event,
            added_players: started.seated,
        })
    }
}

/// A missing entry row means the player never bought in.
fn entry_error(err: DbError, session_id: &str, player_id: &str) -> ApiError {
    match err {
        DbError::NotFound { .. } => CoreError::EntryNotFound {
            session_id: session_id.to_string(),
            player_id: player_id.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::notification_service::LogPushSender;
    use pokernight_core::RsvpStatus;
    use pokernight_db::{DbConfig, NewEvent};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_stores_distribution() {
        let db = test_db().await;
        let service = SessionService::new(&db);

        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();
        assert_eq!(session.id, "sid_20240105_1");
        assert_eq!(session.total_chips, Some(67));
        assert_eq!(
            session.chip_distribution.as_ref().and_then(|c| c.count("White")),
            Some(20)
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_buy_in() {
        let db = test_db().await;
        let service = SessionService::new(&db);

        let err = service.create(date(5), Money::zero()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = service
            .create(date(5), Money::from_cents(2003))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_get_recomputes_missing_distribution() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();

        sqlx::query("UPDATE sessions SET chip_distribution = NULL, total_chips = NULL WHERE id = ?1")
            .bind(&session.id)
            .execute(db.pool())
            .await
            .unwrap();

        let fetched = service.get(&session.id).await.unwrap();
        assert_eq!(fetched.total_chips, Some(67));

        let stored = db.sessions().get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.total_chips, Some(67));
    }

    #[tokio::test]
    async fn test_buy_ins_require_active_session() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();
        let (alice, _) = db.players().find_or_create("Alice").await.unwrap();

        let entries = service.add_buy_ins(&session.id, &alice.id, 2).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_buy_in_cents, 4000);

        service.end(&session.id, &LogPushSender).await.unwrap();

        let err = service.add_buy_ins(&session.id, &alice.id, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let err = service.remove_buy_in(&session.id, &alice.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[tokio::test]
    async fn test_remove_without_entry_is_not_found() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();
        let (alice, _) = db.players().find_or_create("Alice").await.unwrap();

        let err = service.remove_buy_in(&session.id, &alice.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_delete_only_ended_sessions() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();

        let err = service.delete(&session.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        service.end(&session.id, &LogPushSender).await.unwrap();
        service.delete(&session.id).await.unwrap();
        assert!(db.sessions().get(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_end_is_idempotent_and_reactivate_reopens() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();

        let ended = service.end(&session.id, &LogPushSender).await.unwrap();
        assert_eq!(ended.status, SessionStatus::Ended);
        let again = service.end(&session.id, &LogPushSender).await.unwrap();
        assert_eq!(again.status, SessionStatus::Ended);

        let reopened = service.reactivate(&session.id).await.unwrap();
        assert!(reopened.is_active());
    }

    #[tokio::test]
    async fn test_admin_update_reprices_entries() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();
        let (alice, _) = db.players().find_or_create("Alice").await.unwrap();
        service.add_buy_ins(&session.id, &alice.id, 2).await.unwrap();

        let updated = service
            .admin_update(
                &session.id,
                SessionAdminUpdate {
                    buy_in: Some(Money::from_cents(4000)),
                    status: Some(SessionStatus::Ended),
                    wisdom_quote: Some(Some("Fold pre".to_string())),
                    wisdom_player_id: Some(Some(alice.id.clone())),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.buy_in_cents, 4000);
        assert_eq!(updated.total_chips, Some(134));
        assert_eq!(updated.status, SessionStatus::Ended);
        assert_eq!(updated.wisdom_quote.as_deref(), Some("Fold pre"));

        let entry = db.entries().get(&session.id, &alice.id).await.unwrap().unwrap();
        assert_eq!(entry.total_buy_in_cents, 8000);
        assert_eq!(entry.profit_cents, -8000);
    }

    #[tokio::test]
    async fn test_wisdom_requires_known_player() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let session = service.create(date(5), Money::from_cents(2000)).await.unwrap();

        let err = service
            .set_wisdom(&session.id, Some("All in"), Some("pid_999"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let cleared = service.set_wisdom(&session.id, None, None).await.unwrap();
        assert!(cleared.wisdom_quote.is_none());
    }

    #[tokio::test]
    async fn test_start_from_event_seats_yes_rsvps() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let event = db
            .events()
            .create(&NewEvent {
                title: "Poker Night".to_string(),
                date: date(12),
                time: Some("19:00".to_string()),
                location: None,
                description: None,
                buy_in: Money::from_cents(2000),
                max_players: None,
            })
            .await
            .unwrap();

        let (alice, _) = db.players().find_or_create("Alice").await.unwrap();
        let (bob, _) = db.players().find_or_create("Bob").await.unwrap();
        let (cara, _) = db.players().find_or_create("Cara").await.unwrap();
        db.events().upsert_rsvp(&event.id, &alice.id, RsvpStatus::Yes).await.unwrap();
        db.events().upsert_rsvp(&event.id, &bob.id, RsvpStatus::No).await.unwrap();
        db.events().upsert_rsvp(&event.id, &cara.id, RsvpStatus::Yes).await.unwrap();

        let started = service.start_from_event(&event.id).await.unwrap();
        assert_eq!(started.session.id, "sid_20240112_1");
        assert_eq!(started.event.session_id.as_deref(), Some("sid_20240112_1"));
        assert_eq!(started.added_players, vec![alice.id.clone(), cara.id.clone()]);

        let entries = db.entries().list_for_session(&started.session.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.buy_in_count == 1));

        let err = service.start_from_event(&event.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_start_from_cancelled_event() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let event = db
            .events()
            .create(&NewEvent {
                title: "Poker Night".to_string(),
                date: date(12),
                time: None,
                location: None,
                description: None,
                buy_in: Money::from_cents(2000),
                max_players: None,
            })
            .await
            .unwrap();
        db.events().set_cancelled(&event.id, true).await.unwrap();

        let err = service.start_from_event(&event.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert!(db.sessions().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_from_event_rolls_back_when_seating_fails() {
        let db = test_db().await;
        let service = SessionService::new(&db);
        let event = db
            .events()
            .create(&NewEvent {
                title: "Poker Night".to_string(),
                date: date(12),
                time: None,
                location: None,
                description: None,
                buy_in: Money::from_cents(2000),
                max_players: None,
            })
            .await
            .unwrap();
        let (alice, _) = db.players().find_or_create("Alice").await.unwrap();
        db.events().upsert_rsvp(&event.id, &alice.id, RsvpStatus::Yes).await.unwrap();

        // Every entry insert fails after the session row and the link are written
        sqlx::query(
            "CREATE TRIGGER refuse_entries BEFORE INSERT ON entries \
             BEGIN SELECT RAISE(ABORT, 'entries refused'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        assert!(service.start_from_event(&event.id).await.is_err());

        let event = db.events().get(&event.id).await.unwrap().unwrap();
        assert!(event.session_id.is_none());
        assert!(db.sessions().list().await.unwrap().is_empty());

        sqlx::query("DROP TRIGGER refuse_entries")
            .execute(db.pool())
            .await
            .unwrap();

        let started = service.start_from_event(&event.id).await.unwrap();
        assert_eq!(started.session.id, "sid_20240112_1");
        assert_eq!(started.added_players, vec![alice.id]);
    }
}
