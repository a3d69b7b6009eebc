//! # Domain Types
//!
//! Core domain types used throughout Poker Night.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Player      │   │     Session     │   │      Entry      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id  pid_007    │   │  id  sid_…_1    │   │  id  eid_0042   │       │
//! │  │  name           │◄──┤  date, status   │◄──┤  session_id     │       │
//! │  │  seven_two_wins │   │  buy_in_cents   │   │  player_id      │       │
//! │  └─────────────────┘   │  chips          │   │  buy_in_count   │       │
//! │                        └─────────────────┘   │  payout, profit │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CalendarEvent  │   │      Rsvp       │   │PushSubscription │       │
//! │  │  id  evt_…_1    │◄──┤  YES/NO/MAYBE   │   │  endpoint, keys │       │
//! │  │  session_id?    │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money fields are integer cents and carry a `_cents` suffix; each type has
//! a `Money`-returning accessor for arithmetic.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::chips::ChipDistribution;
use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Player
// =============================================================================

/// A regular at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    /// `pid_NNN`
    pub id: String,

    pub name: String,

    /// Lifetime count of pots won holding 7-2 offsuit.
    pub seven_two_wins: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle of a poker night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    /// Buy-ins and payouts can still change.
    Active,
    /// Results are final.
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Ended => "ENDED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(SessionStatus::Active),
            "ENDED" => Ok(SessionStatus::Ended),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["ACTIVE".to_string(), "ENDED".to_string()],
            }),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// One poker night.
///
/// ## ID Format
/// `sid_YYYYMMDD_N`, where N counts sessions created for that date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub id: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Price of one buy-in, in cents.
    pub buy_in_cents: i64,

    pub status: SessionStatus,

    /// Chips handed out per buy-in. Computed when the session is created.
    #[ts(type = "Record<string, number> | null")]
    pub chip_distribution: Option<ChipDistribution>,

    pub total_chips: Option<i64>,

    pub wisdom_quote: Option<String>,

    /// Player credited with the quote.
    pub wisdom_player_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    #[inline]
    pub fn buy_in(&self) -> Money {
        Money::from_cents(self.buy_in_cents)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

// =============================================================================
// Entry
// =============================================================================

/// A player's line in a session: buy-ins, payout, counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Entry {
    /// `eid_NNNN`
    pub id: String,

    pub session_id: String,

    pub player_id: String,

    pub player_name: String,

    pub buy_in_count: i64,

    /// `buy_in_count × session buy-in`
    pub total_buy_in_cents: i64,

    pub payout_cents: i64,

    /// `payout - total_buy_in`
    pub profit_cents: i64,

    pub session_seven_two_wins: i64,

    pub session_strikes: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    #[inline]
    pub fn total_buy_in(&self) -> Money {
        Money::from_cents(self.total_buy_in_cents)
    }

    #[inline]
    pub fn payout(&self) -> Money {
        Money::from_cents(self.payout_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    /// Re-derives total buy-in and profit from the count, the session price
    /// and the payout.
    pub fn reprice(&mut self, session_buy_in: Money) {
        let total = session_buy_in * self.buy_in_count;
        self.total_buy_in_cents = total.cents();
        self.profit_cents = (self.payout() - total).cents();
    }
}

/// One row of a player's history: their entry joined with its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerSessionHistory {
    pub session_id: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub status: SessionStatus,

    pub buy_in_count: i64,

    pub total_buy_in_cents: i64,

    pub payout_cents: i64,

    pub profit_cents: i64,

    pub session_seven_two_wins: i64,

    pub session_strikes: i64,
}

// =============================================================================
// Calendar
// =============================================================================

/// A player's answer to an event invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum RsvpStatus {
    Yes,
    No,
    Maybe,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Yes => "YES",
            RsvpStatus::No => "NO",
            RsvpStatus::Maybe => "MAYBE",
        }
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(RsvpStatus::Yes),
            "NO" => Ok(RsvpStatus::No),
            "MAYBE" => Ok(RsvpStatus::Maybe),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["YES".to_string(), "NO".to_string(), "MAYBE".to_string()],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rsvp {
    pub event_id: String,
    pub player_id: String,
    pub player_name: String,
    pub status: RsvpStatus,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A scheduled poker night.
///
/// ## ID Format
/// `evt_YYYYMMDD_N`, numbered per event date like sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalendarEvent {
    pub id: String,

    /// Defaults to "Poker Night".
    pub title: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Start time, `HH:MM`.
    pub time: Option<String>,

    pub location: Option<String>,

    pub description: Option<String>,

    pub buy_in_cents: i64,

    pub max_players: Option<i64>,

    /// Set once the event has been turned into a session.
    pub session_id: Option<String>,

    pub is_cancelled: bool,

    pub rsvps: Vec<Rsvp>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CalendarEvent {
    #[inline]
    pub fn buy_in(&self) -> Money {
        Money::from_cents(self.buy_in_cents)
    }

    /// Players who answered YES.
    pub fn confirmed(&self) -> impl Iterator<Item = &Rsvp> {
        self.rsvps.iter().filter(|r| r.status == RsvpStatus::Yes)
    }

    /// Upcoming means on or after `today` and not cancelled.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        !self.is_cancelled && self.date >= today
    }
}

// =============================================================================
// Push Subscription
// =============================================================================

/// A browser push endpoint registered for a session's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PushSubscription {
    pub id: i64,
    pub player_id: String,
    pub session_id: String,
    pub endpoint: String,
    pub auth: String,
    pub p256dh: String,
    /// Cleared when the push service reports the endpoint gone.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
