//! # Repository Module
//!
//! Database repository implementations for Poker Night.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / service                                                │
//! │       │                                                                 │
//! │       │  db.entries().add_buy_ins(session, player, 2, buy_in)          │
//! │       ▼                                                                 │
//! │  EntryRepository                                                       │
//! │  ├── add_buy_ins(&self, ...)      ← one transaction                    │
//! │  ├── remove_buy_in(&self, ...)                                         │
//! │  └── set_payout(&self, ...)                                            │
//! │       │                                                                 │
//! │       │  SQL via sqlx::query_as::<_, EntryRecord>                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Row structs (`*Record`) derive FromRow and convert into the           │
//! │  pokernight-core domain types before leaving the repository.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`player::PlayerRepository`] - Players and lifetime 7-2 wins
//! - [`session::SessionRepository`] - Sessions, chip distributions, wisdom
//! - [`entry::EntryRepository`] - Buy-ins, payouts, per-session counters
//! - [`event::EventRepository`] - Calendar events and RSVPs
//! - [`subscription::SubscriptionRepository`] - Push subscriptions

pub mod entry;
pub mod event;
pub mod player;
pub mod session;
pub mod subscription;

use chrono::NaiveDate;
use sqlx::{Sqlite, Transaction};

use crate::error::DbResult;
use pokernight_core::ids;

/// Next 1-based ordinal for a dated id (`sid_YYYYMMDD_N`, `evt_YYYYMMDD_N`).
///
/// `table` is always a compile-time table name, never user input.
pub(crate) async fn next_dated_ordinal(
    tx: &mut Transaction<'_, Sqlite>,
    table: &'static str,
    prefix: &str,
    date: NaiveDate,
) -> DbResult<u32> {
    let pattern = format!("{}%", ids::dated_prefix(prefix, date));
    let existing: Vec<String> =
        sqlx::query_scalar(&format!("SELECT id FROM {} WHERE id LIKE ?1", table))
            .bind(pattern)
            .fetch_all(&mut **tx)
            .await?;

    let max = existing
        .iter()
        .filter_map(|id| ids::dated_ordinal(prefix, date, id))
        .max()
        .unwrap_or(0);

    Ok(max + 1)
}
