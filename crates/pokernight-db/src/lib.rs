//! # pokernight-db: Database Layer for Poker Night
//!
//! SQLite storage for players, sessions, entries, calendar events and push
//! subscriptions, accessed asynchronously through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Poker Night Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /api/sessions/{id}/entries)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   pokernight-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ PlayerRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SessionRepo   │    │ 001_init.sql │  │   │
//! │  │   │               │    │ EntryRepo     │    │ 002_...      │  │   │
//! │  │   │               │    │ EventRepo     │    │ 003_...      │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                   data/pokernight.db                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`backup`] - `VACUUM INTO` snapshots
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pokernight_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("data/pokernight.db")).await?;
//!
//! let (alice, _) = db.players().find_or_create("Alice").await?;
//! let sessions = db.sessions().list_active().await?;
//! ```
//!
//! Repositories store what they are given. Business rules (session must be
//! active, buy-in limits, chip math) are enforced by the caller.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::entry::{EntryRepository, SessionCounter};
pub use repository::event::{EventRepository, EventSessionStart, EventUpdate, NewEvent};
pub use repository::player::PlayerRepository;
pub use repository::session::SessionRepository;
pub use repository::subscription::{NewSubscription, SubscriptionRepository};
