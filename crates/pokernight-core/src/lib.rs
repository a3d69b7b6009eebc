//! # pokernight-core: Pure Business Logic for Poker Night
//!
//! This crate is the **heart** of Poker Night. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Poker Night Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    PWA frontend                                 │   │
//! │  │    Sessions ──► Buy-ins ──► Payouts ──► Leaderboards           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    routes, admin auth, session service, push dispatch          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ pokernight-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   chips   │  │   money   │  │   stats   │  │ validation│  │   │
//! │  │   │  ChipSet  │  │   Money   │  │ Leaders   │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                pokernight-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`chips`] - Chip distribution for a buy-in
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Player, Session, Entry, CalendarEvent, ...)
//! - [`stats`] - Player records, leaderboards, dashboard
//! - [`notification`] - Session result summaries for push messages
//! - [`ids`] - `pid_`/`sid_`/`eid_`/`evt_` identifiers
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pokernight_core::chips::compute_chip_distribution;
//! use pokernight_core::money::Money;
//!
//! let buy_in = Money::parse_decimal("33.60").unwrap();
//! let chips = compute_chip_distribution(buy_in).unwrap();
//!
//! assert_eq!(chips.count("Black"), Some(23));
//! assert_eq!(chips.count("White"), Some(20));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod chips;
pub mod error;
pub mod ids;
pub mod money;
pub mod notification;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pokernight_core::Money` instead of
// `use pokernight_core::money::Money`

pub use chips::{compute_chip_distribution, ChipDistribution, ChipSet};
pub use error::{ChipError, CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Most buy-ins recorded in a single action.
pub const MAX_BUY_INS_PER_ACTION: i64 = 100;

/// Largest session buy-in ($10,000.00).
pub const MAX_SESSION_BUY_IN_CENTS: i64 = 1_000_000;

/// Largest payout for one entry ($100,000.00).
pub const MAX_PAYOUT_CENTS: i64 = 10_000_000;

/// Longest player name.
pub const MAX_NAME_LENGTH: usize = 50;

/// Longest free-text field (location, description, words of wisdom).
pub const MAX_TEXT_LENGTH: usize = 500;

pub const MIN_EVENT_PLAYERS: i64 = 2;
pub const MAX_EVENT_PLAYERS: i64 = 50;

pub const DEFAULT_EVENT_TITLE: &str = "Poker Night";

/// Session buy-in used when none is given ($20.00).
pub const DEFAULT_BUY_IN_CENTS: i64 = 2_000;
