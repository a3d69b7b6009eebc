//! # Poker Night API
//!
//! JSON-over-HTTP server for the Poker Night web app.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Poker Night API                                 │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  routes        │  │  services      │  │  auth                      ││
//! │  │                │  │                │  │                            ││
//! │  │ • players      │  │ • SessionSvc   │  │ • argon2 password check    ││
//! │  │ • sessions     │─►│ • Notification │  │ • JWT admin tokens         ││
//! │  │ • events       │  │   dispatch     │  │ • require_admin middleware ││
//! │  │ • stats, admin │  │                │  │                            ││
//! │  └───────┬────────┘  └───────┬────────┘  └────────────────────────────┘│
//! │          │                   │                                          │
//! │          ▼                   ▼                                          │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  pokernight-db (SQLite repositories) + pokernight-core (rules)   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the `POKERNIGHT_*` environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use state::AppState;
