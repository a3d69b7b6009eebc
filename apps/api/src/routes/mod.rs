//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Router                                                                 │
//! │                                                                         │
//! │  /health, /api/config, /api/chip-calculator/{buy_in}     system.rs      │
//! │  /api/players/...                                        players.rs     │
//! │  /api/sessions/...                                       sessions.rs    │
//! │  /api/dashboard, /api/stats/...                          stats.rs       │
//! │  /api/events/...                                         events.rs      │
//! │  /api/notifications/...                                  notifications.rs│
//! │  /api/admin/login                                        admin.rs       │
//! │  /api/admin/* ──► require_admin (bearer JWT) ──►         admin.rs       │
//! │                                                                         │
//! │  Layers: TraceLayer (request spans), CorsLayer (PWA origin)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Path parameters use axum 0.8 `{name}` syntax. Every error body is
//! `{"code": "...", "message": "..."}`.

pub mod admin;
pub mod events;
pub mod notifications;
pub mod players;
pub mod sessions;
pub mod stats;
pub mod system;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::{Deserialize, Deserializer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_admin;
use crate::state::AppState;

/// Builds the complete router.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(system::health))
        .route("/api/config", get(system::public_config))
        .route("/api/chip-calculator/{buy_in}", get(system::chip_calculator))
        // Players
        .route("/api/players", get(players::list_summaries).post(players::add_player))
        .route("/api/players/details", get(players::list_details))
        .route("/api/players/{id}/stats", get(players::player_stats))
        .route("/api/players/{id}/history", get(players::player_history))
        .route("/api/players/{id}/seven-two-wins", put(players::increment_seven_two_wins))
        .route(
            "/api/players/{id}/seven-two-wins/decrement",
            put(players::decrement_seven_two_wins),
        )
        // Sessions
        .route("/api/sessions", get(sessions::list_sessions).post(sessions::create_session))
        .route("/api/sessions/active", get(sessions::list_active_sessions))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/{id}/end", put(sessions::end_session))
        .route("/api/sessions/{id}/reactivate", put(sessions::reactivate_session))
        .route("/api/sessions/{id}/wisdom", put(sessions::set_wisdom))
        .route("/api/sessions/{id}/entries", post(sessions::add_entry))
        .route(
            "/api/sessions/{id}/entries/{player}/remove-buyin",
            put(sessions::remove_buy_in),
        )
        .route("/api/sessions/{id}/entries/{player}/payout", put(sessions::record_payout))
        .route(
            "/api/sessions/{id}/players/{player}/seven-two-wins/{action}",
            put(sessions::adjust_seven_two_wins),
        )
        .route(
            "/api/sessions/{id}/players/{player}/strikes/{action}",
            put(sessions::adjust_strikes),
        )
        // Statistics
        .route("/api/dashboard", get(stats::dashboard))
        .route("/api/stats/summary", get(stats::summary))
        .route("/api/stats/leaderboards", get(stats::leaderboards))
        .route("/api/stats/gambling-over-time", get(stats::gambling_over_time))
        // Calendar
        .route("/api/events", get(events::list_events).post(events::create_event))
        .route(
            "/api/events/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/api/events/{id}/cancel", put(events::cancel_event))
        .route("/api/events/{id}/uncancel", put(events::uncancel_event))
        .route("/api/events/{id}/start-session", post(events::start_session))
        .route("/api/events/{id}/rsvp", post(events::rsvp))
        .route("/api/events/{id}/rsvp/{player}", delete(events::delete_rsvp))
        // Notifications
        .route("/api/notifications/subscribe", post(notifications::subscribe))
        .route("/api/notifications/unsubscribe", post(notifications::unsubscribe))
        .route(
            "/api/notifications/subscriptions/{player}",
            get(notifications::list_subscriptions),
        )
        // Admin login is the only unauthenticated admin route
        .route("/api/admin/login", post(admin::login));

    let protected = Router::new()
        .route("/api/admin/status", get(admin::status))
        .route("/api/admin/players", get(admin::list_players))
        .route(
            "/api/admin/players/{id}",
            put(admin::update_player).delete(admin::delete_player),
        )
        .route("/api/admin/sessions", get(admin::list_sessions))
        .route(
            "/api/admin/sessions/{id}",
            put(admin::update_session).delete(admin::delete_session),
        )
        .route("/api/admin/entries", get(admin::list_entries))
        .route(
            "/api/admin/entries/{id}",
            put(admin::update_entry).delete(admin::delete_entry),
        )
        .route("/api/admin/backup", post(admin::create_backup))
        .route("/api/admin/backups", get(admin::list_backups))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Marks a JSON key as present, keeping `null` as `Some(None)`. Used with
/// `#[serde(default)]` so an absent key stays `None`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
