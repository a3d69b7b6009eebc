//! Push subscription handlers.
//!
//! The subscription body is what the browser's `PushSubscription.toJSON()`
//! produces, wrapped with the player and session it is for:
//!
//! ```json
//! {
//!   "player_id": "pid_001",
//!   "session_id": "sid_20240105_1",
//!   "subscription": {
//!     "endpoint": "https://push.example/abc",
//!     "keys": { "auth": "...", "p256dh": "..." }
//!   }
//! }
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use pokernight_core::validation::validate_push_endpoint;
use pokernight_core::PushSubscription;
use pokernight_db::{DbError, NewSubscription};

use crate::error::ApiResult;
use crate::routes::players::require_player;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
    pub auth: String,
    pub p256dh: String,
}

#[derive(Debug, Deserialize)]
pub struct BrowserSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub player_id: String,
    pub session_id: String,
    pub subscription: BrowserSubscription,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub player_id: String,
    pub session_id: String,
}

/// Registers (or re-activates) the player's endpoint for a session.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> ApiResult<(StatusCode, Json<PushSubscription>)> {
    let BrowserSubscription { endpoint, keys } = body.subscription;
    validate_push_endpoint(&endpoint, &keys.auth, &keys.p256dh)?;

    require_player(&state.db, &body.player_id).await?;
    state
        .db
        .sessions()
        .get(&body.session_id)
        .await?
        .ok_or_else(|| DbError::not_found("Session", &body.session_id))?;

    let subscription = state
        .db
        .subscriptions()
        .subscribe(&NewSubscription {
            player_id: body.player_id,
            session_id: body.session_id,
            endpoint,
            auth: keys.auth,
            p256dh: keys.p256dh,
        })
        .await?;

    info!(
        player_id = %subscription.player_id,
        session_id = %subscription.session_id,
        "Push subscription registered"
    );
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// 404 when the player has no active subscription for the session.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(body): Json<UnsubscribeRequest>,
) -> ApiResult<StatusCode> {
    state
        .db
        .subscriptions()
        .unsubscribe(&body.player_id, &body.session_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> ApiResult<Json<Vec<PushSubscription>>> {
    require_player(&state.db, &player).await?;
    Ok(Json(state.db.subscriptions().list_for_player(&player).await?))
}
