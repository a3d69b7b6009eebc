//! Session and entry handlers.
//!
//! Entry mutations answer with every entry of the session so the table view
//! can redraw in one round trip.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use pokernight_core::validation::validate_date;
use pokernight_core::{Entry, Money, Session, ValidationError, DEFAULT_BUY_IN_CENTS};
use pokernight_db::SessionCounter;

use crate::error::ApiResult;
use crate::services::{SessionDetails, SessionService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Defaults to $20.00.
    pub buy_in_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WisdomRequest {
    pub wisdom_quote: Option<String>,
    pub player_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    pub player_id: String,
    /// Defaults to one buy-in.
    pub num_buy_ins: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PayoutRequest {
    pub payout_cents: i64,
}

pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<Vec<Session>>> {
    Ok(Json(state.db.sessions().list().await?))
}

pub async fn list_active_sessions(State(state): State<AppState>) -> ApiResult<Json<Vec<Session>>> {
    Ok(Json(state.db.sessions().list_active().await?))
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let date = validate_date(&body.date)?;
    let buy_in = Money::from_cents(body.buy_in_cents.unwrap_or(DEFAULT_BUY_IN_CENTS));

    let session = SessionService::new(&state.db).create(date, buy_in).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionDetails>> {
    Ok(Json(SessionService::new(&state.db).details(&id).await?))
}

/// Ends the session and pushes results to its subscribers.
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    let session = SessionService::new(&state.db)
        .end(&id, state.push.as_ref())
        .await?;
    Ok(Json(session))
}

pub async fn reactivate_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(SessionService::new(&state.db).reactivate(&id).await?))
}

/// Only ended sessions can be deleted.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    SessionService::new(&state.db).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_wisdom(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<WisdomRequest>,
) -> ApiResult<Json<Session>> {
    let session = SessionService::new(&state.db)
        .set_wisdom(&id, body.wisdom_quote.as_deref(), body.player_id.as_deref())
        .await?;
    Ok(Json(session))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddEntryRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Entry>>)> {
    let entries = SessionService::new(&state.db)
        .add_buy_ins(&id, &body.player_id, body.num_buy_ins.unwrap_or(1))
        .await?;
    Ok((StatusCode::CREATED, Json(entries)))
}

pub async fn remove_buy_in(
    State(state): State<AppState>,
    Path((id, player)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Entry>>> {
    Ok(Json(
        SessionService::new(&state.db)
            .remove_buy_in(&id, &player)
            .await?,
    ))
}

pub async fn record_payout(
    State(state): State<AppState>,
    Path((id, player)): Path<(String, String)>,
    Json(body): Json<PayoutRequest>,
) -> ApiResult<Json<Vec<Entry>>> {
    let entries = SessionService::new(&state.db)
        .set_payout(&id, &player, Money::from_cents(body.payout_cents))
        .await?;
    Ok(Json(entries))
}

pub async fn adjust_seven_two_wins(
    State(state): State<AppState>,
    Path((id, player, action)): Path<(String, String, String)>,
) -> ApiResult<Json<Vec<Entry>>> {
    adjust(&state, &id, &player, SessionCounter::SevenTwoWins, &action).await
}

pub async fn adjust_strikes(
    State(state): State<AppState>,
    Path((id, player, action)): Path<(String, String, String)>,
) -> ApiResult<Json<Vec<Entry>>> {
    adjust(&state, &id, &player, SessionCounter::Strikes, &action).await
}

async fn adjust(
    state: &AppState,
    session_id: &str,
    player_id: &str,
    counter: SessionCounter,
    action: &str,
) -> ApiResult<Json<Vec<Entry>>> {
    let delta = counter_delta(action)?;
    let entries = SessionService::new(&state.db)
        .adjust_counter(session_id, player_id, counter, delta)
        .await?;
    Ok(Json(entries))
}

fn counter_delta(action: &str) -> Result<i64, ValidationError> {
    match action {
        "increment" => Ok(1),
        "decrement" => Ok(-1),
        _ => Err(ValidationError::NotAllowed {
            field: "action".to_string(),
            allowed: vec!["increment".to_string(), "decrement".to_string()],
        }),
    }
}
