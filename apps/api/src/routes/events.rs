//! Calendar and RSVP handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::Deserialize;
use tracing::info;

use pokernight_core::validation::{
    validate_date, validate_event_title, validate_max_players, validate_optional_text,
    validate_session_buy_in, validate_time,
};
use pokernight_core::{CalendarEvent, Money, RsvpStatus, DEFAULT_BUY_IN_CENTS};
use pokernight_db::{DbError, EventUpdate, NewEvent};

use crate::error::ApiResult;
use crate::routes::players::require_player;
use crate::services::{SessionService, StartedSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Only future, non-cancelled events.
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub date: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub buy_in_cents: Option<i64>,
    pub max_players: Option<i64>,
}

/// Partial update. For the optional fields an explicit `null` clears the
/// value and an absent key leaves it alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(default, deserialize_with = "super::present")]
    pub time: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::present")]
    pub description: Option<Option<String>>,
    pub buy_in_cents: Option<i64>,
    #[serde(default, deserialize_with = "super::present")]
    pub max_players: Option<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub player_id: String,
    /// YES, NO or MAYBE (any case).
    pub status: String,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> ApiResult<Json<Vec<CalendarEvent>>> {
    let events = if query.upcoming {
        state
            .db
            .events()
            .list_upcoming(Local::now().date_naive())
            .await?
    } else {
        state.db.events().list().await?
    };
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<CalendarEvent>)> {
    let buy_in = Money::from_cents(body.buy_in_cents.unwrap_or(DEFAULT_BUY_IN_CENTS));
    validate_session_buy_in(buy_in)?;
    validate_max_players(body.max_players)?;

    let new_event = NewEvent {
        title: validate_event_title(body.title.as_deref())?,
        date: validate_date(&body.date)?,
        time: validate_time(body.time.as_deref())?,
        location: validate_optional_text("location", body.location.as_deref())?,
        description: validate_optional_text("description", body.description.as_deref())?,
        buy_in,
        max_players: body.max_players,
    };

    let event = state.db.events().create(&new_event).await?;
    info!(event_id = %event.id, date = %event.date, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CalendarEvent>> {
    Ok(Json(require_event(&state, &id).await?))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEventRequest>,
) -> ApiResult<Json<CalendarEvent>> {
    let buy_in = body.buy_in_cents.map(Money::from_cents);
    if let Some(buy_in) = buy_in {
        validate_session_buy_in(buy_in)?;
    }
    if let Some(max_players) = body.max_players {
        validate_max_players(max_players)?;
    }

    let update = EventUpdate {
        title: match body.title.as_deref() {
            Some(title) => Some(validate_event_title(Some(title))?),
            None => None,
        },
        date: body.date.as_deref().map(validate_date).transpose()?,
        time: body
            .time
            .map(|t| validate_time(t.as_deref()))
            .transpose()?,
        location: body
            .location
            .map(|l| validate_optional_text("location", l.as_deref()))
            .transpose()?,
        description: body
            .description
            .map(|d| validate_optional_text("description", d.as_deref()))
            .transpose()?,
        buy_in,
        max_players: body.max_players,
    };

    Ok(Json(state.db.events().update(&id, &update).await?))
}

pub async fn cancel_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CalendarEvent>> {
    let event = state.db.events().set_cancelled(&id, true).await?;
    info!(event_id = %id, "Event cancelled");
    Ok(Json(event))
}

pub async fn uncancel_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CalendarEvent>> {
    Ok(Json(state.db.events().set_cancelled(&id, false).await?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.events().delete(&id).await?;
    info!(event_id = %id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/events/{id}/start-session`: 201 with the session, the linked
/// event and the seated player ids.
pub async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<StartedSession>)> {
    let started = SessionService::new(&state.db).start_from_event(&id).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

/// Creates or replaces a player's answer and returns the whole event.
pub async fn rsvp(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RsvpRequest>,
) -> ApiResult<Json<CalendarEvent>> {
    let status: RsvpStatus = body.status.parse()?;
    require_event(&state, &id).await?;
    require_player(&state.db, &body.player_id).await?;

    let event = state
        .db
        .events()
        .upsert_rsvp(&id, &body.player_id, status)
        .await?;
    Ok(Json(event))
}

pub async fn delete_rsvp(
    State(state): State<AppState>,
    Path((id, player)): Path<(String, String)>,
) -> ApiResult<Json<CalendarEvent>> {
    Ok(Json(state.db.events().delete_rsvp(&id, &player).await?))
}

async fn require_event(state: &AppState, id: &str) -> ApiResult<CalendarEvent> {
    Ok(state
        .db
        .events()
        .get(id)
        .await?
        .ok_or_else(|| DbError::not_found("Event", id))?)
}
