//! Player handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use pokernight_core::stats::{player_stats as build_player_stats, player_summaries, PlayerStats};
use pokernight_core::validation::validate_player_name;
use pokernight_core::{Player, PlayerSessionHistory};
use pokernight_db::{Database, DbError};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddPlayerRequest {
    pub name: String,
}

/// `GET /api/players`: lifetime records, best net profit first.
pub async fn list_summaries(State(state): State<AppState>) -> ApiResult<Json<Vec<PlayerStats>>> {
    let players = state.db.players().list().await?;
    let entries = state.db.entries().list_all().await?;
    Ok(Json(player_summaries(&players, &entries)))
}

/// `GET /api/players/details`: raw player rows, by name.
pub async fn list_details(State(state): State<AppState>) -> ApiResult<Json<Vec<Player>>> {
    Ok(Json(state.db.players().list().await?))
}

/// `POST /api/players`: 201 for a new player, 200 when the name (ignoring
/// case) already exists.
pub async fn add_player(
    State(state): State<AppState>,
    Json(body): Json<AddPlayerRequest>,
) -> ApiResult<(StatusCode, Json<PlayerStats>)> {
    let name = validate_player_name(&body.name)?;
    let (player, created) = state.db.players().find_or_create(&name).await?;

    let status = if created {
        info!(player_id = %player.id, name = %player.name, "Player added");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let stats = stats_for(&state.db, player).await?;
    Ok((status, Json(stats)))
}

pub async fn player_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlayerStats>> {
    let player = require_player(&state.db, &id).await?;
    Ok(Json(stats_for(&state.db, player).await?))
}

/// `GET /api/players/{id}/history`: the player's sessions, newest first.
pub async fn player_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<PlayerSessionHistory>>> {
    require_player(&state.db, &id).await?;
    Ok(Json(state.db.entries().history_for_player(&id).await?))
}

pub async fn increment_seven_two_wins(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlayerStats>> {
    let player = state.db.players().adjust_seven_two_wins(&id, 1).await?;
    Ok(Json(stats_for(&state.db, player).await?))
}

/// Never goes below zero.
pub async fn decrement_seven_two_wins(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlayerStats>> {
    let player = state.db.players().adjust_seven_two_wins(&id, -1).await?;
    Ok(Json(stats_for(&state.db, player).await?))
}

pub(crate) async fn require_player(db: &Database, id: &str) -> ApiResult<Player> {
    Ok(db
        .players()
        .get_by_id(id)
        .await?
        .ok_or_else(|| DbError::not_found("Player", id))?)
}

async fn stats_for(db: &Database, player: Player) -> ApiResult<PlayerStats> {
    let entries = db.entries().list_for_player(&player.id).await?;
    Ok(build_player_stats(&player, &entries))
}
