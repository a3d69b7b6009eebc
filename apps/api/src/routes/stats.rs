//! Dashboard and statistics handlers. All of them load sessions and entries
//! and hand them to the pure functions in `pokernight_core::stats`.

use axum::extract::State;
use axum::Json;

use pokernight_core::stats::{self, Dashboard, GamblingOverTime, Leaderboards, StatsSummary};
use pokernight_core::{Entry, Session};

use crate::error::ApiResult;
use crate::state::AppState;

async fn load(state: &AppState) -> ApiResult<(Vec<Session>, Vec<Entry>)> {
    let sessions = state.db.sessions().list().await?;
    let entries = state.db.entries().list_all().await?;
    Ok((sessions, entries))
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    let total_players = state.db.players().count().await?;
    let (sessions, entries) = load(&state).await?;
    Ok(Json(stats::dashboard(total_players, &sessions, &entries)))
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<StatsSummary>> {
    let (sessions, entries) = load(&state).await?;
    Ok(Json(stats::summary(&sessions, &entries)))
}

pub async fn leaderboards(State(state): State<AppState>) -> ApiResult<Json<Leaderboards>> {
    let (sessions, entries) = load(&state).await?;
    Ok(Json(stats::leaderboards(&sessions, &entries)))
}

pub async fn gambling_over_time(
    State(state): State<AppState>,
) -> ApiResult<Json<GamblingOverTime>> {
    let (sessions, entries) = load(&state).await?;
    Ok(Json(stats::gambling_over_time(&sessions, &entries)))
}
