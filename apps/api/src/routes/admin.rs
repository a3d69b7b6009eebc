//! Admin handlers.
//!
//! Everything except `login` sits behind [`crate::auth::require_admin`].
//! Admin edits bypass the session-status rules the public routes enforce:
//! an admin may delete an active session or correct an ended one.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pokernight_core::stats;
use pokernight_core::validation::{validate_buy_in_count, validate_payout, validate_player_name};
use pokernight_core::{Entry, Money, Player, Session, SessionStatus, ValidationError};
use pokernight_db::backup::{self, BackupInfo};
use pokernight_db::migrations::{migration_status, MigrationStatus};
use pokernight_db::DbError;

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::routes::players::require_player;
use crate::services::{SessionAdminUpdate, SessionService};
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Exchanges the admin password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let Some(hash) = state.config.admin_password_hash.as_deref() else {
        return Err(ApiError::new(
            ErrorCode::AdminDisabled,
            "Admin login is not configured",
        ));
    };

    if !verify_password(&body.password, hash) {
        warn!("Rejected admin login");
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let token = state.jwt.generate_token()?;
    info!("Admin logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
    }))
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DatabaseStats {
    pub players: i64,
    pub sessions: i64,
    pub entries: i64,
    pub active_sessions: i64,
    pub migrations: MigrationStatus,
}

#[derive(Debug, Serialize)]
pub struct FinancialStats {
    pub total_buy_ins_cents: i64,
    pub total_payouts_cents: i64,
    /// Payouts minus buy-ins; non-zero means the books don't balance.
    pub net_difference_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub database_path: String,
    pub debug_mode: bool,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub database_stats: DatabaseStats,
    pub financial_stats: FinancialStats,
    pub system_info: SystemInfo,
}

pub async fn status(State(state): State<AppState>) -> ApiResult<Json<AdminStatus>> {
    let sessions = state.db.sessions().list().await?;
    let entries = state.db.entries().list_all().await?;
    let summary = stats::summary(&sessions, &entries);

    Ok(Json(AdminStatus {
        database_stats: DatabaseStats {
            players: state.db.players().count().await?,
            sessions: sessions.len() as i64,
            entries: entries.len() as i64,
            active_sessions: sessions.iter().filter(|s| s.is_active()).count() as i64,
            migrations: migration_status(state.db.pool()).await?,
        },
        financial_stats: FinancialStats {
            total_buy_ins_cents: summary.total_buy_ins_cents,
            total_payouts_cents: summary.total_payouts_cents,
            net_difference_cents: summary.house_loss_cents,
        },
        system_info: SystemInfo {
            database_path: state.config.database_path.display().to_string(),
            debug_mode: state.config.debug,
            version: state.config.app_version.clone(),
        },
    }))
}

// =============================================================================
// Players
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdatePlayerRequest {
    pub name: Option<String>,
    pub seven_two_wins: Option<i64>,
}

pub async fn list_players(State(state): State<AppState>) -> ApiResult<Json<Vec<Player>>> {
    Ok(Json(state.db.players().list().await?))
}

pub async fn update_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePlayerRequest>,
) -> ApiResult<Json<Player>> {
    let mut player = require_player(&state.db, &id).await?;

    if let Some(name) = body.name.as_deref() {
        let name = validate_player_name(name)?;
        if name != player.name {
            player = state.db.players().rename(&id, &name).await?;
        }
    }

    if let Some(wins) = body.seven_two_wins {
        let delta = non_negative("seven_two_wins", wins)? - player.seven_two_wins;
        if delta != 0 {
            player = state.db.players().adjust_seven_two_wins(&id, delta).await?;
        }
    }

    info!(player_id = %id, "Admin updated player");
    Ok(Json(player))
}

/// Removes the player with their entries, RSVPs and subscriptions.
pub async fn delete_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.players().delete(&id).await?;
    info!(player_id = %id, "Admin deleted player");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub buy_in_cents: Option<i64>,
    /// ACTIVE or ENDED.
    pub status: Option<String>,
    #[serde(default, deserialize_with = "super::present")]
    pub wisdom_quote: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::present")]
    pub wisdom_player_id: Option<Option<String>>,
}

pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<Vec<Session>>> {
    Ok(Json(state.db.sessions().list().await?))
}

pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateSessionRequest>,
) -> ApiResult<Json<Session>> {
    let status = body
        .status
        .as_deref()
        .map(str::parse::<SessionStatus>)
        .transpose()?;

    let session = SessionService::new(&state.db)
        .admin_update(
            &id,
            SessionAdminUpdate {
                buy_in: body.buy_in_cents.map(Money::from_cents),
                status,
                wisdom_quote: body.wisdom_quote,
                wisdom_player_id: body.wisdom_player_id,
            },
        )
        .await?;

    info!(session_id = %id, "Admin updated session");
    Ok(Json(session))
}

/// Deletes a session in any state, with its entries.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.sessions().delete(&id).await?;
    info!(session_id = %id, "Admin deleted session");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Entries
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub buy_in_count: Option<i64>,
    pub payout_cents: Option<i64>,
    pub session_seven_two_wins: Option<i64>,
    pub session_strikes: Option<i64>,
}

pub async fn list_entries(State(state): State<AppState>) -> ApiResult<Json<Vec<Entry>>> {
    Ok(Json(state.db.entries().list_all().await?))
}

/// Corrects an entry. Omitted fields keep their value; totals and profit are
/// re-derived from the session buy-in.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEntryRequest>,
) -> ApiResult<Json<Entry>> {
    let current = state
        .db
        .entries()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Entry", &id))?;

    let buy_in_count = body.buy_in_count.unwrap_or(current.buy_in_count);
    validate_buy_in_count(buy_in_count)?;

    let payout = body
        .payout_cents
        .map(Money::from_cents)
        .unwrap_or_else(|| current.payout());
    validate_payout(payout)?;

    let seven_two_wins = non_negative(
        "session_seven_two_wins",
        body.session_seven_two_wins.unwrap_or(current.session_seven_two_wins),
    )?;
    let strikes = non_negative(
        "session_strikes",
        body.session_strikes.unwrap_or(current.session_strikes),
    )?;

    let entry = state
        .db
        .entries()
        .update(&id, buy_in_count, payout, seven_two_wins, strikes)
        .await?;

    info!(entry_id = %id, "Admin updated entry");
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.entries().delete(&id).await?;
    info!(entry_id = %id, "Admin deleted entry");
    Ok(StatusCode::NO_CONTENT)
}

fn non_negative(field: &str, value: i64) -> Result<i64, ValidationError> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(value)
}

// =============================================================================
// Backups
// =============================================================================

pub async fn create_backup(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<BackupInfo>)> {
    let info = backup::create_backup(state.db.pool(), &state.config.backup_dir).await?;
    info!(file = %info.file_name, size_bytes = info.size_bytes, "Backup created");
    Ok((StatusCode::CREATED, Json(info)))
}

/// Newest first.
pub async fn list_backups(State(state): State<AppState>) -> ApiResult<Json<Vec<BackupInfo>>> {
    Ok(Json(backup::list_backups(&state.config.backup_dir).await?))
}
