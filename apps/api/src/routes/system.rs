//! Health, public config and the chip calculator.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use pokernight_core::{compute_chip_distribution, ChipDistribution, Money};

use crate::config::PublicConfig;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: String,
}

/// `GET /health`: 200 while the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: state.config.app_version.clone(),
        }),
    )
}

pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(state.config.public())
}

#[derive(Debug, Serialize)]
pub struct ChipCalculation {
    /// Echo of the requested amount in dollars.
    pub buy_in: f64,
    pub buy_in_cents: i64,
    pub chip_distribution: ChipDistribution,
    pub total_chips: i64,
}

/// `GET /api/chip-calculator/{buy_in}` with the buy-in in dollars, e.g.
/// `/api/chip-calculator/33.60`.
pub async fn chip_calculator(Path(buy_in): Path<String>) -> ApiResult<Json<ChipCalculation>> {
    let amount = Money::parse_decimal(&buy_in)?;
    let chip_distribution = compute_chip_distribution(amount)?;

    Ok(Json(ChipCalculation {
        buy_in: amount.as_major_f64(),
        buy_in_cents: amount.cents(),
        total_chips: chip_distribution.total_chips(),
        chip_distribution,
    }))
}
