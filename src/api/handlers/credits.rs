//! Credit balance endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireSubject;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

#[derive(Debug, Deserialize)]
pub struct DeductRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
}

/// GET /api/credits/{user_id}
pub async fn get_credits(
    State(state): State<AppState>,
    subject: RequireSubject,
    Path(user_id): Path<String>,
) -> Result<Json<CreditsResponse>, ApiError> {
    subject.ensure_owns(&user_id)?;

    let credits = state.ledger.get_balance(&user_id).await?;

    Ok(Json(CreditsResponse { credits }))
}

/// POST /api/credits/{user_id}/deduct
pub async fn deduct_credits(
    State(state): State<AppState>,
    subject: RequireSubject,
    Path(user_id): Path<String>,
    Json(request): Json<DeductRequest>,
) -> Result<Json<CreditsResponse>, ApiError> {
    subject.ensure_owns(&user_id)?;

    let credits = state.ledger.deduct(&user_id, request.amount).await?;

    Ok(Json(CreditsResponse { credits }))
}
