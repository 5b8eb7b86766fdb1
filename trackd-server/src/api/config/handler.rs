//! Tier configuration API handlers
//!
//! Reads go through the cached tier service, so this surface stays up
//! when the remote tier source is down (stale cache, then fallback).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::tiers::limits;
use crate::utils::{AppError, AppResult};
use shared::models::{LimitCheck, LimitKind, TierConfig};

#[derive(Serialize)]
pub struct TiersResponse {
    pub tiers: Vec<TierConfig>,
}

#[derive(Serialize)]
pub struct TierResponse {
    pub tier: TierConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLimitRequest {
    pub user_id: String,
    pub tier_name: String,
    pub limit_type: LimitKind,
}

/// GET /api/config/tiers - full tier catalog
pub async fn tiers(State(state): State<ServerState>) -> AppResult<Json<TiersResponse>> {
    let tiers = state.tiers.get_all_tiers().await;
    Ok(Json(TiersResponse { tiers }))
}

/// GET /api/config/tiers/{tierName} - one tier
pub async fn tier_by_name(
    State(state): State<ServerState>,
    Path(tier_name): Path<String>,
) -> AppResult<Json<TierResponse>> {
    let tier = state
        .tiers
        .get_tier(&tier_name)
        .await
        .ok_or_else(|| AppError::not_found(format!("Tier {tier_name} not found")))?;
    Ok(Json(TierResponse { tier }))
}

/// POST /api/config/check-limit - entitlement check for one quota kind
///
/// Callers can only ask about themselves.
pub async fn check_limit(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<CheckLimitRequest>,
) -> AppResult<Json<LimitCheck>> {
    if payload.user_id != current_user.id {
        return Err(AppError::forbidden("Cannot check limits for another user"));
    }
    let check = limits::check_limit(
        &state.pool,
        &state.tiers,
        &payload.user_id,
        &payload.tier_name,
        payload.limit_type,
    )
    .await?;
    Ok(Json(check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_limit_request_wire_shape() {
        let payload: CheckLimitRequest = serde_json::from_str(
            r#"{"userId":"u1","tierName":"basic","limitType":"ai"}"#,
        )
        .unwrap();
        assert_eq!(payload.user_id, "u1");
        assert_eq!(payload.tier_name, "basic");
        assert_eq!(payload.limit_type, LimitKind::Ai);
    }
}
