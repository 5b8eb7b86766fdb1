//! AI analysis API handlers
//!
//! Both routes burn one AI credit from the caller's monthly allowance.
//! The credit is recorded only after the upstream call succeeds, so a
//! failed analysis costs nothing.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::ai::Analysis;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::usage;
use crate::tiers::limits;
use crate::utils::validation::MAX_SHORT_TEXT_LEN;
use crate::utils::{AppError, AppResult, FieldErrors};
use shared::models::LimitKind;
use shared::util::current_period;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAnalysisRequest {
    pub business_type: String,
    pub location: String,
    pub services: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingAnalysisRequest {
    pub business_type: String,
    pub location: String,
    pub current_rate: f64,
    pub services: Vec<String>,
}

/// POST /api/ai/competitor-analysis - market landscape analysis
pub async fn competitor_analysis(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<CompetitorAnalysisRequest>,
) -> AppResult<Json<Analysis>> {
    validate_context(&payload.business_type, &payload.location, &payload.services)?;
    limits::enforce(&state.pool, &state.tiers, &current_user.id, LimitKind::Ai).await?;

    let analysis = state
        .analysis
        .analyze_competitors(&payload.business_type, &payload.location, &payload.services)
        .await?;

    usage::record_ai_use(&state.pool, &current_user.id, &current_period()).await?;
    Ok(Json(analysis))
}

/// POST /api/ai/pricing-analysis - rate benchmarking
pub async fn pricing_analysis(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<PricingAnalysisRequest>,
) -> AppResult<Json<Analysis>> {
    validate_context(&payload.business_type, &payload.location, &payload.services)?;
    let mut v = FieldErrors::new();
    v.money(payload.current_rate, "currentRate");
    v.finish()?;
    limits::enforce(&state.pool, &state.tiers, &current_user.id, LimitKind::Ai).await?;

    let analysis = state
        .analysis
        .analyze_pricing(
            &payload.business_type,
            &payload.location,
            payload.current_rate,
            &payload.services,
        )
        .await?;

    usage::record_ai_use(&state.pool, &current_user.id, &current_period()).await?;
    Ok(Json(analysis))
}

fn validate_context(business_type: &str, location: &str, services: &[String]) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    v.require_text(business_type, "businessType", MAX_SHORT_TEXT_LEN);
    v.require_text(location, "location", MAX_SHORT_TEXT_LEN);
    v.list(services, "services");
    v.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_validation() {
        assert!(validate_context("plumber", "Leeds", &["boilers".to_string()]).is_ok());
        assert!(validate_context("", "Leeds", &[]).is_err());
    }

    #[test]
    fn test_pricing_request_wire_shape() {
        let payload: PricingAnalysisRequest = serde_json::from_str(
            r#"{"businessType":"electrician","location":"York","currentRate":48.5,"services":["rewires"]}"#,
        )
        .unwrap();
        assert_eq!(payload.current_rate, 48.5);
        assert_eq!(payload.services.len(), 1);
    }
}
