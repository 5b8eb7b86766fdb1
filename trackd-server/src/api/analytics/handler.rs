//! Analytics API handlers
//!
//! Thin wrappers: all aggregation lives in [`crate::analytics`].

use axum::{Json, extract::State};
use chrono::Utc;

use crate::analytics;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/analytics/dashboard - headline revenue/hours/jobs metrics
pub async fn dashboard(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<analytics::DashboardMetrics>> {
    let metrics = analytics::dashboard_metrics(&state.pool, &current_user.id).await?;
    Ok(Json(metrics))
}

/// GET /api/analytics/efficiency - realized rate per job type
pub async fn efficiency(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<analytics::EfficiencyEntry>>> {
    let entries = analytics::efficiency_matrix(&state.pool, &current_user.id).await?;
    Ok(Json(entries))
}

/// GET /api/analytics/customer-ranking - customers by lifetime value
pub async fn customer_ranking(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<analytics::CustomerValue>>> {
    let ranking = analytics::customer_value_ranking(&state.pool, &current_user.id).await?;
    Ok(Json(ranking))
}

/// GET /api/analytics/seasonal-trends - monthly buckets, trailing year
pub async fn seasonal_trends(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<analytics::SeasonalTrend>>> {
    let trends =
        analytics::seasonal_trends(&state.pool, &current_user.id, Utc::now().date_naive()).await?;
    Ok(Json(trends))
}

/// GET /api/analytics/competitor-comparison - own rate vs each rival
pub async fn competitor_comparison(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<analytics::CompetitorComparison>>> {
    let comparison = analytics::competitor_comparison(&state.pool, &current_user.id).await?;
    Ok(Json(comparison))
}
