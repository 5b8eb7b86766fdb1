//! Insight API handlers
//!
//! Status transitions are one-way (active → completed/dismissed); the
//! repository rejects reopening. The unviewed count drives the client's
//! notification badge.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::insight;
use crate::utils::validation::{MAX_BODY_LEN, MAX_NAME_LEN};
use crate::utils::{AppError, AppResult, FieldErrors};
use shared::models::{Insight, InsightCreate, InsightStatus, InsightUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<InsightStatus>,
}

#[derive(Serialize)]
pub struct UnviewedCount {
    pub count: i64,
}

/// GET /api/insights?status=active - list insights, newest first
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Insight>>> {
    let insights = insight::find_all(&state.pool, &current_user.id, query.status).await?;
    Ok(Json(insights))
}

/// GET /api/insights/unviewed-count - notification badge feed
pub async fn unviewed_count(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<UnviewedCount>> {
    let count = insight::unviewed_count(&state.pool, &current_user.id).await?;
    Ok(Json(UnviewedCount { count }))
}

/// POST /api/insights - record an insight
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<InsightCreate>,
) -> AppResult<Json<Insight>> {
    validate_create(&payload)?;
    let i = insight::create(&state.pool, &current_user.id, payload).await?;
    Ok(Json(i))
}

/// PUT /api/insights/{id} - update text, priority or status
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<InsightUpdate>,
) -> AppResult<Json<Insight>> {
    validate_update(&payload)?;
    let i = insight::update(&state.pool, &current_user.id, id, payload).await?;
    Ok(Json(i))
}

/// POST /api/insights/{id}/view - clear the insight from the badge
pub async fn mark_viewed(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Insight>> {
    insight::mark_viewed(&state.pool, &current_user.id, id).await?;
    let i = insight::find_by_id(&state.pool, &current_user.id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Insight {id} not found")))?;
    Ok(Json(i))
}

/// DELETE /api/insights/{id} - delete an insight
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = insight::delete(&state.pool, &current_user.id, id).await?;
    Ok(Json(result))
}

fn validate_create(payload: &InsightCreate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    v.require_text(&payload.title, "title", MAX_NAME_LEN);
    v.require_text(&payload.body, "body", MAX_BODY_LEN);
    v.finish()
}

fn validate_update(payload: &InsightUpdate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    if let Some(title) = &payload.title {
        v.require_text(title, "title", MAX_NAME_LEN);
    }
    if let Some(body) = &payload.body {
        v.require_text(body, "body", MAX_BODY_LEN);
    }
    v.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::InsightCategory;

    #[test]
    fn test_create_requires_title_and_body() {
        let payload = InsightCreate {
            category: InsightCategory::Pricing,
            title: "".into(),
            body: " ".into(),
            priority: None,
        };
        match validate_create(&payload) {
            Err(AppError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_body_length_cap() {
        let payload = InsightCreate {
            category: InsightCategory::Market,
            title: "Rates trending up".into(),
            body: "x".repeat(MAX_BODY_LEN + 1),
            priority: None,
        };
        assert!(validate_create(&payload).is_err());
    }
}
