//! Competitor API handlers
//!
//! Creates count against the tier's competitor cap; deactivating a
//! competitor (isActive = false) frees its slot without losing the data.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::competitor;
use crate::tiers::limits;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN};
use crate::utils::{AppError, AppResult, FieldErrors};
use shared::models::{Competitor, CompetitorCreate, CompetitorUpdate, LimitKind};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub active: Option<bool>,
}

/// GET /api/competitors?active=true - list tracked competitors
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Competitor>>> {
    let competitors = competitor::find_all(&state.pool, &current_user.id, query.active).await?;
    Ok(Json(competitors))
}

/// POST /api/competitors - track a new competitor (quota-checked)
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<CompetitorCreate>,
) -> AppResult<Json<Competitor>> {
    validate_create(&payload)?;
    limits::enforce(&state.pool, &state.tiers, &current_user.id, LimitKind::Competitors).await?;
    let c = competitor::create(&state.pool, &current_user.id, payload).await?;
    Ok(Json(c))
}

/// PUT /api/competitors/{id} - update a competitor
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CompetitorUpdate>,
) -> AppResult<Json<Competitor>> {
    validate_update(&payload)?;
    let c = competitor::update(&state.pool, &current_user.id, id, payload).await?;
    Ok(Json(c))
}

/// DELETE /api/competitors/{id} - remove a competitor
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = competitor::delete(&state.pool, &current_user.id, id).await?;
    Ok(Json(result))
}

fn validate_common(
    v: &mut FieldErrors,
    hourly_rate: Option<f64>,
    emergency_rate: Option<f64>,
    rating: Option<f64>,
    review_count: Option<i64>,
    services: &Option<Vec<String>>,
    location: &Option<String>,
    notes: &Option<String>,
) {
    v.optional_money(hourly_rate, "hourlyRate");
    v.optional_money(emergency_rate, "emergencyRate");
    if let Some(r) = rating
        && !(1.0..=5.0).contains(&r)
    {
        v.push("rating", "rating must be between 1 and 5");
    }
    v.optional_non_negative(review_count.map(|c| c as f64), "reviewCount");
    if let Some(items) = services {
        v.list(items, "services");
    }
    v.optional_text(location, "location", MAX_SHORT_TEXT_LEN);
    v.optional_text(notes, "notes", MAX_NOTE_LEN);
}

fn validate_create(payload: &CompetitorCreate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    v.require_text(&payload.name, "name", MAX_NAME_LEN);
    validate_common(
        &mut v,
        payload.hourly_rate,
        payload.emergency_rate,
        payload.rating,
        payload.review_count,
        &payload.services,
        &payload.location,
        &payload.notes,
    );
    v.finish()
}

fn validate_update(payload: &CompetitorUpdate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    if let Some(name) = &payload.name {
        v.require_text(name, "name", MAX_NAME_LEN);
    }
    validate_common(
        &mut v,
        payload.hourly_rate,
        payload.emergency_rate,
        payload.rating,
        payload.review_count,
        &payload.services,
        &payload.location,
        &payload.notes,
    );
    v.finish()
}
