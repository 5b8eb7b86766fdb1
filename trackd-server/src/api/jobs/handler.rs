//! Job API handlers
//!
//! Creates are gated by the caller's tier quota (jobs per calendar
//! month). `hourlyRate` in payloads is advisory; the repository always
//! recomputes it from revenue / hours.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::job::{self, JobFilter};
use crate::tiers::limits;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN};
use crate::utils::{AppError, AppResult, FieldErrors};
use shared::models::{Job, JobCreate, JobStatus, JobUpdate, LimitKind};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<JobStatus>,
    pub customer_id: Option<i64>,
    /// Inclusive `YYYY-MM-DD` bounds.
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/jobs?status=&customerId=&from=&to= - list the caller's jobs
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Job>>> {
    let filter = JobFilter {
        status: query.status,
        customer_id: query.customer_id,
        from: query.from,
        to: query.to,
    };
    let jobs = job::find_all(&state.pool, &current_user.id, &filter).await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/{id} - single job
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Job>> {
    let j = job::find_by_id(&state.pool, &current_user.id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
    Ok(Json(j))
}

/// POST /api/jobs - create a job (quota-checked)
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<JobCreate>,
) -> AppResult<Json<Job>> {
    validate_create(&payload)?;
    limits::enforce(&state.pool, &state.tiers, &current_user.id, LimitKind::Jobs).await?;
    let j = job::create(&state.pool, &current_user.id, payload).await?;
    Ok(Json(j))
}

/// PUT /api/jobs/{id} - update a job
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<JobUpdate>,
) -> AppResult<Json<Job>> {
    validate_update(&payload)?;
    let j = job::update(&state.pool, &current_user.id, id, payload).await?;
    Ok(Json(j))
}

/// DELETE /api/jobs/{id} - delete a job
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = job::delete(&state.pool, &current_user.id, id).await?;
    Ok(Json(result))
}

fn validate_create(payload: &JobCreate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    v.require_text(&payload.customer_name, "customerName", MAX_NAME_LEN);
    v.require_text(&payload.job_type, "jobType", MAX_NAME_LEN);
    v.money(payload.revenue, "revenue");
    v.optional_money(payload.expenses, "expenses");
    v.hours(payload.hours, "hours");
    v.rating(payload.satisfaction, "satisfaction");
    v.date(&payload.date, "date");
    if let Some(items) = &payload.materials {
        v.list(items, "materials");
    }
    v.optional_text(&payload.notes, "notes", MAX_NOTE_LEN);
    v.finish()
}

fn validate_update(payload: &JobUpdate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    if let Some(name) = &payload.customer_name {
        v.require_text(name, "customerName", MAX_NAME_LEN);
    }
    if let Some(job_type) = &payload.job_type {
        v.require_text(job_type, "jobType", MAX_NAME_LEN);
    }
    v.optional_money(payload.revenue, "revenue");
    v.optional_money(payload.expenses, "expenses");
    if let Some(h) = payload.hours {
        v.hours(h, "hours");
    }
    v.rating(payload.satisfaction, "satisfaction");
    if let Some(date) = &payload.date {
        v.date(date, "date");
    }
    if let Some(items) = &payload.materials {
        v.list(items, "materials");
    }
    v.optional_text(&payload.notes, "notes", MAX_NOTE_LEN);
    v.finish()
}
