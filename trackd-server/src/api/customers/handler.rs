//! Customer API handlers
//!
//! The aggregate columns (totalJobs, totalRevenue, averageJobValue,
//! lastJobDate) are maintained by the job repository; they are never
//! writable through this surface.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::customer;
use crate::utils::validation::{MAX_ADDRESS_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN};
use crate::utils::{AppError, AppResult, FieldErrors};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/customers - list the caller's customers
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = customer::find_all(&state.pool, &current_user.id).await?;
    Ok(Json(customers))
}

/// GET /api/customers/search?q=xxx - name/phone/email substring match
pub async fn search(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = customer::search(&state.pool, &current_user.id, &query.q).await?;
    Ok(Json(customers))
}

/// GET /api/customers/{id} - single customer
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Customer>> {
    let c = customer::find_by_id(&state.pool, &current_user.id, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {id} not found")))?;
    Ok(Json(c))
}

/// POST /api/customers - create a customer
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<Json<Customer>> {
    validate_create(&payload)?;
    let c = customer::create(&state.pool, &current_user.id, payload).await?;
    Ok(Json(c))
}

/// PUT /api/customers/{id} - update a customer
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    validate_update(&payload)?;
    let c = customer::update(&state.pool, &current_user.id, id, payload).await?;
    Ok(Json(c))
}

/// DELETE /api/customers/{id} - delete a customer
///
/// Linked jobs survive with their denormalized customer name.
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = customer::delete(&state.pool, &current_user.id, id).await?;
    Ok(Json(result))
}

fn validate_contact(v: &mut FieldErrors, phone: &Option<String>, email: &Option<String>, address: &Option<String>, notes: &Option<String>) {
    v.optional_text(phone, "phone", MAX_SHORT_TEXT_LEN);
    v.optional_text(email, "email", MAX_EMAIL_LEN);
    v.optional_text(address, "address", MAX_ADDRESS_LEN);
    v.optional_text(notes, "notes", MAX_NOTE_LEN);
}

fn validate_create(payload: &CustomerCreate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    v.require_text(&payload.name, "name", MAX_NAME_LEN);
    validate_contact(&mut v, &payload.phone, &payload.email, &payload.address, &payload.notes);
    if let Some(items) = &payload.preferred_services {
        v.list(items, "preferredServices");
    }
    v.finish()
}

fn validate_update(payload: &CustomerUpdate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    if let Some(name) = &payload.name {
        v.require_text(name, "name", MAX_NAME_LEN);
    }
    validate_contact(&mut v, &payload.phone, &payload.email, &payload.address, &payload.notes);
    if let Some(score) = payload.satisfaction_score
        && !(1.0..=5.0).contains(&score)
    {
        v.push("satisfactionScore", "satisfactionScore must be between 1 and 5");
    }
    if let Some(items) = &payload.preferred_services {
        v.list(items, "preferredServices");
    }
    v.finish()
}
