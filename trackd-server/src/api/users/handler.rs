//! User profile API handlers
//!
//! Only `/me` routes: users never address each other by id.

use axum::{Json, extract::State};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN};
use crate::utils::{AppError, AppResult, FieldErrors};
use shared::models::{User, UserUpdate};

/// GET /api/users/me - the caller's profile
pub async fn me(State(state): State<ServerState>, current_user: CurrentUser) -> AppResult<Json<User>> {
    let u = user::find_by_id(&state.pool, &current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", current_user.id)))?;
    Ok(Json(u))
}

/// PUT /api/users/me - update profile fields
pub async fn update_me(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    validate(&payload)?;
    let u = user::update(&state.pool, &current_user.id, payload).await?;
    Ok(Json(u))
}

fn validate(payload: &UserUpdate) -> Result<(), AppError> {
    let mut v = FieldErrors::new();
    v.optional_text(&payload.name, "name", MAX_NAME_LEN);
    v.optional_text(&payload.business_type, "businessType", MAX_SHORT_TEXT_LEN);
    if let Some(items) = &payload.specializations {
        v.list(items, "specializations");
    }
    v.optional_non_negative(payload.target_hourly_rate, "targetHourlyRate");
    v.optional_non_negative(payload.revenue_goal, "revenueGoal");
    v.optional_non_negative(payload.hours_goal, "hoursGoal");
    if let Some(currency) = &payload.preferred_currency
        && !matches!(currency.as_str(), "GBP" | "USD" | "EUR")
    {
        v.push("preferredCurrency", "preferredCurrency must be GBP, USD or EUR");
    }
    v.finish()
}
