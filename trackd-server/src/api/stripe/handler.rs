//! Billing API handlers
//!
//! Thin layer over [`BillingService`]: identity scoping and payload
//! shapes live here, provider logic lives there. The webhook handler
//! takes the raw body because signature verification needs the exact
//! bytes that were signed.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::auth::CurrentUser;
use crate::billing::{webhook, CheckoutOutcome};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::{AppError, AppResult};
use shared::models::{BillingCycle, UserSubscription};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub tier: String,
    pub billing_cycle: Option<BillingCycle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSuccessRequest {
    pub session_id: String,
}

/// POST /api/stripe/create-checkout-session - start or retarget a subscription
pub async fn create_checkout_session(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutOutcome>> {
    let u = user::find_by_id(&state.pool, &current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", current_user.id)))?;
    let cycle = payload.billing_cycle.unwrap_or(BillingCycle::Monthly);
    let outcome = state
        .billing
        .create_checkout(&state.pool, &u, &payload.tier, cycle)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/stripe/checkout-success - reconcile after the hosted checkout
pub async fn checkout_success(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<CheckoutSuccessRequest>,
) -> AppResult<Json<UserSubscription>> {
    let sub = state
        .billing
        .complete_checkout(&state.pool, &current_user.id, &payload.session_id)
        .await?;
    Ok(Json(sub))
}

/// POST /api/stripe/cancel-subscription - lapse at period end
pub async fn cancel_subscription(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserSubscription>> {
    let sub = state
        .billing
        .cancel_subscription(&state.pool, &current_user.id)
        .await?;
    Ok(Json(sub))
}

/// POST /api/stripe/reactivate-subscription - undo a pending cancellation
pub async fn reactivate_subscription(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserSubscription>> {
    let sub = state
        .billing
        .reactivate_subscription(&state.pool, &current_user.id)
        .await?;
    Ok(Json(sub))
}

/// GET /api/stripe/subscription/{userId} - the caller's subscription record
pub async fn get_subscription(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<Option<UserSubscription>>> {
    if user_id != current_user.id {
        return Err(AppError::forbidden("Cannot read another user's subscription"));
    }
    let sub = state.billing.get_subscription(&state.pool, &user_id).await?;
    Ok(Json(sub))
}

/// POST /api/stripe/webhook - provider events (raw body, signature-verified)
///
/// Bad signatures are rejected before any state change. Events for
/// unknown users are acknowledged so the provider stops retrying them.
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if state.billing.is_stubbed() {
        debug!("Billing stubbed, webhook ignored");
        return StatusCode::OK;
    }

    let Some(secret) = state.config.stripe_webhook_secret.as_deref() else {
        warn!("Webhook received but STRIPE_WEBHOOK_SECRET is not configured");
        return StatusCode::BAD_REQUEST;
    };

    let sig_header = match headers.get("stripe-signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            warn!("Missing Stripe-Signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    if let Err(e) = webhook::verify_signature(&body, sig_header, secret) {
        warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    info!(event_type = event_type, "Received billing webhook");

    match state.billing.apply_webhook_event(&state.pool, &event).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!(%e, event_type = event_type, "Failed to apply webhook event");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
