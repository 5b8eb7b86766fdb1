//! Webhook reconciliation
//!
//! The payment provider is the source of truth for subscription life
//! cycle; events delivered here fold that truth back into the local
//! row. Every write is absolute and field-scoped, so redelivered or
//! reordered events settle on the same state. Events for subscriptions
//! we can't match are logged and acknowledged, never retried forever.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use shared::models::{SubscriptionStatus, UserSubscription};
use shared::util::now_millis;

use crate::db::repository::{subscription, user};
use crate::utils::{money, AppResult};

const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify the `Stripe-Signature` header (HMAC-SHA256)
pub fn verify_signature(payload: &[u8], sig_header: &str, secret: &str) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Decode hex signature and use constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

/// Fold one verified event into the local subscription row.
pub async fn apply_event(pool: &SqlitePool, event: &Value) -> AppResult<()> {
    let event_type = event["type"].as_str().unwrap_or("");
    match event_type {
        "customer.subscription.created" | "customer.subscription.updated" => {
            subscription_updated(pool, object(event)).await
        }
        "customer.subscription.deleted" => subscription_deleted(pool, object(event)).await,
        "invoice.payment_succeeded" => payment_succeeded(pool, object(event)).await,
        "invoice.payment_failed" => payment_failed(pool, object(event)).await,
        other => {
            debug!(event_type = other, "Ignoring webhook event");
            Ok(())
        }
    }
}

fn object(event: &Value) -> &Value {
    &event["data"]["object"]
}

/// Map the provider's status vocabulary onto ours. Unknown values
/// (incomplete, paused, ...) read as active rather than knocking a
/// paying user offline.
fn parse_status(raw: &str) -> SubscriptionStatus {
    match raw {
        "past_due" | "unpaid" => SubscriptionStatus::PastDue,
        "canceled" => SubscriptionStatus::Canceled,
        "trialing" => SubscriptionStatus::Trialing,
        _ => SubscriptionStatus::Active,
    }
}

/// Match the event to a local row: the subscription id is
/// authoritative, the customer id covers events that arrive before
/// checkout completion stored the subscription id.
async fn find_subscription(
    pool: &SqlitePool,
    obj: &Value,
    id_field: &str,
) -> AppResult<Option<UserSubscription>> {
    if let Some(sub_id) = obj[id_field].as_str() {
        if let Some(sub) = subscription::find_by_stripe_subscription(pool, sub_id).await? {
            return Ok(Some(sub));
        }
    }
    if let Some(cus_id) = obj["customer"].as_str() {
        if let Some(sub) = subscription::find_by_stripe_customer(pool, cus_id).await? {
            return Ok(Some(sub));
        }
    }
    Ok(None)
}

/// Provider timestamps are seconds; we store milliseconds.
fn period_millis(obj: &Value, field: &str) -> Option<i64> {
    obj[field].as_i64().map(|s| s * 1000)
}

async fn subscription_updated(pool: &SqlitePool, obj: &Value) -> AppResult<()> {
    let Some(local) = find_subscription(pool, obj, "id").await? else {
        warn!(subscription = obj["id"].as_str().unwrap_or("?"), "Webhook for unknown subscription");
        return Ok(());
    };

    let status = parse_status(obj["status"].as_str().unwrap_or(""));
    let cancel_at_period_end = obj["cancel_at_period_end"].as_bool().unwrap_or(false);
    let tier = obj["metadata"]["tier"].as_str();

    subscription::sync_status(
        pool,
        &local.user_id,
        status,
        period_millis(obj, "current_period_start"),
        period_millis(obj, "current_period_end"),
        cancel_at_period_end,
        tier,
    )
    .await?;

    if let Some(tier) = tier {
        if tier != local.tier {
            user::set_tier(pool, &local.user_id, tier).await?;
        }
    }

    info!(user_id = %local.user_id, status = ?status, "Synced subscription from webhook");
    Ok(())
}

async fn subscription_deleted(pool: &SqlitePool, obj: &Value) -> AppResult<()> {
    let Some(local) = find_subscription(pool, obj, "id").await? else {
        warn!(subscription = obj["id"].as_str().unwrap_or("?"), "Webhook for unknown subscription");
        return Ok(());
    };

    subscription::mark_canceled(pool, &local.user_id, now_millis()).await?;
    user::set_tier(pool, &local.user_id, "trial").await?;

    info!(user_id = %local.user_id, "Subscription deleted, user back on trial");
    Ok(())
}

async fn payment_succeeded(pool: &SqlitePool, obj: &Value) -> AppResult<()> {
    let Some(local) = find_subscription(pool, obj, "subscription").await? else {
        warn!(
            subscription = obj["subscription"].as_str().unwrap_or("?"),
            "Payment event for unknown subscription"
        );
        return Ok(());
    };

    let paid_at = obj["status_transitions"]["paid_at"]
        .as_i64()
        .map(|s| s * 1000)
        .unwrap_or_else(now_millis);
    let amount = money::from_minor_units(obj["amount_paid"].as_i64().unwrap_or(0));

    subscription::record_payment(pool, &local.user_id, paid_at, amount).await?;

    info!(user_id = %local.user_id, amount = amount, "Recorded payment");
    Ok(())
}

async fn payment_failed(pool: &SqlitePool, obj: &Value) -> AppResult<()> {
    let Some(local) = find_subscription(pool, obj, "subscription").await? else {
        warn!(
            subscription = obj["subscription"].as_str().unwrap_or("?"),
            "Payment event for unknown subscription"
        );
        return Ok(());
    };

    subscription::set_status(pool, &local.user_id, SubscriptionStatus::PastDue).await?;

    warn!(user_id = %local.user_id, "Payment failed, subscription past due");
    Ok(())
}
