//! Subscription Repository
//!
//! Two writers share this table: the billing API (checkout, cancel,
//! reactivate) and the webhook reconciler. Every function below updates
//! only the fields its event owns, so one writer never blanks out what
//! the other just set.

use sqlx::SqlitePool;

use shared::models::{BillingCycle, SubscriptionStatus, UserSubscription};
use shared::util::now_millis;

use super::{RepoError, RepoResult};

const SUBSCRIPTION_SELECT: &str = "SELECT user_id, stripe_customer_id, stripe_subscription_id, tier, status, billing_cycle, monthly_price, currency, current_period_start, current_period_end, cancel_at_period_end, canceled_at, last_payment_date, last_payment_amount, created_at, updated_at FROM user_subscriptions";

pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> RepoResult<Option<UserSubscription>> {
    let sql = format!("{SUBSCRIPTION_SELECT} WHERE user_id = ?");
    let row = sqlx::query_as::<_, UserSubscription>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_stripe_subscription(
    pool: &SqlitePool,
    stripe_subscription_id: &str,
) -> RepoResult<Option<UserSubscription>> {
    let sql = format!("{SUBSCRIPTION_SELECT} WHERE stripe_subscription_id = ?");
    let row = sqlx::query_as::<_, UserSubscription>(&sql)
        .bind(stripe_subscription_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_stripe_customer(
    pool: &SqlitePool,
    stripe_customer_id: &str,
) -> RepoResult<Option<UserSubscription>> {
    let sql = format!("{SUBSCRIPTION_SELECT} WHERE stripe_customer_id = ?");
    let row = sqlx::query_as::<_, UserSubscription>(&sql)
        .bind(stripe_customer_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Create the row lazily with trial defaults; a no-op when it exists.
pub async fn ensure(pool: &SqlitePool, user_id: &str, currency: &str) -> RepoResult<UserSubscription> {
    let now = now_millis();
    sqlx::query(
        "INSERT OR IGNORE INTO user_subscriptions (user_id, currency, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    )
    .bind(user_id)
    .bind(currency)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_user(pool, user_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to ensure subscription".into()))
}

/// Remember the remote customer id so repeat checkouts reuse it.
pub async fn set_stripe_customer(
    pool: &SqlitePool,
    user_id: &str,
    stripe_customer_id: &str,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE user_subscriptions SET stripe_customer_id = ?1, updated_at = ?2 WHERE user_id = ?3",
    )
    .bind(stripe_customer_id)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Completed checkout: the one writer allowed to set every billing field.
#[allow(clippy::too_many_arguments)]
pub async fn apply_checkout(
    pool: &SqlitePool,
    user_id: &str,
    stripe_subscription_id: &str,
    tier: &str,
    billing_cycle: BillingCycle,
    monthly_price: f64,
    currency: &str,
    period_start: Option<i64>,
    period_end: Option<i64>,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE user_subscriptions SET stripe_subscription_id = ?1, tier = ?2, status = ?3, billing_cycle = ?4, monthly_price = ?5, currency = ?6, current_period_start = ?7, current_period_end = ?8, cancel_at_period_end = 0, canceled_at = NULL, updated_at = ?9 WHERE user_id = ?10",
    )
    .bind(stripe_subscription_id)
    .bind(tier)
    .bind(SubscriptionStatus::Active)
    .bind(billing_cycle)
    .bind(monthly_price)
    .bind(currency)
    .bind(period_start)
    .bind(period_end)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// In-place tier migration on an already-live remote subscription.
pub async fn set_tier_price(
    pool: &SqlitePool,
    user_id: &str,
    tier: &str,
    billing_cycle: BillingCycle,
    monthly_price: f64,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE user_subscriptions SET tier = ?1, billing_cycle = ?2, monthly_price = ?3, updated_at = ?4 WHERE user_id = ?5",
    )
    .bind(tier)
    .bind(billing_cycle)
    .bind(monthly_price)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Webhook created/updated: status and period window, plus the tier label
/// when the event metadata carries one.
pub async fn sync_status(
    pool: &SqlitePool,
    user_id: &str,
    status: SubscriptionStatus,
    period_start: Option<i64>,
    period_end: Option<i64>,
    cancel_at_period_end: bool,
    tier: Option<&str>,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE user_subscriptions SET status = ?1, current_period_start = COALESCE(?2, current_period_start), current_period_end = COALESCE(?3, current_period_end), cancel_at_period_end = ?4, tier = COALESCE(?5, tier), updated_at = ?6 WHERE user_id = ?7",
    )
    .bind(status)
    .bind(period_start)
    .bind(period_end)
    .bind(cancel_at_period_end)
    .bind(tier)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Webhook deleted: the subscription is gone remotely, drop back to trial.
pub async fn mark_canceled(pool: &SqlitePool, user_id: &str, canceled_at: i64) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE user_subscriptions SET tier = 'trial', status = ?1, stripe_subscription_id = NULL, cancel_at_period_end = 0, canceled_at = ?2, updated_at = ?3 WHERE user_id = ?4",
    )
    .bind(SubscriptionStatus::Canceled)
    .bind(canceled_at)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Direct cancel (flag on, timestamp set) and reactivate (flag off,
/// timestamp cleared, status restored).
pub async fn set_cancel_at_period_end(
    pool: &SqlitePool,
    user_id: &str,
    cancel: bool,
    canceled_at: Option<i64>,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE user_subscriptions SET cancel_at_period_end = ?1, canceled_at = ?2, status = ?3, updated_at = ?4 WHERE user_id = ?5",
    )
    .bind(cancel)
    .bind(canceled_at)
    .bind(SubscriptionStatus::Active)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Webhook payment_succeeded: payment bookkeeping only.
pub async fn record_payment(
    pool: &SqlitePool,
    user_id: &str,
    paid_at: i64,
    amount: f64,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE user_subscriptions SET last_payment_date = ?1, last_payment_amount = ?2, updated_at = ?3 WHERE user_id = ?4",
    )
    .bind(paid_at)
    .bind(amount)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Webhook payment_failed: status only.
pub async fn set_status(
    pool: &SqlitePool,
    user_id: &str,
    status: SubscriptionStatus,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query("UPDATE user_subscriptions SET status = ?1, updated_at = ?2 WHERE user_id = ?3")
        .bind(status)
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
