//! Subscription Model

use serde::{Deserialize, Serialize};

/// Remote subscription status as reconciled from the payment processor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum SubscriptionStatus {
    #[default]
    Active,
    PastDue,
    Canceled,
    Trialing,
}

/// Billing cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum BillingCycle {
    #[default]
    Monthly,
    Annual,
}

/// Local subscription record, one per user
///
/// Written by both the billing API (checkout, cancel, reactivate) and the
/// webhook reconciler; each writer updates only its own fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserSubscription {
    pub user_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub tier: String,
    pub status: SubscriptionStatus,
    pub billing_cycle: BillingCycle,
    /// Canonical monthly price (annual billing stores the discounted
    /// per-month equivalent).
    pub monthly_price: f64,
    pub currency: String,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
    pub last_payment_date: Option<i64>,
    pub last_payment_amount: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}
