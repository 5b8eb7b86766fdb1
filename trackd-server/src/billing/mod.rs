//! Billing orchestration
//!
//! Drives the checkout / upgrade / cancel flows against [`StripeClient`]
//! and keeps the local subscription row in step. Without a configured
//! secret key the whole module degrades to harmless no-ops so the rest
//! of the product works in development.

pub mod client;
pub mod webhook;

use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};

use shared::models::{BillingCycle, SubscriptionStatus, User, UserSubscription};
use shared::util::now_millis;

use crate::db::repository::{subscription, user};
use crate::tiers::TierService;
use crate::utils::{money, AppError, AppResult};

pub use client::{CheckoutSession, CheckoutSessionParams, StripeClient};

/// Billing flows over the payment provider plus the local ledger.
#[derive(Clone)]
pub struct BillingService {
    client: StripeClient,
    tiers: TierService,
    success_url: String,
    cancel_url: String,
}

/// What a checkout request produced: a hosted checkout URL for new
/// subscriptions, or an in-place update of a live one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BillingService {
    pub fn new(
        client: StripeClient,
        tiers: TierService,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tiers,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    pub fn is_stubbed(&self) -> bool {
        self.client.is_stubbed()
    }

    /// Start a paid subscription, or retarget a live one. A user with a
    /// live remote subscription gets an in-place price swap instead of
    /// a second checkout; everyone else gets a hosted checkout URL.
    pub async fn create_checkout(
        &self,
        pool: &SqlitePool,
        user: &User,
        tier_name: &str,
        cycle: BillingCycle,
    ) -> AppResult<CheckoutOutcome> {
        if self.is_stubbed() {
            debug!(user_id = %user.id, tier = tier_name, "Billing stubbed, skipping checkout");
            return Ok(CheckoutOutcome {
                url: None,
                updated: false,
                message: Some("Billing is not configured".to_string()),
            });
        }

        let tier = self
            .tiers
            .get_tier(tier_name)
            .await
            .ok_or_else(|| AppError::validation("tierName", format!("unknown tier: {tier_name}")))?;

        let sub = subscription::ensure(pool, &user.id, &user.preferred_currency).await?;

        // A live remote subscription is retargeted, never duplicated
        if let Some(remote_id) = sub.stripe_subscription_id.as_deref() {
            if sub.status != SubscriptionStatus::Canceled {
                if sub.tier == tier.name {
                    return Err(AppError::business_rule(format!(
                        "Already subscribed to the {tier_name} tier"
                    )));
                }
                return self.update_live_subscription(pool, user, &sub, remote_id, &tier, cycle).await;
            }
        }

        let price = tier.price_in(&user.preferred_currency).ok_or_else(|| {
            AppError::validation(
                "currency",
                format!("tier {tier_name} is not sold in {}", user.preferred_currency),
            )
        })?;

        let customer_id = match &sub.stripe_customer_id {
            Some(id) => id.clone(),
            None => {
                let id = self.client.create_customer(&user.email, &user.id).await?;
                subscription::set_stripe_customer(pool, &user.id, &id).await?;
                id
            }
        };

        let unit_amount = match cycle {
            BillingCycle::Monthly => money::to_minor_units(price),
            BillingCycle::Annual => money::to_minor_units(money::annual_total(price)),
        };

        let session = self
            .client
            .create_checkout_session(CheckoutSessionParams {
                customer_id: &customer_id,
                user_id: &user.id,
                tier: &tier.name,
                tier_display_name: &tier.display_name,
                billing_cycle: cycle,
                unit_amount,
                currency: &user.preferred_currency,
                success_url: &self.success_url,
                cancel_url: &self.cancel_url,
            })
            .await?;

        info!(user_id = %user.id, tier = tier_name, session = %session.id, "Created checkout session");
        Ok(CheckoutOutcome {
            url: Some(session.url),
            updated: false,
            message: None,
        })
    }

    /// Swap the price on the live subscription, invoicing the
    /// difference. Priced in the subscription's existing currency;
    /// the provider does not allow currency changes in place.
    async fn update_live_subscription(
        &self,
        pool: &SqlitePool,
        user: &User,
        sub: &UserSubscription,
        remote_id: &str,
        tier: &shared::models::TierConfig,
        cycle: BillingCycle,
    ) -> AppResult<CheckoutOutcome> {
        let price = tier.price_in(&sub.currency).ok_or_else(|| {
            AppError::validation(
                "currency",
                format!("tier {} is not sold in {}", tier.name, sub.currency),
            )
        })?;

        let remote = self.client.get_subscription(remote_id).await?;
        let item = &remote["items"]["data"][0];
        let item_id = item["id"]
            .as_str()
            .ok_or_else(|| AppError::upstream("stripe", format!("subscription has no items: {remote}")))?;
        let product = item["price"]["product"]
            .as_str()
            .ok_or_else(|| AppError::upstream("stripe", format!("subscription item has no product: {remote}")))?;

        let unit_amount = match cycle {
            BillingCycle::Monthly => money::to_minor_units(price),
            BillingCycle::Annual => money::to_minor_units(money::annual_total(price)),
        };

        self.client
            .update_subscription_price(
                remote_id,
                item_id,
                product,
                &sub.currency,
                unit_amount,
                cycle,
                &tier.name,
            )
            .await?;

        subscription::set_tier_price(pool, &user.id, &tier.name, cycle, price).await?;
        user::set_tier(pool, &user.id, &tier.name).await?;

        info!(user_id = %user.id, tier = %tier.name, "Updated live subscription in place");
        Ok(CheckoutOutcome {
            url: None,
            updated: true,
            message: Some(format!("Subscription updated to {}", tier.name)),
        })
    }

    /// Success-URL landing: pull the finished session, derive the
    /// canonical monthly price from what the provider actually charged,
    /// and write the one full-width subscription update.
    pub async fn complete_checkout(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        session_id: &str,
    ) -> AppResult<UserSubscription> {
        if self.is_stubbed() {
            let currency = user::find_by_id(pool, user_id)
                .await?
                .map(|u| u.preferred_currency)
                .unwrap_or_else(|| "GBP".to_string());
            return Ok(subscription::ensure(pool, user_id, &currency).await?);
        }

        let session = self.client.get_checkout_session(session_id).await?;
        let sub_id = session["subscription"]
            .as_str()
            .ok_or_else(|| AppError::invalid("Checkout session has no subscription"))?;
        let tier = session["metadata"]["tier"]
            .as_str()
            .ok_or_else(|| AppError::invalid("Checkout session has no tier metadata"))?;
        let cycle = match session["metadata"]["billing_cycle"].as_str() {
            Some("annual") => BillingCycle::Annual,
            _ => BillingCycle::Monthly,
        };

        let remote = self.client.get_subscription(sub_id).await?;
        let charged = money::from_minor_units(
            remote["items"]["data"][0]["price"]["unit_amount"]
                .as_i64()
                .unwrap_or(0),
        );
        let monthly_price = match cycle {
            BillingCycle::Monthly => charged,
            BillingCycle::Annual => money::monthly_from_annual(charged),
        };
        let currency = session["currency"]
            .as_str()
            .or_else(|| remote["currency"].as_str())
            .map(str::to_uppercase)
            .unwrap_or_else(|| "GBP".to_string());

        subscription::ensure(pool, user_id, &currency).await?;
        subscription::apply_checkout(
            pool,
            user_id,
            sub_id,
            tier,
            cycle,
            monthly_price,
            &currency,
            remote["current_period_start"].as_i64().map(|s| s * 1000),
            remote["current_period_end"].as_i64().map(|s| s * 1000),
        )
        .await?;
        user::set_tier(pool, user_id, tier).await?;

        info!(user_id = %user_id, tier = tier, "Checkout completed");
        subscription::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| AppError::internal("Subscription vanished after checkout"))
    }

    /// Flag the subscription to lapse at period end. Access continues
    /// until the period closes.
    pub async fn cancel_subscription(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> AppResult<UserSubscription> {
        let sub = subscription::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No subscription for user {user_id}")))?;

        if self.is_stubbed() {
            return Ok(sub);
        }

        let remote_id = sub
            .stripe_subscription_id
            .as_deref()
            .ok_or_else(|| AppError::business_rule("No active subscription to cancel"))?;

        self.client.set_cancel_at_period_end(remote_id, true).await?;
        subscription::set_cancel_at_period_end(pool, user_id, true, Some(now_millis())).await?;

        info!(user_id = %user_id, "Subscription set to cancel at period end");
        subscription::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| AppError::internal("Subscription vanished after cancel"))
    }

    /// Undo a pending cancellation before the period closes.
    pub async fn reactivate_subscription(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> AppResult<UserSubscription> {
        let sub = subscription::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No subscription for user {user_id}")))?;

        if self.is_stubbed() {
            return Ok(sub);
        }

        let remote_id = sub
            .stripe_subscription_id
            .as_deref()
            .ok_or_else(|| AppError::business_rule("No active subscription to reactivate"))?;

        self.client.set_cancel_at_period_end(remote_id, false).await?;
        subscription::set_cancel_at_period_end(pool, user_id, false, None).await?;

        info!(user_id = %user_id, "Subscription reactivated");
        subscription::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| AppError::internal("Subscription vanished after reactivate"))
    }

    pub async fn get_subscription(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> AppResult<Option<UserSubscription>> {
        Ok(subscription::find_by_user(pool, user_id).await?)
    }

    /// Verified webhook payload applied to the local ledger.
    pub async fn apply_webhook_event(&self, pool: &SqlitePool, event: &Value) -> AppResult<()> {
        webhook::apply_event(pool, event).await
    }
}
