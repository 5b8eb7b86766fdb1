//! Stripe integration via REST API (no SDK dependency)
//!
//! Form-encoded calls against the payment API. Constructed without a
//! secret key the client is "stubbed": [`BillingService`] checks
//! [`StripeClient::is_stubbed`] and never calls a remote method, so the
//! methods here may assume a key is configured.
//!
//! [`BillingService`]: super::BillingService

use std::time::Duration;

use serde_json::Value;

use shared::models::BillingCycle;

use crate::utils::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin client over the payment provider's REST API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

/// Inputs for a new checkout session.
pub struct CheckoutSessionParams<'a> {
    pub customer_id: &'a str,
    pub user_id: &'a str,
    pub tier: &'a str,
    pub tier_display_name: &'a str,
    pub billing_cycle: BillingCycle,
    /// Amount charged per interval, in minor units.
    pub unit_amount: i64,
    pub currency: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// Hosted checkout session handle.
#[derive(Debug)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

impl StripeClient {
    pub fn new(secret_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key,
        }
    }

    /// True when no secret key is configured and billing must no-op.
    pub fn is_stubbed(&self) -> bool {
        self.secret_key.is_none()
    }

    fn key(&self) -> AppResult<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| AppError::upstream("stripe", "no secret key configured"))
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> AppResult<Value> {
        let key = self.key()?;
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .basic_auth(key, None::<&str>)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .timeout(REQUEST_TIMEOUT)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::upstream("stripe", e.to_string()))?;
        read_json(resp).await
    }

    async fn get(&self, path: &str) -> AppResult<Value> {
        let key = self.key()?;
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .basic_auth(key, None::<&str>)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::upstream("stripe", e.to_string()))?;
        read_json(resp).await
    }

    /// Create a customer, tagged with our user id for reconciliation.
    pub async fn create_customer(&self, email: &str, user_id: &str) -> AppResult<String> {
        let resp = self
            .post_form(
                "/v1/customers",
                &[
                    ("email", email.to_string()),
                    ("metadata[user_id]", user_id.to_string()),
                ],
            )
            .await?;

        resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AppError::upstream("stripe", format!("create_customer failed: {resp}")))
    }

    /// Create a hosted checkout session in subscription mode. Prices are
    /// inline so tiers never need pre-registered price ids; the tier
    /// label rides along as metadata on both the session and the
    /// subscription it creates.
    pub async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams<'_>,
    ) -> AppResult<CheckoutSession> {
        let (interval, cycle) = match params.billing_cycle {
            BillingCycle::Monthly => ("month", "monthly"),
            BillingCycle::Annual => ("year", "annual"),
        };

        let resp = self
            .post_form(
                "/v1/checkout/sessions",
                &[
                    ("mode", "subscription".to_string()),
                    ("customer", params.customer_id.to_string()),
                    ("line_items[0][quantity]", "1".to_string()),
                    (
                        "line_items[0][price_data][currency]",
                        params.currency.to_lowercase(),
                    ),
                    (
                        "line_items[0][price_data][unit_amount]",
                        params.unit_amount.to_string(),
                    ),
                    (
                        "line_items[0][price_data][product_data][name]",
                        format!("trackd {}", params.tier_display_name),
                    ),
                    (
                        "line_items[0][price_data][recurring][interval]",
                        interval.to_string(),
                    ),
                    ("success_url", params.success_url.to_string()),
                    ("cancel_url", params.cancel_url.to_string()),
                    ("metadata[user_id]", params.user_id.to_string()),
                    ("metadata[tier]", params.tier.to_string()),
                    ("metadata[billing_cycle]", cycle.to_string()),
                    (
                        "subscription_data[metadata][user_id]",
                        params.user_id.to_string(),
                    ),
                    ("subscription_data[metadata][tier]", params.tier.to_string()),
                    ("subscription_data[metadata][billing_cycle]", cycle.to_string()),
                ],
            )
            .await?;

        match (resp["id"].as_str(), resp["url"].as_str()) {
            (Some(id), Some(url)) => Ok(CheckoutSession {
                id: id.to_string(),
                url: url.to_string(),
            }),
            _ => Err(AppError::upstream(
                "stripe",
                format!("create_checkout failed: {resp}"),
            )),
        }
    }

    pub async fn get_checkout_session(&self, session_id: &str) -> AppResult<Value> {
        self.get(&format!("/v1/checkout/sessions/{session_id}")).await
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> AppResult<Value> {
        self.get(&format!("/v1/subscriptions/{subscription_id}")).await
    }

    /// Swap the single item of a live subscription to a new inline
    /// price, invoicing the difference immediately.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_subscription_price(
        &self,
        subscription_id: &str,
        item_id: &str,
        product: &str,
        currency: &str,
        unit_amount: i64,
        billing_cycle: BillingCycle,
        tier: &str,
    ) -> AppResult<Value> {
        let interval = match billing_cycle {
            BillingCycle::Monthly => "month",
            BillingCycle::Annual => "year",
        };

        self.post_form(
            &format!("/v1/subscriptions/{subscription_id}"),
            &[
                ("items[0][id]", item_id.to_string()),
                ("items[0][price_data][currency]", currency.to_lowercase()),
                ("items[0][price_data][product]", product.to_string()),
                ("items[0][price_data][unit_amount]", unit_amount.to_string()),
                (
                    "items[0][price_data][recurring][interval]",
                    interval.to_string(),
                ),
                ("proration_behavior", "always_invoice".to_string()),
                ("metadata[tier]", tier.to_string()),
            ],
        )
        .await
    }

    /// Flip the cancel-at-period-end flag on a live subscription.
    pub async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> AppResult<Value> {
        self.post_form(
            &format!("/v1/subscriptions/{subscription_id}"),
            &[("cancel_at_period_end", cancel.to_string())],
        )
        .await
    }
}

async fn read_json(resp: reqwest::Response) -> AppResult<Value> {
    let status = resp.status();
    let body: Value = resp
        .json()
        .await
        .map_err(|e| AppError::upstream("stripe", format!("bad response: {e}")))?;

    if !status.is_success() {
        let message = body["error"]["message"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(AppError::upstream("stripe", message));
    }
    Ok(body)
}
