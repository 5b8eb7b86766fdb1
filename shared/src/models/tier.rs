//! Tier Configuration Model
//!
//! Sourced from the external tier table (or hardcoded fallback), never
//! persisted in the primary database.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subscription tier definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TierConfig {
    pub name: String,
    pub display_name: String,
    /// Monthly price keyed by ISO currency code (GBP/USD/EUR).
    pub prices: HashMap<String, f64>,
    /// None means unlimited. Some(0) means no jobs allowed.
    pub max_jobs_per_month: Option<i64>,
    pub max_competitors: i64,
    pub ai_credits_per_month: i64,
    /// "daily" or "weekly".
    pub insight_frequency: String,
    pub features: TierFeatures,
}

impl TierConfig {
    /// Monthly price in the given currency, if the tier is sold in it.
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.prices.get(currency).copied()
    }
}

/// Per-tier feature flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierFeatures {
    pub ai_analysis: bool,
    pub competitor_tracking: bool,
    pub advanced_analytics: bool,
    pub priority_support: bool,
}

/// Quota dimension an entitlement check can ask about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    Jobs,
    Ai,
    Competitors,
}

/// Entitlement check result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitCheck {
    pub allowed: bool,
    /// None means unlimited.
    pub limit: Option<i64>,
    pub current: i64,
    pub message: String,
}
