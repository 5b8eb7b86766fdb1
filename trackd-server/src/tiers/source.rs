//! Tier source client
//!
//! Fetches tier definitions from the external configuration table. The
//! endpoint serves Airtable-shaped payloads: a `records` array whose
//! entries carry an opaque `id` and a loose `fields` object. Field
//! mapping is deliberately forgiving so a half-filled row in the table
//! degrades to defaults instead of failing the whole fetch.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use shared::models::{TierConfig, TierFeatures};

use crate::utils::{AppError, AppResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the remote tier table.
#[derive(Debug, Clone)]
pub struct TierSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl TierSource {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: table.into(),
        }
    }

    /// Fetch and map every well-formed tier record. Records without a
    /// `name` are dropped; everything else falls back to defaults.
    pub async fn fetch(&self) -> AppResult<Vec<TierConfig>> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), self.table);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::upstream("tier source", e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AppError::upstream(
                "tier source",
                format!("HTTP {}", resp.status()),
            ));
        }

        let list: RecordList = resp
            .json()
            .await
            .map_err(|e| AppError::upstream("tier source", format!("bad response: {e}")))?;

        Ok(list
            .records
            .into_iter()
            .filter_map(|r| r.fields.into_config())
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    fields: TierFields,
}

/// Raw table row. Every field optional so sparse rows still map.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TierFields {
    name: String,
    display_name: Option<String>,
    price_gbp: Option<f64>,
    price_usd: Option<f64>,
    price_eur: Option<f64>,
    max_jobs_per_month: Option<i64>,
    max_competitors: Option<i64>,
    ai_credits_per_month: Option<i64>,
    insight_frequency: Option<String>,
    ai_analysis: bool,
    competitor_tracking: bool,
    advanced_analytics: bool,
    priority_support: bool,
}

impl TierFields {
    fn into_config(self) -> Option<TierConfig> {
        if self.name.is_empty() {
            return None;
        }

        let mut prices = HashMap::new();
        if let Some(p) = self.price_gbp {
            prices.insert("GBP".to_string(), p);
        }
        if let Some(p) = self.price_usd {
            prices.insert("USD".to_string(), p);
        }
        if let Some(p) = self.price_eur {
            prices.insert("EUR".to_string(), p);
        }

        Some(TierConfig {
            display_name: self.display_name.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            prices,
            max_jobs_per_month: self.max_jobs_per_month,
            max_competitors: self.max_competitors.unwrap_or(3),
            ai_credits_per_month: self.ai_credits_per_month.unwrap_or(0),
            insight_frequency: self.insight_frequency.unwrap_or_else(|| "weekly".to_string()),
            features: TierFeatures {
                ai_analysis: self.ai_analysis,
                competitor_tracking: self.competitor_tracking,
                advanced_analytics: self.advanced_analytics,
                priority_support: self.priority_support,
            },
        })
    }
}
