//! Tier configuration service
//!
//! Tiers live in an external table so pricing can change without a
//! deploy. This module caches the fetched list for five minutes and
//! degrades in two stages when the source misbehaves: first to the
//! stale cache, then to the hardcoded fallback set. Callers always get
//! a usable tier list.

pub mod limits;
pub mod source;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use shared::models::{TierConfig, TierFeatures};

pub use source::TierSource;

const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

/// Millisecond clock, swappable in tests to step through TTL windows.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

struct TierCache {
    tiers: Option<Vec<TierConfig>>,
    fetched_at: i64,
}

/// Cached, fallback-backed view of the tier table.
#[derive(Clone)]
pub struct TierService {
    source: Option<TierSource>,
    cache: Arc<RwLock<TierCache>>,
    clock: Arc<dyn Clock>,
}

impl TierService {
    /// `None` source means no table is configured; serve the fallback.
    pub fn new(source: Option<TierSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Option<TierSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: Arc::new(RwLock::new(TierCache {
                tiers: None,
                fetched_at: 0,
            })),
            clock,
        }
    }

    /// Every configured tier: cache within TTL, then a fresh fetch,
    /// then the stale cache, then the hardcoded fallback.
    pub async fn get_all_tiers(&self) -> Vec<TierConfig> {
        let now = self.clock.now_millis();

        {
            let cache = self.cache.read();
            if let Some(tiers) = &cache.tiers {
                if now - cache.fetched_at < CACHE_TTL_MS {
                    return tiers.clone();
                }
            }
        }

        if let Some(source) = &self.source {
            match source.fetch().await {
                Ok(tiers) if !tiers.is_empty() => {
                    let mut cache = self.cache.write();
                    cache.tiers = Some(tiers.clone());
                    cache.fetched_at = now;
                    debug!(count = tiers.len(), "Refreshed tier cache");
                    return tiers;
                }
                Ok(_) => warn!("Tier source returned no records"),
                Err(e) => warn!(error = %e, "Tier source fetch failed"),
            }

            // Expired cache beats the fallback when the source is down
            if let Some(tiers) = &self.cache.read().tiers {
                return tiers.clone();
            }
        }

        fallback_tiers()
    }

    pub async fn get_tier(&self, name: &str) -> Option<TierConfig> {
        self.get_all_tiers().await.into_iter().find(|t| t.name == name)
    }
}

fn prices(gbp: f64, usd: f64, eur: f64) -> HashMap<String, f64> {
    HashMap::from([
        ("GBP".to_string(), gbp),
        ("USD".to_string(), usd),
        ("EUR".to_string(), eur),
    ])
}

/// Built-in tier set, used when no source is configured and as the
/// last resort when the source fails before the first successful fetch.
pub fn fallback_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            name: "trial".to_string(),
            display_name: "Trial".to_string(),
            prices: prices(0.0, 0.0, 0.0),
            max_jobs_per_month: Some(25),
            max_competitors: 3,
            ai_credits_per_month: 5,
            insight_frequency: "weekly".to_string(),
            features: TierFeatures::default(),
        },
        TierConfig {
            name: "basic".to_string(),
            display_name: "Basic".to_string(),
            prices: prices(9.99, 12.99, 11.99),
            max_jobs_per_month: Some(100),
            max_competitors: 10,
            ai_credits_per_month: 25,
            insight_frequency: "weekly".to_string(),
            features: TierFeatures::default(),
        },
        TierConfig {
            name: "pro".to_string(),
            display_name: "Pro".to_string(),
            prices: prices(24.99, 32.99, 29.99),
            max_jobs_per_month: None,
            max_competitors: 50,
            ai_credits_per_month: 100,
            insight_frequency: "daily".to_string(),
            features: TierFeatures {
                ai_analysis: true,
                competitor_tracking: true,
                advanced_analytics: true,
                priority_support: true,
            },
        },
    ]
}
