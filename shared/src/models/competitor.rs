//! Competitor Model

use serde::{Deserialize, Serialize};

/// Competitor entity
///
/// Manually entered or AI-assisted record of a rival business. Comparison
/// input only; no relation to jobs or customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub hourly_rate: Option<f64>,
    /// Emergency call-out fee.
    pub emergency_rate: Option<f64>,
    pub services: Vec<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub location: Option<String>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create competitor payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorCreate {
    pub name: String,
    pub hourly_rate: Option<f64>,
    pub emergency_rate: Option<f64>,
    pub services: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Update competitor payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorUpdate {
    pub name: Option<String>,
    pub hourly_rate: Option<f64>,
    pub emergency_rate: Option<f64>,
    pub services: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}
