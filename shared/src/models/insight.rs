//! Insight Model

use serde::{Deserialize, Serialize};

/// Insight category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum InsightCategory {
    Pricing,
    Efficiency,
    Customer,
    Market,
}

/// Insight priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum InsightPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Insight status
///
/// Transitions are one-way: completed and dismissed insights never return
/// to active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum InsightStatus {
    #[default]
    Active,
    Completed,
    Dismissed,
}

/// Insight entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Insight {
    pub id: i64,
    pub user_id: String,
    pub category: InsightCategory,
    pub title: String,
    pub body: String,
    pub priority: InsightPriority,
    pub status: InsightStatus,
    /// Unviewed insights drive the dashboard notification badge.
    pub viewed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create insight payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightCreate {
    pub category: InsightCategory,
    pub title: String,
    pub body: String,
    pub priority: Option<InsightPriority>,
}

/// Update insight payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub priority: Option<InsightPriority>,
    pub status: Option<InsightStatus>,
}
