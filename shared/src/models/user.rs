//! User Model

use serde::{Deserialize, Serialize};

/// User entity
///
/// `id` is the auth provider's opaque subject string; rows are upserted on
/// first authenticated request and never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// e.g. "plumber", "electrician".
    pub business_type: Option<String>,
    pub specializations: Vec<String>,
    pub target_hourly_rate: Option<f64>,
    pub revenue_goal: Option<f64>,
    pub hours_goal: Option<f64>,
    /// Tier label; authoritative copy lives in the subscription record.
    pub subscription_tier: String,
    /// ISO currency code, default GBP.
    pub preferred_currency: String,
    pub notification_preferences: NotificationPreferences,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Notification preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub weekly_summary: bool,
    pub new_insights: bool,
    pub billing_alerts: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            weekly_summary: true,
            new_insights: true,
            billing_alerts: true,
        }
    }
}

/// Update profile payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub business_type: Option<String>,
    pub specializations: Option<Vec<String>>,
    pub target_hourly_rate: Option<f64>,
    pub revenue_goal: Option<f64>,
    pub hours_goal: Option<f64>,
    pub preferred_currency: Option<String>,
    pub notification_preferences: Option<NotificationPreferences>,
}
