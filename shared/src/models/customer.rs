//! Customer Model

use serde::{Deserialize, Serialize};

/// Customer activity status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum CustomerStatus {
    #[default]
    New,
    Active,
    Inactive,
}

/// Customer entity
///
/// `total_jobs` / `total_revenue` / `average_job_value` / `last_job_date`
/// are a materialized aggregate over the customer's linked jobs; the job
/// repository recomputes them on every linked job mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub total_jobs: i64,
    pub total_revenue: f64,
    pub average_job_value: f64,
    pub last_job_date: Option<String>,
    /// Average satisfaction 1-5 across rated jobs.
    pub satisfaction_score: Option<f64>,
    pub status: CustomerStatus,
    pub preferred_services: Vec<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create customer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreate {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub status: Option<CustomerStatus>,
    pub preferred_services: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Update customer payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub satisfaction_score: Option<f64>,
    pub status: Option<CustomerStatus>,
    pub preferred_services: Option<Vec<String>>,
    pub notes: Option<String>,
}
