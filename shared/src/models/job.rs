//! Job Model

use serde::{Deserialize, Serialize};

/// Job lifecycle status
///
/// Normal flow is quoted → booked → in_progress → completed; cancelled can
/// be entered from any non-completed state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum JobStatus {
    #[default]
    Quoted,
    Booked,
    InProgress,
    Completed,
    Cancelled,
}

/// Job entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub user_id: String,
    pub customer_id: Option<i64>,
    /// Denormalized so jobs survive customer deletion.
    pub customer_name: String,
    pub job_type: String,
    pub revenue: f64,
    pub expenses: f64,
    pub hours: f64,
    /// Always revenue / hours, recomputed on every write (0 when hours is 0).
    pub hourly_rate: f64,
    pub status: JobStatus,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// Customer satisfaction 1-5.
    pub satisfaction: Option<i32>,
    pub materials: Vec<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create job payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreate {
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub job_type: String,
    pub revenue: f64,
    pub expenses: Option<f64>,
    pub hours: f64,
    /// Advisory: ignored and recomputed server-side.
    pub hourly_rate: Option<f64>,
    pub status: Option<JobStatus>,
    pub date: String,
    pub satisfaction: Option<i32>,
    pub materials: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Update job payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub job_type: Option<String>,
    pub revenue: Option<f64>,
    pub expenses: Option<f64>,
    pub hours: Option<f64>,
    pub status: Option<JobStatus>,
    pub date: Option<String>,
    pub satisfaction: Option<i32>,
    pub materials: Option<Vec<String>>,
    pub notes: Option<String>,
}
