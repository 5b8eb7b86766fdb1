//! Customer Repository
//!
//! Customer aggregates (`total_jobs`, `total_revenue`, `average_job_value`,
//! `last_job_date`) are a materialized view over the jobs table; the job
//! repository calls [`recompute_stats`] after every linked-job mutation.

use sqlx::SqlitePool;

use shared::models::{Customer, CustomerCreate, CustomerStatus, CustomerUpdate};
use shared::util::{now_millis, snowflake_id};

use super::{RepoError, RepoResult};

const CUSTOMER_SELECT: &str = "SELECT id, user_id, name, phone, email, address, total_jobs, total_revenue, average_job_value, last_job_date, satisfaction_score, status, preferred_services, notes, created_at, updated_at FROM customers";

/// Raw row with the JSON services column still as TEXT.
#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    user_id: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    total_jobs: i64,
    total_revenue: f64,
    average_job_value: f64,
    last_job_date: Option<String>,
    satisfaction_score: Option<f64>,
    status: CustomerStatus,
    preferred_services: String,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Customer {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            phone: r.phone,
            email: r.email,
            address: r.address,
            total_jobs: r.total_jobs,
            total_revenue: r.total_revenue,
            average_job_value: r.average_job_value,
            last_job_date: r.last_job_date,
            satisfaction_score: r.satisfaction_score,
            status: r.status,
            preferred_services: serde_json::from_str(&r.preferred_services).unwrap_or_default(),
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub async fn find_all(pool: &SqlitePool, user_id: &str) -> RepoResult<Vec<Customer>> {
    let sql = format!("{CUSTOMER_SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, CustomerRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Customer::from).collect())
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<Option<Customer>> {
    let sql = format!("{CUSTOMER_SELECT} WHERE user_id = ? AND id = ?");
    let row = sqlx::query_as::<_, CustomerRow>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Customer::from))
}

pub async fn search(pool: &SqlitePool, user_id: &str, query: &str) -> RepoResult<Vec<Customer>> {
    let pattern = format!("%{query}%");
    let sql = format!(
        "{CUSTOMER_SELECT} WHERE user_id = ?1 AND (name LIKE ?2 OR phone LIKE ?2 OR email LIKE ?2) ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, CustomerRow>(&sql)
        .bind(user_id)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Customer::from).collect())
}

pub async fn create(pool: &SqlitePool, user_id: &str, data: CustomerCreate) -> RepoResult<Customer> {
    let now = now_millis();
    let id = snowflake_id();
    let services = serde_json::to_string(&data.preferred_services.unwrap_or_default())
        .unwrap_or_else(|_| "[]".into());
    sqlx::query(
        "INSERT INTO customers (id, user_id, name, phone, email, address, status, preferred_services, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
    )
    .bind(id)
    .bind(user_id)
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(data.status.unwrap_or_default())
    .bind(&services)
    .bind(&data.notes)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create customer".into()))
}

pub async fn update(
    pool: &SqlitePool,
    user_id: &str,
    id: i64,
    data: CustomerUpdate,
) -> RepoResult<Customer> {
    let now = now_millis();
    let services = data
        .preferred_services
        .as_ref()
        .map(|list| serde_json::to_string(list).unwrap_or_else(|_| "[]".into()));
    let rows = sqlx::query(
        "UPDATE customers SET name = COALESCE(?1, name), phone = COALESCE(?2, phone), email = COALESCE(?3, email), address = COALESCE(?4, address), satisfaction_score = COALESCE(?5, satisfaction_score), status = COALESCE(?6, status), preferred_services = COALESCE(?7, preferred_services), notes = COALESCE(?8, notes), updated_at = ?9 WHERE user_id = ?10 AND id = ?11",
    )
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(data.satisfaction_score)
    .bind(data.status)
    .bind(&services)
    .bind(&data.notes)
    .bind(now)
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Customer {id} not found")));
    }
    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Customer {id} not found")))
}

/// Hard delete. Linked jobs keep their denormalized `customer_name`;
/// their `customer_id` goes NULL via the foreign key.
pub async fn delete(pool: &SqlitePool, user_id: &str, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM customers WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Rebuild the materialized job aggregates for one customer from the full
/// set of their jobs (any status). Must agree with what the customer value
/// ranking would compute for the same customer.
pub async fn recompute_stats(pool: &SqlitePool, customer_id: i64) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "UPDATE customers SET \
            total_jobs = (SELECT COUNT(*) FROM jobs WHERE customer_id = ?1), \
            total_revenue = (SELECT COALESCE(SUM(revenue), 0) FROM jobs WHERE customer_id = ?1), \
            average_job_value = CASE \
                WHEN (SELECT COUNT(*) FROM jobs WHERE customer_id = ?1) = 0 THEN 0 \
                ELSE ROUND((SELECT COALESCE(SUM(revenue), 0) FROM jobs WHERE customer_id = ?1) * 1.0 \
                     / (SELECT COUNT(*) FROM jobs WHERE customer_id = ?1), 2) \
            END, \
            last_job_date = (SELECT MAX(date) FROM jobs WHERE customer_id = ?1), \
            updated_at = ?2 \
         WHERE id = ?1",
    )
    .bind(customer_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn seed_customer(pool: &SqlitePool, user_id: &str, name: &str) -> Customer {
    create(
        pool,
        user_id,
        CustomerCreate {
            name: name.to_string(),
            phone: None,
            email: None,
            address: None,
            status: None,
            preferred_services: None,
            notes: None,
        },
    )
    .await
    .unwrap()
}
