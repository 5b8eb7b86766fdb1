//! Input validation helpers
//!
//! Centralized field limits and a collector that accumulates field errors
//! so one response reports everything wrong with a request body.
//! Limits are chosen based on:
//! - Reasonable UX limits for names, notes, addresses
//! - SQLite TEXT has no built-in length enforcement

use chrono::NaiveDate;

use crate::utils::error::{AppError, FieldError};

// ── Field limits ─────────────────────────────────────────────────────

/// Entity names: customer, competitor, job type, insight title, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Notes and free-text reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Insight bodies (AI analysis summaries run long)
pub const MAX_BODY_LEN: usize = 4000;

/// Short identifiers: phone, location, currency codes
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Postal addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Monetary amounts: revenue, expenses, rates
pub const MAX_MONEY: f64 = 9_999_999.99;

/// Hours on a single job
pub const MAX_HOURS: f64 = 10_000.0;

/// List payloads: materials, services, specializations
pub const MAX_LIST_ITEMS: usize = 50;

// ── Field error collector ────────────────────────────────────────────

/// Accumulates field-level validation failures for one request.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Required string: non-empty after trimming, within the length limit.
    pub fn require_text(&mut self, value: &str, field: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} must not be empty"));
        } else if value.len() > max_len {
            self.push(
                field,
                format!("{field} is too long ({} chars, max {max_len})", value.len()),
            );
        }
    }

    /// Optional string: if present, within the length limit.
    pub fn optional_text(&mut self, value: &Option<String>, field: &str, max_len: usize) {
        if let Some(v) = value
            && v.len() > max_len
        {
            self.push(
                field,
                format!("{field} is too long ({} chars, max {max_len})", v.len()),
            );
        }
    }

    /// Monetary amount: finite, non-negative, below the sanity cap.
    pub fn money(&mut self, value: f64, field: &str) {
        if !value.is_finite() {
            self.push(field, format!("{field} must be a finite number"));
        } else if value < 0.0 {
            self.push(field, format!("{field} must be non-negative"));
        } else if value > MAX_MONEY {
            self.push(field, format!("{field} exceeds maximum allowed ({MAX_MONEY})"));
        }
    }

    /// Optional monetary amount.
    pub fn optional_money(&mut self, value: Option<f64>, field: &str) {
        if let Some(v) = value {
            self.money(v, field);
        }
    }

    /// Job hours: finite, non-negative, below the sanity cap.
    pub fn hours(&mut self, value: f64, field: &str) {
        if !value.is_finite() {
            self.push(field, format!("{field} must be a finite number"));
        } else if value < 0.0 {
            self.push(field, format!("{field} must be non-negative"));
        } else if value > MAX_HOURS {
            self.push(field, format!("{field} exceeds maximum allowed ({MAX_HOURS})"));
        }
    }

    /// Optional non-negative number: ratings averages, goals, review counts.
    pub fn optional_non_negative(&mut self, value: Option<f64>, field: &str) {
        if let Some(v) = value {
            if !v.is_finite() {
                self.push(field, format!("{field} must be a finite number"));
            } else if v < 0.0 {
                self.push(field, format!("{field} must be non-negative"));
            }
        }
    }

    /// Satisfaction rating: integer 1-5.
    pub fn rating(&mut self, value: Option<i32>, field: &str) {
        if let Some(v) = value
            && !(1..=5).contains(&v)
        {
            self.push(field, format!("{field} must be between 1 and 5"));
        }
    }

    /// Calendar date in ISO `YYYY-MM-DD` form.
    pub fn date(&mut self, value: &str, field: &str) {
        if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            self.push(field, format!("{field} must be a date in YYYY-MM-DD format"));
        }
    }

    /// String list: bounded item count, each item within the name limit.
    pub fn list(&mut self, items: &[String], field: &str) {
        if items.len() > MAX_LIST_ITEMS {
            self.push(
                field,
                format!("{field} has too many items ({}, max {MAX_LIST_ITEMS})", items.len()),
            );
            return;
        }
        if items.iter().any(|item| item.len() > MAX_NAME_LEN) {
            self.push(
                field,
                format!("{field} contains an item longer than {MAX_NAME_LEN} chars"),
            );
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the collector: `Ok(())` when clean, the full error list otherwise.
    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_request_finishes_ok() {
        let mut v = FieldErrors::new();
        v.require_text("Boiler swap", "jobType", MAX_NAME_LEN);
        v.money(450.0, "revenue");
        v.hours(6.5, "hours");
        v.date("2025-03-14", "date");
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_collects_every_failure() {
        let mut v = FieldErrors::new();
        v.require_text("  ", "customerName", MAX_NAME_LEN);
        v.money(-10.0, "revenue");
        v.rating(Some(9), "satisfaction");
        v.date("14/03/2025", "date");
        match v.finish() {
            Err(AppError::Validation(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_finite_money() {
        let mut v = FieldErrors::new();
        v.money(f64::NAN, "revenue");
        v.money(f64::INFINITY, "expenses");
        assert!(v.finish().is_err());
    }

    #[test]
    fn test_list_limits() {
        let mut v = FieldErrors::new();
        let too_many: Vec<String> = (0..MAX_LIST_ITEMS + 1).map(|i| format!("item{i}")).collect();
        v.list(&too_many, "materials");
        assert!(!v.is_empty());

        let mut v = FieldErrors::new();
        v.list(&["copper pipe".to_string(), "flux".to_string()], "materials");
        assert!(v.finish().is_ok());
    }
}
