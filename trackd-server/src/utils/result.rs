//! Unified Result Types
//!
//! Type alias shared by HTTP handlers and application services

use crate::AppError;

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;
