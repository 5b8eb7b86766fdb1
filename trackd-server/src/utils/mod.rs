//! Utility module - shared helpers and types
//!
//! # Contents
//!
//! - [`AppError`] / [`AppResult`] - application error handling
//! - [`FieldErrors`] - request validation collector
//! - money arithmetic and logging helpers

pub mod error;
pub mod logger;
pub mod money;
pub mod result;
pub mod validation;

pub use error::{AppError, ErrorBody, FieldError};
pub use result::AppResult;
pub use validation::FieldErrors;
