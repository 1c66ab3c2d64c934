use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").unwrap());

/// Signup input checks, run before any database access.
pub fn validate_signup(name: &str, email: &str, phone: &str, password: &str) -> AppResult<()> {
    if !EMAIL_PATTERN.is_match(email) {
        return Err(AppError::validation("invalid email format"));
    }
    if name.chars().count() < 2 {
        return Err(AppError::validation(
            "name must be at least 2 characters long",
        ));
    }
    if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation("phone number must be 10 digits"));
    }
    if password.len() < 8 {
        return Err(AppError::validation(
            "password must be at least 8 characters long",
        ));
    }
    Ok(())
}

pub fn validate_patient_draft(name: &str, age: i32) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("patient name is required"));
    }
    if age <= 0 {
        return Err(AppError::validation(
            "patient age must be greater than zero",
        ));
    }
    Ok(())
}
