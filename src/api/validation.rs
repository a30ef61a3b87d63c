//! Simple validation helpers for incoming DTOs.
//! Lets handlers reject malformed data before it reaches the database.

use regex::Regex;

use crate::errors::AppError;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9+]{6,20}$").unwrap();
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn sanitize_phone(phone: &str) -> Option<String> {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if PHONE_RE.is_match(&digits) {
        Some(digits)
    } else {
        None
    }
}

pub fn ensure_max_len(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// Non-blank text of at most `max` characters, trimmed.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    if !ensure_max_len(trimmed, max) {
        return Err(AppError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Phone number reduced to digits and `+`, at most `max` characters.
pub fn phone_number(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let phone = sanitize_phone(value)
        .ok_or_else(|| AppError::InvalidInput(format!("{} is not a valid phone number", field)))?;
    if !ensure_max_len(&phone, max) {
        return Err(AppError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(phone)
}

pub fn email_address(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let email = required_text(field, value, max)?;
    if !validate_email(&email) {
        return Err(AppError::InvalidInput(format!("{} is not a valid email", field)));
    }
    Ok(email)
}
