use lazy_static::lazy_static;
use recall_error::{AppError, AppResult, FieldError};
use recall_models::user::{LoginStartInput, RegisterInput};
use regex::Regex;

use crate::validation::sentence_set_rule;

lazy_static! {
    // This pattern checks for a valid email format with proper domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^([a-z0-9_+]([a-z0-9_+.]*[a-z0-9_+])?)@([a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,6})"
    ).unwrap();

    // Alphanumeric characters and underscores, 3-32 characters
    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9_]{3,32}$"
    ).unwrap();
}

const ALLOWED_SEX_VALUES: [&str; 3] = ["male", "female", "rather not say"];
const MIN_AGE: u32 = 18;

/// Per-field rule functions. Each returns the failure message, or `None`
/// when the field passes.

pub fn username_rule(username: &str) -> Option<String> {
    if username.trim().is_empty() {
        return Some("Username is required.".to_string());
    }

    if !USERNAME_REGEX.is_match(username) {
        return Some(
            "Username must be 3-32 characters long and can only contain a-z, A-Z, 0-9, _ characters."
                .to_string(),
        );
    }

    None
}

pub fn email_rule(email: &str) -> Option<String> {
    if email.trim().is_empty() {
        return Some("Email is required.".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Some("Not a valid email address.".to_string());
    }

    None
}

pub fn age_rule(age: Option<u32>) -> Option<String> {
    match age {
        Some(age) if age < MIN_AGE => Some(format!("Age must be at least {}.", MIN_AGE)),
        _ => None,
    }
}

pub fn sex_rule(sex: Option<&str>) -> Option<String> {
    match sex {
        Some(sex) if !ALLOWED_SEX_VALUES.contains(&sex) => Some(format!(
            "Must be one of: {}.",
            ALLOWED_SEX_VALUES.join(", ")
        )),
        _ => None,
    }
}

pub fn location_rule(location: Option<&str>) -> Option<String> {
    match location {
        Some(location) if location.len() < 3 || location.len() > 255 => {
            Some("Location must be between 3 and 255 characters.".to_string())
        }
        _ => None,
    }
}

pub fn password_reminder_rule(days: u32) -> Option<String> {
    if days < 1 {
        return Some("Password reminder must be at least 1 day.".to_string());
    }

    None
}

/// Validates a registration payload field by field, aggregating every
/// failure. `partial` skips the sentence/answer requirements, matching the
/// pre-registration validate endpoint.
pub fn validate_registration(input: &RegisterInput, partial: bool) -> AppResult<()> {
    let mut errors = Vec::new();

    if let Some(message) = username_rule(&input.username) {
        errors.push(FieldError::new("username", message));
    }

    if let Some(message) = email_rule(&input.email) {
        errors.push(FieldError::new("email", message));
    }

    if let Some(message) = age_rule(input.age) {
        errors.push(FieldError::new("age", message));
    }

    if let Some(message) = sex_rule(input.sex.as_deref()) {
        errors.push(FieldError::new("sex", message));
    }

    if let Some(message) = location_rule(input.location.as_deref()) {
        errors.push(FieldError::new("location", message));
    }

    if let Some(message) = password_reminder_rule(input.password_reminder) {
        errors.push(FieldError::new("password_reminder", message));
    }

    if !partial {
        let sentence_texts: Vec<String> =
            input.sentences.iter().map(|s| s.text.clone()).collect();

        if let Some(message) = sentence_set_rule(&sentence_texts) {
            errors.push(FieldError::new("sentences", message));
        }

        if input.answers.is_empty() {
            errors.push(FieldError::new(
                "answers",
                "At least one security-question answer is required.",
            ));
        }

        for answer in &input.answers {
            if answer.text.trim().is_empty() {
                errors.push(FieldError::new("answers", "Answers cannot be empty."));
                break;
            }
        }
    }

    if !errors.is_empty() {
        return Err(AppError::FieldErrors(errors));
    }

    Ok(())
}

/// Validates the identity + password login step
pub fn validate_login_start(input: &LoginStartInput) -> AppResult<()> {
    let mut errors = Vec::new();

    if input.identity.trim().is_empty() {
        errors.push(FieldError::new("identity", "Identity is required."));
    }

    if input.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required."));
    }

    if !errors.is_empty() {
        return Err(AppError::FieldErrors(errors));
    }

    Ok(())
}

/// Validates a bare email field (forgot-password, change-email probes)
pub fn validate_email_field(email: &str) -> AppResult<()> {
    if let Some(message) = email_rule(email) {
        return Err(AppError::validation("email", &message));
    }

    Ok(())
}
