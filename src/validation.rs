use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trimmed value of a required text field; blank counts as missing.
pub fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

pub fn max_chars(value: &str, max: usize, field: &str) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} can not be more than {max} characters"
        )));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), AppError> {
    if !is_valid_email(value) {
        return Err(AppError::Validation("Please add a valid email".into()));
    }
    Ok(())
}

pub fn password(value: &str, message: &str) -> Result<(), AppError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}
