//! Request-body validation that collects every failing field before
//! rejecting, so clients get the full error list in one round trip.

use crate::errors::{AppError, FieldErrors};

pub const REQUIRED: &str = "This field is required.";

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Blank (empty or whitespace-only) values fail.
    pub fn required(&mut self, field: &str, value: &str) -> bool {
        let present = !value.trim().is_empty();
        self.check(present, field, REQUIRED);
        present
    }

    pub fn max_chars(&mut self, field: &str, value: &str, max: usize) {
        self.check(
            value.chars().count() <= max,
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
    }

    pub fn min_chars(&mut self, field: &str, value: &str, min: usize) {
        self.check(
            value.chars().count() >= min,
            field,
            format!("Ensure this field has at least {min} characters."),
        );
    }

    pub fn email(&mut self, field: &str, value: &str) {
        self.check(
            is_plausible_email(value),
            field,
            "Enter a valid email address.",
        );
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// One `@`, a non-empty local part, and a dotted domain with no spaces.
pub fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) || value.len() > 254 {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
