//! Shared validation utilities
//!
//! Rules append to a [`FieldErrors`] collector so every failing field is
//! reported at once.
//!
//! ```rust,ignore
//! let mut errors = FieldErrors::new();
//! errors.require_id("fileId", command.file_id);
//! errors.min_length("submissionPeriod", &command.submission_period, 4);
//! Ok(errors.into_vec())
//! ```

use uuid::Uuid;

use crate::error::FieldError;

#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Fails when `valid` is false
    pub fn check(&mut self, valid: bool, field: &str, message: impl Into<String>) {
        if !valid {
            self.add(field, message);
        }
    }

    /// GUIDs must not be nil
    pub fn require_id(&mut self, field: &str, id: Uuid) {
        self.check(!id.is_nil(), field, format!("'{field}' must not be empty"));
    }

    /// Text must contain something other than whitespace
    pub fn require_text(&mut self, field: &str, value: Option<&str>) {
        let present = value.is_some_and(|v| !v.trim().is_empty());
        self.check(present, field, format!("'{field}' must not be empty"));
    }

    pub fn min_length(&mut self, field: &str, value: &str, min: usize) {
        self.check(
            value.trim().chars().count() >= min,
            field,
            format!("'{field}' must be at least {min} characters"),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_failure() {
        let mut errors = FieldErrors::new();
        errors.require_id("id", Uuid::nil());
        errors.require_text("fileName", Some("   "));
        errors.require_text("comments", None);
        errors.min_length("submissionPeriod", "Jan", 4);

        let fields: Vec<_> = errors.into_vec().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, ["id", "fileName", "comments", "submissionPeriod"]);
    }

    #[test]
    fn test_valid_values_pass() {
        let mut errors = FieldErrors::new();
        errors.require_id("id", Uuid::new_v4());
        errors.require_text("fileName", Some("pom.csv"));
        errors.min_length("submissionPeriod", "Jan to June 2024", 4);
        assert!(errors.is_empty());
    }
}
