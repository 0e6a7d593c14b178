//! Field validation registry.
//!
//! The legacy form layer dispatched to validators by method-name convention.
//! Here the mapping is explicit: a registry binds field names to pure
//! validation functions, and `validate` runs every registered validator
//! against the submitted field values, collecting all failures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A submitted form value, before domain interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Missing,
}

impl FieldValue {
    pub fn from_optional_number(value: Option<f64>) -> Self {
        match value {
            Some(number) => FieldValue::Number(number),
            None => FieldValue::Missing,
        }
    }
}

/// A field-level validation failure surfaced back to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Pure check over a single field value.
pub type ValidatorFn = fn(&FieldValue) -> Result<(), String>;

/// Explicit field-name-to-validator mapping invoked by `validate`.
#[derive(Default)]
pub struct ValidationRegistry {
    validators: BTreeMap<&'static str, ValidatorFn>,
}

impl ValidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, field: &'static str, validator: ValidatorFn) -> Self {
        self.validators.insert(field, validator);
        self
    }

    /// Run every registered validator. Fields absent from the submission are
    /// presented to their validator as `FieldValue::Missing` so required-ness
    /// stays a validator concern, not an orchestrator one.
    pub fn validate(
        &self,
        fields: &BTreeMap<&'static str, FieldValue>,
    ) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for (field, validator) in &self.validators {
            let value = fields.get(field).unwrap_or(&FieldValue::Missing);
            if let Err(message) = validator(value) {
                errors.push(FieldError::new(*field, message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Scores are bounded to [1, 5]; a missing value is a valid "no score yet".
/// Non-finite numbers fail the range check.
pub fn score_range(value: &FieldValue) -> Result<(), String> {
    match value {
        FieldValue::Missing => Ok(()),
        FieldValue::Number(score) if (1.0..=5.0).contains(score) => Ok(()),
        _ => Err("Score must be between 1 and 5.".to_string()),
    }
}

pub fn required_text(value: &FieldValue) -> Result<(), String> {
    match value {
        FieldValue::Text(text) if !text.trim().is_empty() => Ok(()),
        _ => Err("This field is required.".to_string()),
    }
}

/// Shallow shape check; real deliverability is the mail system's problem.
pub fn email_shape(value: &FieldValue) -> Result<(), String> {
    let invalid = || "Enter a valid email address.".to_string();
    match value {
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            let Some((local, domain)) = trimmed.split_once('@') else {
                return Err(invalid());
            };
            if local.is_empty() || domain.is_empty() || !domain.contains('.') {
                return Err(invalid());
            }
            Ok(())
        }
        _ => Err(invalid()),
    }
}

/// Registry for reviewer score submissions.
pub fn score_form() -> ValidationRegistry {
    ValidationRegistry::new().register("score", score_range)
}

/// Registry for public application submissions.
pub fn application_form() -> ValidationRegistry {
    ValidationRegistry::new()
        .register("name", required_text)
        .register("email", email_shape)
}
