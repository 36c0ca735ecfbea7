//! Request validation.
//!
//! A [`Validator`] collects every failing field before reporting, so clients
//! see all problems with a payload at once.

use serde::Serialize;
use serde_json::Value;

use crate::error::{DomainError, Result};

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn check(&mut self, field: &'static str, ok: bool, message: &'static str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError { field, message });
        }
        self
    }

    /// The value must contain something other than whitespace.
    pub fn required(
        &mut self,
        field: &'static str,
        value: &str,
        message: &'static str,
    ) -> &mut Self {
        self.check(field, !value.trim().is_empty(), message)
    }

    pub fn email(&mut self, field: &'static str, value: &str, message: &'static str) -> &mut Self {
        self.check(field, is_valid_email(value), message)
    }

    pub fn min_len(
        &mut self,
        field: &'static str,
        value: &str,
        min: usize,
        message: &'static str,
    ) -> &mut Self {
        self.check(field, value.chars().count() >= min, message)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fails with [`DomainError::Validation`] if any rule was violated.
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

/// Loose structural email check: one `@`, a non-empty local part and a
/// dotted domain, no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Reads a numeric field that may arrive as a JSON number or a numeric string.
pub fn numeric(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}
