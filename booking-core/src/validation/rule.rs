use std::fmt;
use std::sync::Arc;

use super::FieldErrors;

type Validator = dyn Fn(&str) -> bool + Send + Sync;

/// A predicate over a field value paired with the message reported when the
/// predicate fails. Rules hold no state and clone cheaply, so the same rule
/// can guard any number of fields.
#[derive(Clone)]
pub struct ValidationRule {
    validator: Arc<Validator>,
    message: String,
}

impl ValidationRule {
    pub fn new<F>(
        message: impl Into<String>,
        validator: F,
    ) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            validator: Arc::new(validator),
            message: message.into(),
        }
    }

    /// Same predicate, different message.
    pub fn with_message(
        mut self,
        message: impl Into<String>,
    ) -> Self {
        self.message = message.into();
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn check(
        &self,
        value: &str,
    ) -> bool {
        (self.validator)(value)
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Message of the first rule `value` fails, in the order given.
pub fn first_failure<'a>(
    value: &str,
    rules: &'a [ValidationRule],
) -> Option<&'a str> {
    rules
        .iter()
        .find(|rule| !rule.check(value))
        .map(ValidationRule::message)
}

/// Evaluates `rules` against `value` and records the outcome under `field`.
///
/// The first failing rule's message becomes the field's error; when every
/// rule passes the field is cleared. Other fields are left untouched.
/// Returns whether the field is valid.
pub fn validate_field(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    rules: &[ValidationRule],
) -> bool {
    let failure = first_failure(value, rules).map(str::to_owned);
    let valid = failure.is_none();
    errors.set(field, failure);
    valid
}
