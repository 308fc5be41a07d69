//! Field validation.
//!
//! A field is checked against an ordered list of [`ValidationRule`]s; the
//! first failing rule decides the message recorded in [`FieldErrors`].

mod field_errors;
mod rule;
pub mod rules;
pub mod schema;

pub use field_errors::FieldErrors;
pub use rule::{ValidationRule, first_failure, validate_field};
pub use schema::validate_for_submit;
