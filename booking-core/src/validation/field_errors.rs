use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field name to the error currently shown for it.
///
/// A key mapped to `None` is a field that was checked and passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Option<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        field: &str,
        message: Option<String>,
    ) {
        self.0.insert(field.to_string(), message);
    }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.0.get(field).and_then(|message| message.as_deref())
    }

    /// No field holds an error.
    pub fn is_valid(&self) -> bool {
        self.0.values().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// First field in name order that holds an error.
    pub fn first(&self) -> Option<(&str, &str)> {
        self.iter().next()
    }

    /// Fields holding an error, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(field, message)| message.as_deref().map(|m| (field.as_str(), m)))
    }

    /// Copies every entry of `other` over this map.
    pub fn merge(
        &mut self,
        other: FieldErrors,
    ) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}
