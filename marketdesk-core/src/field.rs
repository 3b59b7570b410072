//! Field values and field-level patching of detail records.

use crate::error::ConsoleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a mutable field on a detail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(value) => Some(*value),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Flag(value) => serde_json::Value::Bool(*value),
            FieldValue::Text(value) => serde_json::Value::String(value.clone()),
        }
    }

    /// Require a flag, reporting `field` on mismatch.
    pub fn expect_flag(&self, field: &str) -> Result<bool, ConsoleError> {
        self.as_flag()
            .ok_or_else(|| ConsoleError::validation(field, "expected true or false"))
    }

    /// Require text, reporting `field` on mismatch.
    pub fn expect_text(&self, field: &str) -> Result<&str, ConsoleError> {
        self.as_text()
            .ok_or_else(|| ConsoleError::validation(field, "expected a text value"))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(value) => write!(f, "{}", value),
            FieldValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// A detail record whose mutable fields can be read and written by name.
///
/// `write_field` validates the value before touching the record, so a
/// rejected write leaves the record unchanged.
pub trait Patchable {
    /// Identifier of the record.
    fn record_id(&self) -> &str;

    /// Current value of a mutable field, `None` if the field is not mutable.
    fn read_field(&self, field: &str) -> Option<FieldValue>;

    fn write_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConsoleError>;
}

/// Error for a field name a record does not expose.
pub fn unknown_field(field: &str) -> ConsoleError {
    ConsoleError::validation(field, "field cannot be changed from the console")
}
