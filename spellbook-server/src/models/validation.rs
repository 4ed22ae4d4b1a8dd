//! Validation of path parameters

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Identifiers and levels are unsigned decimal literals, nothing else.
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Validation error for path parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Parameter is empty or missing from the path
    Empty { field: &'static str },

    /// Parameter is not an unsigned integer literal
    NotNumeric { field: &'static str, value: String },

    /// Parameter is numeric but does not fit the store's integer column
    OutOfRange { field: &'static str, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::NotNumeric { field, value } => {
                write!(f, "{} must be an unsigned integer, got '{}'", field, value)
            }
            Self::OutOfRange { field, value } => {
                write!(f, "{} '{}' is out of range", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Parse a numeric path parameter (`^\d+$`) into a store id.
pub fn parse_id(field: &'static str, raw: &str) -> Result<i32, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if !DIGITS.is_match(raw) {
        return Err(ValidationError::NotNumeric {
            field,
            value: raw.to_owned(),
        });
    }
    raw.parse::<i32>().map_err(|_| ValidationError::OutOfRange {
        field,
        value: raw.to_owned(),
    })
}
