//! Validation error types

use std::fmt;

/// Validation error for request payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length (characters)
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., slug)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Too many entries in a list field
    TooMany { field: &'static str, max: usize },

    /// Numeric field outside its scale
    OutOfRange { field: &'static str, min: i64, max: i64 },

    /// Caller targeted themselves where another member is required
    SelfReference { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::TooMany { field, max } => write!(f, "at most {} {} allowed", max, field),
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::SelfReference { field } => write!(f, "{} cannot be yourself", field),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<q5_core::Q5Error> for ValidationError {
    fn from(err: q5_core::Q5Error) -> Self {
        match err {
            q5_core::Q5Error::SignalOutOfRange { signal, max, .. } => Self::OutOfRange {
                field: signal,
                min: 0,
                max: i64::from(max),
            },
            _ => Self::InvalidFormat {
                field: "input",
                reason: "could not be validated",
            },
        }
    }
}

/// Trim and bound a required text field.
///
/// Length is counted in characters, not bytes.
pub fn required_text(field: &'static str, s: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(trimmed.to_owned())
}

/// Like [`required_text`] but blank input becomes `None`.
pub fn optional_text(
    field: &'static str,
    s: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

/// Optional absolute http(s) URL (avatars, images, datasheets, websites).
pub fn optional_url(field: &'static str, s: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(url) = optional_text(field, s, 2048)? else {
        return Ok(None);
    };

    if !(url.starts_with("https://") || url.starts_with("http://")) || url.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must be an http(s) URL",
        });
    }

    Ok(Some(url))
}
