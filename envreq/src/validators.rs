//! Built-in validators.
//!
//! Each function has the `Fn(&str) -> Result<(), ValidationError>` shape and
//! can be passed straight to [`Requirement::validator`](crate::Requirement::validator).

use crate::error::ValidationError;
use crate::requirement::Validate;
use ::base64::Engine;
use ::base64::engine::general_purpose::STANDARD;

/// Absolute URL with a scheme and a host.
pub fn url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { what: "URL" });
    }

    let parsed = ::url::Url::parse(value).map_err(|e| ValidationError::InvalidUrl {
        reason: e.to_string(),
    })?;

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingHost);
    }

    Ok(())
}

/// Human-friendly duration such as `30s`, `500ms` or `1h 30m`.
pub fn duration(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { what: "duration" });
    }

    humantime::parse_duration(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidDuration {
            reason: e.to_string(),
        })
}

/// Rejects empty and whitespace-only values.
pub fn not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { what: "value" });
    }
    Ok(())
}

/// TCP/UDP port number in 1..=65535.
pub fn port(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { what: "port" });
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::PortNotNumeric);
    }

    // Digit strings too long for u32 are out of range as well.
    match value.parse::<u32>() {
        Ok(n) if (1..=65535).contains(&n) => Ok(()),
        _ => Err(ValidationError::PortOutOfRange),
    }
}

/// Standard-alphabet base64 with padding.
pub fn base64(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty {
            what: "base64 value",
        });
    }

    STANDARD
        .decode(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidBase64 {
            reason: e.to_string(),
        })
}

/// Accepts exactly one of a fixed set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOf {
    options: Vec<String>,
}

impl OneOf {
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl Validate for OneOf {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if self.options.iter().any(|option| option == value) {
            Ok(())
        } else {
            Err(ValidationError::NotOneOf {
                options: self.options.clone(),
            })
        }
    }
}

/// Build a [`OneOf`] validator. Matching is exact and case-sensitive.
pub fn one_of<I, S>(options: I) -> OneOf
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    OneOf {
        options: options.into_iter().map(Into::into).collect(),
    }
}
