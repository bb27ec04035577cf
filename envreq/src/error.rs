//! Error types shared across the registry.

use thiserror::Error;

/// A validator rejected a present value.
///
/// Validation errors never abort a declaration. They are stored on the
/// [`Outcome`](crate::Outcome) and surface through the report, counting as a
/// failure only when the variable is required.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The value was empty (or whitespace-only, for `not_empty`).
    #[error("{what} cannot be empty")]
    Empty { what: &'static str },

    /// The value did not parse as an absolute URL.
    #[error("invalid URL: {reason}")]
    InvalidUrl { reason: String },

    /// The URL parsed but carries no host.
    #[error("URL must have a host")]
    MissingHost,

    /// The value is not a duration such as `30s` or `1h 30m`.
    #[error("invalid duration: {reason}")]
    InvalidDuration { reason: String },

    /// The value is not one of the accepted options.
    #[error("must be one of: {}", .options.join(", "))]
    NotOneOf { options: Vec<String> },

    /// Port contains something other than ASCII digits.
    #[error("port must be numeric")]
    PortNotNumeric,

    /// Port is numeric but outside 1..=65535.
    #[error("port must be between 1 and 65535")]
    PortOutOfRange,

    /// The value is not valid standard base64.
    #[error("invalid base64: {reason}")]
    InvalidBase64 { reason: String },

    /// Free-form error from a user-supplied validator.
    #[error("{0}")]
    Custom(String),
}

impl ValidationError {
    /// Build a [`ValidationError::Custom`] from any message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Declaration-order violations detected by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A required variable nobody declared before `freeze()` showed up afterwards.
    ///
    /// `declared_by` carries the requirement's `source` label.
    #[error(
        "envreq: REQUIRED environment variable '{name}' registered after freeze (from: {declared_by})\n\
         All required environment variables must be declared before Registry::freeze().\n\
         Move this declaration earlier in initialization."
    )]
    RequiredAfterFreeze { name: String, declared_by: String },
}
