//! Resolved values.

use crate::error::ValidationError;
use crate::requirement::Requirement;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Read from the environment.
    Environment,
    /// Unset in the environment; the requirement's default was used.
    Default,
    /// Neither the environment nor a default provided a value.
    Absent,
}

/// Health of a single entry as shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    /// Required and absent.
    Missing,
    /// Present but rejected by its validator.
    Invalid,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Missing => write!(f, "missing"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// The cached resolution of one variable.
///
/// Computed once per name and never recomputed until the registry is reset,
/// even if later declarations tighten the canonical requirement.
#[derive(Debug)]
pub struct Outcome {
    /// Canonical requirement as it stood when the value was first resolved.
    pub requirement: Requirement,
    /// Whether the environment or a default provided a value.
    pub present: bool,
    /// Resolved value, empty when absent.
    pub value: String,
    pub origin: Origin,
    /// Validator verdict; only set when a value was present and a validator exists.
    pub error: Option<ValidationError>,
    /// Set once a later declaration marks the name sensitive.
    marked_sensitive: AtomicBool,
}

impl Outcome {
    /// A resolution result. `present` follows from `origin`.
    pub fn new(
        requirement: Requirement,
        value: impl Into<String>,
        origin: Origin,
        error: Option<ValidationError>,
    ) -> Self {
        Self {
            requirement,
            present: origin != Origin::Absent,
            value: value.into(),
            origin,
            error,
            marked_sensitive: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.requirement.name
    }

    pub fn status(&self) -> Status {
        if !self.present && self.requirement.is_required() {
            Status::Missing
        } else if self.error.is_some() {
            Status::Invalid
        } else {
            Status::Ok
        }
    }

    /// Whether this entry blocks startup: required and missing, or required
    /// and invalid. Optional entries never fail.
    pub fn is_failure(&self) -> bool {
        self.requirement.is_required() && self.status() != Status::Ok
    }

    /// Whether reports must mask this value.
    ///
    /// True if the requirement was sensitive at resolution time or any later
    /// declaration of the name was.
    pub fn is_sensitive(&self) -> bool {
        self.requirement.sensitive || self.marked_sensitive.load(Ordering::Acquire)
    }

    pub(crate) fn mark_sensitive(&self) {
        self.marked_sensitive.store(true, Ordering::Release);
    }

    /// The value if present and valid.
    pub fn valid_value(&self) -> Option<&str> {
        (self.present && self.error.is_none()).then_some(self.value.as_str())
    }
}
