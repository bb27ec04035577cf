//! Declare environment variable requirements where they are used, validate
//! them all at startup.
//!
//! Each component declares the variables it reads through a shared
//! [`Registry`]. Declarations of the same name from different components are
//! merged into one canonical [`Requirement`]: required wins over optional,
//! sensitive wins over non-sensitive, and the first non-empty metadata sticks.
//! Every name is read and validated exactly once.
//!
//! ```ignore
//! use envreq::{Registry, Requirement, validators};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new());
//!
//! let auth_url = registry.declare(
//!     Requirement::new("AUTH_SERVICE_URL")
//!         .source("authclient")
//!         .description("Base URL for authentication service")
//!         .validator(validators::url),
//! );
//!
//! envreq::must_validate(&registry);
//! registry.freeze();
//! ```
//!
//! Reports never print sensitive values. Set `ENVREQ_SHOW_VALUES=1` to add
//! value previews; sensitive entries still show only their last four
//! characters.

pub mod error;
pub mod keys;
pub mod logging;
pub mod manifest;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod requirement;
pub mod source;
pub mod validators;

pub use error::{RegistryError, ValidationError};
pub use manifest::{Manifest, ManifestError};
pub use outcome::{Origin, Outcome, Status};
pub use registry::{CachedValue, Registry};
pub use report::{
    Failure, FailureKind, ReportOptions, ReportRow, ValidationReport, render_report, report_rows,
};
pub use requirement::{Requirement, Validate, Validator, merge};
pub use source::{EnvSource, MapEnv, ProcessEnv};

use std::io::Write;

/// Exit status used when required variables are missing or invalid.
pub const EXIT_VALIDATION_FAILED: i32 = 2;

/// Validate `registry`, print the report to stderr and exit the process with
/// [`EXIT_VALIDATION_FAILED`] if any required variable is missing or invalid.
///
/// Returns normally when everything required is in place.
pub fn must_validate(registry: &Registry) {
    let report = registry.validate();
    let options = ReportOptions::from_source(registry.env());

    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    // Best effort: stderr may already be closed.
    let _ = report.render(&mut out, &options);

    if !report.is_ok() {
        let _ = writeln!(
            out,
            "\n{} required environment variable(s) missing or invalid",
            report.failure_count()
        );
        let _ = out.flush();
        std::process::exit(EXIT_VALIDATION_FAILED);
    }
}
