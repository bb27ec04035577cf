//! Declared requirements and the merge rule that reconciles them.

use crate::error::ValidationError;
use std::fmt;
use std::sync::Arc;

/// A value check: `Ok(())` accepts, `Err` explains the rejection.
///
/// Implemented for every `Fn(&str) -> Result<(), ValidationError>`, so plain
/// functions such as [`validators::url`](crate::validators::url) and closures
/// can be passed wherever a validator is expected.
///
/// Validators run while the registry holds its write lock. They must not
/// call back into the registry.
pub trait Validate: Send + Sync {
    fn validate(&self, value: &str) -> Result<(), ValidationError>;
}

impl<F> Validate for F
where
    F: Fn(&str) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        self(value)
    }
}

/// Shared handle to a validator.
pub type Validator = Arc<dyn Validate>;

/// One call site's declaration of an environment variable.
///
/// Required by default; call [`Requirement::optional`] to relax it.
#[derive(Clone, Default)]
pub struct Requirement {
    /// Variable name, e.g. `STRIPE_API_KEY`.
    pub name: String,
    /// Owning component, for reporting.
    pub source: String,
    /// Short help text.
    pub description: String,
    /// Absent values are not a failure.
    pub optional: bool,
    /// Fallback used when the variable is unset. Empty means no default.
    pub default: String,
    pub validator: Option<Validator>,
    /// Never shown unmasked in reports.
    pub sensitive: bool,
}

impl Requirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Whether an absent value fails validation.
    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("description", &self.description)
            .field("optional", &self.optional)
            .field("default", &self.default)
            .field("validator", &self.validator.as_ref().map(|_| "<validator>"))
            .field("sensitive", &self.sensitive)
            .finish()
    }
}

/// Fold `incoming` into the canonical requirement for the same name.
///
/// Stricter always wins: the result is required if either side is, and
/// sensitive if either side is. Metadata (source, description, default,
/// validator) is first-writer-wins: an already populated field is never
/// overwritten, an empty one is filled from `incoming`.
pub fn merge(mut canonical: Requirement, incoming: Requirement) -> Requirement {
    debug_assert_eq!(canonical.name, incoming.name);

    canonical.optional = canonical.optional && incoming.optional;
    canonical.sensitive = canonical.sensitive || incoming.sensitive;

    if canonical.source.is_empty() {
        canonical.source = incoming.source;
    }
    if canonical.description.is_empty() {
        canonical.description = incoming.description;
    }
    if canonical.default.is_empty() {
        canonical.default = incoming.default;
    }
    if canonical.validator.is_none() {
        canonical.validator = incoming.validator;
    }

    canonical
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reject_all(_: &str) -> Result<(), ValidationError> {
        Err(ValidationError::custom("rejected"))
    }

    #[test]
    fn test_builder_defaults_to_required() {
        let req = Requirement::new("DATABASE_URL");
        assert!(req.is_required());
        assert!(!req.sensitive);
        assert!(req.default.is_empty());
        assert!(req.validator.is_none());
    }

    #[test]
    fn test_merge_required_wins() {
        let optional = Requirement::new("X").optional();
        let required = Requirement::new("X");
        assert!(!merge(optional.clone(), required.clone()).optional);
        assert!(!merge(required, optional.clone()).optional);
        assert!(merge(optional.clone(), optional).optional);
    }

    #[test]
    fn test_merge_sensitive_wins() {
        let plain = Requirement::new("X");
        let secret = Requirement::new("X").sensitive();
        assert!(merge(plain.clone(), secret.clone()).sensitive);
        assert!(merge(secret, plain.clone()).sensitive);
        assert!(!merge(plain.clone(), plain).sensitive);
    }

    #[test]
    fn test_merge_metadata_first_writer_wins() {
        let first = Requirement::new("X").description("A").source("billing");
        let second = Requirement::new("X")
            .description("B")
            .source("auth")
            .with_default("8080");
        let merged = merge(first, second);
        assert_eq!(merged.description, "A");
        assert_eq!(merged.source, "billing");
        // Empty field is filled from the later declaration.
        assert_eq!(merged.default, "8080");
    }

    #[test]
    fn test_merge_keeps_first_validator() {
        let first = Requirement::new("X");
        let second = Requirement::new("X").validator(reject_all);
        let merged = merge(first, second);
        let validator = merged.validator.expect("validator filled from second");
        assert!(validator.validate("anything").is_err());

        let accept =
            Requirement::new("X").validator(|_: &str| -> Result<(), ValidationError> { Ok(()) });
        let merged = merge(accept, Requirement::new("X").validator(reject_all));
        assert!(merged.validator.unwrap().validate("anything").is_ok());
    }

    #[test]
    fn test_debug_hides_validator_body() {
        let req = Requirement::new("X").validator(reject_all);
        let debug = format!("{:?}", req);
        assert!(debug.contains("<validator>"));
    }
}
