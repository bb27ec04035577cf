//! The requirement registry.
//!
//! Components declare what they need with [`Registry::declare`] at the point
//! of use. The first declaration of a name reads and validates the value and
//! caches the [`Outcome`]; every later declaration merges its metadata into
//! the canonical requirement and gets the cached outcome back.
//!
//! Lifecycle:
//! 1. `declare` anywhere during initialization
//! 2. [`Registry::validate`] (or [`crate::must_validate`]) once everything is declared
//! 3. [`Registry::freeze`] right before serving traffic
//! 4. After freeze:
//!    - re-declaring a known name: allowed
//!    - a new optional name: allowed, logged as a warning
//!    - a new required name: the registry dumps a full report and panics

use crate::error::RegistryError;
use crate::outcome::{Origin, Outcome};
use crate::report::{ReportOptions, ValidationReport, render_report};
use crate::requirement::{Requirement, merge};
use crate::source::{EnvSource, ProcessEnv};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct State {
    requirements: HashMap<String, Requirement>,
    outcomes: HashMap<String, Arc<Outcome>>,
}

/// Value and presence of a resolved variable, see [`Registry::value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedValue {
    pub value: String,
    pub present: bool,
}

/// Process-wide table of declared environment requirements.
///
/// Cheap to share: wrap it in an [`Arc`] and hand it to every component that
/// declares variables.
pub struct Registry {
    state: RwLock<State>,
    frozen: AtomicBool,
    env: Arc<dyn EnvSource>,
}

impl Registry {
    /// Registry backed by the process environment.
    pub fn new() -> Self {
        Self::with_source(Arc::new(ProcessEnv))
    }

    /// Registry backed by an arbitrary source.
    pub fn with_source(env: Arc<dyn EnvSource>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            frozen: AtomicBool::new(false),
            env,
        }
    }

    /// The environment source values are read from.
    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    /// Declare a requirement and return its resolved outcome.
    ///
    /// The first declaration of a name reads the environment (falling back
    /// to the default) and runs the validator; the result is cached and
    /// returned to every later caller, even ones whose declaration tightens
    /// the requirement. Missing or invalid values never fail here, they are
    /// reported by [`Registry::validate`].
    ///
    /// # Panics
    ///
    /// If the registry is frozen and `requirement` is a required variable no
    /// one declared before the freeze. The full report is printed to stderr
    /// first.
    pub fn declare(&self, requirement: Requirement) -> Arc<Outcome> {
        if self.is_frozen() && !self.is_declared(&requirement.name) {
            if requirement.optional {
                warn!(
                    name = %requirement.name,
                    source = %requirement.source,
                    "optional environment variable registered after freeze"
                );
            } else {
                self.abort_required_after_freeze(&requirement);
            }
        }

        self.merge_and_resolve(requirement)
    }

    /// Every known outcome, sorted by name.
    ///
    /// Names that were declared but not yet resolved are resolved now.
    pub fn snapshot(&self) -> Vec<Arc<Outcome>> {
        let (mut outcomes, pending) = {
            let state = self.read_state();
            let mut outcomes = Vec::with_capacity(state.requirements.len());
            let mut pending = Vec::new();
            for (name, requirement) in &state.requirements {
                match state.outcomes.get(name) {
                    Some(outcome) => outcomes.push(Arc::clone(outcome)),
                    None => pending.push(requirement.clone()),
                }
            }
            (outcomes, pending)
        };

        for requirement in pending {
            outcomes.push(self.merge_and_resolve(requirement));
        }

        outcomes.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        outcomes
    }

    /// Snapshot every entry and classify the failures.
    ///
    /// A non-empty [`ValidationReport::failures`] list means the process
    /// should not continue starting up.
    pub fn validate(&self) -> ValidationReport {
        let report = ValidationReport::from_outcomes(self.snapshot());
        if report.is_ok() {
            debug!(entries = report.outcomes.len(), "environment validated");
        } else {
            warn!(
                failures = report.failure_count(),
                "required environment variables missing or invalid"
            );
        }
        report
    }

    /// Cached value and presence for `name`.
    ///
    /// `None` means the name was never resolved. This never declares or
    /// resolves anything.
    pub fn value(&self, name: &str) -> Option<CachedValue> {
        self.read_state()
            .outcomes
            .get(name)
            .map(|outcome| CachedValue {
                value: outcome.value.clone(),
                present: outcome.present,
            })
    }

    /// Cached outcome for `name`, without resolving.
    pub fn outcome(&self, name: &str) -> Option<Arc<Outcome>> {
        self.read_state().outcomes.get(name).cloned()
    }

    /// Whether `name` has been declared.
    pub fn is_declared(&self, name: &str) -> bool {
        self.read_state().requirements.contains_key(name)
    }

    /// Current canonical requirement for `name`.
    pub fn requirement(&self, name: &str) -> Option<Requirement> {
        self.read_state().requirements.get(name).cloned()
    }

    /// Number of declared names.
    pub fn len(&self) -> usize {
        self.read_state().requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the declaration window. Idempotent.
    ///
    /// Call right before the application starts serving external traffic.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        info!("envreq registry frozen - new required registrations will panic");
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Drop every declaration and cached outcome and reopen the registry.
    ///
    /// Meant for test isolation only: declarations racing with a reset may
    /// land on either side of it.
    pub fn reset(&self) {
        let mut state = self.write_state();
        state.requirements.clear();
        state.outcomes.clear();
        self.frozen.store(false, Ordering::Release);
        debug!("envreq registry reset");
    }

    fn merge_and_resolve(&self, incoming: Requirement) -> Arc<Outcome> {
        let mut state = self.write_state();

        let canonical = match state.requirements.get(&incoming.name) {
            Some(existing) => merge(existing.clone(), incoming),
            None => incoming,
        };
        let name = canonical.name.clone();
        state.requirements.insert(name.clone(), canonical.clone());

        // Lookup and store happen under the same write guard, so racing
        // declarations of a new name resolve it exactly once.
        if let Some(cached) = state.outcomes.get(&name) {
            if canonical.sensitive {
                cached.mark_sensitive();
            }
            return Arc::clone(cached);
        }
        let outcome = Arc::new(self.resolve(canonical));
        state.outcomes.insert(name, Arc::clone(&outcome));
        outcome
    }

    fn resolve(&self, requirement: Requirement) -> Outcome {
        let (value, origin) = match self.env.lookup(&requirement.name) {
            Some(value) => (value, Origin::Environment),
            None if !requirement.default.is_empty() => {
                (requirement.default.clone(), Origin::Default)
            }
            None => (String::new(), Origin::Absent),
        };
        let present = origin != Origin::Absent;

        let error = match &requirement.validator {
            Some(validator) if present => validator.validate(&value).err(),
            _ => None,
        };

        debug!(
            name = %requirement.name,
            source = %requirement.source,
            ?origin,
            valid = error.is_none(),
            "resolved environment variable"
        );

        Outcome::new(requirement, value, origin, error)
    }

    fn abort_required_after_freeze(&self, requirement: &Requirement) -> ! {
        let violation = RegistryError::RequiredAfterFreeze {
            name: requirement.name.clone(),
            declared_by: requirement.source.clone(),
        };
        error!(
            name = %requirement.name,
            source = %requirement.source,
            "REQUIRED environment variable registered after freeze"
        );

        let mut dump = Vec::new();
        let options = ReportOptions::from_source(self.env.as_ref());
        if render_report(&mut dump, &self.snapshot(), &options).is_ok() {
            eprintln!("envreq: complete environment state at time of panic:");
            eprintln!("{}", String::from_utf8_lossy(&dump));
        }

        panic!("{violation}");
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("Registry")
            .field("declared", &state.requirements.len())
            .field("resolved", &state.outcomes.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::source::MapEnv;
    use crate::validators;
    use std::sync::atomic::AtomicUsize;

    fn registry_with(vars: &[(&str, &str)]) -> (Registry, Arc<MapEnv>) {
        let env: Arc<MapEnv> = Arc::new(vars.iter().copied().collect());
        (Registry::with_source(env.clone()), env)
    }

    #[test]
    fn test_declare_reads_environment() {
        let (registry, _env) = registry_with(&[("TEST_URL", "https://api.example.com")]);

        let outcome = registry.declare(
            Requirement::new("TEST_URL")
                .source("client")
                .description("API base URL")
                .validator(validators::url),
        );

        assert!(outcome.present);
        assert_eq!(outcome.value, "https://api.example.com");
        assert_eq!(outcome.origin, Origin::Environment);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_default_substitution() {
        let (registry, _env) = registry_with(&[]);

        let outcome = registry.declare(
            Requirement::new("PORT")
                .optional()
                .with_default("8080")
                .validator(validators::port),
        );

        assert!(outcome.present);
        assert_eq!(outcome.value, "8080");
        assert_eq!(outcome.origin, Origin::Default);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_empty_value_is_present_and_skips_default() {
        let (registry, _env) = registry_with(&[("EMPTY", "")]);

        let outcome = registry.declare(Requirement::new("EMPTY").with_default("fallback"));

        assert!(outcome.present);
        assert_eq!(outcome.value, "");
        assert_eq!(outcome.origin, Origin::Environment);
    }

    #[test]
    fn test_absent_without_default() {
        let (registry, _env) = registry_with(&[]);

        let outcome = registry.declare(Requirement::new("MISSING").validator(validators::url));

        assert!(!outcome.present);
        assert_eq!(outcome.value, "");
        assert_eq!(outcome.origin, Origin::Absent);
        // Validator never runs without a value.
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_cached_outcome_is_identical() {
        let (registry, env) = registry_with(&[("TEST_VAL", "test-value")]);

        let first = registry.declare(Requirement::new("TEST_VAL").source("test"));
        let second = registry.declare(
            Requirement::new("TEST_VAL")
                .description("late")
                .validator(|_: &str| -> Result<(), ValidationError> {
                    Err(ValidationError::custom("too late"))
                }),
        );

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.error.is_none());
        assert_eq!(env.reads("TEST_VAL"), 1);

        // Canonical requirement still picked up the new metadata.
        let canonical = registry.requirement("TEST_VAL").unwrap();
        assert_eq!(canonical.description, "late");
        assert!(canonical.validator.is_some());
    }

    #[test]
    fn test_value_lookup() {
        let (registry, _env) = registry_with(&[("TEST_VAL", "test-value")]);
        registry.declare(Requirement::new("TEST_VAL").source("test"));

        assert_eq!(
            registry.value("TEST_VAL"),
            Some(CachedValue {
                value: "test-value".to_string(),
                present: true,
            })
        );
        assert_eq!(registry.value("NOT_EXISTS"), None);
        assert!(!registry.is_declared("NOT_EXISTS"));
    }

    #[test]
    fn test_value_lookup_does_not_resolve() {
        let (registry, env) = registry_with(&[("LAZY", "1")]);
        assert_eq!(registry.value("LAZY"), None);
        assert_eq!(env.total_reads(), 0);
    }

    #[test]
    fn test_snapshot_sorted_by_name() {
        let (registry, _env) = registry_with(&[("B", "2"), ("A", "1")]);
        registry.declare(Requirement::new("C").optional());
        registry.declare(Requirement::new("A"));
        registry.declare(Requirement::new("B"));

        let names: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_validate_counts_required_failures() {
        let (registry, _env) = registry_with(&[
            ("PRESENT_VAR", "value"),
            ("INVALID_VAR", "not-a-url"),
            ("OPTIONAL_INVALID", "not-a-url"),
        ]);

        registry.declare(Requirement::new("PRESENT_VAR").source("test"));
        registry.declare(Requirement::new("MISSING_VAR").source("test"));
        registry.declare(Requirement::new("INVALID_VAR").validator(validators::url));
        registry.declare(Requirement::new("OPTIONAL_MISSING").optional());
        registry.declare(
            Requirement::new("OPTIONAL_INVALID")
                .optional()
                .validator(validators::url),
        );

        let report = registry.validate();
        assert_eq!(report.failure_count(), 2);
        assert!(!report.is_ok());
        assert_eq!(report.outcomes.len(), 5);
    }

    #[test]
    fn test_freeze_allows_known_and_optional_names() {
        let (registry, _env) = registry_with(&[("KNOWN", "1")]);
        registry.declare(Requirement::new("KNOWN").optional());
        registry.freeze();
        registry.freeze();
        assert!(registry.is_frozen());

        // Re-declaring as required is fine: the name is already known.
        let known = registry.declare(Requirement::new("KNOWN"));
        assert!(known.present);
        assert!(registry.requirement("KNOWN").unwrap().is_required());

        let late = registry.declare(Requirement::new("LATE_OPTIONAL").optional());
        assert!(!late.present);
        assert!(registry.is_declared("LATE_OPTIONAL"));
    }

    #[test]
    #[should_panic(expected = "registered after freeze")]
    fn test_freeze_panics_on_new_required() {
        let (registry, _env) = registry_with(&[]);
        registry.declare(Requirement::new("TEST1").source("test"));
        registry.freeze();
        registry.declare(Requirement::new("TEST2").source("test"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let (registry, env) = registry_with(&[("A", "1")]);
        registry.declare(Requirement::new("A"));
        registry.freeze();

        registry.reset();

        assert!(registry.is_empty());
        assert!(!registry.is_frozen());
        assert_eq!(registry.value("A"), None);

        // Re-declaring after reset resolves again.
        registry.declare(Requirement::new("A"));
        assert_eq!(env.reads("A"), 2);
    }

    #[test]
    fn test_validator_runs_once() {
        let (registry, _env) = registry_with(&[("COUNTED", "x")]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting = move |_: &str| -> Result<(), ValidationError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        for _ in 0..5 {
            registry.declare(Requirement::new("COUNTED").validator(counting.clone()));
        }
        registry.snapshot();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_sensitive_declaration_masks_cached_value() {
        let (registry, _env) = registry_with(&[("SHARED_TOKEN", "tok_abcdef123456")]);
        let first = registry.declare(Requirement::new("SHARED_TOKEN").source("cache"));
        assert!(!first.is_sensitive());

        let second = registry.declare(Requirement::new("SHARED_TOKEN").sensitive());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_sensitive());

        let mut out = Vec::new();
        let options = ReportOptions::default().with_show_values(true);
        render_report(&mut out, &registry.snapshot(), &options).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(!output.contains("tok_abcdef123456"));
        assert!(output.contains("••••3456"));
    }
}
