//! Where values come from.
//!
//! The registry never calls `std::env` directly; it goes through an
//! [`EnvSource`]. Production code uses [`ProcessEnv`], tests inject a
//! [`MapEnv`] so they neither race on the process environment nor need
//! `unsafe` `set_var` calls.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Read a single variable by name.
pub trait EnvSource: Send + Sync {
    /// Returns `None` when the variable is not set. A variable set to the
    /// empty string is present.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The ambient process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        // Non-UTF-8 values are still present; report them lossily.
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

/// Fixed in-memory environment that counts how often each name is read.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    reads: Mutex<HashMap<String, usize>>,
}

impl MapEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable (builder style).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Number of lookups performed for `name`.
    pub fn reads(&self, name: &str) -> usize {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Number of lookups performed across all names.
    pub fn total_reads(&self) -> usize {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            reads: Mutex::default(),
        }
    }
}

impl EnvSource for MapEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        *self
            .reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert(0) += 1;
        self.vars.get(name).cloned()
    }
}

/// Parse a boolean-like toggle.
///
/// Accepts: 1, true, yes, on (for true), case-insensitive. Anything else,
/// including the empty string, is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_counts_reads() {
        let env = MapEnv::new().with("A", "1");
        assert_eq!(env.lookup("A").as_deref(), Some("1"));
        assert_eq!(env.lookup("A").as_deref(), Some("1"));
        assert_eq!(env.lookup("B"), None);
        assert_eq!(env.reads("A"), 2);
        assert_eq!(env.reads("B"), 1);
        assert_eq!(env.reads("C"), 0);
        assert_eq!(env.total_reads(), 3);
    }

    #[test]
    fn test_map_env_empty_value_is_present() {
        let env: MapEnv = [("EMPTY", "")].into_iter().collect();
        assert_eq!(env.lookup("EMPTY").as_deref(), Some(""));
    }

    #[test]
    fn test_parse_flag() {
        for val in ["1", "true", "TRUE", "yes", "On", " 1 "] {
            assert!(parse_flag(val), "Expected true for '{}'", val);
        }
        for val in ["0", "false", "no", "off", "", "maybe", "2"] {
            assert!(!parse_flag(val), "Expected false for '{}'", val);
        }
    }

    #[test]
    fn test_process_env_missing_var() {
        assert_eq!(
            ProcessEnv.lookup("ENVREQ_SURELY_NOT_SET_IN_ANY_ENVIRONMENT"),
            None
        );
    }
}
