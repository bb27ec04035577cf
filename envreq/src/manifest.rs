//! TOML manifests listing requirements.
//!
//! A manifest lets a deployment check an environment without running the
//! application:
//!
//! ```toml
//! [[requirement]]
//! name = "AUTH_SERVICE_URL"
//! source = "authclient"
//! description = "Base URL for authentication service"
//! validator = "url"
//!
//! [[requirement]]
//! name = "APP_ENV"
//! optional = true
//! default = "development"
//! validator = { one_of = ["production", "development", "test"] }
//! ```

use crate::outcome::Outcome;
use crate::registry::Registry;
use crate::requirement::Requirement;
use crate::validators;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Names accepted in the string form of `validator`.
pub const VALIDATOR_NAMES: &[&str] = &["url", "duration", "port", "base64", "not_empty"];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("requirement #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("requirement '{name}' uses unknown validator '{validator}' (expected one of: {})", VALIDATOR_NAMES.join(", "))]
    UnknownValidator { name: String, validator: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default, rename = "requirement")]
    requirements: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    name: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    default: String,
    #[serde(default)]
    sensitive: bool,
    #[serde(default)]
    validator: Option<ValidatorSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValidatorSpec {
    Named(String),
    OneOf { one_of: Vec<String> },
}

/// Parsed manifest, in file order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub requirements: Vec<Requirement>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            entries = manifest.requirements.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content)?;
        let requirements = raw
            .requirements
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_requirement(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requirements })
    }

    /// Declare every entry, in file order.
    ///
    /// Repeated names merge through the registry like any other declaration.
    pub fn declare_all(&self, registry: &Registry) -> Vec<Arc<Outcome>> {
        self.requirements
            .iter()
            .map(|requirement| registry.declare(requirement.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl RawEntry {
    fn into_requirement(self, index: usize) -> Result<Requirement, ManifestError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ManifestError::EmptyName { index });
        }

        let mut requirement = Requirement::new(name.clone())
            .source(self.source)
            .description(self.description)
            .with_default(self.default);
        if self.optional {
            requirement = requirement.optional();
        }
        if self.sensitive {
            requirement = requirement.sensitive();
        }

        match self.validator {
            None => {}
            Some(ValidatorSpec::OneOf { one_of }) => {
                requirement = requirement.validator(validators::one_of(one_of));
            }
            Some(ValidatorSpec::Named(validator)) => {
                requirement = match validator.as_str() {
                    "url" => requirement.validator(validators::url),
                    "duration" => requirement.validator(validators::duration),
                    "port" => requirement.validator(validators::port),
                    "base64" => requirement.validator(validators::base64),
                    "not_empty" => requirement.validator(validators::not_empty),
                    _ => return Err(ManifestError::UnknownValidator { name, validator }),
                };
            }
        }

        Ok(requirement)
    }
}
