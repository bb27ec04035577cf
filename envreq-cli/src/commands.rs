use anyhow::{Context, Result, bail};
use envreq::{Manifest, Registry, ReportOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILED: u8 = envreq::EXIT_VALIDATION_FAILED as u8;

pub struct ReportRequest {
    pub manifest: PathBuf,
    pub show_values: bool,
    pub json: bool,
}

fn load(manifest: &Path) -> Result<(Registry, Manifest)> {
    let parsed = Manifest::load(manifest)
        .with_context(|| format!("Failed to load manifest {}", manifest.display()))?;
    let registry = Registry::new();
    parsed.declare_all(&registry);
    Ok((registry, parsed))
}

/// Render the report for `request`. With `fail_on_missing`, returns exit
/// code 2 when any required variable is missing or invalid.
pub fn check(request: &ReportRequest, fail_on_missing: bool) -> Result<u8> {
    let (registry, manifest) = load(&request.manifest)?;
    info!(
        manifest = %request.manifest.display(),
        entries = manifest.len(),
        "checking environment"
    );

    let report = registry.validate();
    let env_options = ReportOptions::from_source(registry.env());
    let options = env_options.with_show_values(env_options.show_values || request.show_values);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if request.json {
        serde_json::to_writer_pretty(&mut out, &report.rows(&options))
            .context("Failed to write JSON report")?;
        writeln!(out)?;
    } else {
        report.render(&mut out, &options)?;
    }
    out.flush()?;

    if report.is_ok() {
        debug!("all required environment variables present and valid");
        return Ok(EXIT_OK);
    }

    if !request.json {
        eprintln!(
            "\n{} required environment variable(s) missing or invalid",
            report.failure_count()
        );
    }
    Ok(if fail_on_missing { EXIT_FAILED } else { EXIT_OK })
}

/// Print the value of `name` from the manifest's environment.
///
/// Sensitive and undeclared names are refused.
pub fn get(name: &str, manifest: &Path) -> Result<u8> {
    let (registry, _) = load(manifest)?;

    let Some(outcome) = registry.outcome(name) else {
        bail!("'{name}' is not declared in {}", manifest.display());
    };
    if outcome.is_sensitive() {
        bail!("'{name}' is sensitive; refusing to print it");
    }
    if !outcome.present {
        bail!("'{name}' is not set");
    }
    if let Some(err) = &outcome.error {
        eprintln!("warning: {name}: {err}");
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", outcome.value)?;
    Ok(EXIT_OK)
}
