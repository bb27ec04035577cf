//! Human-readable reporting.
//!
//! Reports never contain raw sensitive values. Value previews are off by
//! default; with [`ReportOptions::show_values`] non-sensitive values are shown
//! (truncated) and sensitive ones only as `••••` plus their last four
//! characters.

use crate::keys;
use crate::outcome::{Outcome, Status};
use crate::source::{EnvSource, ProcessEnv, parse_flag};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;

const NAME_WIDTH: usize = 20;
const SOURCE_WIDTH: usize = 12;
const REQUIRED_WIDTH: usize = 8;
const SENSITIVE_WIDTH: usize = 9;
const STATUS_WIDTH: usize = 8;
const DETAILS_RULE_WIDTH: usize = 20;

/// Longest non-sensitive preview shown verbatim.
const PREVIEW_MAX_CHARS: usize = 20;
/// Characters kept when a preview is truncated.
const PREVIEW_KEEP_CHARS: usize = 17;
/// Trailing characters revealed for sensitive values.
const MASK_SUFFIX_CHARS: usize = 4;
const MASK: &str = "••••";

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Append value previews to the details column.
    pub show_values: bool,
}

impl ReportOptions {
    /// Read `ENVREQ_SHOW_VALUES` from the process environment.
    pub fn from_env() -> Self {
        Self::from_source(&ProcessEnv)
    }

    /// Read `ENVREQ_SHOW_VALUES` from `env`.
    pub fn from_source(env: &dyn EnvSource) -> Self {
        Self {
            show_values: env.lookup(keys::SHOW_VALUES).is_some_and(|v| parse_flag(&v)),
        }
    }

    #[must_use]
    pub fn with_show_values(mut self, show_values: bool) -> Self {
        self.show_values = show_values;
        self
    }
}

/// One rendered line of the report, already masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub source: String,
    pub required: bool,
    pub sensitive: bool,
    pub status: Status,
    pub details: String,
    /// Counts toward the startup failure total.
    pub failure: bool,
}

impl ReportRow {
    fn from_outcome(outcome: &Outcome, options: &ReportOptions) -> Self {
        let requirement = &outcome.requirement;
        let status = outcome.status();

        let details = match status {
            Status::Missing => requirement.description.clone(),
            Status::Invalid => {
                let message = outcome
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                redact(&format!("Error: {message}"), outcome)
            }
            Status::Ok if options.show_values && outcome.present => format!(
                "{} (value: {})",
                requirement.description,
                preview(&outcome.value, outcome.is_sensitive())
            ),
            Status::Ok => requirement.description.clone(),
        };

        Self {
            name: requirement.name.clone(),
            source: requirement.source.clone(),
            required: requirement.is_required(),
            sensitive: outcome.is_sensitive(),
            status,
            details,
            failure: outcome.is_failure(),
        }
    }
}

/// Build masked report rows for `outcomes`, in the given order.
pub fn report_rows(outcomes: &[Arc<Outcome>], options: &ReportOptions) -> Vec<ReportRow> {
    outcomes
        .iter()
        .map(|outcome| ReportRow::from_outcome(outcome, options))
        .collect()
}

/// Write the report table and return the number of failing entries.
pub fn render_report<W: Write>(
    writer: &mut W,
    outcomes: &[Arc<Outcome>],
    options: &ReportOptions,
) -> io::Result<usize> {
    write_line(
        writer,
        ["ENV", "SOURCE", "REQUIRED", "SENSITIVE", "STATUS", "DETAILS"],
    )?;
    let rules = [
        NAME_WIDTH,
        SOURCE_WIDTH,
        REQUIRED_WIDTH,
        SENSITIVE_WIDTH,
        STATUS_WIDTH,
        DETAILS_RULE_WIDTH,
    ]
    .map(|width| "-".repeat(width));
    write_line(writer, rules.each_ref().map(String::as_str))?;

    let mut failures = 0;
    for row in report_rows(outcomes, options) {
        if row.failure {
            failures += 1;
        }
        let status = row.status.to_string();
        write_line(
            writer,
            [
                row.name.as_str(),
                row.source.as_str(),
                yes_no(row.required),
                yes_no(row.sensitive),
                status.as_str(),
                row.details.as_str(),
            ],
        )?;
    }

    Ok(failures)
}

fn write_line<W: Write>(writer: &mut W, columns: [&str; 6]) -> io::Result<()> {
    let [name, source, required, sensitive, status, details] = columns;
    writeln!(
        writer,
        "{} {} {} {} {} {}",
        pad(name, NAME_WIDTH),
        pad(source, SOURCE_WIDTH),
        pad(required, REQUIRED_WIDTH),
        pad(sensitive, SENSITIVE_WIDTH),
        pad(status, STATUS_WIDTH),
        details
    )
}

/// Left-align `text` to `width` terminal columns. Longer text is left intact.
fn pad(text: &str, width: usize) -> String {
    let used = text.width();
    if used >= width {
        text.to_string()
    } else {
        format!("{text}{}", " ".repeat(width - used))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn preview(value: &str, sensitive: bool) -> String {
    if sensitive {
        return mask(value);
    }
    if value.chars().count() > PREVIEW_MAX_CHARS {
        let kept: String = value.chars().take(PREVIEW_KEEP_CHARS).collect();
        format!("{kept}...")
    } else {
        value.to_string()
    }
}

/// `••••` followed by the last four characters, or just `••••` for shorter values.
pub fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count < MASK_SUFFIX_CHARS {
        return MASK.to_string();
    }
    let suffix: String = value.chars().skip(count - MASK_SUFFIX_CHARS).collect();
    format!("{MASK}{suffix}")
}

/// Validator messages may echo the value; keep secrets out of them.
fn redact(text: &str, outcome: &Outcome) -> String {
    if outcome.is_sensitive() && !outcome.value.is_empty() {
        text.replace(&outcome.value, &mask(&outcome.value))
    } else {
        text.to_string()
    }
}

/// Why an entry failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Required and absent.
    Missing,
    /// Required and rejected by its validator.
    Invalid,
}

/// A required entry that blocks startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub name: String,
    pub kind: FailureKind,
}

/// Result of [`Registry::validate`](crate::Registry::validate).
#[derive(Debug)]
pub struct ValidationReport {
    /// Every outcome, sorted by name.
    pub outcomes: Vec<Arc<Outcome>>,
    /// Required entries that are missing or invalid, in name order.
    pub failures: Vec<Failure>,
}

impl ValidationReport {
    pub fn from_outcomes(outcomes: Vec<Arc<Outcome>>) -> Self {
        let failures = outcomes
            .iter()
            .filter(|outcome| outcome.is_failure())
            .map(|outcome| Failure {
                name: outcome.name().to_string(),
                kind: match outcome.status() {
                    Status::Missing => FailureKind::Missing,
                    _ => FailureKind::Invalid,
                },
            })
            .collect();
        Self { outcomes, failures }
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Render the table for these outcomes, see [`render_report`].
    pub fn render<W: Write>(&self, writer: &mut W, options: &ReportOptions) -> io::Result<usize> {
        render_report(writer, &self.outcomes, options)
    }

    /// Masked rows for these outcomes, see [`report_rows`].
    pub fn rows(&self, options: &ReportOptions) -> Vec<ReportRow> {
        report_rows(&self.outcomes, options)
    }
}
