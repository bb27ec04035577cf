#![allow(dead_code)]

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_test_logging() {
    let _ = fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected to find '{needle}' in output, got: {haystack}"
    );
}

pub fn assert_not_contains(haystack: &str, needle: &str) {
    assert!(
        !haystack.contains(needle),
        "Did not expect '{needle}' in output, got: {haystack}"
    );
}

pub fn write_manifest(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create manifest");
    file.write_all(content.as_bytes())
        .expect("Failed to write manifest");
    file
}

/// `envreq` with a scrubbed environment: only `vars` plus PATH are visible.
pub fn envreq(vars: &[(&str, &str)]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_envreq"));
    cmd.env_clear();
    if let Some(path) = std::env::var_os("PATH") {
        cmd.env("PATH", path);
    }
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd
}

pub fn run(cmd: &mut Command) -> (Output, String, String) {
    let output = cmd.output().expect("Failed to run envreq");
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    (output, stdout, stderr)
}

#[macro_export]
macro_rules! test_log {
    ($($arg:tt)*) => {
        tracing::info!(target: "test", $($arg)*);
    };
}
