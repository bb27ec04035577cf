//! Environment variables read by envreq itself.

/// Include value previews in reports: `1`, `true`, `yes` or `on`.
/// Sensitive values are still masked down to their last four characters.
pub const SHOW_VALUES: &str = "ENVREQ_SHOW_VALUES";

/// Log filter directive, e.g. `envreq=debug`.
pub const LOG: &str = "ENVREQ_LOG";

/// Log output format: `pretty` (default) or `json`.
pub const LOG_FORMAT: &str = "ENVREQ_LOG_FORMAT";

/// Default manifest path for the `envreq` binary.
pub const MANIFEST: &str = "ENVREQ_MANIFEST";
