//! Default configuration values shared by the daemon and its tests.

use ferry_protocol::Severity;

use crate::logging::LogFormat;

/// Default telemetry filter expression.
///
/// Telemetry shares stderr with protocol error envelopes, so the default
/// stays quiet; operators opt in via `FERRYD_LOG_FILTER`.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default telemetry filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default telemetry output format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default minimum severity for protocol log envelopes.
#[must_use]
pub fn default_severity_threshold() -> Severity {
    Severity::Info
}
