//! Log severity levels and threshold ordering.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Severity attached to protocol log envelopes.
///
/// Levels are ordered most to least severe; a lower rank means a more
/// important message. A message is emitted when its rank does not exceed the
/// configured threshold's rank.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    /// Unrecoverable faults.
    Fatal,
    /// Errors reported on the error channel.
    Error,
    /// Degraded but functional conditions.
    Warn,
    /// Routine lifecycle messages.
    #[default]
    Info,
    /// Diagnostic detail for controllers.
    Debug,
    /// High-volume tracing detail.
    Trace,
}

/// Errors encountered while parsing a [`Severity`] from text.
pub type SeverityParseError = strum::ParseError;

impl Severity {
    /// Numeric rank of the level; `fatal` is 0, `trace` is 5.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Fatal => 0,
            Self::Error => 1,
            Self::Warn => 2,
            Self::Info => 3,
            Self::Debug => 4,
            Self::Trace => 5,
        }
    }

    /// Whether a message at this severity passes the given threshold.
    #[must_use]
    pub const fn enabled_at(self, threshold: Self) -> bool {
        self.rank() <= threshold.rank()
    }
}
