//! Typed errors for a watch run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single page source did not yield usable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFailure {
    /// Non-2xx response.
    Status(u16),
    /// 2xx response whose body carries none of the content markers
    /// (login wall, interstitial).
    EmptyShell,
    /// Request never produced a response.
    Transport(String),
}

impl SourceFailure {
    /// Blocked, rate-limited or server-side failure. Other failures still
    /// fall through to the next source; this only shapes the log line.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status(401 | 403 | 429 | 500))
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::EmptyShell => write!(f, "no recognizable content"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

/// One failed attempt against a named source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    pub source: String,
    pub failure: SourceFailure,
}

impl fmt::Display for SourceAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.failure)
    }
}

#[derive(Debug, Error)]
pub enum WatchError {
    /// Primary and every mirror failed.
    #[error("profile page unavailable ({})", join_attempts(.failures))]
    FetchUnavailable { failures: Vec<SourceAttempt> },

    /// Every extraction pattern missed.
    #[error("no post identifier found in page from {source_name}")]
    NoIdentifierFound { source_name: String },

    #[error("notification delivery failed: {0}")]
    NotifyDeliveryFailed(String),

    #[error("state file {}: {message}", .path.display())]
    StateIo { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ifttt_client::IftttError> for WatchError {
    fn from(err: ifttt_client::IftttError) -> Self {
        WatchError::NotifyDeliveryFailed(err.to_string())
    }
}

fn join_attempts(failures: &[SourceAttempt]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, WatchError>;
