use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use ifttt_client::WebhookValues;
use serde::{Deserialize, Serialize};

/// Canonical permalink prefix for a post.
pub const POST_URL_BASE: &str = "https://www.instagram.com/p/";

/// Minimum token length accepted as a post identifier.
pub const MIN_SHORTCODE_LEN: usize = 5;

/// Opaque post identifier from the site's `/p/<shortcode>/` URL scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcode(String);

impl Shortcode {
    /// Accepts 5+ characters from `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() >= MIN_SHORTCODE_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn post_url(&self) -> String {
        format!("{POST_URL_BASE}{}/", self.0)
    }
}

impl fmt::Display for Shortcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted last-seen marker. An empty string means nothing seen yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckState {
    #[serde(default)]
    pub last_shortcode: String,
}

impl CheckState {
    pub fn seen(shortcode: &Shortcode) -> Self {
        Self {
            last_shortcode: shortcode.as_str().to_string(),
        }
    }

    pub fn is_same_post(&self, shortcode: &Shortcode) -> bool {
        self.last_shortcode == shortcode.as_str()
    }
}

/// What gets sent for a newly detected post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub shortcode: Shortcode,
    pub detected_at: DateTime<Utc>,
    pub post_url: String,
}

impl NotificationPayload {
    pub fn new(shortcode: Shortcode, detected_at: DateTime<Utc>) -> Self {
        let post_url = shortcode.post_url();
        Self {
            shortcode,
            detected_at,
            post_url,
        }
    }

    /// Wire shape: identifier, ISO-8601 detection time (millis, `Z`), permalink.
    pub fn webhook_values(&self) -> WebhookValues {
        WebhookValues {
            value1: self.shortcode.to_string(),
            value2: self
                .detected_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            value3: self.post_url.clone(),
        }
    }
}

/// How a single invocation ended. None of these are process failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Primary and mirrors all failed; state untouched.
    Unavailable,
    /// Page fetched but no identifier matched; state untouched.
    NoIdentifier,
    Unchanged(Shortcode),
    NewPost {
        shortcode: Shortcode,
        delivered: bool,
    },
    /// State could not be read or written.
    Aborted(String),
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "outcome=unavailable"),
            Self::NoIdentifier => write!(f, "outcome=no_identifier"),
            Self::Unchanged(code) => write!(f, "outcome=unchanged shortcode={code}"),
            Self::NewPost {
                shortcode,
                delivered,
            } => write!(
                f,
                "outcome=new_post shortcode={shortcode} delivered={delivered}"
            ),
            Self::Aborted(reason) => write!(f, "outcome=aborted reason={reason}"),
        }
    }
}
