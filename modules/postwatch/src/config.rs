use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::fetcher::{default_mirrors, primary_source, PageSource};
use crate::jitter::Jitter;
use crate::state::DEFAULT_STATE_PATH;

pub const DEFAULT_NOTIFY_EVENT: &str = "britney_post";
pub const DEFAULT_PROFILE_NAME: &str = "britneyspears";
const DEFAULT_JITTER_MIN_SECS: u64 = 5;
const DEFAULT_JITTER_MAX_SECS: u64 = 25;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Webhook
    pub notify_key: Option<String>,
    pub notify_event: String,

    // Target
    pub profile_name: String,
    pub mirrors: Vec<PageSource>,
    pub fetch_timeout: Duration,

    // Run
    pub state_path: PathBuf,
    pub jitter: Jitter,
}

/// The slice of configuration the watcher itself needs.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub profile_name: String,
    pub jitter: Jitter,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unusable values are logged and replaced by their defaults, so a bad
    /// variable never stops the run.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jitter_min = parse_secs(&lookup, "JITTER_MIN_SECS", DEFAULT_JITTER_MIN_SECS);
        let jitter_max = parse_secs(&lookup, "JITTER_MAX_SECS", DEFAULT_JITTER_MAX_SECS);
        let jitter = Jitter::new(jitter_min, jitter_max).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring jitter settings, using defaults");
            default_jitter()
        });

        let mirrors = match lookup("PROFILE_MIRRORS") {
            Some(raw) => parse_mirrors(&raw),
            None => default_mirrors(),
        };

        Self {
            notify_key: non_empty("NOTIFY_KEY"),
            notify_event: non_empty("NOTIFY_EVENT")
                .unwrap_or_else(|| DEFAULT_NOTIFY_EVENT.to_string()),
            profile_name: non_empty("PROFILE_NAME")
                .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
            mirrors,
            fetch_timeout: parse_secs(&lookup, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS),
            state_path: non_empty("STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            jitter,
        }
    }

    /// Primary source followed by the configured mirrors.
    pub fn sources(&self) -> Vec<PageSource> {
        let mut sources = vec![primary_source()];
        sources.extend(self.mirrors.iter().cloned());
        sources
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            profile_name: self.profile_name.clone(),
            jitter: self.jitter,
        }
    }

    pub fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  NOTIFY_KEY: {}",
            self.notify_key
                .as_deref()
                .map(ifttt_client::redact)
                .unwrap_or_else(|| "<not set>".to_string())
        );
        tracing::info!("  NOTIFY_EVENT: {}", self.notify_event);
        tracing::info!("  PROFILE_NAME: {}", self.profile_name);
        tracing::info!("  STATE_PATH: {}", self.state_path.display());
        tracing::info!("  mirrors: {}", self.mirrors.len());
    }
}

fn default_jitter() -> Jitter {
    Jitter::new(
        Duration::from_secs(DEFAULT_JITTER_MIN_SECS),
        Duration::from_secs(DEFAULT_JITTER_MAX_SECS),
    )
    .unwrap_or_else(|_| Jitter::none())
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Duration {
    let Some(raw) = lookup(key) else {
        return Duration::from_secs(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => {
            warn!(
                key,
                value = raw.as_str(),
                default,
                "Not a whole number of seconds, using default"
            );
            Duration::from_secs(default)
        }
    }
}

/// Comma-separated URL templates, each containing `{profile}`. Templates
/// without the placeholder are skipped.
fn parse_mirrors(raw: &str) -> Vec<PageSource> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|template| {
            let usable = template.contains("{profile}");
            if !usable {
                warn!(
                    template = *template,
                    "Mirror template has no {{profile}} placeholder, skipping"
                );
            }
            usable
        })
        .enumerate()
        .map(|(i, template)| PageSource::new(&format!("mirror-{}", i + 1), template))
        .collect()
}
