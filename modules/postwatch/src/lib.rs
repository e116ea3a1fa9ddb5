pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod jitter;
pub mod notify;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;
pub mod watcher;

pub use config::{Config, WatchConfig};
pub use error::{Result, WatchError};
pub use types::{CheckState, NotificationPayload, RunOutcome, Shortcode};
pub use watcher::ProfileWatcher;
