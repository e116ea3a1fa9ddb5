use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Result, WatchError};
use crate::types::CheckState;

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_PATH: &str = "last_seen.json";

/// Durable last-seen marker.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Missing state is a first run, not an error.
    async fn load_state(&self) -> Result<CheckState>;

    /// Replaces the whole record; readers never observe a partial write.
    async fn save_state(&self, state: &CheckState) -> Result<()>;
}

/// `{"last_shortcode": "..."}` on disk.
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, message: impl std::fmt::Display) -> WatchError {
        WatchError::StateIo {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_STATE_PATH.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load_state(&self) -> Result<CheckState> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file yet, treating as first run");
                return Ok(CheckState::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let state: CheckState =
            serde_json::from_str(&raw).map_err(|e| self.io_error(format!("malformed: {e}")))?;
        debug!(last_shortcode = state.last_shortcode.as_str(), "Loaded state");
        Ok(state)
    }

    async fn save_state(&self, state: &CheckState) -> Result<()> {
        let json = serde_json::to_string(state).map_err(|e| self.io_error(e))?;

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            last_shortcode = state.last_shortcode.as_str(),
            "Saved state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("last_seen.json"));

        let state = store.load_state().await.unwrap();
        assert_eq!(state.last_shortcode, "");
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_seen.json");
        let store = JsonFileStateStore::new(&path);

        store
            .save_state(&CheckState {
                last_shortcode: "XYZ99".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"last_shortcode":"XYZ99"}"#
        );
        assert_eq!(store.load_state().await.unwrap().last_shortcode, "XYZ99");
        assert!(!store.temp_path().exists(), "temp file should be renamed away");
    }

    #[tokio::test]
    async fn save_overwrites_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_seen.json");
        std::fs::write(&path, r#"{"last_shortcode":"OLD_LONGER_CODE","extra":true}"#).unwrap();
        let store = JsonFileStateStore::new(&path);

        store
            .save_state(&CheckState {
                last_shortcode: "NEW01".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"last_shortcode":"NEW01"}"#
        );
    }

    #[tokio::test]
    async fn unknown_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_seen.json");
        std::fs::write(&path, r#"{"last_shortcode":"ABC12","checked_at":"x"}"#).unwrap();

        let state = JsonFileStateStore::new(&path).load_state().await.unwrap();
        assert_eq!(state.last_shortcode, "ABC12");
    }

    #[tokio::test]
    async fn malformed_file_is_state_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_seen.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileStateStore::new(&path).load_state().await.unwrap_err();
        assert!(matches!(err, WatchError::StateIo { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn unwritable_location_is_state_io() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("missing-dir").join("state.json"));

        let err = store.save_state(&CheckState::default()).await.unwrap_err();
        assert!(matches!(err, WatchError::StateIo { .. }), "{err:?}");
    }
}
