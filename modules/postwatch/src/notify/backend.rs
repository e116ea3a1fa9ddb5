use async_trait::async_trait;

use crate::error::Result;
use crate::types::NotificationPayload;

/// Pluggable webhook target for new-post notifications.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// One delivery attempt. No retries.
    async fn send(&self, payload: &NotificationPayload) -> Result<()>;

    fn name(&self) -> &str;

    /// `false` when no credential is configured.
    fn is_enabled(&self) -> bool {
        true
    }
}
