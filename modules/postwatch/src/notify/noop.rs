use async_trait::async_trait;

use super::backend::NotifyBackend;
use crate::error::Result;
use crate::types::NotificationPayload;

/// Stand-in used when no webhook key is configured.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn send(&self, _payload: &NotificationPayload) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
