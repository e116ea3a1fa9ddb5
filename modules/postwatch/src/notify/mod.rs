pub mod backend;
pub mod ifttt;
pub mod noop;

use tracing::{info, warn};

use crate::types::NotificationPayload;
use backend::NotifyBackend;

/// Single-attempt, best-effort delivery. Never fails the run.
pub struct Notifier {
    backend: Box<dyn NotifyBackend>,
}

impl Notifier {
    pub fn new(backend: Box<dyn NotifyBackend>) -> Self {
        Self { backend }
    }

    /// Returns whether the webhook accepted the payload. Disabled backends
    /// and delivery failures both report `false`.
    pub async fn notify(&self, payload: &NotificationPayload) -> bool {
        if !self.backend.is_enabled() {
            info!(
                backend = self.backend.name(),
                shortcode = %payload.shortcode,
                "Notifications disabled, skipping delivery"
            );
            return false;
        }

        match self.backend.send(payload).await {
            Ok(()) => {
                info!(
                    backend = self.backend.name(),
                    shortcode = %payload.shortcode,
                    "Notification delivered"
                );
                true
            }
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    shortcode = %payload.shortcode,
                    error = %e,
                    "Notification failed, not retrying"
                );
                false
            }
        }
    }
}
