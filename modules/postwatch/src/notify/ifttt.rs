use async_trait::async_trait;
use ifttt_client::IftttClient;

use super::backend::NotifyBackend;
use crate::error::Result;
use crate::types::NotificationPayload;

/// IFTTT Maker webhook backend.
pub struct IftttBackend {
    client: IftttClient,
    event: String,
}

impl IftttBackend {
    pub fn new(key: String, event: String) -> Self {
        Self {
            client: IftttClient::new(key),
            event,
        }
    }

    pub fn with_client(client: IftttClient, event: String) -> Self {
        Self { client, event }
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}

#[async_trait]
impl NotifyBackend for IftttBackend {
    async fn send(&self, payload: &NotificationPayload) -> Result<()> {
        self.client
            .trigger(&self.event, &payload.webhook_values())
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ifttt"
    }
}
