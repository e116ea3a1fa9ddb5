pub mod error;

pub use error::{IftttError, Result};

use serde::Serialize;

const BASE_URL: &str = "https://maker.ifttt.com";

/// The three free-form ingredient slots a Maker webhook accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebhookValues {
    pub value1: String,
    pub value2: String,
    pub value3: String,
}

pub struct IftttClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl IftttClient {
    pub fn new(key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            key,
        }
    }

    /// Point the client at a different host (local relays, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn trigger_url(&self, event: &str) -> String {
        format!("{}/trigger/{}/with/key/{}", self.base_url, event, self.key)
    }

    /// Fire a webhook event once. Non-2xx responses become `IftttError::Api`
    /// carrying the response body.
    pub async fn trigger(&self, event: &str, values: &WebhookValues) -> Result<()> {
        tracing::debug!(event, key = %redact(&self.key), "Triggering IFTTT webhook");

        let resp = self
            .client
            .post(self.trigger_url(event))
            .json(values)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IftttError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }
}

/// Short, log-safe preview of a webhook key.
pub fn redact(key: &str) -> String {
    let n = key.chars().count().min(4);
    let prefix: String = key.chars().take(n).collect();
    format!("{}...({} chars)", prefix, key.chars().count())
}
