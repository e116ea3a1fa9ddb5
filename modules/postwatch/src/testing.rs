// Test mocks for the watch pipeline.
//
// One mock per trait boundary:
// - MockTransport (PageTransport): HashMap-based URL→response, records requests
// - MemoryStateStore (StateStore): in-memory record with injectable IO failures
// - MockNotifier (NotifyBackend): records payloads, optionally fails delivery

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::WatchError;
use crate::fetcher::{PageResponse, PageTransport};
use crate::notify::backend::NotifyBackend;
use crate::state::StateStore;
use crate::types::{CheckState, NotificationPayload};

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// Unregistered URLs fail as transport errors.
pub struct MockTransport {
    responses: HashMap<String, std::result::Result<PageResponse, String>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on(mut self, url: &str, response: PageResponse) -> Self {
        self.responses.insert(url.to_string(), Ok(response));
        self
    }

    pub fn on_error(mut self, url: &str, message: &str) -> Self {
        self.responses
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    /// Every URL requested, in order.
    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        self.requests.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<PageResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(Ok(resp)) => Ok(resp.clone()),
            Some(Err(msg)) => Err(anyhow!("{msg}")),
            None => Err(anyhow!("no mock registered for {url}")),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStateStore
// ---------------------------------------------------------------------------

pub struct MemoryStateStore {
    state: Arc<Mutex<Option<CheckState>>>,
    saves: Arc<AtomicUsize>,
    fail_load: bool,
    fail_save: bool,
}

impl MemoryStateStore {
    /// No prior record.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
            saves: Arc::new(AtomicUsize::new(0)),
            fail_load: false,
            fail_save: false,
        }
    }

    pub fn with_state(last_shortcode: &str) -> Self {
        let store = Self::new();
        *store.state.lock().unwrap() = Some(CheckState {
            last_shortcode: last_shortcode.to_string(),
        });
        store
    }

    pub fn unreadable() -> Self {
        Self {
            fail_load: true,
            ..Self::new()
        }
    }

    pub fn unwritable(last_shortcode: &str) -> Self {
        Self {
            fail_save: true,
            ..Self::with_state(last_shortcode)
        }
    }

    /// Shared view of the stored record.
    pub fn handle(&self) -> Arc<Mutex<Option<CheckState>>> {
        self.state.clone()
    }

    pub fn save_count(&self) -> Arc<AtomicUsize> {
        self.saves.clone()
    }

    fn io_error(message: &str) -> WatchError {
        WatchError::StateIo {
            path: PathBuf::from("<memory>"),
            message: message.to_string(),
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_state(&self) -> crate::error::Result<CheckState> {
        if self.fail_load {
            return Err(Self::io_error("simulated read failure"));
        }
        Ok(self.state.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save_state(&self, state: &CheckState) -> crate::error::Result<()> {
        if self.fail_save {
            return Err(Self::io_error("simulated write failure"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockNotifier
// ---------------------------------------------------------------------------

pub struct MockNotifier {
    sent: Arc<Mutex<Vec<NotificationPayload>>>,
    fail_status: Option<u16>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_status: None,
        }
    }

    /// Records the attempt, then rejects it with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::new()
        }
    }

    /// Every payload handed to the backend, delivered or not.
    pub fn sent(&self) -> Arc<Mutex<Vec<NotificationPayload>>> {
        self.sent.clone()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifyBackend for MockNotifier {
    async fn send(&self, payload: &NotificationPayload) -> crate::error::Result<()> {
        self.sent.lock().unwrap().push(payload.clone());
        match self.fail_status {
            Some(status) => Err(WatchError::NotifyDeliveryFailed(format!(
                "Webhook error (status {status})"
            ))),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
