use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use crate::extractor::{excerpt, IdentifierExtractor};
use crate::fetcher::ProfileFetcher;
use crate::notify::Notifier;
use crate::state::StateStore;
use crate::types::{CheckState, NotificationPayload, RunOutcome};

/// Characters of page content logged when no identifier is found.
const DIAGNOSTIC_EXCERPT_CHARS: usize = 300;

/// One profile check: jitter, fetch, extract, compare, notify, persist.
pub struct ProfileWatcher {
    config: WatchConfig,
    fetcher: ProfileFetcher,
    extractor: IdentifierExtractor,
    store: Box<dyn StateStore>,
    notifier: Notifier,
}

impl ProfileWatcher {
    pub fn new(
        config: WatchConfig,
        fetcher: ProfileFetcher,
        extractor: IdentifierExtractor,
        store: Box<dyn StateStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            fetcher,
            extractor,
            store,
            notifier,
        }
    }

    /// Run once. Every failure is logged and folded into the outcome.
    pub async fn run(&self) -> RunOutcome {
        match self.run_inner().await {
            Ok(outcome) => outcome,
            Err(WatchError::FetchUnavailable { failures }) => {
                warn!(attempts = failures.len(), "Skipped this run, every source failed");
                RunOutcome::Unavailable
            }
            Err(WatchError::NoIdentifierFound { .. }) => RunOutcome::NoIdentifier,
            Err(e) => {
                error!(error = %e, "Run aborted");
                RunOutcome::Aborted(e.to_string())
            }
        }
    }

    async fn run_inner(&self) -> Result<RunOutcome> {
        let profile = self.config.profile_name.as_str();

        self.config.jitter.wait().await;

        let state = self.store.load_state().await?;

        let page = self.fetcher.fetch_profile_page(profile).await?;

        let Some(found) = self.extractor.extract_match(&page.body) else {
            warn!(
                profile,
                source = page.source.as_str(),
                url = page.url.as_str(),
                excerpt = %excerpt(&page.body, DIAGNOSTIC_EXCERPT_CHARS),
                "No shortcode found, layout may have changed"
            );
            return Err(WatchError::NoIdentifierFound {
                source_name: page.source,
            });
        };
        let shortcode = found.shortcode;
        info!(
            profile,
            shortcode = %shortcode,
            pattern = found.pattern.as_str(),
            source = page.source.as_str(),
            url = page.url.as_str(),
            "Extracted shortcode"
        );

        if state.is_same_post(&shortcode) {
            info!(shortcode = %shortcode, "No change");
            return Ok(RunOutcome::Unchanged(shortcode));
        }

        let payload = NotificationPayload::new(shortcode.clone(), Utc::now());
        info!(
            previous = state.last_shortcode.as_str(),
            post_url = payload.post_url.as_str(),
            "New post detected"
        );

        let delivered = self.notifier.notify(&payload).await;

        // State advances whether or not delivery succeeded.
        self.store.save_state(&CheckState::seen(&shortcode)).await?;

        Ok(RunOutcome::NewPost {
            shortcode,
            delivered,
        })
    }
}
