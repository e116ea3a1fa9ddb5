use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CACHE_CONTROL};
use tracing::{info, warn};

use crate::error::{SourceAttempt, SourceFailure, WatchError};

/// Desktop Chrome signature; bare clients get the login wall far more often.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

pub const PRIMARY_TEMPLATE: &str = "https://www.instagram.com/{profile}/";
pub const MIRROR_A_TEMPLATE: &str = "https://r.jina.ai/http://www.instagram.com/{profile}/";
pub const MIRROR_B_TEMPLATE: &str =
    "https://api.allorigins.win/raw?url=https://www.instagram.com/{profile}/";

/// Substrings that show a body carries real profile content.
pub const DEFAULT_CONTENT_MARKERS: &[&str] = &["shortcode", "/p/", r"\/p\/"];

// --- Sources ---

/// One place the profile page can be read from. `{profile}` in the template
/// is replaced with the profile name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    pub name: String,
    pub url_template: String,
}

impl PageSource {
    pub fn new(name: &str, url_template: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
        }
    }

    pub fn url_for(&self, profile: &str) -> String {
        self.url_template.replace("{profile}", profile)
    }
}

pub fn primary_source() -> PageSource {
    PageSource::new("instagram", PRIMARY_TEMPLATE)
}

pub fn default_mirrors() -> Vec<PageSource> {
    vec![
        PageSource::new("jina-mirror", MIRROR_A_TEMPLATE),
        PageSource::new("allorigins-mirror", MIRROR_B_TEMPLATE),
    ]
}

/// Primary first, then mirrors in priority order.
pub fn default_sources() -> Vec<PageSource> {
    let mut sources = vec![primary_source()];
    sources.extend(default_mirrors());
    sources
}

// --- Transport ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Plain GET. An `Err` means no response at all; HTTP error statuses come
/// back as `Ok` with the status set.
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<PageResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<PageResponse> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .context("Failed to read response body")?;
        Ok(PageResponse { status, body })
    }
}

// --- Fetcher ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub source: String,
    pub url: String,
    pub body: String,
}

pub type FetchResult = std::result::Result<FetchedPage, WatchError>;

/// Walks the source list once, in order, returning the first page that
/// passes the success check.
pub struct ProfileFetcher {
    sources: Vec<PageSource>,
    transport: Box<dyn PageTransport>,
    content_markers: Vec<String>,
}

impl ProfileFetcher {
    pub fn new(transport: Box<dyn PageTransport>, sources: Vec<PageSource>) -> Self {
        Self {
            sources,
            transport,
            content_markers: DEFAULT_CONTENT_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    /// Empty list turns the content check off; any 2xx body is accepted.
    pub fn with_content_markers(mut self, markers: Vec<String>) -> Self {
        self.content_markers = markers;
        self
    }

    pub async fn fetch_profile_page(&self, profile: &str) -> FetchResult {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let url = source.url_for(profile);
            info!(source = source.name.as_str(), url = url.as_str(), "Fetching profile page");

            let failure = match self.transport.get(&url).await {
                Ok(resp) => match self.accept(resp) {
                    Ok(body) => {
                        info!(
                            source = source.name.as_str(),
                            bytes = body.len(),
                            "Profile page fetched"
                        );
                        return Ok(FetchedPage {
                            source: source.name.clone(),
                            url,
                            body,
                        });
                    }
                    Err(failure) => failure,
                },
                Err(e) => SourceFailure::Transport(format!("{e:#}")),
            };

            warn!(
                source = source.name.as_str(),
                failure = %failure,
                retryable = failure.is_retryable(),
                "Source failed, falling through"
            );
            failures.push(SourceAttempt {
                source: source.name.clone(),
                failure,
            });
        }

        Err(WatchError::FetchUnavailable { failures })
    }

    fn accept(&self, resp: PageResponse) -> std::result::Result<String, SourceFailure> {
        if !resp.is_success() {
            return Err(SourceFailure::Status(resp.status));
        }
        if self.content_markers.is_empty() || self.has_marker(&resp.body) {
            Ok(resp.body)
        } else {
            Err(SourceFailure::EmptyShell)
        }
    }

    fn has_marker(&self, body: &str) -> bool {
        self.content_markers
            .iter()
            .any(|marker| body.contains(marker.as_str()))
    }
}
