//! EventApi trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::PollError;

/// What one page request produced
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    /// The precondition matched; nothing changed since the stored etag
    NotModified,
    /// Raw envelopes, newest first
    Fresh(Vec<Value>),
}

/// One page of a source feed plus its response metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub body: PageBody,
    /// Entity tag of this response
    pub etag: Option<String>,
    /// Server poll-interval hint in seconds
    pub poll_interval: Option<u64>,
    /// URL of the next (older) page
    pub next: Option<String>,
}

impl PageResponse {
    pub fn fresh(envelopes: Vec<Value>) -> Self {
        Self {
            body: PageBody::Fresh(envelopes),
            etag: None,
            poll_interval: None,
            next: None,
        }
    }

    pub fn not_modified() -> Self {
        Self {
            body: PageBody::NotModified,
            etag: None,
            poll_interval: None,
            next: None,
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval = Some(secs);
        self
    }

    pub fn with_next(mut self, url: impl Into<String>) -> Self {
        self.next = Some(url.into());
        self
    }
}

/// Read-only access to an activity-feed API
///
/// Implementations perform exactly one HTTP exchange per call. Cursor logic,
/// pagination policy and retry cadence belong to the poller.
#[async_trait]
pub trait EventApi: Send + Sync {
    /// Fetch one page
    ///
    /// `url` is either an endpoint path (`/orgs/x/events`) or an absolute
    /// next-page URL taken from a previous response. `etag`, when given, is sent
    /// as the `If-None-Match` precondition.
    async fn fetch_page(&self, url: &str, etag: Option<&str>) -> Result<PageResponse, PollError>;

    /// Login of the user the credentials belong to
    async fn current_user(&self) -> Result<String, PollError>;
}
