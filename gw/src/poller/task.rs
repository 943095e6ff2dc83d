//! SourcePoller - incremental polling of one feed

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::{EventApi, PageBody, PollError, ResolvedSource, SourceCursor};
use crate::config::PollConfig;
use crate::event::{Event, decode_batch, envelope_id};

/// What a poller reports after one cycle
#[derive(Debug, Clone)]
pub struct PollBatch {
    /// Textual descriptor of the originating source
    pub source: String,
    /// New events, oldest first
    pub events: Vec<Event>,
    /// Set when the cycle failed; `events` is empty then
    pub error: Option<PollError>,
}

impl PollBatch {
    pub fn ok(source: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            source: source.into(),
            events,
            error: None,
        }
    }

    pub fn failed(source: impl Into<String>, error: PollError) -> Self {
        Self {
            source: source.into(),
            events: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Polls one source forever, delivering only events it has not delivered before
pub struct SourcePoller {
    source: ResolvedSource,
    api: Arc<dyn EventApi>,
    cursor: SourceCursor,
    count: usize,
    min_interval_secs: u64,
}

impl SourcePoller {
    pub fn new(source: ResolvedSource, api: Arc<dyn EventApi>, config: &PollConfig) -> Self {
        debug!(source = %source.descriptor, path = %source.path, "SourcePoller::new: called");
        let min_interval_secs = config.min_interval_secs.max(1);
        Self {
            source,
            api,
            cursor: SourceCursor::new(config.default_interval_secs.max(min_interval_secs)),
            count: config.count.max(1),
            min_interval_secs,
        }
    }

    pub fn source_id(&self) -> String {
        self.source.id()
    }

    pub fn cursor(&self) -> &SourceCursor {
        &self.cursor
    }

    /// Seconds until the next cycle
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.cursor.poll_interval_secs)
    }

    /// Run one poll cycle
    ///
    /// The cursor is committed only when the whole cycle succeeds; on error it
    /// is left exactly as it was so the next cycle retries the same request.
    pub async fn poll_cycle(&mut self) -> PollBatch {
        let source_id = self.source_id();
        debug!(source = %source_id, cursor = ?self.cursor, "poll_cycle: called");

        let mut working = self.cursor.clone();
        match self.fetch_new(&mut working).await {
            Ok(events) => {
                debug!(source = %source_id, count = events.len(), last_seen_id = ?working.last_seen_id, "poll_cycle: success");
                self.cursor = working;
                PollBatch::ok(source_id, events)
            }
            Err(e) => {
                warn!(source = %source_id, error = %e, retryable = e.is_retryable(), "poll_cycle: failed");
                PollBatch::failed(source_id, e)
            }
        }
    }

    async fn fetch_new(&self, working: &mut SourceCursor) -> Result<Vec<Event>, PollError> {
        let raw = self.fetch_pages(working).await?;
        let fresh = self.filter_seen(working, raw);

        let mut events = decode_batch(fresh);
        events.reverse();
        Ok(events)
    }

    /// Fetch pages newest-first until the seen boundary, the count, or the last page
    async fn fetch_pages(&self, working: &mut SourceCursor) -> Result<Vec<Value>, PollError> {
        let mut raw: Vec<Value> = Vec::new();
        let mut first = true;
        working.next_page_url = Some(self.source.path.clone());

        while let Some(url) = working.next_page_url.take() {
            let precondition = if first { working.etag.clone() } else { None };
            let page = self.api.fetch_page(&url, precondition.as_deref()).await?;

            if first {
                working.apply_interval(page.poll_interval, self.min_interval_secs);
            }

            let envelopes = match page.body {
                PageBody::NotModified => {
                    debug!(%url, "fetch_pages: not modified");
                    break;
                }
                PageBody::Fresh(envelopes) => envelopes,
            };

            if first && page.etag.is_some() {
                working.etag = page.etag;
            }
            first = false;

            let crossed = working
                .last_seen_id
                .as_deref()
                .is_some_and(|seen| envelopes.iter().any(|e| envelope_id(e) == Some(seen)));
            let empty = envelopes.is_empty();
            raw.extend(envelopes);

            if crossed || empty || raw.len() >= self.count {
                debug!(%url, crossed, empty, fetched = raw.len(), "fetch_pages: stopping");
                break;
            }
            working.next_page_url = page.next;
        }

        working.next_page_url = None;
        Ok(raw)
    }

    /// Cut the newest-first list at the last-seen id, cap it at the count, advance the cursor
    fn filter_seen(&self, working: &mut SourceCursor, mut raw: Vec<Value>) -> Vec<Value> {
        if let Some(seen) = working.last_seen_id.as_deref()
            && let Some(idx) = raw.iter().position(|e| envelope_id(e) == Some(seen))
        {
            raw.truncate(idx);
        }
        raw.truncate(self.count);

        if let Some(newest) = raw.iter().find_map(envelope_id) {
            working.last_seen_id = Some(newest.to_string());
        }
        raw
    }

    /// Poll until shutdown or until the receiving side goes away
    pub async fn run(mut self, tx: mpsc::Sender<PollBatch>, mut shutdown: watch::Receiver<bool>) {
        let source_id = self.source_id();
        info!(source = %source_id, "SourcePoller::run: starting");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let batch = tokio::select! {
                batch = self.poll_cycle() => batch,
                _ = shutdown.changed() => break,
            };

            tokio::select! {
                sent = tx.send(batch) => {
                    if sent.is_err() {
                        debug!(source = %source_id, "run: merger gone");
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }

            let interval = self.interval();
            debug!(source = %source_id, ?interval, "run: sleeping");
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(source = %source_id, "SourcePoller::run: stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::client::mock::MockEventApi;
    use crate::poller::{PageResponse, SourceDescriptor};
    use serde_json::json;

    fn envelope(id: &str, minute: u32) -> Value {
        json!({
            "id": id,
            "type": "WatchEvent",
            "actor": {"login": "octocat"},
            "repo": {"name": "octo/hello"},
            "created_at": format!("2024-03-01T12:{:02}:00Z", minute),
            "payload": {"action": "started"},
        })
    }

    fn poller(api: Arc<MockEventApi>, count: usize) -> SourcePoller {
        let source = SourceDescriptor::repo("octo/hello").unwrap().resolve(None).unwrap();
        let config = PollConfig {
            count,
            ..PollConfig::default()
        };
        SourcePoller::new(source, api, &config)
    }

    fn ids(batch: &PollBatch) -> Vec<&str> {
        batch.events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_cuts_at_last_seen_id() {
        let api = Arc::new(MockEventApi::new(vec![
            Ok(PageResponse::fresh(vec![envelope("E3", 8)]).with_etag("\"1\"")),
            Ok(PageResponse::fresh(vec![envelope("E5", 10), envelope("E4", 9), envelope("E3", 8)]).with_etag("\"2\"")),
        ]));
        let mut p = poller(api.clone(), 30);

        let first = p.poll_cycle().await;
        assert_eq!(ids(&first), vec!["E3"]);
        assert_eq!(p.cursor().last_seen_id.as_deref(), Some("E3"));

        let second = p.poll_cycle().await;
        assert!(second.error.is_none());
        // Delivered oldest first
        assert_eq!(ids(&second), vec!["E4", "E5"]);
        assert_eq!(p.cursor().last_seen_id.as_deref(), Some("E5"));
        assert_eq!(p.cursor().etag.as_deref(), Some("\"2\""));
        assert_eq!(p.cursor().next_page_url, None);
    }

    #[tokio::test]
    async fn test_not_modified_preserves_cursor() {
        let api = Arc::new(MockEventApi::new(vec![
            Ok(PageResponse::fresh(vec![envelope("E1", 1)])
                .with_etag("\"a\"")
                .with_poll_interval(60)),
            Ok(PageResponse::not_modified().with_poll_interval(120)),
        ]));
        let mut p = poller(api.clone(), 30);

        p.poll_cycle().await;
        let before = p.cursor().clone();

        let batch = p.poll_cycle().await;
        assert!(batch.events.is_empty());
        assert!(batch.error.is_none());
        assert_eq!(p.cursor().etag, before.etag);
        assert_eq!(p.cursor().last_seen_id, before.last_seen_id);
        assert_eq!(p.cursor().poll_interval_secs, 120);

        let requests = api.requests();
        assert_eq!(requests[0].etag, None);
        assert_eq!(requests[1].etag.as_deref(), Some("\"a\""));
    }

    #[tokio::test]
    async fn test_error_leaves_cursor_untouched() {
        let api = Arc::new(MockEventApi::new(vec![
            Ok(PageResponse::fresh(vec![envelope("E1", 1)]).with_etag("\"a\"")),
            Err(PollError::Api {
                status: 502,
                message: "Bad gateway".to_string(),
            }),
            Ok(PageResponse::fresh(vec![envelope("E2", 2), envelope("E1", 1)])),
        ]));
        let mut p = poller(api.clone(), 30);

        p.poll_cycle().await;
        let before = p.cursor().clone();

        let failed = p.poll_cycle().await;
        assert!(failed.is_error());
        assert!(failed.events.is_empty());
        assert_eq!(p.cursor(), &before);

        let retried = p.poll_cycle().await;
        assert_eq!(ids(&retried), vec!["E2"]);
        // The retry carries the same precondition as the failed attempt
        let requests = api.requests();
        assert_eq!(requests[1].etag, requests[2].etag);
    }

    #[tokio::test]
    async fn test_error_on_later_page_discards_whole_cycle() {
        let api = Arc::new(MockEventApi::new(vec![
            Ok(PageResponse::fresh(vec![envelope("E2", 2)])
                .with_etag("\"b\"")
                .with_next("https://api.github.com/repos/octo/hello/events?page=2")),
            Err(PollError::transport("connection reset")),
        ]));
        let mut p = poller(api.clone(), 30);

        let batch = p.poll_cycle().await;
        assert!(batch.is_error());
        assert_eq!(p.cursor(), &SourceCursor::new(30));
    }

    #[tokio::test]
    async fn test_paginates_until_boundary() {
        let api = Arc::new(MockEventApi::new(vec![
            Ok(PageResponse::fresh(vec![envelope("E1", 1)])),
            Ok(PageResponse::fresh(vec![envelope("E4", 4), envelope("E3", 3)])
                .with_etag("\"p1\"")
                .with_next("https://api.github.com/repos/octo/hello/events?page=2")),
            Ok(PageResponse::fresh(vec![envelope("E2", 2), envelope("E1", 1)])
                .with_next("https://api.github.com/repos/octo/hello/events?page=3")),
        ]));
        let mut p = poller(api.clone(), 30);

        p.poll_cycle().await;
        let batch = p.poll_cycle().await;
        assert_eq!(ids(&batch), vec!["E2", "E3", "E4"]);
        assert_eq!(p.cursor().last_seen_id.as_deref(), Some("E4"));
        assert_eq!(p.cursor().etag.as_deref(), Some("\"p1\""));

        let requests = api.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].url, "/repos/octo/hello/events");
        assert_eq!(requests[2].url, "https://api.github.com/repos/octo/hello/events?page=2");
        // Only the first page of a cycle is conditional
        assert_eq!(requests[2].etag, None);
    }

    #[tokio::test]
    async fn test_stops_at_count() {
        let api = Arc::new(MockEventApi::new(vec![Ok(PageResponse::fresh(vec![
            envelope("E5", 5),
            envelope("E4", 4),
            envelope("E3", 3),
        ])
        .with_next("https://api.github.com/repos/octo/hello/events?page=2"))]));
        let mut p = poller(api.clone(), 2);

        let batch = p.poll_cycle().await;
        assert_eq!(ids(&batch), vec!["E4", "E5"]);
        assert_eq!(api.call_count(), 1);
        assert_eq!(p.cursor().last_seen_id.as_deref(), Some("E5"));
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let api = Arc::new(MockEventApi::new(vec![Ok(PageResponse::fresh(vec![]).with_etag("\"e\""))]));
        let mut p = poller(api, 30);

        let batch = p.poll_cycle().await;
        assert!(batch.events.is_empty());
        assert!(batch.error.is_none());
        assert_eq!(p.cursor().last_seen_id, None);
        assert_eq!(p.cursor().etag.as_deref(), Some("\"e\""));
    }

    #[tokio::test]
    async fn test_malformed_newest_event_still_advances_cursor() {
        let broken = json!({"id": "E9", "type": "PushEvent", "created_at": "not a time"});
        let api = Arc::new(MockEventApi::new(vec![
            Ok(PageResponse::fresh(vec![broken.clone(), envelope("E8", 8)])),
            Ok(PageResponse::fresh(vec![broken, envelope("E8", 8)])),
        ]));
        let mut p = poller(api, 30);

        let first = p.poll_cycle().await;
        assert_eq!(ids(&first), vec!["E8"]);
        assert_eq!(p.cursor().last_seen_id.as_deref(), Some("E9"));

        let second = p.poll_cycle().await;
        assert!(second.events.is_empty());
    }

    #[tokio::test]
    async fn test_interval_hint_is_clamped() {
        let api = Arc::new(MockEventApi::new(vec![Ok(PageResponse::fresh(vec![]).with_poll_interval(0))]));
        let mut p = poller(api, 30);
        assert_eq!(p.interval(), Duration::from_secs(30));

        p.poll_cycle().await;
        assert_eq!(p.interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_run_delivers_then_stops_on_shutdown() {
        let api = Arc::new(MockEventApi::new(vec![Ok(PageResponse::fresh(vec![envelope("E1", 1)]))]));
        let p = poller(api, 30);
        let (tx, mut rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(p.run(tx, shutdown_rx));

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.source, "repo:octo/hello");
        assert_eq!(ids(&batch), vec!["E1"]);

        // The poller is now sleeping for 30s; shutdown must cut that short
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(rx.recv().await.is_none());
    }
}
