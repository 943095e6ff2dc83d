//! Per-source incremental fetch state

/// Poll state owned by exactly one poller
///
/// Cursors live for the lifetime of the process and are never shared; a
/// restart begins from an empty cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCursor {
    /// Entity tag of the last fresh first page
    pub etag: Option<String>,
    /// Id of the newest event already delivered
    pub last_seen_id: Option<String>,
    /// Seconds to wait before the next cycle
    pub poll_interval_secs: u64,
    /// Next page of the cycle in progress; empty between cycles
    pub next_page_url: Option<String>,
}

impl SourceCursor {
    pub fn new(poll_interval_secs: u64) -> Self {
        Self {
            etag: None,
            last_seen_id: None,
            poll_interval_secs,
            next_page_url: None,
        }
    }

    /// Apply a server interval hint, clamped to `min_secs`
    pub fn apply_interval(&mut self, hint: Option<u64>, min_secs: u64) {
        if let Some(secs) = hint {
            self.poll_interval_secs = secs.max(min_secs);
        }
    }
}

impl Default for SourceCursor {
    fn default() -> Self {
        Self::new(crate::DEFAULT_POLL_INTERVAL_SECS)
    }
}
