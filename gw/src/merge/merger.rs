//! StreamMerger - warm-up gate, ordering and dedup across sources

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::OutputSink;
use crate::event::Event;
use crate::poller::{PollBatch, PollError};

/// Merger state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    /// Buffering until every configured source has reported once
    Warming,
    /// Forwarding every batch as it arrives
    Steady,
}

/// A failed poll surfaced to the sink
#[derive(Debug, Clone)]
pub struct SourceError {
    pub source: String,
    pub error: PollError,
}

/// Result of feeding one batch to the merger
#[derive(Debug, Default)]
pub struct Accepted {
    /// The batch carried an error
    pub error: Option<SourceError>,
    /// Events released by this batch, ordered by `created_at`; `None` while warming
    pub flushed: Option<Vec<Event>>,
    /// This batch completed the warm-up
    pub warmed_up: bool,
}

/// Why [`StreamMerger::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// One-shot mode and the warm-up flush went out
    OneShotComplete,
    /// Every poller dropped its sender
    ChannelClosed,
    /// The shutdown signal fired
    Shutdown,
}

/// Counters from a merger run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub emitted: usize,
    pub errors: usize,
    pub reason: StopReason,
}

/// Remembers the most recent emitted ids, oldest evicted first
#[derive(Debug)]
struct DedupWindow {
    capacity: usize,
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl DedupWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.min(4096)),
            ids: HashSet::new(),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn remember(&mut self, id: &str) {
        if self.capacity == 0 || self.ids.contains(id) {
            return;
        }
        if self.order.len() == self.capacity
            && let Some(evicted) = self.order.pop_front()
        {
            self.ids.remove(&evicted);
        }
        self.order.push_back(id.to_string());
        self.ids.insert(id.to_string());
    }
}

/// Fans in poll batches and releases one ordered stream
///
/// The merger is owned by a single consuming task, so none of its state is
/// shared or locked.
#[derive(Debug)]
pub struct StreamMerger {
    sources: HashSet<String>,
    reported: HashMap<String, usize>,
    state: MergeState,
    pending: Vec<Event>,
    seen: DedupWindow,
}

impl StreamMerger {
    /// Create a merger gated on the given source identifiers
    pub fn new<I, S>(sources: I, dedup_window: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: HashSet<String> = sources.into_iter().map(Into::into).collect();
        debug!(source_count = sources.len(), dedup_window, "StreamMerger::new: called");
        let state = if sources.is_empty() {
            MergeState::Steady
        } else {
            MergeState::Warming
        };

        Self {
            sources,
            reported: HashMap::new(),
            state,
            pending: Vec::new(),
            seen: DedupWindow::new(dedup_window),
        }
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Number of events held back by the gate
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Batches received so far from one source
    pub fn reported(&self, source: &str) -> usize {
        self.reported.get(source).copied().unwrap_or(0)
    }

    /// Feed one batch
    pub fn accept(&mut self, batch: PollBatch) -> Accepted {
        debug!(source = %batch.source, events = batch.events.len(), error = batch.is_error(), state = ?self.state, "accept: called");
        let PollBatch { source, events, error } = batch;

        if self.sources.contains(&source) {
            *self.reported.entry(source.clone()).or_insert(0) += 1;
        } else {
            warn!(%source, "accept: batch from unconfigured source");
        }

        let error = error.map(|error| SourceError { source, error });
        self.pending.extend(events);

        match self.state {
            MergeState::Warming => {
                if self.sources.iter().all(|s| self.reported.contains_key(s)) {
                    info!(pending = self.pending.len(), "accept: all sources reported, warm-up complete");
                    self.state = MergeState::Steady;
                    Accepted {
                        error,
                        flushed: Some(self.flush()),
                        warmed_up: true,
                    }
                } else {
                    Accepted {
                        error,
                        flushed: None,
                        warmed_up: false,
                    }
                }
            }
            MergeState::Steady => Accepted {
                error,
                flushed: Some(self.flush()),
                warmed_up: false,
            },
        }
    }

    /// Sort the pending buffer, drop already-emitted ids, and drain it
    fn flush(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        // sort_by_key is stable: equal timestamps keep arrival order
        events.sort_by_key(|e| e.created_at);

        let mut in_flush = HashSet::new();
        events.retain(|e| !self.seen.contains(&e.id) && in_flush.insert(e.id.clone()));
        for event in &events {
            self.seen.remember(&event.id);
        }

        debug!(count = events.len(), "flush: released");
        events
    }

    /// Consume batches and write them to `sink`
    ///
    /// Returns after the warm-up flush when `follow` is false, when every sender
    /// is gone, or when `shutdown` fires.
    pub async fn run<S: OutputSink + ?Sized>(
        &mut self,
        rx: &mut mpsc::Receiver<PollBatch>,
        sink: &mut S,
        follow: bool,
        shutdown: &mut watch::Receiver<bool>,
    ) -> io::Result<RunOutcome> {
        info!(follow, sources = self.sources.len(), "StreamMerger::run: starting");
        let mut emitted = 0;
        let mut errors = 0;

        let reason = loop {
            if *shutdown.borrow() {
                break StopReason::Shutdown;
            }

            let batch = tokio::select! {
                batch = rx.recv() => match batch {
                    Some(batch) => batch,
                    None => break StopReason::ChannelClosed,
                },
                _ = shutdown.changed() => break StopReason::Shutdown,
            };

            let accepted = self.accept(batch);

            if let Some(SourceError { source, error }) = &accepted.error {
                errors += 1;
                sink.error(source, error)?;
            }

            if let Some(events) = accepted.flushed {
                for event in &events {
                    sink.emit(event)?;
                }
                emitted += events.len();
                sink.flush()?;

                if !follow && self.state == MergeState::Steady {
                    break StopReason::OneShotComplete;
                }
            }
        };

        info!(emitted, errors, ?reason, "StreamMerger::run: stopped");
        Ok(RunOutcome {
            emitted,
            errors,
            reason,
        })
    }
}
