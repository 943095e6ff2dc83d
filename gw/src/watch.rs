//! Watch orchestration: one poller task per source feeding one merger

use std::sync::Arc;

use eyre::{Context, Result};
use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::auth::{Credentials, resolve_login};
use crate::config::Config;
use crate::error::ConfigError;
use crate::merge::{OutputSink, RunOutcome, StreamMerger};
use crate::poller::{EventApi, ResolvedSource, SourceDescriptor, SourcePoller};

/// Whether any source's endpoint embeds the authenticated login
pub fn needs_login(sources: &[SourceDescriptor]) -> bool {
    sources.iter().any(|s| s.kind.needs_login())
}

/// Fix every source's endpoint path
pub fn resolve_sources(sources: &[SourceDescriptor], login: Option<&str>) -> Result<Vec<ResolvedSource>, ConfigError> {
    debug!(count = sources.len(), ?login, "resolve_sources: called");
    sources.iter().map(|s| s.resolve(login)).collect()
}

/// Resolve endpoints, asking the API for the login only when a source needs it
pub async fn prepare_sources(
    sources: &[SourceDescriptor],
    creds: &Credentials,
    api: &dyn EventApi,
) -> Result<Vec<ResolvedSource>, ConfigError> {
    let login = if needs_login(sources) {
        Some(resolve_login(creds, api).await?)
    } else {
        creds.login.clone()
    };
    resolve_sources(sources, login.as_deref())
}

/// Poll every source and stream merged output into `sink`
///
/// Returns when the merger stops (one-shot complete, external shutdown, or all
/// pollers gone); the pollers are then told to stop and awaited.
pub async fn run_watch<S: OutputSink + ?Sized>(
    api: Arc<dyn EventApi>,
    sources: Vec<ResolvedSource>,
    config: &Config,
    follow: bool,
    sink: &mut S,
    mut shutdown: watch::Receiver<bool>,
) -> Result<RunOutcome> {
    info!(sources = sources.len(), follow, "run_watch: starting");

    let (tx, mut rx) = mpsc::channel(config.poll.channel_capacity.max(1));
    let (stop_tx, stop_rx) = watch::channel(false);

    let ids: Vec<String> = sources.iter().map(ResolvedSource::id).collect();
    let mut handles = Vec::with_capacity(sources.len());
    for source in sources {
        let poller = SourcePoller::new(source, api.clone(), &config.poll);
        handles.push(tokio::spawn(poller.run(tx.clone(), stop_rx.clone())));
    }
    drop(tx);

    let mut merger = StreamMerger::new(ids, config.merge.dedup_window);
    let outcome = merger
        .run(&mut rx, sink, follow, &mut shutdown)
        .await
        .context("Failed to write output");

    debug!("run_watch: stopping pollers");
    let _ = stop_tx.send(true);
    drop(rx);
    for result in join_all(handles).await {
        if let Err(e) = result {
            warn!(error = %e, "run_watch: poller task failed");
        }
    }

    let outcome = outcome?;
    info!(emitted = outcome.emitted, errors = outcome.errors, reason = ?outcome.reason, "run_watch: done");
    Ok(outcome)
}
