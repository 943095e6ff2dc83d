//! github-watch - tail GitHub activity feeds as one ordered stream
//!
//! Watches any number of event feeds (organizations, repositories, users, or
//! the authenticated user's received events), polls each incrementally, and
//! prints a single time-ordered stream of one-screen summaries.
//!
//! # Core Concepts
//!
//! - **Incremental polling**: each source keeps an etag and a last-seen id, so
//!   nothing a source already delivered is delivered again
//! - **Server cadence**: the poll interval follows the server's hint
//! - **Warm-up gate**: nothing is printed until every source has reported once
//! - **Forward compatible decoding**: unknown event types render as a one-line
//!   notice instead of failing
//!
//! # Modules
//!
//! - [`event`] - Event model and envelope decoder
//! - [`render`] - Summary rendering
//! - [`poller`] - Source descriptors, cursors, API client, poll loop
//! - [`merge`] - Warm-up gate, ordering and dedup
//! - [`auth`] - Credential providers
//! - [`watch`] - Orchestration
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod merge;
pub mod poller;
pub mod render;
pub mod watch;

/// Poll interval used until a source's server sends a hint
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Events requested per source per cycle
pub const DEFAULT_COUNT: usize = 30;

// Re-export commonly used types
pub use auth::{CredentialChain, CredentialProvider, Credentials, TokenFile};
pub use config::Config;
pub use error::ConfigError;
pub use event::{DecodeError, Event, EventKind, EventPayload, decode_batch, decode_envelope};
pub use merge::{MergeState, OutputSink, StreamMerger, TerminalSink};
pub use poller::{
    EventApi, GitHubClient, PageBody, PageResponse, PollBatch, PollError, ResolvedSource, SourceCursor,
    SourceDescriptor, SourceKind, SourcePoller,
};
pub use render::{RenderOptions, SummaryRenderer};
pub use watch::run_watch;
