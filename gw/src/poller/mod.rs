//! Source polling
//!
//! One [`SourcePoller`] per configured feed. Each owns its [`SourceCursor`],
//! talks to the API through the [`EventApi`] seam and reports a [`PollBatch`]
//! per cycle over a channel.

mod client;
mod cursor;
mod error;
mod github;
mod source;
mod task;

pub use client::{EventApi, PageBody, PageResponse};
pub use cursor::SourceCursor;
pub use error::PollError;
pub use github::{GitHubClient, parse_next_link, parse_poll_interval};
pub use source::{ResolvedSource, SourceDescriptor, SourceKind};
pub use task::{PollBatch, SourcePoller};

#[cfg(test)]
pub use client::mock;
