//! Multi-source merge
//!
//! [`StreamMerger`] holds output back until every source has reported once,
//! then releases each batch in `created_at` order with duplicate ids removed.

mod merger;
mod sink;

pub use merger::{Accepted, MergeState, RunOutcome, SourceError, StopReason, StreamMerger};
pub use sink::{CollectingSink, DEFAULT_WIDTH, OutputSink, TerminalSink, terminal_width};
