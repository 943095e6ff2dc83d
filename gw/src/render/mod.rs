//! Summary rendering
//!
//! Turns an [`Event`] into display text. Pure formatting: the terminal width,
//! time zone handling and color are all inputs, so output is reproducible in
//! tests.
//!
//! ```text
//! octo/hello                    @octocat pushed 2 commits to main   Mar 1 12:00:00 PM
//!
//!                               aaaaaaaa first commit
//!                               cccccccc third commit
//! ```

mod summary;
mod text;

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use tracing::debug;

use crate::config::RenderConfig;
use crate::event::Event;

pub use summary::{Summary, summarize};
pub use text::{display_width, ellipsis, pad_right, wrap};

/// Narrowest wrap width used for headline and body text
const MIN_TEXT_WIDTH: usize = 10;

/// Inputs to the layout
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Terminal width in columns
    pub width: usize,
    /// Width of the left-hand repository column
    pub repo_column: usize,
    /// Comment bodies are cut after this many lines
    pub body_lines: usize,
    /// chrono format string for the timestamp
    pub time_format: String,
    /// Render timestamps in the local zone instead of UTC
    pub local_time: bool,
    /// Apply ANSI colors after layout
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default(), 80)
    }
}

impl RenderOptions {
    pub fn from_config(config: &RenderConfig, width: usize) -> Self {
        Self {
            width,
            repo_column: config.repo_column,
            body_lines: config.body_lines,
            time_format: config.time_format.clone(),
            local_time: config.local_time,
            color: config.color,
        }
    }
}

/// Renders events into multi-line summaries
#[derive(Debug, Clone)]
pub struct SummaryRenderer {
    options: RenderOptions,
}

impl SummaryRenderer {
    pub fn new(options: RenderOptions) -> Self {
        debug!(width = options.width, repo_column = options.repo_column, "SummaryRenderer::new: called");
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Change the width, e.g. after a terminal resize
    pub fn set_width(&mut self, width: usize) {
        self.options.width = width;
    }

    /// Format the event timestamp
    pub fn timestamp(&self, created_at: &DateTime<Utc>) -> String {
        if self.options.local_time {
            created_at.with_timezone(&Local).format(&self.options.time_format).to_string()
        } else {
            created_at.format(&self.options.time_format).to_string()
        }
    }

    /// Render one event
    pub fn render(&self, event: &Event) -> String {
        let summary = summarize(event, self.options.body_lines);
        let stamp = self.timestamp(&event.created_at);
        self.layout(&event.repo_name, &summary, &stamp)
    }

    /// Place repository, headline, timestamp and body into columns
    pub fn layout(&self, repo_name: &str, summary: &Summary, stamp: &str) -> String {
        let opts = &self.options;
        let repo_cell = pad_right(repo_name, opts.repo_column);
        let repo_cell_width = display_width(&repo_cell);
        let stamp_width = display_width(stamp);
        let indent = " ".repeat(opts.repo_column);
        let text_width = opts.width.saturating_sub(opts.repo_column).max(MIN_TEXT_WIDTH);

        // The first line reserves room for the timestamp and one separating space
        let first_room = opts
            .width
            .saturating_sub(repo_cell_width + stamp_width + 1)
            .max(MIN_TEXT_WIDTH);

        let mut headline = wrap(&summary.headline, first_room).into_iter();
        let first = headline.next().unwrap_or_default();
        let overflow: Vec<String> = headline.collect();

        let used = repo_cell_width + display_width(&first);
        let gap = opts.width.saturating_sub(used + stamp_width).max(1);

        let (repo_text, stamp_text) = if opts.color {
            (repo_cell.cyan().to_string(), stamp.dimmed().to_string())
        } else {
            (repo_cell, stamp.to_string())
        };

        let mut lines = vec![format!("{}{}{}{}", repo_text, first, " ".repeat(gap), stamp_text)];

        // Headline overflow re-wraps at the full text width
        if !overflow.is_empty() {
            for line in wrap(&overflow.join(" "), text_width) {
                lines.push(format!("{}{}", indent, line));
            }
        }

        for body_line in &summary.body {
            if body_line.trim().is_empty() {
                lines.push(String::new());
                continue;
            }
            for line in wrap(body_line, text_width) {
                lines.push(format!("{}{}", indent, line));
            }
        }

        lines.join("\n")
    }
}
