//! Output sinks for the merged stream

use std::io::{self, Stderr, Stdout, Write};

use colored::Colorize;
use tracing::debug;

use crate::event::Event;
use crate::poller::PollError;
use crate::render::SummaryRenderer;

/// Fallback width when the terminal size cannot be read
pub const DEFAULT_WIDTH: usize = 80;

/// Where the merger delivers ordered events and poll failures
pub trait OutputSink: Send {
    /// Deliver one event
    fn emit(&mut self, event: &Event) -> io::Result<()>;

    /// Report a failed poll; the stream keeps going
    fn error(&mut self, source: &str, error: &PollError) -> io::Result<()>;

    /// Called after each released batch
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Current terminal width, or [`DEFAULT_WIDTH`] when not attached to a terminal
pub fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols as usize,
        _ => DEFAULT_WIDTH,
    }
}

/// Renders events as separated summaries
///
/// Without a fixed width the terminal is re-measured before every event so a
/// resize takes effect on the next line.
pub struct TerminalSink<W: Write + Send = Stdout, E: Write + Send = Stderr> {
    renderer: SummaryRenderer,
    out: W,
    err: E,
    fixed_width: Option<usize>,
}

impl TerminalSink {
    pub fn stdout(renderer: SummaryRenderer, fixed_width: Option<usize>) -> Self {
        Self::with_writers(renderer, io::stdout(), io::stderr(), fixed_width)
    }
}

impl<W: Write + Send, E: Write + Send> TerminalSink<W, E> {
    pub fn with_writers(mut renderer: SummaryRenderer, out: W, err: E, fixed_width: Option<usize>) -> Self {
        debug!(?fixed_width, "TerminalSink::with_writers: called");
        if let Some(width) = fixed_width {
            renderer.set_width(width);
        }
        Self {
            renderer,
            out,
            err,
            fixed_width,
        }
    }

    pub fn into_writers(self) -> (W, E) {
        (self.out, self.err)
    }

    fn width(&self) -> usize {
        self.fixed_width.unwrap_or_else(terminal_width)
    }
}

impl<W: Write + Send, E: Write + Send> OutputSink for TerminalSink<W, E> {
    fn emit(&mut self, event: &Event) -> io::Result<()> {
        let width = self.width();
        self.renderer.set_width(width);
        writeln!(self.out, "{}", "-".repeat(width))?;
        writeln!(self.out, "{}", self.renderer.render(event))
    }

    fn error(&mut self, source: &str, error: &PollError) -> io::Result<()> {
        let line = format!("Events load error [{}]: {}", source, error);
        if self.renderer.options().color {
            writeln!(self.err, "{}", line.red())
        } else {
            writeln!(self.err, "{}", line)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }
}

/// Keeps everything in memory; for tests and library callers
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<Event>,
    pub errors: Vec<(String, PollError)>,
}

impl OutputSink for CollectingSink {
    fn emit(&mut self, event: &Event) -> io::Result<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn error(&mut self, source: &str, error: &PollError) -> io::Result<()> {
        self.errors.push((source.to_string(), error.clone()));
        Ok(())
    }
}
