//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::error::ConfigError;
use crate::poller::SourceDescriptor;

/// github-watch - tail GitHub activity feeds
#[derive(Debug, Parser)]
#[command(
    name = "gw",
    about = "Tail GitHub activity from orgs, repos and users as one time-ordered stream",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Shorthand for --log-level DEBUG
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Organization feed as seen by you (includes private activity)
    #[arg(long, value_name = "ORG")]
    pub org: Vec<String>,

    /// Public organization feed
    #[arg(long = "public-org", value_name = "ORG")]
    pub public_org: Vec<String>,

    /// Repository feed
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Vec<String>,

    /// Events performed by a user
    #[arg(long, value_name = "LOGIN")]
    pub user: Vec<String>,

    /// Source in textual form (org:X, user-org:X, repo:O/N, user:X, received)
    #[arg(long, value_name = "DESCRIPTOR")]
    pub source: Vec<String>,

    /// Events requested per source per poll
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Keep polling and print new events as they arrive
    #[arg(short, long)]
    pub follow: bool,

    /// Render width (defaults to the terminal width)
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Lines of comment body to show
    #[arg(long = "body-lines")]
    pub body_lines: Option<usize>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a personal access token for later runs
    Login {
        /// Token to store (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,
    },

    /// Print the login the stored credentials belong to
    Whoami,
}

impl Cli {
    /// Effective log level: --log-level, then --debug
    pub fn effective_log_level(&self) -> Option<String> {
        self.log_level
            .clone()
            .or_else(|| self.debug.then(|| "DEBUG".to_string()))
    }

    /// Every configured source, validated, in first-seen order
    ///
    /// CLI sources come first, then `config_sources`. With nothing configured
    /// the received-events feed is watched.
    pub fn sources(&self, config_sources: &[String]) -> Result<Vec<SourceDescriptor>, ConfigError> {
        debug!(?config_sources, "Cli::sources: called");
        let mut sources = Vec::new();

        for org in &self.org {
            sources.push(SourceDescriptor::user_org(org)?);
        }
        for org in &self.public_org {
            sources.push(SourceDescriptor::org(org)?);
        }
        for repo in &self.repo {
            sources.push(SourceDescriptor::repo(repo)?);
        }
        for user in &self.user {
            sources.push(SourceDescriptor::user(user)?);
        }
        for text in self.source.iter().chain(config_sources) {
            sources.push(text.parse()?);
        }

        let mut unique: Vec<SourceDescriptor> = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique.contains(&source) {
                unique.push(source);
            }
        }

        if unique.is_empty() {
            debug!("Cli::sources: nothing configured, using received feed");
            unique.push(SourceDescriptor::received());
        }
        Ok(unique)
    }
}

/// Log file location
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("github-watch")
        .join("logs")
        .join("github-watch.log")
}

/// Help footer listing source forms and the log location
pub fn generate_after_help() -> String {
    format!(
        "Sources:\n  --org ORG          /users/<you>/events/orgs/ORG\n  --public-org ORG   /orgs/ORG/events\n  --repo OWNER/NAME  /repos/OWNER/NAME/events\n  --user LOGIN       /users/LOGIN/events\n  (none)             /users/<you>/received_events\n\nLogs are written to: {}",
        get_log_path().display()
    )
}
