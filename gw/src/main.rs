//! github-watch - tail GitHub activity feeds
//!
//! CLI entry point: loads configuration, resolves credentials and runs the watch.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result, eyre};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use githubwatch::auth::{CredentialChain, CredentialProvider, Credentials, PromptCredentials, TokenFile, resolve_login};
use githubwatch::cli::{Cli, Command, generate_after_help, get_log_path};
use githubwatch::config::Config;
use githubwatch::merge::{TerminalSink, terminal_width};
use githubwatch::poller::{EventApi, GitHubClient};
use githubwatch::render::{RenderOptions, SummaryRenderer};
use githubwatch::watch::{prepare_sources, run_watch};

fn parse_level(s: &str) -> tracing::Level {
    match s.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log here yet; stdout belongs to the rendered stream, so logs go to a file
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level / --debug > config file > default (INFO)
    let level = cli_log_level
        .or(config_log_level)
        .map(parse_level)
        .unwrap_or(tracing::Level::INFO);

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Fold command-line scalars into the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    debug!(count = ?cli.count, body_lines = ?cli.body_lines, no_color = cli.no_color, "apply_overrides: called");
    if let Some(count) = cli.count {
        config.poll.count = count;
    }
    if let Some(lines) = cli.body_lines {
        config.render.body_lines = lines;
    }
    if cli.no_color || !io::stdout().is_terminal() {
        config.render.color = false;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.effective_log_level().as_deref(), config_log_level.as_deref())
        .context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);
    info!(base_url = %config.api.base_url, "github-watch loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match &cli.command {
        Some(Command::Login { token }) => cmd_login(&config, token.clone()).await,
        Some(Command::Whoami) => cmd_whoami(&config).await,
        None => cmd_watch(&config, &cli).await,
    }
}

async fn cmd_watch(config: &Config, cli: &Cli) -> Result<()> {
    // Descriptors are validated before any credential lookup or network access
    let sources = cli.sources(&config.sources)?;
    info!(sources = ?sources.iter().map(ToString::to_string).collect::<Vec<_>>(), "cmd_watch: sources");

    let creds = CredentialChain::standard(&config.api, &config.auth, io::stdin().is_terminal()).resolve()?;
    let client = GitHubClient::new(&config.api, creds.token.clone()).context("Failed to build HTTP client")?;
    let resolved = prepare_sources(&sources, &creds, &client).await?;
    let api: Arc<dyn EventApi> = Arc::new(client);

    let width = cli.width.unwrap_or_else(terminal_width);
    let renderer = SummaryRenderer::new(RenderOptions::from_config(&config.render, width));
    let mut sink = TerminalSink::stdout(renderer, cli.width);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("cmd_watch: interrupt received, shutting down");
                let _ = ctrl_c_tx.send(true);
            }
            Err(e) => warn!(error = %e, "cmd_watch: failed to listen for ctrl-c"),
        }
    });

    run_watch(api, resolved, config, cli.follow, &mut sink, shutdown_rx).await?;
    drop(shutdown_tx);
    Ok(())
}

async fn cmd_login(config: &Config, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => PromptCredentials
            .credentials()?
            .map(|c| c.token)
            .ok_or_else(|| eyre!("No token entered"))?,
    };

    let client = GitHubClient::new(&config.api, token.clone()).context("Failed to build HTTP client")?;
    let login = resolve_login(&Credentials::new(token.clone()), &client).await?;

    let store = TokenFile::new(&config.auth.token_file);
    store.save(&Credentials::new(token).with_login(&login))?;
    println!("Logged in as {} (token saved to {})", login, store.path().display());
    Ok(())
}

async fn cmd_whoami(config: &Config) -> Result<()> {
    let creds = CredentialChain::standard(&config.api, &config.auth, false).resolve()?;
    let client = GitHubClient::new(&config.api, creds.token.clone()).context("Failed to build HTTP client")?;
    let login = resolve_login(&creds, &client).await?;
    println!("{}", login);
    Ok(())
}
