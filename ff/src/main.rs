//! ff - watch 0xFable games from the command line

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use fable::chain::{Address, GameId};
use fable::cli::{Cli, Command};
use fable::config::Config;
use fable::format::format;
use fable::network::{ContractGameReader, GameFeed};
use fable::utils::format_timestamp;
use fable::watch::{GameWatcher, WatchEvent};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fable")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("ff.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Watch {
            game_id,
            polls,
            poll_ms,
        } => {
            debug!(%game_id, ?polls, ?poll_ms, "main: matched Watch command");
            cmd_watch(&config, game_id, polls, poll_ms).await
        }
        Command::Deck { player, deck_id } => {
            debug!(%player, deck_id, "main: matched Deck command");
            cmd_deck(&config, player, deck_id).await
        }
        Command::Config => {
            debug!("main: matched Config command");
            cmd_config(&config)
        }
    }
}

fn build_feed(config: &Config) -> Result<GameFeed> {
    config.validate().context("Invalid configuration")?;
    let reader = ContractGameReader::from_config(config).context("Failed to create RPC client")?;
    Ok(GameFeed::new(Arc::new(reader), &config.throttle))
}

/// Poll a game until the poll budget runs out or Ctrl-C
async fn cmd_watch(config: &Config, game_id: GameId, polls: Option<u64>, poll_ms: Option<u64>) -> Result<()> {
    debug!(%game_id, ?polls, ?poll_ms, "cmd_watch: called");
    let feed = build_feed(config)?;
    let poll_interval = poll_ms.map(Duration::from_millis).unwrap_or_else(|| config.poll.interval());
    let watcher = GameWatcher::new(feed.clone(), game_id, poll_interval);

    println!(
        "Watching game {} via {} every {}ms",
        game_id.to_string().cyan(),
        config.rpc.url,
        poll_interval.as_millis()
    );

    let (tx, mut rx) = mpsc::channel(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let view = tokio::select! {
        view = watcher.run(polls, tx) => Some(view),
        _ = tokio::signal::ctrl_c() => {
            info!("cmd_watch: interrupted");
            None
        }
    };
    printer.await.context("Event printer failed")?;

    let game_data = feed.game_data_stats();
    let cards = feed.cards_stats();
    if let Some(view) = view {
        println!(
            "{} {} updates, {} unchanged, {} failures",
            "✓".green(),
            view.updates,
            view.unchanged,
            view.failures
        );
    }
    println!(
        "  game-data: {} dispatched, {} throttled, {} zombies",
        game_data.dispatched, game_data.throttled, game_data.zombies
    );
    println!(
        "  cards: {} dispatched, {} throttled, {} zombies",
        cards.dispatched, cards.throttled, cards.zombies
    );
    Ok(())
}

fn print_event(event: &WatchEvent) {
    let now = format_timestamp(chrono::Local::now().timestamp_millis());
    match event {
        WatchEvent::Updated { feed, output } => {
            println!("[{}] {} {}", now.dimmed(), feed.to_string().yellow(), output);
        }
        WatchEvent::Unchanged { feed } => {
            println!("[{}] {} {}", now.dimmed(), feed.to_string().yellow(), "unchanged".dimmed());
        }
        WatchEvent::Failed { feed, error } => {
            println!("[{}] {} {}", now.dimmed(), feed.to_string().yellow(), error.red());
        }
    }
}

/// Read a deck once
async fn cmd_deck(config: &Config, player: Address, deck_id: u8) -> Result<()> {
    debug!(%player, deck_id, "cmd_deck: called");
    let feed = build_feed(config)?;
    let deck = feed
        .fetch_deck(player, deck_id)
        .await
        .context(format!("Failed to read deck {} of {}", deck_id, player))?;
    println!("{}", deck);
    Ok(())
}

/// Print the effective configuration
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    println!("{}", format(&config.to_shape(), true));
    Ok(())
}
