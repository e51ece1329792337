//! CLI argument parsing for ff

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::chain::{Address, GameId};

/// Fable - poll 0xFable game state from the chain
#[derive(Parser, Debug)]
#[command(name = "ff")]
#[command(author, version, about = "Watch 0xFable games with throttled, zombie-free reads", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll a game and print every update
    Watch {
        /// Game ID (decimal or 0x hex)
        #[arg(value_name = "GAME_ID")]
        game_id: GameId,

        /// Stop after this many polls (default: run until interrupted)
        #[arg(short, long)]
        polls: Option<u64>,

        /// Milliseconds between polls (default: from config)
        #[arg(long)]
        poll_ms: Option<u64>,
    },

    /// Read a player's deck once
    Deck {
        /// Player address (0x + 40 hex digits)
        #[arg(value_name = "PLAYER")]
        player: Address,

        /// Deck index in the player's inventory
        #[arg(value_name = "DECK_ID")]
        deck_id: u8,
    },

    /// Print the effective configuration
    Config,
}
