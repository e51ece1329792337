//! Fable - chain data layer for 0xFable games
//!
//! Reads game state through `eth_call` and wraps the polled reads with
//! fetchgate's throttled, zombie-filtering coordinator.

pub mod chain;
pub mod cli;
pub mod config;
pub mod format;
pub mod network;
pub mod rpc;
pub mod utils;
pub mod watch;

pub use chain::{Address, CallOutput, GameId};
pub use config::Config;
pub use network::{ContractGameReader, GameFeed, GameReader};
pub use rpc::{ReadError, RpcClient};
pub use watch::{Feed, GameView, GameWatcher, WatchEvent};
