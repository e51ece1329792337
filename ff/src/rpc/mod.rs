//! Ethereum JSON-RPC access
//!
//! A minimal `eth_call` client with retries for transient failures. This is
//! the read primitive underneath the throttled game feeds.

mod client;
mod error;

pub use client::RpcClient;
pub use error::ReadError;
