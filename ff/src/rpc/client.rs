//! JSON-RPC client

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::error::{ReadError, is_retryable_status};
use crate::chain::{Address, CallOutput};
use crate::config::RpcConfig;
use crate::utils::bytes_to_hex;

/// Upper bound for a single retry delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (1-based): `initial * 2^(attempt-1)`, capped at [`MAX_BACKOFF`]
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    initial.checked_mul(factor).unwrap_or(MAX_BACKOFF).min(MAX_BACKOFF)
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Ethereum JSON-RPC client for read-only calls
pub struct RpcClient {
    url: String,
    http: Client,
    max_retries: u32,
    initial_backoff: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a new client from configuration
    pub fn from_config(config: &RpcConfig) -> Result<Self, ReadError> {
        debug!(?config, "RpcClient::from_config: called");
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            url: config.url.clone(),
            http,
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute a read-only call against the latest block
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<CallOutput, ReadError> {
        debug!(%to, data_len = data.len(), "RpcClient::eth_call: called");
        let params = json!([{ "to": to.to_string(), "data": format!("0x{}", bytes_to_hex(data)) }, "latest"]);
        let result = self.request("eth_call", params).await?;

        let hex = result
            .as_str()
            .ok_or_else(|| ReadError::InvalidResponse(format!("eth_call result is not a string: {result}")))?;
        hex.parse::<CallOutput>()
            .map_err(|e| ReadError::InvalidResponse(e.to_string()))
    }

    /// Send one JSON-RPC request, retrying transient failures with exponential backoff
    async fn request(&self, method: &str, params: Value) -> Result<Value, ReadError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "RpcClient::request: called");
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_delay(self.initial_backoff, attempt);
                warn!(
                    method,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "request: retrying after transient error"
                );
                tokio::time::sleep(backoff).await;
            }

            let response = match self.http.post(&self.url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "request: network error");
                    last_error = Some(ReadError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if is_retryable_status(status) && attempt < self.max_retries {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "request: retryable status");
                last_error = Some(ReadError::Status { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                debug!(status, "request: HTTP error");
                let text = response.text().await.unwrap_or_default();
                return Err(ReadError::Status { status, message: text });
            }

            let text = response.text().await?;
            debug!(attempt, "request: success");
            return parse_response(&text);
        }

        Err(last_error.unwrap_or_else(|| ReadError::InvalidResponse("Max retries exceeded".to_string())))
    }
}

fn parse_response(text: &str) -> Result<Value, ReadError> {
    let response: RpcResponse = serde_json::from_str(text)?;

    if let Some(error) = response.error {
        debug!(code = error.code, message = %error.message, "parse_response: RPC error object");
        return Err(ReadError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    response
        .result
        .ok_or_else(|| ReadError::InvalidResponse("Response has neither result nor error".to_string()))
}
