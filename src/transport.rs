//! The single capability the client needs from the network: send one
//! JSON-RPC request and hand back its `result`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::{RpcError, RpcRequest};

use crate::error::TransportError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Issues one JSON-RPC call.
///
/// Implementations return the response's `result` member, which is
/// `Value::Null` when the node found nothing.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn invoke(&self, method: &'static str, params: Value) -> Result<Value, TransportError>;
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    /// `Some(Value::Null)` for `"result": null`, `None` when the key is absent.
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("failed to build http client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn invoke(&self, method: &'static str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope = match serde_json::from_str::<JsonRpcResponse>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Http {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => return Err(TransportError::Decode(e.to_string())),
        };

        // Some nodes pair a JSON-RPC error with a non-2xx status.
        if let Some(error) = envelope.error {
            return Err(TransportError::Response {
                code: error.code,
                message: error.message,
            });
        }
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        envelope.result.ok_or_else(|| {
            TransportError::Decode(format!("{method} response carries neither result nor error"))
        })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Lets an existing `solana-client` connection serve as the transport.
///
/// `RpcClient` only sends positional params, so calls built with by-name
/// params (`getTokenAccounts`) are refused before anything is sent.
#[async_trait]
impl RpcTransport for RpcClient {
    async fn invoke(&self, method: &'static str, params: Value) -> Result<Value, TransportError> {
        if !(params.is_array() || params.is_null()) {
            return Err(TransportError::Unsupported(format!(
                "{method} uses by-name params, which solana-client cannot send"
            )));
        }

        self.send::<Value>(RpcRequest::Custom { method }, params)
            .await
            .map_err(client_error_to_transport)
    }
}

fn client_error_to_transport(err: ClientError) -> TransportError {
    match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
            TransportError::Response {
                code: *code,
                message: message.clone(),
            }
        }
        ClientErrorKind::RpcError(other) => TransportError::Decode(other.to_string()),
        ClientErrorKind::Reqwest(e) if e.is_timeout() => TransportError::Timeout(e.to_string()),
        ClientErrorKind::Reqwest(e) => match e.status() {
            Some(status) => TransportError::Http {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => TransportError::Connection(e.to_string()),
        },
        ClientErrorKind::SerdeJson(e) => TransportError::Decode(e.to_string()),
        _ => TransportError::Connection(err.to_string()),
    }
}
