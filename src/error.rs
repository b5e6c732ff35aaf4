use thiserror::Error;

/// Errors returned by the RPC client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid limit: must be greater than zero")]
    InvalidLimit,

    #[error("rpc error: {0}")]
    Rpc(#[from] TransportError),

    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
}

impl Error {
    /// Whether the caller may reasonably retry the same request.
    ///
    /// Only transport failures qualify; input errors and payload
    /// inconsistencies will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Rpc(transport) => transport.is_retryable(),
            _ => false,
        }
    }
}

/// Failures raised by an [`RpcTransport`](crate::transport::RpcTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("http status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("rpc response error {code}: {message}")]
    Response { code: i64, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request not supported by this transport: {0}")]
    Unsupported(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout(_) | TransportError::Connection(_) => true,
            TransportError::Http { status, .. } => *status == 429 || *status >= 500,
            TransportError::Response { .. }
            | TransportError::Decode(_)
            | TransportError::Unsupported(_) => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
