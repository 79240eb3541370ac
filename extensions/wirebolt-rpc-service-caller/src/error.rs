use std::io;
use std::time::Duration;
use thiserror::Error;
use wirebolt::rpc::{RpcResponse, RpcResultStatus};
use wirebolt::serializer::SerializationError;
use wirebolt_rpc_service::FailureKind;

/// Errors observed by the caller of a remote method.
#[derive(Debug, Error)]
pub enum RpcCallerError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("connecting to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection to {address} is closed")]
    ConnectionClosed { address: String },

    #[error("request {request_id} was abandoned before a result arrived")]
    Abandoned { request_id: String },

    #[error("client is shut down")]
    ClientClosed,

    #[error("request {request_id} timed out after {timeout:?}")]
    Timeout {
        request_id: String,
        timeout: Duration,
    },

    #[error("codec error: {message}")]
    Codec { message: String },

    #[error("remote call failed ({status:?}, {kind}): {message}")]
    Remote {
        status: RpcResultStatus,
        kind: String,
        message: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request id `{0}` is already pending on this connection")]
    DuplicateRequestId(String),
}

impl RpcCallerError {
    /// Classifies the failure for a [`RetryPolicy`](wirebolt_rpc_service::RetryPolicy).
    pub fn kind(&self) -> FailureKind {
        match self {
            RpcCallerError::Connect { .. }
            | RpcCallerError::ConnectTimeout { .. }
            | RpcCallerError::Io(_)
            | RpcCallerError::ConnectionClosed { .. }
            | RpcCallerError::Abandoned { .. }
            | RpcCallerError::ClientClosed => FailureKind::Connection,
            RpcCallerError::Timeout { .. } => FailureKind::Timeout,
            RpcCallerError::Codec { .. } => FailureKind::Codec,
            RpcCallerError::Remote {
                status: RpcResultStatus::Overloaded,
                ..
            } => FailureKind::Overloaded,
            RpcCallerError::Remote { .. } => FailureKind::Service,
            RpcCallerError::InvalidRequest(_) | RpcCallerError::DuplicateRequestId(_) => {
                FailureKind::InvalidRequest
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == FailureKind::Timeout
    }

    /// The response a caller would have seen had the failure been reported
    /// over the wire.
    pub fn into_response(self, request_id: impl Into<String>) -> RpcResponse {
        let status = match &self {
            RpcCallerError::Timeout { .. } => RpcResultStatus::Timeout,
            RpcCallerError::Codec { .. } => RpcResultStatus::SerializationError,
            RpcCallerError::Remote { status, .. } => *status,
            _ => RpcResultStatus::Error,
        };
        let kind = format!("{:?}", self.kind());

        RpcResponse::failure(request_id, status, kind, self.to_string())
    }
}

impl From<SerializationError> for RpcCallerError {
    fn from(err: SerializationError) -> Self {
        RpcCallerError::Codec {
            message: err.to_string(),
        }
    }
}
