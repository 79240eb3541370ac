use std::io;
use std::time::Duration;
use thiserror::Error;
use wirebolt::rpc::{RpcResponse, RpcResultStatus};
use wirebolt::serializer::SerializationError;

#[derive(Debug, Error)]
pub enum RpcServiceEndpointError {
    #[error("service `{service_key}` is already registered")]
    DuplicateService { service_key: String },

    #[error("service `{service_key}` declares `{signature}` more than once")]
    DuplicateMethod {
        service_key: String,
        signature: String,
    },

    #[error("failed to start the business worker pool: {0}")]
    WorkerPool(#[from] io::Error),
}

/// Why a handler invocation failed to produce a value.
#[derive(Debug, Error)]
pub enum RpcInvokeError {
    #[error("method not found: {descriptor}")]
    MethodNotFound { descriptor: String },

    #[error("expected at least {expected} argument(s), got {supplied}")]
    ArgumentCount { expected: usize, supplied: usize },

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("{message}")]
    Target { message: String },

    #[error("handler panicked: {message}")]
    Panic { message: String },

    #[error("async handler did not complete within {timeout:?}")]
    AsyncTimeout { timeout: Duration },
}

impl RpcInvokeError {
    pub fn target(message: impl Into<String>) -> Self {
        RpcInvokeError::Target {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RpcInvokeError::MethodNotFound { .. } => "MethodNotFound",
            RpcInvokeError::ArgumentCount { .. } => "InvalidArguments",
            RpcInvokeError::Serialization(_) => "SerializationError",
            RpcInvokeError::Target { .. } => "TargetError",
            RpcInvokeError::Panic { .. } => "Panic",
            RpcInvokeError::AsyncTimeout { .. } => "AsyncTimeout",
        }
    }

    pub fn status(&self) -> RpcResultStatus {
        match self {
            RpcInvokeError::MethodNotFound { .. } => RpcResultStatus::MethodNotFound,
            RpcInvokeError::Serialization(_) => RpcResultStatus::SerializationError,
            _ => RpcResultStatus::Error,
        }
    }

    pub fn into_response(self, request_id: impl Into<String>) -> RpcResponse {
        let detail = format!("{self:?}");
        RpcResponse::failure(request_id, self.status(), self.kind(), self.to_string())
            .with_detail(detail)
    }
}
