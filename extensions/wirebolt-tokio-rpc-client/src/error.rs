use thiserror::Error;
use tokio::runtime::TryCurrentError;
use wirebolt_rpc_service::ConfigError;

/// Errors raised while constructing an [`RpcClient`](crate::RpcClient).
#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("RpcClient must be created inside a Tokio runtime: {0}")]
    NoRuntime(#[from] TryCurrentError),
}
