use std::io;
use thiserror::Error;
use wirebolt_rpc_service::ConfigError;
use wirebolt_rpc_service_endpoint::error::RpcServiceEndpointError;

#[derive(Debug, Error)]
pub enum RpcServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Endpoint(#[from] RpcServiceEndpointError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
