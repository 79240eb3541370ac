use crate::{Connection, ConnectionManager, RpcClientError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use wirebolt::rpc::{RpcRequest, RpcRequestBuilder, RpcResponse};
use wirebolt::serializer::SerializerKind;
use wirebolt_rpc_service::RpcConfig;
use wirebolt_rpc_service_caller::{PendingCall, RpcCallerError, RpcServiceCallerInterface};

/// The client-side invoker.
///
/// Every call resolves its connection through the [`ConnectionManager`],
/// registers a correlation row whose deadline is the request's timeout, and
/// writes the frame. That deadline is the only timeout a call has: the
/// blocking variant waits on the same [`PendingCall`].
#[derive(Debug)]
pub struct RpcClient {
    config: RpcConfig,
    manager: Arc<ConnectionManager>,
    runtime: Handle,
}

impl RpcClient {
    /// Creates a client bound to the current Tokio runtime.
    pub fn new(config: RpcConfig) -> Result<Self, RpcClientError> {
        Self::with_handle(config, Handle::try_current()?)
    }

    /// Creates a client whose connections run on `runtime`.
    pub fn with_handle(config: RpcConfig, runtime: Handle) -> Result<Self, RpcClientError> {
        config.validate()?;

        Ok(Self {
            manager: Arc::new(ConnectionManager::new(config.clone())),
            config,
            runtime,
        })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// A request builder tagged with this client's serializer.
    pub fn request(
        &self,
        service_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> RpcRequestBuilder {
        RpcRequest::builder(self.config.serializer, service_name, method_name)
    }

    /// The live connection to `address`, established if necessary.
    pub async fn connection(&self, address: &str) -> Result<Arc<Connection>, RpcCallerError> {
        self.manager.get_or_create(address).await
    }

    /// Writes `request` and returns as soon as it has been flushed. The
    /// returned [`PendingCall`] resolves with the response or a failure.
    pub async fn invoke_async(
        &self,
        address: &str,
        mut request: RpcRequest,
    ) -> Result<PendingCall, RpcCallerError> {
        if address.trim().is_empty() {
            return Err(RpcCallerError::InvalidRequest(
                "no target address".to_string(),
            ));
        }
        if request.service_name.is_empty() || request.method_name.is_empty() {
            return Err(RpcCallerError::InvalidRequest(format!(
                "request {} names no service or method",
                request.request_id
            )));
        }

        if request.timeout_ms == 0 {
            request.timeout_ms = self.config.request_timeout_ms;
        }
        let timeout = Duration::from_millis(request.timeout_ms);

        let connection = self.manager.get_or_create(address).await?;
        connection
            .call(request, self.config.serializer, timeout)
            .await
    }

    pub async fn invoke(
        &self,
        address: &str,
        request: RpcRequest,
    ) -> Result<RpcResponse, RpcCallerError> {
        self.invoke_async(address, request).await?.await
    }

    /// Blocks the calling thread until the response arrives or the request's
    /// deadline fires.
    ///
    /// Must be called from a thread that has not entered any tokio runtime,
    /// and the runtime must be multi-threaded so its workers keep driving the
    /// connection. Threads of `spawn_blocking` count as inside the runtime
    /// and are refused too, since tokio cannot tell them apart from workers;
    /// call [`invoke`](Self::invoke) from async code instead.
    pub fn invoke_blocking(
        &self,
        address: &str,
        request: RpcRequest,
    ) -> Result<RpcResponse, RpcCallerError> {
        if Handle::try_current().is_ok() {
            return Err(RpcCallerError::InvalidRequest(
                "invoke_blocking cannot run on a thread inside a tokio runtime".to_string(),
            ));
        }

        self.runtime.block_on(self.invoke(address, request))
    }

    /// Closes every connection; later calls fail with `ClientClosed`.
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}

#[async_trait::async_trait]
impl RpcServiceCallerInterface for RpcClient {
    fn serializer(&self) -> SerializerKind {
        self.config.serializer
    }

    async fn invoke(&self, address: &str, request: RpcRequest) -> Result<RpcResponse, RpcCallerError> {
        RpcClient::invoke(self, address, request).await
    }
}
