use crate::error::{RpcInvokeError, RpcServiceEndpointError};
use crate::{
    LocalServiceInvoker, RpcArguments, RpcCallContext, RpcReturn, ServiceRegistry, WorkerPool,
    split_request,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wirebolt::frame::RpcFrame;
use wirebolt::rpc::{RpcRequest, RpcResponse};
use wirebolt::serializer::SerializerKind;
use wirebolt_rpc_service::RpcConfig;

/// Receives the single response produced for a request.
pub trait RpcResponseEmitter: Send + Sync + 'static {
    fn emit(&self, frame: RpcFrame<RpcResponse>);
}

impl<F> RpcResponseEmitter for F
where
    F: Fn(RpcFrame<RpcResponse>) + Send + Sync + 'static,
{
    fn emit(&self, frame: RpcFrame<RpcResponse>) {
        self(frame)
    }
}

/// Turns decoded requests into responses.
///
/// Heartbeats and lookup misses are answered inline on the calling (I/O)
/// task. Everything else is handed to the [`WorkerPool`]; a saturated pool
/// is answered with `Overloaded`. Every request yields exactly one emit.
pub struct RpcDispatcher {
    registry: Arc<dyn ServiceRegistry>,
    workers: Arc<WorkerPool>,
    async_await_timeout: Duration,
}

impl RpcDispatcher {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        workers: Arc<WorkerPool>,
        async_await_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            workers,
            async_await_timeout,
        }
    }

    pub fn from_config(
        registry: Arc<dyn ServiceRegistry>,
        config: &RpcConfig,
    ) -> Result<Self, RpcServiceEndpointError> {
        let workers = WorkerPool::new(config.business_threads, config.business_queue_capacity)?;
        Ok(Self::new(
            registry,
            Arc::new(workers),
            config.async_await_timeout(),
        ))
    }

    pub fn workers(&self) -> &Arc<WorkerPool> {
        &self.workers
    }

    pub fn dispatch<E: RpcResponseEmitter>(&self, frame: RpcFrame<RpcRequest>, emitter: E) {
        let RpcFrame {
            serializer,
            message: request,
        } = frame;

        if request.is_heartbeat {
            let response = RpcResponse::heartbeat(request.request_id.clone(), serializer)
                .unwrap_or_else(|err| RpcInvokeError::from(err).into_response(request.request_id));
            emitter.emit(RpcFrame::new(serializer, response));
            return;
        }

        let Some(invoker) = self
            .registry
            .lookup(&request.service_name, &request.service_version)
        else {
            tracing::debug!(
                "No service registered for {} (request {})",
                request.service_key(),
                request.request_id
            );
            let response = RpcResponse::service_not_found(request.request_id.clone(), &request.service_key());
            emitter.emit(RpcFrame::new(serializer, response));
            return;
        };

        let slot = match self.workers.try_reserve() {
            Ok(slot) => slot,
            Err(err) => {
                tracing::warn!("Rejecting request {}: {}", request.request_id, err);
                emitter.emit(RpcFrame::new(
                    serializer,
                    RpcResponse::overloaded(request.request_id),
                ));
                return;
            }
        };

        let async_await_timeout = self.async_await_timeout;

        slot.spawn(async move {
            let started = Instant::now();
            let request_id = request.request_id.clone();

            let response = match execute(invoker, serializer, request, async_await_timeout).await {
                Ok(value) => RpcResponse::success(request_id, value),
                Err(err) => {
                    tracing::debug!("Request {} failed: {}", request_id, err);
                    err.into_response(request_id)
                }
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            emitter.emit(RpcFrame::new(
                serializer,
                response.with_processing_time_ms(elapsed_ms),
            ));
        });
    }
}

async fn execute(
    invoker: Arc<LocalServiceInvoker>,
    serializer: SerializerKind,
    request: RpcRequest,
    async_await_timeout: Duration,
) -> Result<Vec<u8>, RpcInvokeError> {
    let (context, arguments) = split_request(serializer, request);
    let scoped = context.clone();

    scoped
        .scope(run_handler(invoker, context, arguments, async_await_timeout))
        .await
}

async fn run_handler(
    invoker: Arc<LocalServiceInvoker>,
    context: RpcCallContext,
    arguments: RpcArguments,
    async_await_timeout: Duration,
) -> Result<Vec<u8>, RpcInvokeError> {
    let returned = std::panic::catch_unwind(AssertUnwindSafe(|| {
        invoker.invoke(context, arguments)
    }))
    .map_err(panic_to_error)??;

    match returned {
        RpcReturn::Ready(value) => Ok(value),
        RpcReturn::Pending(pending) => {
            let guarded = AssertUnwindSafe(pending).catch_unwind();
            match tokio::time::timeout(async_await_timeout, guarded).await {
                Ok(Ok(result)) => result,
                Ok(Err(panic)) => Err(panic_to_error(panic)),
                Err(_) => Err(RpcInvokeError::AsyncTimeout {
                    timeout: async_await_timeout,
                }),
            }
        }
    }
}

fn panic_to_error(panic: Box<dyn Any + Send>) -> RpcInvokeError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());

    tracing::error!("Handler panicked: {}", message);
    RpcInvokeError::Panic { message }
}
