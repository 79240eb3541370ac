use crate::{CorrelationTable, PendingResult, RpcCallerError};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use wirebolt::rpc::RpcResponse;

/// A request that has been written and is waiting for its response.
///
/// Resolves exactly once: with the matching response, with a timeout at the
/// row's deadline, or with a connection error if the connection dies first.
/// Dropping it unresolved removes the row so a late response is discarded.
#[derive(Debug)]
pub struct PendingCall {
    request_id: String,
    generation: u64,
    deadline: Instant,
    receiver: oneshot::Receiver<PendingResult>,
    table: Arc<CorrelationTable>,
}

impl PendingCall {
    pub fn new(
        table: Arc<CorrelationTable>,
        request_id: String,
        generation: u64,
        deadline: Instant,
        receiver: oneshot::Receiver<PendingResult>,
    ) -> Self {
        Self {
            request_id,
            generation,
            deadline,
            receiver,
            table,
        }
    }

    /// Registers `request_id` in `table` with a deadline `timeout` from now.
    pub fn register(
        table: &Arc<CorrelationTable>,
        request_id: &str,
        timeout: Duration,
    ) -> Result<Self, RpcCallerError> {
        let deadline = Instant::now() + timeout;
        let (generation, receiver) = table.register_row(request_id, deadline)?;
        Ok(Self::new(
            Arc::clone(table),
            request_id.to_string(),
            generation,
            deadline,
            receiver,
        ))
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub async fn wait(mut self) -> Result<RpcResponse, RpcCallerError> {
        match tokio::time::timeout_at(self.deadline, &mut self.receiver).await {
            Ok(result) => self.settle(result),
            Err(_) => {
                // Another path may have removed the row at the same instant;
                // its result is already on the way, so take that one instead.
                self.table.expire_row(&self.request_id, self.generation);
                let result = (&mut self.receiver).await;
                self.settle(result)
            }
        }
    }

    fn settle(
        &self,
        result: Result<PendingResult, oneshot::error::RecvError>,
    ) -> Result<RpcResponse, RpcCallerError> {
        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(RpcCallerError::Abandoned {
                request_id: self.request_id.clone(),
            }),
        }
    }
}

impl IntoFuture for PendingCall {
    type Output = Result<RpcResponse, RpcCallerError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.table.remove_row(&self.request_id, self.generation);
    }
}
