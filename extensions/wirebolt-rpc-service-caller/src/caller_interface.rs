use crate::RpcCallerError;
use serde::de::DeserializeOwned;
use wirebolt::rpc::{RpcRequest, RpcResponse};
use wirebolt::serializer::SerializerKind;
use wirebolt_rpc_service::{RetryPolicy, RpcMethodDefinition};

/// Decodes the value of a successful response, or converts a failure
/// response into [`RpcCallerError::Remote`].
pub fn decode_response<T: DeserializeOwned>(
    serializer: SerializerKind,
    response: &RpcResponse,
) -> Result<T, RpcCallerError> {
    if let Some(failure) = response.failure_descriptor() {
        return Err(RpcCallerError::Remote {
            status: response.status,
            kind: failure.kind.clone(),
            message: failure.message.clone(),
        });
    }

    response
        .decode_value(serializer)?
        .ok_or_else(|| RpcCallerError::Codec {
            message: format!("response {} carries no value", response.request_id),
        })
}

/// A generic capability for making RPC calls to an address.
///
/// Implementors provide `invoke`; typed calls and the retry loop are
/// provided on top of it.
#[async_trait::async_trait]
pub trait RpcServiceCallerInterface: Send + Sync {
    /// The serializer new requests are tagged with.
    fn serializer(&self) -> SerializerKind;

    /// Sends `request` to `address` and waits for its response.
    async fn invoke(&self, address: &str, request: RpcRequest) -> Result<RpcResponse, RpcCallerError>;

    /// Calls a method described by a shared [`RpcMethodDefinition`].
    async fn call<M>(&self, address: &str, input: M::Input) -> Result<M::Output, RpcCallerError>
    where
        M: RpcMethodDefinition + 'static,
    {
        let serializer = self.serializer();
        let request = M::build_request(serializer, &input)?;
        let response = self.invoke(address, request).await?;
        decode_response(serializer, &response)
    }

    /// Like [`call`](Self::call), but consults `policy` after each failure.
    ///
    /// Every attempt is a new request with a fresh id.
    async fn call_with_retry<M, P>(
        &self,
        address: &str,
        input: M::Input,
        policy: &P,
    ) -> Result<M::Output, RpcCallerError>
    where
        M: RpcMethodDefinition + 'static,
        M::Input: Sync,
        P: RetryPolicy + ?Sized,
    {
        let serializer = self.serializer();
        let mut attempt: u32 = 1;

        loop {
            let delay = policy.delay_before_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let request = M::build_request(serializer, &input)?;
            let outcome = match self.invoke(address, request).await {
                Ok(response) => decode_response(serializer, &response),
                Err(err) => Err(err),
            };

            match outcome {
                Ok(output) => return Ok(output),
                Err(err) if policy.should_retry(attempt, err.kind()) => {
                    tracing::debug!(
                        "Attempt {} of {}.{} failed ({}), retrying",
                        attempt,
                        M::SERVICE_NAME,
                        M::METHOD_NAME,
                        err
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
