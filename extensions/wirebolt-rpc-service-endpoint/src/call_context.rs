use std::collections::HashMap;
use wirebolt::rpc::{FromRpcParam, RpcRequest};
use wirebolt::serializer::SerializerKind;

use crate::error::RpcInvokeError;

tokio::task_local! {
    static CURRENT_CALL: RpcCallContext;
}

/// What a handler may know about the call it is serving.
///
/// Raw handlers receive it as an argument; typed handlers can fetch it with
/// [`RpcCallContext::current`].
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCallContext {
    pub request_id: String,
    pub service_name: String,
    pub service_version: String,
    pub method_name: String,
    pub serializer: SerializerKind,
    pub attachments: HashMap<String, String>,
}

impl RpcCallContext {
    /// The context of the call being executed on this task, if any.
    pub fn current() -> Option<RpcCallContext> {
        CURRENT_CALL.try_with(|ctx| ctx.clone()).ok()
    }

    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }

    pub(crate) async fn scope<F: Future>(self, future: F) -> F::Output {
        CURRENT_CALL.scope(self, future).await
    }
}

/// The still-serialized argument values of one call.
#[derive(Debug, Clone)]
pub struct RpcArguments {
    serializer: SerializerKind,
    parameter_types: Vec<String>,
    parameters: Vec<Vec<u8>>,
}

impl RpcArguments {
    pub fn new(
        serializer: SerializerKind,
        parameter_types: Vec<String>,
        parameters: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            serializer,
            parameter_types,
            parameters,
        }
    }

    pub fn serializer(&self) -> SerializerKind {
        self.serializer
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    pub fn len(&self) -> usize {
        self.parameter_types.len().min(self.parameters.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn decode<T: FromRpcParam>(&self, index: usize) -> Result<T, RpcInvokeError> {
        match (self.parameter_types.get(index), self.parameters.get(index)) {
            (Some(param_type), Some(bytes)) => {
                Ok(T::from_rpc_param(self.serializer, param_type, bytes)?)
            }
            _ => Err(RpcInvokeError::ArgumentCount {
                expected: index + 1,
                supplied: self.len(),
            }),
        }
    }
}

/// Splits a request into the context and arguments a handler receives.
pub fn split_request(serializer: SerializerKind, request: RpcRequest) -> (RpcCallContext, RpcArguments) {
    let RpcRequest {
        request_id,
        service_name,
        service_version,
        method_name,
        parameter_types,
        parameters,
        attachments,
        ..
    } = request;

    (
        RpcCallContext {
            request_id,
            service_name,
            service_version,
            method_name,
            serializer,
            attachments,
        },
        RpcArguments::new(serializer, parameter_types, parameters),
    )
}
