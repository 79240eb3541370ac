use crate::RpcMethodSignature;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wirebolt::constants::DEFAULT_SERVICE_VERSION;
use wirebolt::rpc::{FromRpcParam, RpcParamType, RpcRequest};
use wirebolt::serializer::{SerializationError, SerializerKind};

/// Describes one remotely callable method with a single typed input.
///
/// Shared between the server, which registers a handler for it, and the
/// client, which calls it, so both sides agree on names and types.
pub trait RpcMethodDefinition {
    const SERVICE_NAME: &'static str;
    const SERVICE_VERSION: &'static str = DEFAULT_SERVICE_VERSION;
    const METHOD_NAME: &'static str;

    type Input: Serialize + DeserializeOwned + FromRpcParam + Send + 'static;
    type Output: Serialize + DeserializeOwned + Send + 'static;

    fn signature() -> RpcMethodSignature {
        RpcMethodSignature::new(Self::METHOD_NAME, vec![Self::Input::param_type()])
    }

    fn build_request(
        serializer: SerializerKind,
        input: &Self::Input,
    ) -> Result<RpcRequest, SerializationError> {
        RpcRequest::builder(serializer, Self::SERVICE_NAME, Self::METHOD_NAME)
            .version(Self::SERVICE_VERSION)
            .arg(input)
            .build()
    }
}
