use crate::constants::{
    DEFAULT_SERVICE_VERSION, HEARTBEAT_METHOD_NAME, HEARTBEAT_SERVICE_NAME,
};
use crate::rpc::RpcParamType;
use crate::serializer::{SerializationError, SerializerKind};
use crate::utils::{generate_request_id, now_millis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A single remote call, as carried in a request frame.
///
/// Parameter values are serialized one by one with the frame's serializer,
/// and `parameter_types` carries the matching type descriptors so the server
/// can resolve overloads before decoding anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub request_id: String,
    pub service_name: String,
    pub service_version: String,
    pub method_name: String,
    pub parameter_types: Vec<String>,
    pub parameters: Vec<Vec<u8>>,

    /// Zero means "not set"; the invoker substitutes its configured default.
    pub timeout_ms: u64,

    pub created_at_ms: u64,
    pub is_heartbeat: bool,
    pub attachments: HashMap<String, String>,
}

impl RpcRequest {
    pub fn new(
        service_name: impl Into<String>,
        service_version: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            request_id: generate_request_id(),
            service_name: service_name.into(),
            service_version: service_version.into(),
            method_name: method_name.into(),
            parameter_types: Vec::new(),
            parameters: Vec::new(),
            timeout_ms: 0,
            created_at_ms: now_millis(),
            is_heartbeat: false,
            attachments: HashMap::new(),
        }
    }

    /// A liveness check addressed to the reserved heartbeat service.
    pub fn heartbeat() -> Self {
        let mut request = Self::new(
            HEARTBEAT_SERVICE_NAME,
            DEFAULT_SERVICE_VERSION,
            HEARTBEAT_METHOD_NAME,
        );
        request.is_heartbeat = true;
        request
    }

    pub fn builder(
        serializer: SerializerKind,
        service_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> RpcRequestBuilder {
        RpcRequestBuilder {
            serializer,
            request: Self::new(service_name, DEFAULT_SERVICE_VERSION, method_name),
            error: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// `service:version`, the registry key this request targets.
    pub fn service_key(&self) -> String {
        format!("{}:{}", self.service_name, self.service_version)
    }

    /// Human readable `method(type, ...)` form, used in diagnostics.
    pub fn method_descriptor(&self) -> String {
        format!("{}({})", self.method_name, self.parameter_types.join(", "))
    }
}

/// Builds an [`RpcRequest`], serializing each argument as it is added.
///
/// The first serialization failure is remembered and reported by `build`.
#[derive(Debug)]
pub struct RpcRequestBuilder {
    serializer: SerializerKind,
    request: RpcRequest,
    error: Option<SerializationError>,
}

impl RpcRequestBuilder {
    pub fn serializer(&self) -> SerializerKind {
        self.serializer
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.request.service_version = version.into();
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request.request_id = request_id.into();
        self
    }

    pub fn arg<T: Serialize + RpcParamType>(mut self, value: &T) -> Self {
        if self.error.is_some() {
            return self;
        }

        match self.serializer.serialize(value) {
            Ok(bytes) => {
                self.request.parameter_types.push(T::param_type());
                self.request.parameters.push(bytes);
            }
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Adds an argument that was already serialized with this builder's serializer.
    pub fn raw_arg(mut self, param_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.request.parameter_types.push(param_type.into());
        self.request.parameters.push(bytes);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.attachments.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<RpcRequest, SerializationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.request),
        }
    }
}
