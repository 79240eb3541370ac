use crate::constants::HEARTBEAT_PONG;
use crate::rpc::RpcResultStatus;
use crate::serializer::{SerializationError, SerializerKind};
use crate::utils::now_millis;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Why a call did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFailure {
    /// Short machine-friendly category, e.g. `"TargetError"` or `"Panic"`.
    pub kind: String,
    pub message: String,

    /// Optional diagnostic text such as a backtrace or source chain.
    pub detail: Option<String>,
}

/// Either the serialized result value or a failure descriptor, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RpcOutcome {
    Value(Vec<u8>),
    Failure(RpcFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub request_id: String,
    pub status: RpcResultStatus,
    pub status_message: String,
    pub outcome: RpcOutcome,
    pub processing_time_ms: u64,
    pub created_at_ms: u64,
    pub is_heartbeat: bool,
}

impl RpcResponse {
    fn with_outcome(
        request_id: impl Into<String>,
        status: RpcResultStatus,
        status_message: impl Into<String>,
        outcome: RpcOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            status,
            status_message: status_message.into(),
            outcome,
            processing_time_ms: 0,
            created_at_ms: now_millis(),
            is_heartbeat: false,
        }
    }

    pub fn success(request_id: impl Into<String>, value: Vec<u8>) -> Self {
        Self::with_outcome(request_id, RpcResultStatus::Success, "OK", RpcOutcome::Value(value))
    }

    /// Serializes `value` and wraps it in a success response.
    pub fn success_with<T: Serialize>(
        request_id: impl Into<String>,
        serializer: SerializerKind,
        value: &T,
    ) -> Result<Self, SerializationError> {
        Ok(Self::success(request_id, serializer.serialize(value)?))
    }

    /// A non-success response. `status` must not be `Success`; if it is, the
    /// status is downgraded to `Error` so the response stays well-formed.
    pub fn failure(
        request_id: impl Into<String>,
        status: RpcResultStatus,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let status = match status {
            RpcResultStatus::Success => RpcResultStatus::Error,
            other => other,
        };
        let message = message.into();

        Self::with_outcome(
            request_id,
            status,
            message.clone(),
            RpcOutcome::Failure(RpcFailure {
                kind: kind.into(),
                message,
                detail: None,
            }),
        )
    }

    pub fn service_not_found(request_id: impl Into<String>, service_key: &str) -> Self {
        Self::failure(
            request_id,
            RpcResultStatus::ServiceNotFound,
            "ServiceNotFound",
            format!("service not found: {service_key}"),
        )
    }

    pub fn method_not_found(request_id: impl Into<String>, method_descriptor: &str) -> Self {
        Self::failure(
            request_id,
            RpcResultStatus::MethodNotFound,
            "MethodNotFound",
            format!("method not found: {method_descriptor}"),
        )
    }

    pub fn overloaded(request_id: impl Into<String>) -> Self {
        Self::failure(
            request_id,
            RpcResultStatus::Overloaded,
            "Overloaded",
            "server worker pool is saturated",
        )
    }

    /// The reply to a heartbeat request, carrying `"pong"`.
    pub fn heartbeat(
        request_id: impl Into<String>,
        serializer: SerializerKind,
    ) -> Result<Self, SerializationError> {
        let mut response = Self::success_with(request_id, serializer, &HEARTBEAT_PONG)?;
        response.is_heartbeat = true;
        Ok(response)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        if let RpcOutcome::Failure(failure) = &mut self.outcome {
            failure.detail = Some(detail.into());
        }
        self
    }

    pub fn with_processing_time_ms(mut self, processing_time_ms: u64) -> Self {
        self.processing_time_ms = processing_time_ms;
        self
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn value(&self) -> Option<&[u8]> {
        match &self.outcome {
            RpcOutcome::Value(bytes) => Some(bytes),
            RpcOutcome::Failure(_) => None,
        }
    }

    pub fn failure_descriptor(&self) -> Option<&RpcFailure> {
        match &self.outcome {
            RpcOutcome::Value(_) => None,
            RpcOutcome::Failure(failure) => Some(failure),
        }
    }

    /// Decodes the result value, or returns `Ok(None)` for a failure response.
    pub fn decode_value<T: DeserializeOwned>(
        &self,
        serializer: SerializerKind,
    ) -> Result<Option<T>, SerializationError> {
        self.value()
            .map(|bytes| serializer.deserialize(bytes))
            .transpose()
    }
}
