use example_wirebolt_rpc_service_definition::Add;
use std::sync::Mutex;
use std::time::Duration;
use wirebolt::rpc::{RpcRequest, RpcResponse, RpcResultStatus};
use wirebolt::serializer::SerializerKind;
use wirebolt_rpc_service::{FailureKind, FixedRetryPolicy, NoRetry};
use wirebolt_rpc_service_caller::{RpcCallerError, RpcServiceCallerInterface, decode_response};

/// Answers with scripted outcomes, recording every request it saw.
struct ScriptedCaller {
    script: Mutex<Vec<Result<(), RpcCallerError>>>,
    seen: Mutex<Vec<RpcRequest>>,
}

impl ScriptedCaller {
    fn new(mut script: Vec<Result<(), RpcCallerError>>) -> Self {
        script.reverse();
        Self {
            script: Mutex::new(script),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<RpcRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RpcServiceCallerInterface for ScriptedCaller {
    fn serializer(&self) -> SerializerKind {
        SerializerKind::Json
    }

    async fn invoke(&self, _address: &str, request: RpcRequest) -> Result<RpcResponse, RpcCallerError> {
        self.seen.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop().unwrap_or(Ok(()));
        next?;

        let values: Vec<i64> = SerializerKind::Json.deserialize(&request.parameters[0]).unwrap();
        Ok(RpcResponse::success_with(
            request.request_id,
            SerializerKind::Json,
            &values.iter().sum::<i64>(),
        )
        .unwrap())
    }
}

fn connection_lost() -> RpcCallerError {
    RpcCallerError::ConnectionClosed {
        address: "test".into(),
    }
}

#[tokio::test]
async fn typed_call_round_trips() {
    let caller = ScriptedCaller::new(vec![]);
    let sum = caller.call::<Add>("test", vec![1, 2, 3]).await.unwrap();
    assert_eq!(sum, 6);

    let seen = caller.seen();
    assert_eq!(seen[0].service_name, "Calculator");
    assert_eq!(seen[0].parameter_types, vec!["list<i64>"]);
}

#[tokio::test]
async fn retry_uses_a_fresh_request_each_attempt() {
    let caller = ScriptedCaller::new(vec![Err(connection_lost()), Err(connection_lost())]);
    let policy = FixedRetryPolicy::new(3, Duration::from_millis(5));

    let sum = caller
        .call_with_retry::<Add, _>("test", vec![4, 5], &policy)
        .await
        .unwrap();
    assert_eq!(sum, 9);

    let seen = caller.seen();
    assert_eq!(seen.len(), 3);
    assert_ne!(seen[0].request_id, seen[1].request_id);
    assert_ne!(seen[1].request_id, seen[2].request_id);
}

#[tokio::test]
async fn retry_gives_up_after_max_attempts() {
    let caller = ScriptedCaller::new(vec![
        Err(connection_lost()),
        Err(connection_lost()),
        Err(connection_lost()),
    ]);
    let policy = FixedRetryPolicy::new(2, Duration::ZERO);

    let err = caller
        .call_with_retry::<Add, _>("test", vec![1], &policy)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Connection);
    assert_eq!(caller.seen().len(), 2);
}

#[tokio::test]
async fn non_transient_failures_are_not_retried() {
    let caller = ScriptedCaller::new(vec![Err(RpcCallerError::InvalidRequest("bad".into()))]);
    let policy = FixedRetryPolicy::new(5, Duration::ZERO);

    let err = caller
        .call_with_retry::<Add, _>("test", vec![1], &policy)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcCallerError::InvalidRequest(_)));
    assert_eq!(caller.seen().len(), 1);

    let caller = ScriptedCaller::new(vec![Err(connection_lost())]);
    assert!(
        caller
            .call_with_retry::<Add, _>("test", vec![1], &NoRetry)
            .await
            .is_err()
    );
    assert_eq!(caller.seen().len(), 1);
}

#[test]
fn failure_responses_become_remote_errors() {
    let response = RpcResponse::failure("r1", RpcResultStatus::Error, "TargetError", "boom");
    let err = decode_response::<i64>(SerializerKind::Json, &response).unwrap_err();

    match &err {
        RpcCallerError::Remote { status, kind, message } => {
            assert_eq!(*status, RpcResultStatus::Error);
            assert_eq!(kind, "TargetError");
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), FailureKind::Service);

    let overloaded = decode_response::<i64>(SerializerKind::Json, &RpcResponse::overloaded("r2"))
        .unwrap_err();
    assert_eq!(overloaded.kind(), FailureKind::Overloaded);
}

#[test]
fn local_failures_convert_to_responses() {
    let response = RpcCallerError::Timeout {
        request_id: "r1".into(),
        timeout: Duration::from_millis(100),
    }
    .into_response("r1");

    assert_eq!(response.status, RpcResultStatus::Timeout);
    assert_eq!(response.failure_descriptor().unwrap().kind, "Timeout");
}
