use example_wirebolt_rpc_service_definition::{Add, Echo, Sleep};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wirebolt::frame::RpcFrame;
use wirebolt::rpc::{RpcRequest, RpcResponse, RpcResultStatus};
use wirebolt::serializer::SerializerKind;
use wirebolt_rpc_service::RpcMethodDefinition;
use wirebolt_rpc_service_endpoint::{
    LocalServiceRegistry, RpcCallContext, RpcDispatcher, ServiceDefinition, WorkerPool,
};

fn registry() -> Arc<LocalServiceRegistry> {
    let registry = LocalServiceRegistry::new();

    registry
        .register(
            ServiceDefinition::new(Echo::SERVICE_NAME)
                .implement::<Echo, _, _>(Echo::respond)
                .method("whoami", || {
                    RpcCallContext::current()
                        .map(|ctx| ctx.attachment("tenant").map(str::to_string))
                        .ok_or("no call context")
                })
                .method("explode", || -> Result<(), String> { panic!("kaboom") })
                .build()
                .unwrap(),
        )
        .unwrap();

    registry
        .register(
            ServiceDefinition::new(Add::SERVICE_NAME)
                .implement::<Add, _, _>(Add::respond)
                .build()
                .unwrap(),
        )
        .unwrap();

    registry
        .register(
            ServiceDefinition::new(Sleep::SERVICE_NAME)
                .implement_async::<Sleep, _, _, _>(|millis: u64| async move {
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                    Ok::<_, String>(millis)
                })
                .method_async("request_id", || async {
                    RpcCallContext::current()
                        .map(|ctx| ctx.request_id)
                        .ok_or("no call context")
                })
                .build()
                .unwrap(),
        )
        .unwrap();

    Arc::new(registry)
}

fn dispatcher(capacity: usize, async_await_timeout: Duration) -> RpcDispatcher {
    let workers = WorkerPool::new(2, capacity).unwrap();
    RpcDispatcher::new(registry(), Arc::new(workers), async_await_timeout)
}

async fn dispatch_one(
    dispatcher: &RpcDispatcher,
    serializer: SerializerKind,
    request: RpcRequest,
) -> RpcResponse {
    let (tx, mut rx) = mpsc::unbounded_channel();
    dispatcher.dispatch(RpcFrame::new(serializer, request), move |frame| {
        let _ = tx.send(frame);
    });

    let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("response within 5s")
        .expect("exactly one response");
    assert_eq!(frame.serializer, serializer);

    // The emitter is dropped after its single use
    assert!(rx.recv().await.is_none());
    frame.message
}

#[tokio::test]
async fn sync_handler_result_is_returned() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));

    for serializer in [SerializerKind::Bitcode, SerializerKind::Json] {
        let request = RpcRequest::builder(serializer, "Echo", "echo")
            .request_id("r1")
            .arg(&"hi")
            .build()
            .unwrap();

        let response = dispatch_one(&dispatcher, serializer, request).await;
        assert_eq!(response.request_id, "r1");
        assert_eq!(response.status, RpcResultStatus::Success);
        assert_eq!(
            response.decode_value::<String>(serializer).unwrap(),
            Some("Echo: hi".to_string())
        );
    }
}

#[tokio::test]
async fn async_handler_result_is_awaited() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let request = Sleep::build_request(SerializerKind::Json, &20).unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Json, request).await;
    assert!(response.is_success());
    assert_eq!(response.decode_value::<u64>(SerializerKind::Json).unwrap(), Some(20));
    assert!(response.processing_time_ms >= 20);
}

#[tokio::test]
async fn unknown_service_is_reported() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let request = RpcRequest::builder(SerializerKind::Bitcode, "Ghost", "haunt")
        .build()
        .unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(response.status, RpcResultStatus::ServiceNotFound);
    assert!(response.status_message.contains("Ghost:1.0"));
    assert!(response.value().is_none());
}

#[tokio::test]
async fn unknown_version_is_reported() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let request = RpcRequest::builder(SerializerKind::Bitcode, "Echo", "echo")
        .version("9.9")
        .arg(&"hi")
        .build()
        .unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(response.status, RpcResultStatus::ServiceNotFound);
}

#[tokio::test]
async fn mismatched_parameter_types_are_method_not_found() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let request = RpcRequest::builder(SerializerKind::Bitcode, "Echo", "echo")
        .arg(&42i64)
        .build()
        .unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(response.status, RpcResultStatus::MethodNotFound);
    assert_eq!(response.failure_descriptor().unwrap().kind, "MethodNotFound");
    assert!(response.status_message.contains("echo(i64)"));
}

#[tokio::test]
async fn target_error_is_a_failure_response() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let request = Add::build_request(SerializerKind::Bitcode, &vec![i64::MAX, 1]).unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(response.status, RpcResultStatus::Error);

    let failure = response.failure_descriptor().unwrap();
    assert_eq!(failure.kind, "TargetError");
    assert_eq!(failure.message, "integer overflow");
    assert!(failure.detail.is_some());
}

#[tokio::test]
async fn undecodable_argument_is_a_serialization_error() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let request = RpcRequest::builder(SerializerKind::Json, "Echo", "echo")
        .raw_arg("string", b"{not json".to_vec())
        .build()
        .unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Json, request).await;
    assert_eq!(response.status, RpcResultStatus::SerializationError);
}

#[tokio::test]
async fn handler_panic_becomes_a_failure_response() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let request = RpcRequest::builder(SerializerKind::Bitcode, "Echo", "explode")
        .build()
        .unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(response.status, RpcResultStatus::Error);

    let failure = response.failure_descriptor().unwrap();
    assert_eq!(failure.kind, "Panic");
    assert!(failure.message.contains("kaboom"));

    // The pool survives the panic
    let request = Echo::build_request(SerializerKind::Bitcode, &"still here".to_string()).unwrap();
    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert!(response.is_success());
}

#[tokio::test]
async fn slow_async_handler_hits_the_await_timeout() {
    let dispatcher = dispatcher(16, Duration::from_millis(50));
    let request = Sleep::build_request(SerializerKind::Bitcode, &2_000).unwrap();

    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(response.status, RpcResultStatus::Error);
    assert_eq!(response.failure_descriptor().unwrap().kind, "AsyncTimeout");
}

#[tokio::test]
async fn saturated_pool_answers_overloaded() {
    let dispatcher = dispatcher(1, Duration::from_secs(5));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let slow = Sleep::build_request(SerializerKind::Bitcode, &300).unwrap();
    let slow_id = slow.request_id.clone();
    let tx_slow = tx.clone();
    dispatcher.dispatch(RpcFrame::new(SerializerKind::Bitcode, slow), move |frame| {
        let _ = tx_slow.send(frame);
    });

    let rejected = Echo::build_request(SerializerKind::Bitcode, &"hi".to_string()).unwrap();
    let rejected_id = rejected.request_id.clone();
    dispatcher.dispatch(RpcFrame::new(SerializerKind::Bitcode, rejected), move |frame| {
        let _ = tx.send(frame);
    });

    let first = rx.recv().await.unwrap().message;
    assert_eq!(first.request_id, rejected_id);
    assert_eq!(first.status, RpcResultStatus::Overloaded);

    let second = rx.recv().await.unwrap().message;
    assert_eq!(second.request_id, slow_id);
    assert!(second.is_success());
}

#[tokio::test]
async fn heartbeat_is_answered_with_pong() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));
    let ping = RpcRequest::heartbeat();
    let ping_id = ping.request_id.clone();

    let response = dispatch_one(&dispatcher, SerializerKind::Json, ping).await;
    assert!(response.is_heartbeat);
    assert_eq!(response.request_id, ping_id);
    assert_eq!(
        response.decode_value::<String>(SerializerKind::Json).unwrap(),
        Some("pong".to_string())
    );
    assert_eq!(dispatcher.workers().available(), 16);
}

#[tokio::test]
async fn handlers_see_the_call_context() {
    let dispatcher = dispatcher(16, Duration::from_secs(5));

    let request = RpcRequest::builder(SerializerKind::Bitcode, "Echo", "whoami")
        .attachment("tenant", "acme")
        .build()
        .unwrap();
    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(
        response
            .decode_value::<Option<String>>(SerializerKind::Bitcode)
            .unwrap(),
        Some(Some("acme".to_string()))
    );

    let request = RpcRequest::builder(SerializerKind::Bitcode, "Sleeper", "request_id")
        .request_id("ctx-42")
        .build()
        .unwrap();
    let response = dispatch_one(&dispatcher, SerializerKind::Bitcode, request).await;
    assert_eq!(
        response.decode_value::<String>(SerializerKind::Bitcode).unwrap(),
        Some("ctx-42".to_string())
    );
}

#[test]
fn call_context_is_absent_outside_a_call() {
    assert!(RpcCallContext::current().is_none());
}
