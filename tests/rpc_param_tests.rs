use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use wirebolt::constants::{HEARTBEAT_METHOD_NAME, HEARTBEAT_SERVICE_NAME};
use wirebolt::rpc::{
    FromRpcParam, RpcAnyParam, RpcParamType, RpcRequest, RpcResponse, RpcResultStatus,
    is_param_type_assignable,
};
use wirebolt::serializer::SerializerKind;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
}

wirebolt::impl_rpc_param!(Point => "point");

#[test]
fn descriptors_are_stable() {
    assert_eq!(String::param_type(), "string");
    assert_eq!(<&str>::param_type(), "string");
    assert_eq!(i64::param_type(), "i64");
    assert_eq!(<()>::param_type(), "unit");
    assert_eq!(Vec::<i64>::param_type(), "list<i64>");
    assert_eq!(<[u8]>::param_type(), "list<u8>");
    assert_eq!(HashMap::<String, f64>::param_type(), "map<string,f64>");
    assert_eq!(Option::<Vec<String>>::param_type(), "option<list<string>>");
    assert_eq!(RpcAnyParam::param_type(), "any");
    assert_eq!(Point::param_type(), "point");
}

#[test]
fn assignability_rules() {
    assert!(is_param_type_assignable("i64", "i64"));
    assert!(is_param_type_assignable("any", "list<string>"));
    assert!(is_param_type_assignable("option<i64>", "i64"));
    assert!(is_param_type_assignable("option<i64>", "unit"));
    assert!(is_param_type_assignable("option<option<string>>", "string"));
    assert!(is_param_type_assignable("option<any>", "point"));

    assert!(!is_param_type_assignable("i64", "i32"));
    assert!(!is_param_type_assignable("i64", "unit"));
    assert!(!is_param_type_assignable("option<i64>", "string"));
    assert!(!is_param_type_assignable("list<i64>", "any"));
}

#[test]
fn optional_parameters_accept_values_and_unit() {
    for serializer in [SerializerKind::Bitcode, SerializerKind::Json] {
        let bytes = serializer.serialize(&42i64).unwrap();
        let decoded = Option::<i64>::from_rpc_param(serializer, "i64", &bytes).unwrap();
        assert_eq!(decoded, Some(42));

        let unit = serializer.serialize(&()).unwrap();
        let decoded = Option::<i64>::from_rpc_param(serializer, "unit", &unit).unwrap();
        assert_eq!(decoded, None);

        let exact = serializer.serialize(&Some(7i64)).unwrap();
        let decoded = Option::<i64>::from_rpc_param(serializer, "option<i64>", &exact).unwrap();
        assert_eq!(decoded, Some(7));
    }
}

#[test]
fn any_param_defers_decoding() {
    let serializer = SerializerKind::Json;
    let bytes = serializer.serialize(&Point { x: 1, y: -2 }).unwrap();

    let param = RpcAnyParam::from_rpc_param(serializer, "point", &bytes).unwrap();
    assert_eq!(param.supplied_type(), "point");
    assert_eq!(param.bytes(), &bytes[..]);
    assert_eq!(param.decode::<Point>().unwrap(), Point { x: 1, y: -2 });
    assert!(param.decode::<String>().is_err());
}

#[test]
fn builder_records_types_and_metadata() {
    let request = RpcRequest::builder(SerializerKind::Bitcode, "Calculator", "add")
        .version("2.0")
        .request_id("r1")
        .arg(&vec![1i64, 2])
        .arg(&Point { x: 3, y: 4 })
        .raw_arg("unit", SerializerKind::Bitcode.serialize(&()).unwrap())
        .timeout(Duration::from_millis(1500))
        .attachment("tenant", "acme")
        .build()
        .unwrap();

    assert_eq!(request.request_id, "r1");
    assert_eq!(request.service_key(), "Calculator:2.0");
    assert_eq!(request.parameter_types, vec!["list<i64>", "point", "unit"]);
    assert_eq!(request.parameters.len(), 3);
    assert_eq!(request.method_descriptor(), "add(list<i64>, point, unit)");
    assert_eq!(request.timeout(), Some(Duration::from_millis(1500)));
    assert_eq!(request.attachments.get("tenant").map(String::as_str), Some("acme"));
    assert!(!request.is_heartbeat);

    let decoded: Vec<i64> = SerializerKind::Bitcode.deserialize(&request.parameters[0]).unwrap();
    assert_eq!(decoded, vec![1, 2]);
}

#[test]
fn requests_default_to_fresh_ids_and_no_timeout() {
    let a = RpcRequest::new("Echo", "1.0", "echo");
    let b = RpcRequest::new("Echo", "1.0", "echo");

    assert_ne!(a.request_id, b.request_id);
    assert_eq!(a.timeout(), None);
    assert!(a.created_at_ms > 0);
}

#[test]
fn heartbeat_request_and_response() {
    let ping = RpcRequest::heartbeat();
    assert!(ping.is_heartbeat);
    assert_eq!(ping.service_name, HEARTBEAT_SERVICE_NAME);
    assert_eq!(ping.method_name, HEARTBEAT_METHOD_NAME);

    let pong = RpcResponse::heartbeat(&ping.request_id, SerializerKind::Json).unwrap();
    assert!(pong.is_heartbeat);
    assert!(pong.is_success());
    assert_eq!(pong.request_id, ping.request_id);
    assert_eq!(
        pong.decode_value::<String>(SerializerKind::Json).unwrap(),
        Some("pong".to_string())
    );
}

#[test]
fn failure_responses_never_carry_a_value() {
    let response = RpcResponse::failure("r2", RpcResultStatus::Success, "TargetError", "boom")
        .with_detail("stack");

    assert_eq!(response.status, RpcResultStatus::Error);
    assert!(!response.is_success());
    assert!(response.value().is_none());
    assert_eq!(response.decode_value::<String>(SerializerKind::Json).unwrap(), None);

    let failure = response.failure_descriptor().unwrap();
    assert_eq!(failure.kind, "TargetError");
    assert_eq!(failure.message, "boom");
    assert_eq!(failure.detail.as_deref(), Some("stack"));
}

#[test]
fn canned_failures_use_dedicated_statuses() {
    let not_found = RpcResponse::service_not_found("a", "Ghost:1.0");
    assert_eq!(not_found.status, RpcResultStatus::ServiceNotFound);
    assert!(not_found.status_message.contains("Ghost:1.0"));

    let no_method = RpcResponse::method_not_found("b", "echo(i64)");
    assert_eq!(no_method.status, RpcResultStatus::MethodNotFound);

    let overloaded = RpcResponse::overloaded("c");
    assert_eq!(overloaded.status, RpcResultStatus::Overloaded);
    assert_eq!(overloaded.failure_descriptor().unwrap().kind, "Overloaded");
}

#[test]
fn status_codes_are_stable() {
    assert_eq!(RpcResultStatus::Success.value(), 0);
    assert_eq!(RpcResultStatus::ServiceNotFound.value(), 1);
    assert_eq!(RpcResultStatus::Error.value(), 3);
    assert_eq!(RpcResultStatus::Timeout.value(), 4);
    assert_eq!(RpcResultStatus::try_from(6u8).unwrap(), RpcResultStatus::Overloaded);
    assert!(RpcResultStatus::try_from(42u8).is_err());
}
