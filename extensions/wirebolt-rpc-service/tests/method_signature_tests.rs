use wirebolt::serializer::SerializerKind;
use wirebolt_rpc_service::{RpcMethodDefinition, RpcMethodSignature, method_signature_id};

struct Greet;

impl RpcMethodDefinition for Greet {
    const SERVICE_NAME: &'static str = "Greeter";
    const METHOD_NAME: &'static str = "greet";

    type Input = String;
    type Output = String;
}

struct Sum;

impl RpcMethodDefinition for Sum {
    const SERVICE_NAME: &'static str = "Math";
    const SERVICE_VERSION: &'static str = "2.1";
    const METHOD_NAME: &'static str = "sum";

    type Input = Vec<u32>;
    type Output = u64;
}

fn types(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn signature_id_depends_on_name_and_types() {
    let a = method_signature_id("add", &["i64", "i64"]);
    assert_eq!(a, method_signature_id("add", &types(&["i64", "i64"])));
    assert_ne!(a, method_signature_id("add", &["i64"]));
    assert_ne!(a, method_signature_id("sub", &["i64", "i64"]));
    assert_ne!(
        method_signature_id("f", &["ab", "c"]),
        method_signature_id("f", &["a", "bc"])
    );
}

#[test]
fn exact_and_compatible_matching() {
    let signature = RpcMethodSignature::new("find", types(&["string", "option<i32>"]));

    assert_eq!(signature.arity(), 2);
    assert_eq!(signature.to_string(), "find(string, option<i32>)");
    assert_eq!(
        signature.id(),
        method_signature_id("find", signature.parameter_types())
    );

    assert!(signature.matches_exactly("find", &types(&["string", "option<i32>"])));
    assert!(!signature.matches_exactly("find", &types(&["string", "i32"])));

    assert!(signature.accepts("find", &types(&["string", "i32"])));
    assert!(signature.accepts("find", &types(&["string", "unit"])));
    assert!(!signature.accepts("find", &types(&["string"])));
    assert!(!signature.accepts("find", &types(&["i32", "i32"])));
    assert!(!signature.accepts("lookup", &types(&["string", "i32"])));
}

#[test]
fn definitions_build_matching_requests() {
    assert_eq!(Greet::signature().to_string(), "greet(string)");
    assert_eq!(Sum::signature().parameter_types(), &types(&["list<u32>"])[..]);

    let request = Sum::build_request(SerializerKind::Json, &vec![1, 2, 3]).unwrap();
    assert_eq!(request.service_key(), "Math:2.1");
    assert_eq!(request.method_name, "sum");
    assert!(Sum::signature().matches_exactly(&request.method_name, &request.parameter_types));

    let values: Vec<u32> = SerializerKind::Json.deserialize(&request.parameters[0]).unwrap();
    assert_eq!(values, vec![1, 2, 3]);

    let request = Greet::build_request(SerializerKind::Bitcode, &"hi".to_string()).unwrap();
    assert_eq!(request.service_key(), "Greeter:1.0");
}
