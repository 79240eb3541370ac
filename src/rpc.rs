mod rpc_param;
mod rpc_request;
mod rpc_response;
mod rpc_result_status;

pub use rpc_param::{
    ANY_PARAM_TYPE, FromRpcParam, RpcAnyParam, RpcParamType, UNIT_PARAM_TYPE,
    is_param_type_assignable,
};
pub use rpc_request::{RpcRequest, RpcRequestBuilder};
pub use rpc_response::{RpcFailure, RpcOutcome, RpcResponse};
pub use rpc_result_status::RpcResultStatus;
