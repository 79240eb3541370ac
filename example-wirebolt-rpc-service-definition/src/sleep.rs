use wirebolt_rpc_service::RpcMethodDefinition;

/// Sleeps for the given number of milliseconds, then echoes it back.
pub struct Sleep;

impl RpcMethodDefinition for Sleep {
    const SERVICE_NAME: &'static str = "Sleeper";
    const METHOD_NAME: &'static str = "sleep";

    type Input = u64;
    type Output = u64;
}
