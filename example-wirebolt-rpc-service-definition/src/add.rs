use wirebolt_rpc_service::RpcMethodDefinition;

pub struct Add;

impl RpcMethodDefinition for Add {
    const SERVICE_NAME: &'static str = "Calculator";
    const METHOD_NAME: &'static str = "add";

    type Input = Vec<i64>;
    type Output = i64;
}

impl Add {
    pub fn respond(values: Vec<i64>) -> Result<i64, String> {
        values
            .iter()
            .try_fold(0i64, |sum, value| sum.checked_add(*value))
            .ok_or_else(|| "integer overflow".to_string())
    }
}
