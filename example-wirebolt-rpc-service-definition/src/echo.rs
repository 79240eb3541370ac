use wirebolt_rpc_service::RpcMethodDefinition;

pub struct Echo;

impl RpcMethodDefinition for Echo {
    const SERVICE_NAME: &'static str = "Echo";
    const METHOD_NAME: &'static str = "echo";

    type Input = String;
    type Output = String;
}

impl Echo {
    pub fn respond(message: String) -> Result<String, String> {
        Ok(format!("Echo: {message}"))
    }
}
