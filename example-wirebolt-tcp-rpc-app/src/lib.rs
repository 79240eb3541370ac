use example_wirebolt_rpc_service_definition::{Add, Echo, Sleep};
use std::time::Duration;
use wirebolt_rpc_service::RpcMethodDefinition;
use wirebolt_rpc_service_endpoint::ServiceDefinition;
use wirebolt_tokio_rpc_server::{RpcServer, RpcServerError};

/// Registers the example `Echo`, `Calculator` and `Sleeper` services.
pub fn register_example_services(server: &RpcServer) -> Result<(), RpcServerError> {
    server.register(ServiceDefinition::new(Echo::SERVICE_NAME).implement::<Echo, _, _>(Echo::respond))?;

    server.register(ServiceDefinition::new(Add::SERVICE_NAME).implement::<Add, _, _>(Add::respond))?;

    server.register(
        ServiceDefinition::new(Sleep::SERVICE_NAME).implement_async::<Sleep, _, _, _>(
            |millis: u64| async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok::<_, String>(millis)
            },
        ),
    )?;

    Ok(())
}
