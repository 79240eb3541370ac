use example_wirebolt_rpc_service_definition::{Add, Echo};
use example_wirebolt_tcp_rpc_app::register_example_services;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wirebolt::rpc::RpcResultStatus;
use wirebolt_rpc_service::RpcConfig;
use wirebolt_rpc_service_caller::RpcServiceCallerInterface;
use wirebolt_tokio_rpc_client::RpcClient;
use wirebolt_tokio_rpc_server::RpcServer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RpcConfig::from_env();
    let runtime = config.build_io_runtime()?;

    runtime.block_on(async move {
        let server = RpcServer::new(config.clone())?;
        register_example_services(&server)?;

        let server = Arc::new(server);
        let listener = server.bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();

        let server_task = tokio::spawn({
            let server = server.clone();
            async move {
                if let Err(err) = server.serve_with_listener(listener).await {
                    tracing::error!("Server stopped: {}", err);
                }
            }
        });

        let client = RpcClient::new(config)?;

        let (echoed, sum) = tokio::join!(
            client.call::<Echo>(&address, "hello".to_string()),
            client.call::<Add>(&address, vec![1, 2, 3]),
        );
        tracing::info!("echo() -> {:?}", echoed);
        tracing::info!("add() -> {:?}", sum);

        let response = client
            .invoke(&address, client.request("Ghost", "haunt").build()?)
            .await?;
        if response.status == RpcResultStatus::ServiceNotFound {
            tracing::info!("Ghost.haunt() -> {}", response.status_message);
        } else {
            tracing::warn!("Ghost.haunt() unexpectedly returned {:?}", response.status);
        }

        client.shutdown();
        server_task.abort();

        Ok::<_, Box<dyn std::error::Error>>(())
    })
}
