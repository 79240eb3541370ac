use example_wirebolt_rpc_service_definition::{Echo, Sleep};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use wirebolt_rpc_service::{FailureKind, RpcConfig, RpcMethodDefinition};
use wirebolt_rpc_service_caller::{RpcServiceCallerInterface, RpcTransportState};
use wirebolt_rpc_service_endpoint::ServiceDefinition;
use wirebolt_tokio_rpc_client::{Connection, ConnectionManager, RpcClient};
use wirebolt_tokio_rpc_server::RpcServer;
use wirebolt_tokio_rpc_server::utils::tcp_listener_to_address;

/// Heartbeat timings short enough to observe several rounds in a test.
fn fast_heartbeat_config() -> RpcConfig {
    RpcConfig {
        business_threads: 2,
        heartbeat_interval_ms: 100,
        heartbeat_timeout_ms: 50,
        reader_idle_time_ms: 300,
        writer_idle_time_ms: 100,
        ..RpcConfig::default()
    }
}

async fn start_server(config: RpcConfig) -> String {
    let server = RpcServer::new(config).unwrap();
    server
        .register(ServiceDefinition::new(Echo::SERVICE_NAME).implement::<Echo, _, _>(Echo::respond))
        .unwrap();
    server
        .register(
            ServiceDefinition::new(Sleep::SERVICE_NAME).implement_async::<Sleep, _, _, _>(
                |millis: u64| async move {
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                    Ok::<_, String>(millis)
                },
            ),
        )
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = tcp_listener_to_address(&listener).unwrap();
    tokio::spawn(Arc::new(server).serve_with_listener(listener));

    address
}

/// Accepts connections and holds them open without ever reading or replying.
async fn start_mute_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = tcp_listener_to_address(&listener).unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    address
}

async fn wait_until_closed(connection: &Connection) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while connection.is_alive() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection closed within 5s");
}

#[tokio::test]
async fn heartbeats_keep_an_idle_connection_alive() {
    // 1. --- SETUP: SERVER AND CLIENT WITH FAST HEARTBEATS ---
    let address = start_server(fast_heartbeat_config()).await;
    let client = RpcClient::new(fast_heartbeat_config()).unwrap();

    client.call::<Echo>(&address, "first".to_string()).await.unwrap();
    let connection = client.connection(&address).await.unwrap();

    // 2. --- TEST: STAY SILENT WELL PAST THE SERVER'S READER IDLE TIME ---
    tokio::time::sleep(Duration::from_millis(450)).await;

    // 3. --- ASSERT: SAME CONNECTION, STILL USABLE ---
    assert!(connection.is_alive());
    assert_eq!(connection.missed_heartbeats(), 0);

    let echo = client.call::<Echo>(&address, "second".to_string()).await.unwrap();
    assert_eq!(echo, "Echo: second");
    assert!(Arc::ptr_eq(&connection, &client.connection(&address).await.unwrap()));
}

#[tokio::test]
async fn server_closes_a_client_that_sends_nothing() {
    let address = start_server(fast_heartbeat_config()).await;
    let config = RpcConfig {
        heartbeat_enabled: false,
        ..fast_heartbeat_config()
    };

    let connection = Connection::connect(&address, &config).await.unwrap();
    wait_until_closed(&connection).await;
}

#[tokio::test]
async fn unanswered_heartbeats_close_the_connection() {
    let address = start_mute_server().await;
    let connection = Connection::connect(&address, &fast_heartbeat_config())
        .await
        .unwrap();

    let states = Arc::new(Mutex::new(Vec::new()));
    let recorded = states.clone();
    connection.set_state_change_handler(move |state| {
        recorded.lock().unwrap().push(state);
    });

    wait_until_closed(&connection).await;
    assert!(connection.missed_heartbeats() >= 3);
    assert_eq!(
        *states.lock().unwrap(),
        vec![RpcTransportState::Connected, RpcTransportState::Disconnected]
    );
}

#[tokio::test]
async fn connection_loss_fails_every_pending_call() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = tcp_listener_to_address(&listener).unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(socket);
    });

    let client = Arc::new(
        RpcClient::new(RpcConfig {
            heartbeat_enabled: false,
            request_timeout_ms: 5_000,
            ..RpcConfig::default()
        })
        .unwrap(),
    );

    let calls = (0..3).map(|_| {
        let client = client.clone();
        let address = address.clone();
        async move { client.call::<Sleep>(&address, 10).await }
    });
    let outcomes = tokio::time::timeout(Duration::from_secs(3), futures::future::join_all(calls))
        .await
        .expect("calls fail fast, not at their deadline");

    for outcome in outcomes {
        let err = outcome.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Connection, "{err}");
    }

    // The dead connection is evicted on next lookup
    assert!(client.manager().get(&address).is_none());
    assert!(client.manager().is_empty());
}

#[tokio::test]
async fn dropping_the_connection_reports_disconnected() {
    let address = start_server(RpcConfig::default()).await;
    let connection = Connection::connect(&address, &RpcConfig::default())
        .await
        .unwrap();

    let states = Arc::new(Mutex::new(Vec::new()));
    let recorded = states.clone();
    connection.set_state_change_handler(move |state| {
        recorded.lock().unwrap().push(state);
    });

    drop(connection);

    assert_eq!(
        *states.lock().unwrap(),
        vec![RpcTransportState::Connected, RpcTransportState::Disconnected]
    );
}

#[tokio::test]
async fn manager_reuses_then_replaces_connections() {
    let address = start_server(RpcConfig::default()).await;
    let manager = Arc::new(ConnectionManager::new(RpcConfig::default()));

    // Concurrent first use dials once
    let dials = (0..10).map(|_| {
        let manager = manager.clone();
        let address = address.clone();
        async move { manager.get_or_create(&address).await.unwrap() }
    });
    let connections = futures::future::join_all(dials).await;
    for connection in &connections[1..] {
        assert!(Arc::ptr_eq(&connections[0], connection));
    }
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.dials_in_progress(), 0);

    // A closed connection is replaced on next use
    connections[0].close();
    let fresh = manager.get_or_create(&address).await.unwrap();
    assert!(!Arc::ptr_eq(&connections[0], &fresh));
    assert!(fresh.is_alive());
    assert_eq!(manager.len(), 1);

    assert!(manager.close(&address));
    assert!(!fresh.is_alive());
    assert!(manager.is_empty());
}

#[tokio::test]
async fn failed_dials_leave_no_lock_behind() {
    let manager = ConnectionManager::new(RpcConfig::default());

    for _ in 0..5 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = tcp_listener_to_address(&listener).unwrap().to_string();
        drop(listener);

        let err = manager.get_or_create(&address).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Connection);
    }

    assert!(manager.is_empty());
    assert_eq!(manager.dials_in_progress(), 0);
}
