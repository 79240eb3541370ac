use crate::Connection;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use wirebolt_rpc_service::RpcConfig;
use wirebolt_rpc_service_caller::RpcCallerError;

/// Keeps at most one live [`Connection`] per remote address.
///
/// Connections are created lazily on first use. Concurrent callers for the
/// same address serialize on a per-address lock, so only one of them dials;
/// the rest reuse its connection. A cached connection found dead is evicted
/// by whoever notices, and replaced.
#[derive(Debug)]
pub struct ConnectionManager {
    config: RpcConfig,
    connections: DashMap<String, Arc<Connection>>,
    connect_locks: DashMap<String, Arc<Mutex<()>>>,
    closed: AtomicBool,
}

impl ConnectionManager {
    pub fn new(config: RpcConfig) -> Self {
        Self {
            config,
            connections: DashMap::new(),
            connect_locks: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub async fn get_or_create(&self, address: &str) -> Result<Arc<Connection>, RpcCallerError> {
        if self.is_closed() {
            return Err(RpcCallerError::ClientClosed);
        }

        if let Some(connection) = self.get(address) {
            return Ok(connection);
        }

        let lock = self
            .connect_locks
            .entry(address.to_string())
            .or_default()
            .value()
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.connect_locked(address).await
        };

        // The slot goes once no other caller is waiting on it
        drop(lock);
        self.connect_locks
            .remove_if(address, |_, slot| Arc::strong_count(slot) == 1);

        result
    }

    async fn connect_locked(&self, address: &str) -> Result<Arc<Connection>, RpcCallerError> {
        if let Some(connection) = self.get(address) {
            return Ok(connection);
        }

        let connection = Connection::connect(address, &self.config).await?;
        self.connections
            .insert(address.to_string(), connection.clone());

        if self.is_closed() {
            self.close(address);
            return Err(RpcCallerError::ClientClosed);
        }

        Ok(connection)
    }

    /// The cached connection for `address`, if it is still alive.
    pub fn get(&self, address: &str) -> Option<Arc<Connection>> {
        let cached = self.connections.get(address).map(|entry| entry.value().clone())?;
        if cached.is_alive() {
            return Some(cached);
        }

        tracing::debug!("Evicting dead connection to {}", address);
        self.connections
            .remove_if(address, |_, connection| !connection.is_alive());
        None
    }

    /// Number of cached connections, dead ones included until evicted.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Addresses with a dial in progress.
    pub fn dials_in_progress(&self) -> usize {
        self.connect_locks.len()
    }

    pub fn close(&self, address: &str) -> bool {
        match self.connections.remove(address) {
            Some((_, connection)) => {
                connection.close();
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes every connection and refuses new ones.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);

        let addresses: Vec<String> = self
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for address in addresses {
            self.close(&address);
        }
    }
}
