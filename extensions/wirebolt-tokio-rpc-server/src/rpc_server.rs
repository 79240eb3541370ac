use crate::RpcServerError;
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpSocket, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::codec::{FramedRead, FramedWrite};
use wirebolt::connection::{
    ConnectionStateCell, HeartbeatMonitor, HeartbeatRole, IdleAction, IdleTracker,
};
use wirebolt::frame::{FrameEncodeError, RpcFrame, ServerFrameCodec};
use wirebolt::rpc::{RpcResponse, RpcResultStatus};
use wirebolt_rpc_service::RpcConfig;
use wirebolt_rpc_service_endpoint::{LocalServiceRegistry, RpcDispatcher, ServiceDefinition};

/// Tears down per-connection state however `handle_connection` exits,
/// including when the task is aborted during server shutdown.
struct ConnectionGuard {
    state: Arc<ConnectionStateCell>,
    sender: AbortHandle,
    active_connections: Arc<AtomicUsize>,
    peer: SocketAddr,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.state.begin_closing();
        self.sender.abort();
        self.active_connections.fetch_sub(1, Ordering::AcqRel);
        tracing::info!("Terminated connection for {}.", self.peer);
    }
}

/// A TCP server that decodes request frames, dispatches them and writes one
/// response frame per request.
pub struct RpcServer {
    config: RpcConfig,
    registry: Arc<LocalServiceRegistry>,
    dispatcher: Arc<RpcDispatcher>,
    active_connections: Arc<AtomicUsize>,
}

impl RpcServer {
    pub fn new(config: RpcConfig) -> Result<Self, RpcServerError> {
        Self::with_registry(config, Arc::new(LocalServiceRegistry::new()))
    }

    /// Builds a server around an existing registry.
    pub fn with_registry(
        config: RpcConfig,
        registry: Arc<LocalServiceRegistry>,
    ) -> Result<Self, RpcServerError> {
        config.validate()?;

        let dispatcher = RpcDispatcher::from_config(registry.clone(), &config)?;

        Ok(RpcServer {
            config,
            registry,
            dispatcher: Arc::new(dispatcher),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Builds and registers a service.
    pub fn register(&self, service: ServiceDefinition) -> Result<(), RpcServerError> {
        self.registry.register(service.build()?)?;
        Ok(())
    }

    pub fn registry(&self) -> Arc<LocalServiceRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }

    /// Binds a listener with the configured `server_backlog`.
    pub async fn bind<A: ToSocketAddrs>(&self, addr: A) -> Result<TcpListener, RpcServerError> {
        let mut last_err = None;

        for address in tokio::net::lookup_host(addr).await? {
            let socket = if address.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            socket.set_reuseaddr(true)?;

            if let Err(err) = socket.bind(address) {
                last_err = Some(err);
                continue;
            }

            match socket.listen(self.config.server_backlog) {
                Ok(listener) => return Ok(listener),
                Err(err) => last_err = Some(err),
            }
        }

        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "no address to bind to")
            })
            .into())
    }

    /// Binds to `addr` and serves until the process ends.
    pub async fn serve<A: ToSocketAddrs>(self: Arc<Self>, addr: A) -> Result<(), RpcServerError> {
        let listener = self.bind(addr).await?;
        self.serve_with_listener(listener).await
    }

    /// Serves connections from a pre-bound listener, e.g. one bound to port 0.
    pub async fn serve_with_listener(
        self: Arc<Self>,
        listener: TcpListener,
    ) -> Result<(), RpcServerError> {
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    /// Serves until `shutdown` resolves, then closes every open connection.
    pub async fn serve_with_shutdown<F>(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), RpcServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let address = listener.local_addr()?;
        tracing::info!("Server running on {:?}", address);

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Server on {:?} shutting down", address);
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(self.clone().handle_connection(stream, peer));
                    }
                    Err(err) => {
                        tracing::warn!("Failed to accept connection on {:?}: {}", address, err);
                    }
                },

                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        connections.shutdown().await;
        Ok(())
    }

    /// Serves one client until it disconnects, goes read-idle or sends a
    /// frame that cannot be decoded.
    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {}: {}", peer, err);
        }

        let (read_half, write_half) = stream.into_split();
        self.serve_io(read_half, write_half, peer).await;
    }

    /// Serves requests read from `reader`, writing responses to `writer`.
    ///
    /// Returns once the peer disconnects, goes read-idle, sends an
    /// undecodable frame, or the writer fails. Any of these closes both
    /// directions.
    pub async fn serve_io<R, W>(self: Arc<Self>, reader: R, writer: W, peer: SocketAddr)
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.active_connections.fetch_add(1, Ordering::AcqRel);
        tracing::info!("Client connected: {}", peer);

        let codec = ServerFrameCodec::new(self.config.max_frame_size);
        let mut frames = FramedRead::new(reader, codec.clone());
        let sink = FramedWrite::new(writer, codec);

        let state = Arc::new(ConnectionStateCell::new());
        let idle = Arc::new(IdleTracker::new());
        let monitor = HeartbeatMonitor::new(HeartbeatRole::Server, self.config.heartbeat_settings());

        let (tx, rx) = mpsc::unbounded_channel::<RpcFrame<RpcResponse>>();
        let mut sender = tokio::spawn(Self::sender_task(sink, rx, idle.clone(), peer));
        let _guard = ConnectionGuard {
            state: state.clone(),
            sender: sender.abort_handle(),
            active_connections: self.active_connections.clone(),
            peer,
        };

        let mut idle_check = tokio::time::interval(monitor.poll_period());
        idle_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                next = frames.next() => match next {
                    Some(Ok(frame)) => {
                        idle.mark_read();
                        tracing::trace!(
                            "Request {} from {} for {}.{}",
                            frame.message.request_id,
                            peer,
                            frame.message.service_key(),
                            frame.message.method_name
                        );

                        let tx = tx.clone();
                        let state = state.clone();
                        self.dispatcher.dispatch(frame, move |response: RpcFrame<RpcResponse>| {
                            if !state.is_active() {
                                return;
                            }
                            if let Err(mpsc::error::SendError(response)) = tx.send(response) {
                                state.begin_closing();
                                tracing::debug!(
                                    "Dropping response {} for {}: writer has exited",
                                    response.message.request_id,
                                    peer
                                );
                            }
                        });
                    }
                    Some(Err(err)) => {
                        tracing::error!("Closing connection to {}: {}", peer, err);
                        break;
                    }
                    None => {
                        tracing::info!("Client {} disconnected.", peer);
                        break;
                    }
                },

                _ = &mut sender => {
                    tracing::warn!("Writer for {} exited. Closing connection.", peer);
                    break;
                }

                _ = idle_check.tick(), if monitor.is_enabled() => {
                    if monitor.evaluate(&idle) == IdleAction::Close {
                        tracing::warn!(
                            "Client {} idle for {:?}. Closing connection.",
                            peer,
                            idle.read_idle()
                        );
                        break;
                    }
                }
            }
        }
    }

    /// Sole writer of the socket. Responses that fail to encode are replaced
    /// by a `SerializationError` response so the caller still gets an answer.
    async fn sender_task<W>(
        mut sink: FramedWrite<W, ServerFrameCodec>,
        mut rx: mpsc::UnboundedReceiver<RpcFrame<RpcResponse>>,
        idle: Arc<IdleTracker>,
        peer: SocketAddr,
    ) where
        W: AsyncWrite + Unpin,
    {
        while let Some(frame) = rx.recv().await {
            let serializer = frame.serializer;
            let request_id = frame.message.request_id.clone();

            match sink.send(frame).await {
                Ok(()) => idle.mark_write(),
                Err(FrameEncodeError::Io(err)) => {
                    tracing::error!("Write to {} failed: {}", peer, err);
                    break;
                }
                Err(err) => {
                    tracing::error!("Could not encode response {} for {}: {}", request_id, peer, err);

                    let fallback = RpcResponse::failure(
                        request_id,
                        RpcResultStatus::SerializationError,
                        "SerializationError",
                        err.to_string(),
                    );
                    if sink.send(RpcFrame::new(serializer, fallback)).await.is_err() {
                        break;
                    }
                    idle.mark_write();
                }
            }
        }
    }
}
