use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::codec::{FramedRead, FramedWrite};
use wirebolt::connection::{
    ConnectionStateCell, HeartbeatMonitor, HeartbeatRole, IdleAction, IdleTracker,
};
use wirebolt::frame::{ClientFrameCodec, FrameEncodeError, RpcFrame};
use wirebolt::rpc::RpcRequest;
use wirebolt::serializer::SerializerKind;
use wirebolt_rpc_service::RpcConfig;
use wirebolt_rpc_service_caller::{
    CorrelationTable, PendingCall, RpcCallerError, RpcTransportState, spawn_deadline_sweeper,
};

type StateChangeHandler = Arc<dyn Fn(RpcTransportState) + Send + Sync>;

struct OutboundFrame {
    frame: RpcFrame<RpcRequest>,
    written: oneshot::Sender<Result<(), RpcCallerError>>,
}

/// One TCP connection to a server, shared by every caller of that address.
///
/// A reader task completes correlation rows, a writer task is the sole
/// owner of the socket's write half, and a heartbeat task keeps the
/// connection warm while it is write-idle. Any fatal error moves the
/// connection to `Closing`, aborts the tasks and fails every pending call.
pub struct Connection {
    address: String,
    state: ConnectionStateCell,
    table: Arc<CorrelationTable>,
    idle: Arc<IdleTracker>,
    monitor: Arc<HeartbeatMonitor>,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    state_handler: Mutex<Option<StateChangeHandler>>,
}

impl Connection {
    /// Opens a connection to `address` within `connect_timeout`.
    pub async fn connect(address: &str, config: &RpcConfig) -> Result<Arc<Self>, RpcCallerError> {
        let connect_timeout = config.connect_timeout();

        let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(RpcCallerError::Connect {
                    address: address.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(RpcCallerError::ConnectTimeout {
                    address: address.to_string(),
                    timeout: connect_timeout,
                });
            }
        };

        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {}: {}", address, err);
        }

        let codec = ClientFrameCodec::new(config.max_frame_size);
        let (read_half, write_half) = stream.into_split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let connection = Arc::new(Connection {
            address: address.to_string(),
            state: ConnectionStateCell::new(),
            table: Arc::new(CorrelationTable::new()),
            idle: Arc::new(IdleTracker::new()),
            monitor: Arc::new(HeartbeatMonitor::new(
                HeartbeatRole::Client,
                config.heartbeat_settings(),
            )),
            outbound,
            tasks: Mutex::new(Vec::new()),
            state_handler: Mutex::new(None),
        });

        let weak = Arc::downgrade(&connection);
        let mut tasks = vec![
            tokio::spawn(Self::reader_task(
                FramedRead::new(read_half, codec.clone()),
                connection.table.clone(),
                connection.idle.clone(),
                weak.clone(),
            )),
            tokio::spawn(Self::writer_task(
                FramedWrite::new(write_half, codec),
                outbound_rx,
                connection.idle.clone(),
                weak.clone(),
            )),
            spawn_deadline_sweeper(
                Arc::downgrade(&connection.table),
                config.deadline_sweep_interval(),
            ),
        ];

        if connection.monitor.is_enabled() {
            tasks.push(tokio::spawn(Self::heartbeat_task(
                weak,
                connection.monitor.clone(),
                connection.idle.clone(),
                config.serializer,
            )));
        }

        *connection
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = tasks;

        // The reader may have hit EOF before the tasks were stored.
        if !connection.is_alive() {
            connection.abort_tasks();
            return Err(connection.closed_error());
        }

        tracing::info!("Connected to {}", address);
        Ok(connection)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_alive(&self) -> bool {
        self.state.is_active()
    }

    /// Calls waiting for a response on this connection.
    pub fn pending_calls(&self) -> usize {
        self.table.len()
    }

    pub fn missed_heartbeats(&self) -> u32 {
        self.monitor.missed_heartbeats()
    }

    /// Registers a handler for connectivity changes. It is called at once
    /// with the current state, and again when the connection closes.
    pub fn set_state_change_handler(
        &self,
        handler: impl Fn(RpcTransportState) + Send + Sync + 'static,
    ) {
        let handler: StateChangeHandler = Arc::new(handler);
        *self
            .state_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler.clone());

        handler(if self.is_alive() {
            RpcTransportState::Connected
        } else {
            RpcTransportState::Disconnected
        });
    }

    /// Writes one frame. Resolves once the frame has been flushed.
    pub async fn send(&self, frame: RpcFrame<RpcRequest>) -> Result<(), RpcCallerError> {
        if !self.is_alive() {
            return Err(self.closed_error());
        }

        let (written, written_rx) = oneshot::channel();
        self.outbound
            .send(OutboundFrame { frame, written })
            .map_err(|_| self.closed_error())?;

        written_rx.await.map_err(|_| self.closed_error())?
    }

    /// Registers `request` in the correlation table, writes it and returns
    /// the handle that resolves with its response. If the write fails the
    /// row is removed before the error is returned.
    pub async fn call(
        &self,
        request: RpcRequest,
        serializer: SerializerKind,
        timeout: Duration,
    ) -> Result<PendingCall, RpcCallerError> {
        if !self.is_alive() {
            return Err(self.closed_error());
        }

        let pending = PendingCall::register(&self.table, &request.request_id, timeout)?;

        match self.send(RpcFrame::new(serializer, request)).await {
            Ok(()) => Ok(pending),
            Err(err) => {
                drop(pending);
                Err(err)
            }
        }
    }

    pub fn close(&self) {
        self.shutdown("closed locally");
    }

    fn closed_error(&self) -> RpcCallerError {
        RpcCallerError::ConnectionClosed {
            address: self.address.clone(),
        }
    }

    fn abort_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.abort();
        }
    }

    fn shutdown(&self, reason: &str) {
        if !self.state.begin_closing() {
            return;
        }

        tracing::info!("Closing connection to {}: {}", self.address, reason);

        self.abort_tasks();

        let failed = self.table.fail_all(|_| self.closed_error());
        if failed > 0 {
            tracing::warn!(
                "Failed {} pending call(s) on closed connection to {}",
                failed,
                self.address
            );
        }

        let handler = self
            .state_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handler) = handler {
            handler(RpcTransportState::Disconnected);
        }
    }

    async fn reader_task(
        mut frames: FramedRead<OwnedReadHalf, ClientFrameCodec>,
        table: Arc<CorrelationTable>,
        idle: Arc<IdleTracker>,
        connection: Weak<Connection>,
    ) {
        let reason = loop {
            match frames.next().await {
                Some(Ok(frame)) => {
                    idle.mark_read();
                    tracing::trace!("Response {} received", frame.message.request_id);
                    table.complete(frame.into_message());
                }
                Some(Err(err)) => {
                    tracing::error!("Undecodable frame from server: {}", err);
                    break "corrupt stream";
                }
                None => break "server closed the connection",
            }
        };

        if let Some(connection) = connection.upgrade() {
            connection.shutdown(reason);
        }
    }

    async fn writer_task(
        mut sink: FramedWrite<OwnedWriteHalf, ClientFrameCodec>,
        mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
        idle: Arc<IdleTracker>,
        connection: Weak<Connection>,
    ) {
        while let Some(OutboundFrame { frame, written }) = outbound.recv().await {
            match sink.send(frame).await {
                Ok(()) => {
                    idle.mark_write();
                    let _ = written.send(Ok(()));
                }
                Err(FrameEncodeError::Io(err)) => {
                    tracing::error!("Write failed: {}", err);
                    let _ = written.send(Err(RpcCallerError::Io(err)));
                    break;
                }
                // Nothing reached the socket, so the stream is still intact.
                Err(err) => {
                    let _ = written.send(Err(RpcCallerError::Codec {
                        message: err.to_string(),
                    }));
                }
            }
        }

        if let Some(connection) = connection.upgrade() {
            connection.shutdown("write failed");
        }
    }

    async fn heartbeat_task(
        connection: Weak<Connection>,
        monitor: Arc<HeartbeatMonitor>,
        idle: Arc<IdleTracker>,
        serializer: SerializerKind,
    ) {
        let mut ticker = tokio::time::interval(monitor.poll_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let heartbeat_timeout = monitor.settings().timeout;

        loop {
            ticker.tick().await;

            if monitor.evaluate(&idle) != IdleAction::SendHeartbeat {
                continue;
            }

            let Some(strong) = connection.upgrade() else {
                break;
            };

            let pending = match strong
                .call(RpcRequest::heartbeat(), serializer, heartbeat_timeout)
                .await
            {
                Ok(pending) => pending,
                Err(err) => {
                    tracing::debug!("Could not send heartbeat to {}: {}", strong.address, err);
                    if !strong.is_alive() {
                        break;
                    }
                    continue;
                }
            };
            let address = strong.address.clone();
            drop(strong);

            match pending.wait().await {
                Ok(response) => {
                    tracing::trace!(
                        "Heartbeat acknowledged by {} (flag: {})",
                        address,
                        response.is_heartbeat
                    );
                    monitor.record_heartbeat_ack();
                }
                Err(err) if err.is_timeout() => {
                    let action = monitor.record_heartbeat_miss();
                    tracing::warn!(
                        "Heartbeat to {} missed ({} in a row)",
                        address,
                        monitor.missed_heartbeats()
                    );

                    if action == IdleAction::Close {
                        if let Some(strong) = connection.upgrade() {
                            strong.shutdown("heartbeat timeout");
                        }
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("state", &self.state.get())
            .field("pending_calls", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown("dropped");
    }
}
