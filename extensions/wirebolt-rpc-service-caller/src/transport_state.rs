/// Connectivity of a client transport, as reported to state-change handlers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RpcTransportState {
    Connected,
    Disconnected,
}
