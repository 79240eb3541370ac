use std::io::Result;
use tokio::net::TcpListener;

/// Formats the local address of a bound listener as a `host:port` string,
/// the form `RpcClient` expects.
pub fn tcp_listener_to_address(listener: &TcpListener) -> Result<String> {
    Ok(listener.local_addr()?.to_string())
}
