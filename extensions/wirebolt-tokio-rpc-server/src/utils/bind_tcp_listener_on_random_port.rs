use std::io::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Binds a `TcpListener` to an OS-assigned port on `127.0.0.1`.
///
/// Returns the listener together with the address it ended up on, which is
/// what tests and demos hand to a client.
pub async fn bind_tcp_listener_on_random_port() -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;

    Ok((listener, address))
}
