//! A Tokio TCP client for Wirebolt: one multiplexed [`Connection`] per
//! remote address, a [`ConnectionManager`] that creates and reuses them, and
//! the [`RpcClient`] invoker with async and blocking calls.

mod connection;
pub use connection::*;

mod connection_manager;
pub use connection_manager::*;

mod error;
pub use error::*;

mod rpc_client;
pub use rpc_client::*;
