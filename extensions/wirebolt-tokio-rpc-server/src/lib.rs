//! Note: This `RpcServer` is a reference implementation and does not include
//! authentication, authorization or transport encryption. It is best suited
//! for trusted, internal network communication. Any transport that can feed
//! decoded frames to an [`RpcDispatcher`] can act as a server; this one does
//! so over plain TCP using Tokio.
//!
//! [`RpcDispatcher`]: wirebolt_rpc_service_endpoint::RpcDispatcher

mod error;
pub use error::*;

mod rpc_server;
pub use rpc_server::*;

pub mod utils;
