//! Core building blocks of the Wirebolt RPC framework.
//!
//! This crate is transport-agnostic: it knows how to frame, serialize and
//! describe RPC messages and how a single connection moves through its
//! lifecycle, but it never touches a socket itself. The Tokio server and
//! client in `extensions/` drive these primitives over TCP.

pub mod connection;
pub mod constants;
pub mod frame;
pub mod rpc;
pub mod serializer;
pub mod utils;
