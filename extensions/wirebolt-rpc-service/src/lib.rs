//! Contracts shared by Wirebolt servers and clients: configuration, method
//! signatures, typed method definitions and the retry policy consulted above
//! the invoker.

mod config;
pub use config::*;
mod error;
pub use error::*;
mod method_definition;
pub use method_definition::*;
mod method_signature;
pub use method_signature::*;
mod retry_policy;
pub use retry_policy::*;
