//! Server-side dispatch for Wirebolt: the service registry, typed handler
//! adapters, the bounded business worker pool and the dispatcher that turns
//! a decoded request into exactly one response.

mod call_context;
pub use call_context::*;

mod dispatcher;
pub use dispatcher::*;

pub mod error;

mod handler;
pub use handler::*;

mod registry;
pub use registry::*;

mod service_invoker;
pub use service_invoker::*;

mod worker_pool;
pub use worker_pool::*;
